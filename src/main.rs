//! Thin entry point: all CLI behavior lives in `yini-cli` (spec.md §6's
//! external CLI collaborator); this binary only wires it up as `yini`.

use std::process::ExitCode;

fn main() -> ExitCode {
    yini_cli::run()
}
