use std::process::ExitCode;

fn main() -> ExitCode {
    yini_cli::run()
}
