//! Pass 1 — macro expansion (spec.md §4.5).

use std::collections::HashSet;

use yini_syntax::ast::{Define, Expr};
use yini_syntax::{ErrorSite, Value};

use crate::error::{Error, Result};
use crate::resolve::eval::{evaluate, Environment};
use crate::resolved::OrderedMap;

/// Resolves every `#define` entry into a `Value`, honoring "later
/// definitions override earlier ones under the same name" (spec.md §4.4)
/// by only keeping the last `Define` per name before resolving, and
/// detecting `CircularMacro` across transitive `@other` references.
pub fn resolve_macros(
    defines: &[Define],
    env_provider: &dyn Fn(&str) -> Option<String>,
) -> Result<OrderedMap<Value>> {
    let mut latest: OrderedMap<Define> = OrderedMap::new();
    for define in defines {
        latest.insert(define.name.clone(), define.clone());
    }

    let names: Vec<String> = latest.keys().map(str::to_string).collect();
    let mut env = MacroEnv {
        defines: &latest,
        env_provider,
        resolved: OrderedMap::new(),
        in_progress: HashSet::new(),
    };
    for name in &names {
        env.resolve(name)?;
    }
    Ok(env.resolved)
}

struct MacroEnv<'a> {
    defines: &'a OrderedMap<Define>,
    env_provider: &'a dyn Fn(&str) -> Option<String>,
    resolved: OrderedMap<Value>,
    in_progress: HashSet<String>,
}

impl<'a> MacroEnv<'a> {
    fn resolve(&mut self, name: &str) -> Result<Value> {
        if let Some(value) = self.resolved.get(name) {
            return Ok(value.clone());
        }
        let define = self
            .defines
            .get(name)
            .expect("resolve only called with known macro names")
            .clone();

        if !self.in_progress.insert(name.to_string()) {
            return Err(Error::CircularMacro(ErrorSite::named(
                define.position.clone(),
                name.to_string(),
            )));
        }
        let value = evaluate(&define.value, self)?;
        self.in_progress.remove(name);
        self.resolved.insert(name.to_string(), value.clone());
        Ok(value)
    }
}

impl<'a> Environment for MacroEnv<'a> {
    fn resolve_macro(&mut self, name: &str, expr: &Expr) -> Result<Value> {
        if self.defines.contains_key(name) {
            self.resolve(name)
        } else {
            Err(Error::UndefinedMacro(ErrorSite::named(
                expr.position.clone(),
                name.to_string(),
            )))
        }
    }

    /// Macros are evaluated in an empty section scope (spec.md §4.5): any
    /// cross-reference inside a macro body is necessarily undefined.
    fn resolve_cross_ref(&mut self, section: &str, key: &str, expr: &Expr) -> Result<Value> {
        Err(Error::UndefinedCrossRef(ErrorSite::named(
            expr.position.clone(),
            format!("{section}.{key}"),
        )))
    }

    fn resolve_env(&self, name: &str) -> Option<String> {
        (self.env_provider)(name)
    }
}
