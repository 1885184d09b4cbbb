//! The three-pass resolver (spec.md §4.5): macro expansion, inheritance
//! flattening, then demand-driven per-entry evaluation.

pub mod eval;
pub mod inherit;
pub mod macros;

use std::collections::{HashMap, HashSet};

use yini_syntax::ast::{Document, Expr};
use yini_syntax::{ErrorSite, Value};

use crate::error::{Error, Result};
use crate::resolve::eval::{evaluate, Environment};
use crate::resolve::inherit::FlattenedSection;
use crate::resolved::{Origin, ResolvedConfig};

/// Runs all three passes over a merged [`Document`], returning the
/// [`ResolvedConfig`] plus every error collected during per-entry evaluation
/// (spec.md §7: "Resolver errors are collected per entry where safe, but any
/// error stops further evaluation of that entry and leaves it marked
/// `Unresolved`"). Macro expansion and inheritance flattening (Passes 1-2)
/// have no such per-entry granularity — a cycle there aborts the whole
/// resolve, returned as `Err`. The `#define`/`#include`/`#schema`
/// pseudo-sections never appear in the result (spec.md §4.5, final
/// paragraph) — they live on separate `Document` fields, never as `Section`
/// values, so there is nothing to filter out here.
pub fn resolve(
    document: &Document,
    env_provider: &dyn Fn(&str) -> Option<String>,
) -> Result<(ResolvedConfig, Vec<Error>)> {
    let macros = macros::resolve_macros(&document.defines, env_provider)?;
    let flattened = inherit::flatten_inheritance(document)?;

    let by_name: HashMap<String, FlattenedSection> = flattened
        .iter()
        .map(|s| (s.name.clone(), s.clone()))
        .collect();
    let order: Vec<String> = flattened.iter().map(|s| s.name.clone()).collect();

    let mut pass = ResolvePass {
        flattened: by_name,
        macros,
        env_provider,
        resolved: ResolvedConfig::new(),
        in_progress: HashSet::new(),
    };
    let mut errors = Vec::new();

    for section_name in &order {
        let section = pass.flattened.get(section_name).expect("in order").clone();
        for key in section.entries.keys().map(str::to_string).collect::<Vec<_>>() {
            if let Err(err) = pass.resolve_entry(section_name, &key) {
                errors.push(err);
            }
        }
        pass.resolve_quick_registers(section_name, &mut errors);
    }

    pass.resolved.macros = pass.macros.clone();
    Ok((pass.resolved, errors))
}

struct ResolvePass<'a> {
    flattened: HashMap<String, FlattenedSection>,
    macros: crate::resolved::OrderedMap<Value>,
    env_provider: &'a dyn Fn(&str) -> Option<String>,
    resolved: ResolvedConfig,
    in_progress: HashSet<(String, String)>,
}

impl<'a> ResolvePass<'a> {
    fn resolve_entry(&mut self, section: &str, key: &str) -> Result<Value> {
        if let Some(value) = self.resolved.get(section, key) {
            return Ok(value.clone());
        }

        let expr = self
            .flattened
            .get(section)
            .and_then(|s| s.entries.get(key))
            .cloned()
            .expect("callers only resolve keys already validated to exist");

        let id = (section.to_string(), key.to_string());
        if !self.in_progress.insert(id.clone()) {
            return Err(Error::CircularReference(ErrorSite::named(
                expr.position.clone(),
                format!("{section}.{key}"),
            )));
        }

        let value = {
            let mut env = SectionEnv {
                pass: self,
                current_section: section.to_string(),
            };
            evaluate(&expr, &mut env)
        };
        self.in_progress.remove(&id);
        let value = value?;

        if let Value::Dynamic(_) = &value {
            let (line, column) = (expr.position.line, expr.position.column);
            self.resolved.ensure_section(section).origins.insert(
                key.to_string(),
                Origin {
                    file: expr.position.file.clone(),
                    line,
                    rhs_start_column: column,
                },
            );
        }
        self.resolved
            .ensure_section(section)
            .entries
            .insert(key.to_string(), value.clone());
        Ok(value)
    }

    fn resolve_quick_registers(&mut self, section: &str, errors: &mut Vec<Error>) {
        let quick_registers = self
            .flattened
            .get(section)
            .map(|s| s.quick_registers.clone())
            .unwrap_or_default();
        for (index, expr) in quick_registers.iter().enumerate() {
            let mut env = SectionEnv {
                pass: self,
                current_section: section.to_string(),
            };
            match evaluate(expr, &mut env) {
                Ok(value) => {
                    self.resolved
                        .ensure_section(section)
                        .entries
                        .insert(index.to_string(), value);
                }
                Err(err) => errors.push(err),
            }
        }
    }
}

struct SectionEnv<'a, 'b> {
    pass: &'b mut ResolvePass<'a>,
    current_section: String,
}

impl<'a, 'b> Environment for SectionEnv<'a, 'b> {
    fn resolve_macro(&mut self, name: &str, expr: &Expr) -> Result<Value> {
        self.pass
            .macros
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UndefinedMacro(ErrorSite::named(expr.position.clone(), name.to_string())))
    }

    fn resolve_cross_ref(&mut self, section: &str, key: &str, expr: &Expr) -> Result<Value> {
        if !self.pass.flattened.contains_key(section) {
            return Err(Error::UndefinedCrossRef(ErrorSite::named(
                expr.position.clone(),
                format!("{section}.{key}"),
            )));
        }
        if self
            .pass
            .flattened
            .get(section)
            .map(|s| !s.entries.contains_key(key))
            .unwrap_or(true)
        {
            return Err(Error::UndefinedCrossRef(ErrorSite::named(
                expr.position.clone(),
                format!("{section}.{key}"),
            )));
        }
        self.pass.resolve_entry(section, key)
    }

    fn resolve_env(&self, name: &str) -> Option<String> {
        (self.pass.env_provider)(name)
    }
}
