//! Schema Validator (spec.md §4.6).

use yini_syntax::ast::{EmptyBehavior, SchemaRule, TypeExpr};
use yini_syntax::Value;

use crate::error::ValidationError;
use crate::resolve::eval::{evaluate, Environment};
use crate::resolved::ResolvedConfig;

/// Validates `config` against `rules`, collecting every violation rather
/// than stopping at the first (spec.md §4.6, last paragraph). Defaults
/// declared with `=expr` empty-behavior are evaluated and written into
/// `config` as a side effect, matching "write the default into the
/// ResolvedConfig ... and continue".
pub fn validate(
    config: &mut ResolvedConfig,
    rules: &[SchemaRule],
    env_provider: &dyn Fn(&str) -> Option<String>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for rule in rules {
        let section_present = config.sections.contains_key(&rule.section);
        let key_present = section_present
            && config
                .sections
                .get(&rule.section)
                .map(|s| s.entries.contains_key(&rule.key))
                .unwrap_or(false);

        if !section_present {
            if rule.required && matches!(rule.empty_behavior, EmptyBehavior::Error) {
                errors.push(ValidationError::MissingSection {
                    section: rule.section.clone(),
                });
            }
            continue;
        }

        if !key_present {
            match &rule.empty_behavior {
                EmptyBehavior::Error => {
                    if rule.required {
                        errors.push(ValidationError::MissingKey {
                            section: rule.section.clone(),
                            key: rule.key.clone(),
                        });
                    }
                }
                EmptyBehavior::Default(default_expr) => {
                    let macros_snapshot = config.macros.clone();
                    let mut env = ValidatorDefaultEnv {
                        macros: &macros_snapshot,
                        env_provider,
                    };
                    match evaluate(default_expr, &mut env) {
                        Ok(value) => {
                            config.ensure_section(&rule.section).entries.insert(rule.key.clone(), value);
                        }
                        Err(_) => errors.push(ValidationError::MissingKey {
                            section: rule.section.clone(),
                            key: rule.key.clone(),
                        }),
                    }
                }
                EmptyBehavior::Silent => {}
            }
            continue;
        }

        let value = config
            .get(&rule.section, &rule.key)
            .expect("key_present checked above")
            .clone();
        let value = value.unwrap_dynamic();

        if !satisfies(&rule.type_expr, value) {
            errors.push(ValidationError::TypeMismatch {
                section: rule.section.clone(),
                key: rule.key.clone(),
                expected: type_expr_name(&rule.type_expr),
                found: value.type_name().to_string(),
            });
            continue;
        }

        if let (Some(number), true) = (as_range_number(value), rule.min.is_some() || rule.max.is_some()) {
            let in_range = rule.min.map_or(true, |min| number >= min)
                && rule.max.map_or(true, |max| number <= max);
            if !in_range {
                errors.push(ValidationError::OutOfRange {
                    section: rule.section.clone(),
                    key: rule.key.clone(),
                    value: number,
                    min: rule.min,
                    max: rule.max,
                });
            }
        }
    }

    errors
}

fn as_range_number(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}

/// Recursively checks whether `value` satisfies `type_expr`.
fn satisfies(type_expr: &TypeExpr, value: &Value) -> bool {
    match (type_expr, value) {
        (TypeExpr::Any, _) => true,
        (TypeExpr::String, Value::String(_)) => true,
        (TypeExpr::Int, Value::Integer(_)) => true,
        (TypeExpr::Float, Value::Float(_) | Value::Integer(_)) => true,
        (TypeExpr::Bool, Value::Boolean(_)) => true,
        (TypeExpr::Array(inner), Value::Array(items)) => {
            items.iter().all(|item| satisfies(inner, item))
        }
        (TypeExpr::Set(inner), Value::Set(items)) => {
            items.iter().all(|item| satisfies(inner, item))
        }
        (TypeExpr::Map(_, value_type), Value::Map(entries)) => {
            entries.iter().all(|(_, v)| satisfies(value_type, v))
        }
        _ => false,
    }
}

fn type_expr_name(type_expr: &TypeExpr) -> String {
    match type_expr {
        TypeExpr::String => "string".to_string(),
        TypeExpr::Int => "int".to_string(),
        TypeExpr::Float => "float".to_string(),
        TypeExpr::Bool => "bool".to_string(),
        TypeExpr::Array(inner) => format!("array[{}]", type_expr_name(inner)),
        TypeExpr::Set(inner) => format!("set[{}]", type_expr_name(inner)),
        TypeExpr::Map(k, v) => format!("{{{}:{}}}", type_expr_name(k), type_expr_name(v)),
        TypeExpr::Any => "any".to_string(),
    }
}

/// Evaluates a schema default expression. Defaults have no section scope of
/// their own (the target key is, by definition, absent), so cross-references
/// within a default expression are never valid.
struct ValidatorDefaultEnv<'a> {
    macros: &'a crate::resolved::OrderedMap<Value>,
    env_provider: &'a dyn Fn(&str) -> Option<String>,
}

impl<'a> Environment for ValidatorDefaultEnv<'a> {
    fn resolve_macro(&mut self, name: &str, expr: &yini_syntax::ast::Expr) -> crate::error::Result<Value> {
        self.macros.get(name).cloned().ok_or_else(|| {
            crate::error::Error::UndefinedMacro(yini_syntax::ErrorSite::named(
                expr.position.clone(),
                name.to_string(),
            ))
        })
    }

    fn resolve_cross_ref(
        &mut self,
        section: &str,
        key: &str,
        expr: &yini_syntax::ast::Expr,
    ) -> crate::error::Result<Value> {
        Err(crate::error::Error::UndefinedCrossRef(yini_syntax::ErrorSite::named(
            expr.position.clone(),
            format!("{section}.{key}"),
        )))
    }

    fn resolve_env(&self, name: &str) -> Option<String> {
        (self.env_provider)(name)
    }
}
