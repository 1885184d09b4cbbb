//! Expression evaluator shared by the macro pass and the per-entry pass
//! (spec.md §4.5 "Evaluation rules").

use yini_syntax::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use yini_syntax::value::{Color, Coord, PathValue};
use yini_syntax::{ErrorSite, Value};

use crate::error::{Error, Result};

/// Abstracts over the two scopes an expression can be evaluated in: the
/// empty scope used for macro right-hand sides, and the per-section scope
/// used for pass 3. Both need to resolve `MacroRef`s (transitively, with
/// cycle detection); only the section scope can resolve `CrossRef`s.
pub trait Environment {
    fn resolve_macro(&mut self, name: &str, expr: &Expr) -> Result<Value>;
    fn resolve_cross_ref(&mut self, section: &str, key: &str, expr: &Expr) -> Result<Value>;
    fn resolve_env(&self, name: &str) -> Option<String>;
}

pub fn evaluate(expr: &Expr, env: &mut dyn Environment) -> Result<Value> {
    match &expr.kind {
        ExprKind::Integer(i) => Ok(Value::Integer(*i)),
        ExprKind::Float(x) => Ok(Value::Float(*x)),
        ExprKind::String(s) => Ok(Value::String(s.clone())),
        ExprKind::Boolean(b) => Ok(Value::Boolean(*b)),
        ExprKind::HexColor(digits) => evaluate_hex_color(digits, expr),
        ExprKind::Array(items) => {
            let values = items
                .iter()
                .map(|item| evaluate(item, env))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Array(values))
        }
        ExprKind::Set(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                let value = evaluate(item, env)?;
                if values.contains(&value) {
                    return Err(Error::DuplicateSetMember(ErrorSite::at(
                        item.position.clone(),
                    )));
                }
                values.push(value);
            }
            Ok(Value::Set(values))
        }
        ExprKind::Map(entries) => {
            let mut values = Vec::with_capacity(entries.len());
            for (key, value_expr) in entries {
                let value = evaluate(value_expr, env)?;
                values.push((key.clone(), value));
            }
            Ok(Value::Map(values))
        }
        ExprKind::MacroRef(name) => env.resolve_macro(name, expr),
        ExprKind::CrossRef(section, key) => env.resolve_cross_ref(section, key, expr),
        ExprKind::EnvRef(name, default) => match env.resolve_env(name) {
            Some(value) => Ok(Value::String(value)),
            None => match default {
                Some(default_expr) => evaluate(default_expr, env),
                None => Err(Error::MissingEnvVar(ErrorSite::named(
                    expr.position.clone(),
                    name.clone(),
                ))),
            },
        },
        ExprKind::Binary(op, lhs, rhs) => evaluate_binary(*op, lhs, rhs, expr, env),
        ExprKind::Unary(op, operand) => evaluate_unary(*op, operand, expr, env),
        ExprKind::Group(inner) => evaluate(inner, env),
        ExprKind::Call(name, args) => evaluate_call(name, args, expr, env),
    }
}

fn evaluate_hex_color(digits: &str, expr: &Expr) -> Result<Value> {
    let byte = |range: std::ops::Range<usize>| -> Result<u8> {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| Error::InvalidHexColor(ErrorSite::at(expr.position.clone())))
    };
    if digits.len() != 6 {
        return Err(Error::InvalidHexColor(ErrorSite::at(expr.position.clone())));
    }
    Ok(Value::Color(Color {
        r: byte(0..2)?,
        g: byte(2..4)?,
        b: byte(4..6)?,
        a: None,
    }))
}

fn evaluate_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    expr: &Expr,
    env: &mut dyn Environment,
) -> Result<Value> {
    let left = evaluate(lhs, env)?;
    let right = evaluate(rhs, env)?;
    use BinaryOp::*;
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => match op {
            Add => Ok(Value::Integer(a + b)),
            Sub => Ok(Value::Integer(a - b)),
            Mul => Ok(Value::Integer(a * b)),
            Div => {
                if *b == 0 {
                    Err(Error::DivisionByZero(ErrorSite::at(expr.position.clone())))
                } else {
                    Ok(Value::Integer(a.wrapping_div(*b)))
                }
            }
            Rem => {
                if *b == 0 {
                    Err(Error::DivisionByZero(ErrorSite::at(expr.position.clone())))
                } else {
                    Ok(Value::Integer(a.wrapping_rem(*b)))
                }
            }
        },
        (a, b) if is_numeric(a) && is_numeric(b) => {
            let a = as_f64(a);
            let b = as_f64(b);
            match op {
                Add => Ok(Value::Float(a + b)),
                Sub => Ok(Value::Float(a - b)),
                Mul => Ok(Value::Float(a * b)),
                Div => {
                    if b == 0.0 {
                        Err(Error::DivisionByZero(ErrorSite::at(expr.position.clone())))
                    } else {
                        Ok(Value::Float(a / b))
                    }
                }
                Rem => Err(Error::InvalidOperator(ErrorSite::at(expr.position.clone()))),
            }
        }
        _ => Err(Error::InvalidOperator(ErrorSite::at(expr.position.clone()))),
    }
}

fn is_numeric(value: &Value) -> bool {
    matches!(value, Value::Integer(_) | Value::Float(_))
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Integer(i) => *i as f64,
        Value::Float(x) => *x,
        _ => unreachable!("as_f64 only called on numeric values"),
    }
}

fn evaluate_unary(
    op: UnaryOp,
    operand: &Expr,
    expr: &Expr,
    env: &mut dyn Environment,
) -> Result<Value> {
    let value = evaluate(operand, env)?;
    match (op, &value) {
        (UnaryOp::Neg, Value::Integer(i)) => Ok(Value::Integer(-i)),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Pos, Value::Integer(_) | Value::Float(_)) => Ok(value),
        _ => Err(Error::InvalidOperator(ErrorSite::at(expr.position.clone()))),
    }
}

fn evaluate_call(
    name: &str,
    args: &[Expr],
    expr: &Expr,
    env: &mut dyn Environment,
) -> Result<Value> {
    let values = args
        .iter()
        .map(|arg| evaluate(arg, env))
        .collect::<Result<Vec<_>>>()?;
    let invalid = || Error::InvalidConstructor(ErrorSite::named(expr.position.clone(), name.to_string()));

    match name.to_ascii_lowercase().as_str() {
        "color" => {
            let byte = |v: &Value| -> Option<u8> {
                match v {
                    Value::Integer(i) => u8::try_from(*i).ok(),
                    _ => None,
                }
            };
            match values.as_slice() {
                [r, g, b] => Ok(Value::Color(Color {
                    r: byte(r).ok_or_else(invalid)?,
                    g: byte(g).ok_or_else(invalid)?,
                    b: byte(b).ok_or_else(invalid)?,
                    a: None,
                })),
                [r, g, b, a] => Ok(Value::Color(Color {
                    r: byte(r).ok_or_else(invalid)?,
                    g: byte(g).ok_or_else(invalid)?,
                    b: byte(b).ok_or_else(invalid)?,
                    a: Some(byte(a).ok_or_else(invalid)?),
                })),
                _ => Err(invalid()),
            }
        }
        "coord" => {
            let num = |v: &Value| -> Option<f64> {
                match v {
                    Value::Integer(i) => Some(*i as f64),
                    Value::Float(x) => Some(*x),
                    _ => None,
                }
            };
            match values.as_slice() {
                [x, y] => Ok(Value::Coord(Coord {
                    x: num(x).ok_or_else(invalid)?,
                    y: num(y).ok_or_else(invalid)?,
                    z: None,
                })),
                [x, y, z] => Ok(Value::Coord(Coord {
                    x: num(x).ok_or_else(invalid)?,
                    y: num(y).ok_or_else(invalid)?,
                    z: Some(num(z).ok_or_else(invalid)?),
                })),
                _ => Err(invalid()),
            }
        }
        "path" => match values.as_slice() {
            [Value::String(text)] => Ok(Value::Path(PathValue { text: text.clone() })),
            _ => Err(invalid()),
        },
        "list" | "array" => Ok(Value::Array(values)),
        "set" => {
            let mut deduped = Vec::with_capacity(values.len());
            for value in values {
                if deduped.contains(&value) {
                    return Err(Error::DuplicateSetMember(ErrorSite::at(
                        expr.position.clone(),
                    )));
                }
                deduped.push(value);
            }
            Ok(Value::Set(deduped))
        }
        "dyna" => match values.as_slice() {
            [single] => {
                if single.is_dynamic() {
                    Err(Error::NestedDyna(ErrorSite::at(expr.position.clone())))
                } else {
                    Ok(Value::Dynamic(Box::new(single.clone())))
                }
            }
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}
