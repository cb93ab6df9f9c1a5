//! The dynamically-typed value carried by publications and inputs (spec.md §4.5).
//!
//! Federates publish and subscribe with a declared [`ValueKind`], but the wire
//! payload is untyped bytes; coercion between kinds happens at the receiving input,
//! mirroring how the cross-language pub/sub boundary works.

use std::sync::OnceLock;

use regex::Regex;

use crate::RuntimeError;
use fedrt_core::InterfaceHandle;

/// Matches the `"re+imj"` / `"re-imj"` string form of a complex literal (spec.md §4.5,
/// e.g. `"3.14159+2j"`). Pure-real and pure-imaginary strings are handled separately in
/// [`parse_complex`], since the sign-split regex requires both parts present.
fn complex_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?P<re>[+-]?\d+(?:\.\d+)?)(?P<sign>[+-])(?P<im>\d+(?:\.\d+)?)j$").unwrap())
}

/// Parses a complex literal string into `(real, imaginary)`, accepting the full
/// `"re+imj"` form, a pure imaginary (`"2j"`), or a pure real (`"3.14"`, taken as
/// `im = 0.0`).
fn parse_complex(s: &str) -> Option<(f64, f64)> {
    let s = s.trim();
    if let Some(caps) = complex_pattern().captures(s) {
        let re: f64 = caps["re"].parse().ok()?;
        let sign = if &caps["sign"] == "-" { -1.0 } else { 1.0 };
        let im: f64 = caps["im"].parse::<f64>().ok()? * sign;
        return Some((re, im));
    }
    if let Some(stripped) = s.strip_suffix('j').or_else(|| s.strip_suffix('J')) {
        let im: f64 = stripped.parse().ok()?;
        return Some((0.0, im));
    }
    let re: f64 = s.parse().ok()?;
    Some((re, 0.0))
}

/// The declared type of a publication or input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Double,
    Integer,
    String,
    Boolean,
    Vector,
    Complex,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValueKind::Double => "double",
            ValueKind::Integer => "int",
            ValueKind::String => "string",
            ValueKind::Boolean => "bool",
            ValueKind::Vector => "vector",
            ValueKind::Complex => "complex",
        };
        f.write_str(s)
    }
}

/// A concrete value as produced by a publication or consumed by an input.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Double(f64),
    Integer(i64),
    String(String),
    Boolean(bool),
    Vector(Vec<f64>),
    Complex(f64, f64),
}

fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Double(_) => ValueKind::Double,
            Value::Integer(_) => ValueKind::Integer,
            Value::String(_) => ValueKind::String,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Vector(_) => ValueKind::Vector,
            Value::Complex(_, _) => ValueKind::Complex,
        }
    }

    /// Coerce `self` to `target`, following the type-coercion matrix of spec.md §4.5:
    /// numeric kinds interconvert, strings parse/format, booleans map to 0.0/1.0, and
    /// anything coercing into a vector/complex of incompatible shape fails.
    pub fn coerce(&self, target: ValueKind, handle: InterfaceHandle) -> Result<Value, RuntimeError> {
        if self.kind() == target {
            return Ok(self.clone());
        }
        let fail = || RuntimeError::TypeCoercionFail(handle);
        match (self, target) {
            (Value::Double(d), ValueKind::Integer) => Ok(Value::Integer(*d as i64)),
            (Value::Double(d), ValueKind::Boolean) => Ok(Value::Boolean(*d != 0.0)),
            (Value::Double(d), ValueKind::String) => Ok(Value::String(d.to_string())),
            (Value::Double(d), ValueKind::Vector) => Ok(Value::Vector(vec![*d])),
            (Value::Double(d), ValueKind::Complex) => Ok(Value::Complex(*d, 0.0)),

            (Value::Integer(i), ValueKind::Double) => Ok(Value::Double(*i as f64)),
            (Value::Integer(i), ValueKind::Boolean) => Ok(Value::Boolean(*i != 0)),
            (Value::Integer(i), ValueKind::String) => Ok(Value::String(i.to_string())),
            (Value::Integer(i), ValueKind::Vector) => Ok(Value::Vector(vec![*i as f64])),
            (Value::Integer(i), ValueKind::Complex) => Ok(Value::Complex(*i as f64, 0.0)),

            (Value::Boolean(b), ValueKind::Double) => Ok(Value::Double(if *b { 1.0 } else { 0.0 })),
            (Value::Boolean(b), ValueKind::Integer) => Ok(Value::Integer(if *b { 1 } else { 0 })),
            (Value::Boolean(b), ValueKind::String) => Ok(Value::String(b.to_string())),

            (Value::String(s), ValueKind::Double) => s.parse::<f64>().map(Value::Double).map_err(|_| fail()),
            (Value::String(s), ValueKind::Integer) => s.parse::<i64>().map(Value::Integer).map_err(|_| fail()),
            (Value::String(s), ValueKind::Boolean) => match s.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Boolean(true)),
                "false" | "0" => Ok(Value::Boolean(false)),
                _ => Err(fail()),
            },
            (Value::String(s), ValueKind::Complex) => {
                parse_complex(s).map(|(re, im)| Value::Complex(re, im)).ok_or_else(fail)
            }

            // vector -> double yields the 2-norm; vector -> int its floor.
            (Value::Vector(v), ValueKind::Double) => Ok(Value::Double(l2_norm(v))),
            (Value::Vector(v), ValueKind::Integer) => Ok(Value::Integer(l2_norm(v).floor() as i64)),

            // complex -> double yields the magnitude.
            (Value::Complex(re, im), ValueKind::Double) => Ok(Value::Double((re * re + im * im).sqrt())),

            _ => Err(fail()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedrt_core::InterfaceHandle;

    fn h() -> InterfaceHandle {
        InterfaceHandle::from(1usize)
    }

    #[test]
    fn double_to_string_and_back() {
        let v = Value::Double(3.5);
        let s = v.coerce(ValueKind::String, h()).unwrap();
        assert_eq!(s, Value::String("3.5".to_owned()));
        let back = s.coerce(ValueKind::Double, h()).unwrap();
        assert_eq!(back, Value::Double(3.5));
    }

    #[test]
    fn bool_from_string() {
        assert_eq!(
            Value::String("true".into()).coerce(ValueKind::Boolean, h()).unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn unparseable_string_fails() {
        assert!(Value::String("not a number".into())
            .coerce(ValueKind::Double, h())
            .is_err());
    }

    #[test]
    fn same_kind_is_identity() {
        let v = Value::Integer(7);
        assert_eq!(v.coerce(ValueKind::Integer, h()).unwrap(), v);
    }

    #[test]
    fn vector_to_double_is_2norm() {
        let v = Value::Vector(vec![3.0, 4.0]);
        assert_eq!(v.coerce(ValueKind::Double, h()).unwrap(), Value::Double(5.0));
    }

    #[test]
    fn vector_to_int_is_floor_of_2norm() {
        let v = Value::Vector(vec![3.0, 4.0, 1.0]);
        assert_eq!(v.coerce(ValueKind::Integer, h()).unwrap(), Value::Integer(5));
    }

    #[test]
    fn complex_to_double_is_magnitude() {
        let v = Value::Complex(3.0, 4.0);
        assert_eq!(v.coerce(ValueKind::Double, h()).unwrap(), Value::Double(5.0));
    }

    #[test]
    fn string_parses_to_complex() {
        let v = Value::String("3.14159+2j".to_owned());
        assert_eq!(v.coerce(ValueKind::Complex, h()).unwrap(), Value::Complex(3.14159, 2.0));

        let negative = Value::String("-1.5-2.5j".to_owned());
        assert_eq!(negative.coerce(ValueKind::Complex, h()).unwrap(), Value::Complex(-1.5, -2.5));

        let pure_imaginary = Value::String("2j".to_owned());
        assert_eq!(pure_imaginary.coerce(ValueKind::Complex, h()).unwrap(), Value::Complex(0.0, 2.0));
    }
}
