//! Multi-input aggregation (spec.md §4.5 "Aggregation methods" table).
//!
//! An [`crate::Input`] with more than one source must declare an [`AggregationMethod`]
//! other than [`AggregationMethod::NoOp`] — see `SPEC_FULL.md`'s Open Question decision,
//! enforced at registration time in [`crate::ValueFederateManager::link_input`].

use crate::{RuntimeError, Value};

/// How an input with multiple connected publications combines their latest values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMethod {
    /// Valid only for single-source inputs; pass the value through unchanged.
    NoOp,
    /// Keep every source's value addressable by source index rather than reducing.
    Vectorize,
    /// Logical AND, treating each value as a boolean (nonzero == true).
    And,
    /// Logical OR, treating each value as a boolean (nonzero == true).
    Or,
    Sum,
    /// Pairwise difference: first value minus the sum of the rest.
    Diff,
    Max,
    Min,
    Average,
    /// Take the value from the highest-priority source (lowest source index wins ties).
    Priority,
}

impl AggregationMethod {
    /// `true` if this method is safe to use on an input with `n_sources` connections.
    pub fn allowed_for(&self, n_sources: usize) -> bool {
        match self {
            AggregationMethod::NoOp => n_sources <= 1,
            _ => true,
        }
    }

    /// Reduce `values`, indexed in source-registration order, into a single value
    /// (or, for [`AggregationMethod::Vectorize`], the list unchanged as a vector).
    pub fn reduce(&self, values: &[Value]) -> Result<Value, RuntimeError> {
        if values.is_empty() {
            return Err(RuntimeError::UnknownDest("aggregation over zero sources".into()));
        }
        match self {
            AggregationMethod::NoOp => Ok(values[0].clone()),
            AggregationMethod::Priority => Ok(values[0].clone()),
            AggregationMethod::Vectorize => {
                let nums = as_f64_slice(values);
                Ok(Value::Vector(nums))
            }
            // SUM/DIFF/MAX/MIN/AVERAGE all expand a vector source elementwise rather
            // than taking one representative scalar (spec.md §4.5, exercised by S3).
            AggregationMethod::Sum => Ok(Value::Double(flatten_f64(values).iter().sum())),
            AggregationMethod::Diff => {
                let nums = flatten_f64(values);
                let (first, rest) = nums.split_first().expect("checked non-empty above");
                Ok(Value::Double(first - rest.iter().sum::<f64>()))
            }
            AggregationMethod::Max => Ok(Value::Double(
                flatten_f64(values).into_iter().fold(f64::NEG_INFINITY, f64::max),
            )),
            AggregationMethod::Min => Ok(Value::Double(
                flatten_f64(values).into_iter().fold(f64::INFINITY, f64::min),
            )),
            AggregationMethod::Average => {
                let nums = flatten_f64(values);
                Ok(Value::Double(nums.iter().sum::<f64>() / nums.len() as f64))
            }
            AggregationMethod::And => Ok(Value::Boolean(as_f64_slice(values).iter().all(|&v| v != 0.0))),
            AggregationMethod::Or => Ok(Value::Boolean(as_f64_slice(values).iter().any(|&v| v != 0.0))),
        }
    }
}

fn as_f64_slice(values: &[Value]) -> Vec<f64> {
    values
        .iter()
        .map(|v| match v {
            Value::Double(d) => *d,
            Value::Integer(i) => *i as f64,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Complex(re, _) => *re,
            Value::Vector(v) => v.first().copied().unwrap_or(0.0),
            Value::String(s) => s.parse().unwrap_or(0.0),
        })
        .collect()
}

/// Like [`as_f64_slice`] but a [`Value::Vector`] contributes every one of its
/// elements instead of just the first.
fn flatten_f64(values: &[Value]) -> Vec<f64> {
    let mut out = Vec::new();
    for value in values {
        match value {
            Value::Vector(vs) => out.extend(vs.iter().copied()),
            other => out.extend(as_f64_slice(std::slice::from_ref(other))),
        }
    }
    out
}
