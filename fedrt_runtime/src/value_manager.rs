//! The value federate manager: publications and inputs (spec.md §4.5).

use std::collections::HashMap;

use fedrt_core::InterfaceHandle;
use tinymap::TinyMap;

use crate::{AggregationMethod, RuntimeError, Time, Value, ValueKind};

/// A registered publication.
#[derive(Debug, Clone)]
pub struct Publication {
    pub key: String,
    pub kind: ValueKind,
    pub units: Option<String>,
    /// Minimum absolute change required to re-publish, or `None` to disable change detection.
    pub delta: Option<f64>,
    last_value: Option<Value>,
}

impl Publication {
    fn new(key: String, kind: ValueKind, units: Option<String>) -> Self {
        Publication { key, kind, units, delta: None, last_value: None }
    }

    /// Applies change detection; returns `true` if this value should actually be sent.
    fn should_publish(&mut self, value: &Value) -> bool {
        let send = match (self.delta, &self.last_value, value) {
            (Some(delta), Some(Value::Double(prev)), Value::Double(next)) => (next - prev).abs() >= delta,
            (Some(delta), Some(Value::Integer(prev)), Value::Integer(next)) => {
                ((*next - *prev).abs() as f64) >= delta
            }
            _ => true,
        };
        if send {
            self.last_value = Some(value.clone());
        }
        send
    }
}

/// One value delivered to an input from a single source, kept in source-registration order.
#[derive(Debug, Clone)]
struct SourceSlot {
    publication_name: String,
    value: Option<Value>,
    /// Linear unit-conversion factor from this source's publication units into the
    /// input's declared units, resolved once at `add_target` time.
    scale: f64,
}

/// Scales a numeric `Value` by `scale`, leaving non-numeric kinds untouched. Applied at
/// delivery time so `get_value` never needs to know about units again (spec.md §4.5:
/// "the input's reported value is scaled automatically, e.g. kW -> W").
fn scale_value(value: &Value, scale: f64) -> Value {
    if scale == 1.0 {
        return value.clone();
    }
    match value {
        Value::Double(d) => Value::Double(d * scale),
        Value::Integer(i) => Value::Integer((*i as f64 * scale).round() as i64),
        Value::Vector(v) => Value::Vector(v.iter().map(|x| x * scale).collect()),
        Value::Complex(re, im) => Value::Complex(re * scale, im * scale),
        Value::String(_) | Value::Boolean(_) => value.clone(),
    }
}

/// A registered input.
#[derive(Debug, Clone)]
pub struct Input {
    pub key: String,
    pub kind: ValueKind,
    pub units: Option<String>,
    pub aggregation: AggregationMethod,
    pub priority_index: usize,
    sources: Vec<SourceSlot>,
    updated: bool,
    last_update_time: Time,
}

impl Input {
    fn new(key: String, kind: ValueKind, units: Option<String>) -> Self {
        Input {
            key,
            kind,
            units,
            aggregation: AggregationMethod::NoOp,
            priority_index: 0,
            sources: Vec::new(),
            updated: false,
            last_update_time: Time::ZERO,
        }
    }

    pub fn n_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn is_updated(&self) -> bool {
        self.updated
    }
}

/// Owns a federate's publications and inputs, performing unit conversion, type
/// coercion, change detection, and multi-input aggregation (spec.md §4.5).
#[derive(Debug, Default)]
pub struct ValueFederateManager {
    publications: TinyMap<InterfaceHandle, Publication>,
    inputs: TinyMap<InterfaceHandle, Input>,
    publication_names: HashMap<String, InterfaceHandle>,
    input_names: HashMap<String, InterfaceHandle>,
}

impl ValueFederateManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_publication(
        &mut self,
        key: impl Into<String>,
        kind: ValueKind,
        units: Option<String>,
    ) -> Result<InterfaceHandle, RuntimeError> {
        let key = key.into();
        if self.publication_names.contains_key(&key) {
            return Err(RuntimeError::NameCollision(key));
        }
        let handle = self.publications.insert(Publication::new(key.clone(), kind, units));
        self.publication_names.insert(key, handle);
        Ok(handle)
    }

    pub fn register_input(
        &mut self,
        key: impl Into<String>,
        kind: ValueKind,
        units: Option<String>,
    ) -> Result<InterfaceHandle, RuntimeError> {
        let key = key.into();
        if self.input_names.contains_key(&key) {
            return Err(RuntimeError::NameCollision(key));
        }
        let handle = self.inputs.insert(Input::new(key.clone(), kind, units));
        self.input_names.insert(key, handle);
        Ok(handle)
    }

    /// Link `publication_name` as a source of `input`. Enforces the unit-compatibility
    /// check and the NO_OP-with-multiple-sources rule (`SPEC_FULL.md` Open Question).
    pub fn add_target(
        &mut self,
        input: InterfaceHandle,
        publication_name: impl Into<String>,
        publication_units: Option<&str>,
    ) -> Result<(), RuntimeError> {
        let publication_name = publication_name.into();
        let input_state = self
            .inputs
            .get_mut(input)
            .ok_or_else(|| RuntimeError::UnknownDest(publication_name.clone()))?;

        let scale = if let (Some(input_units), Some(pub_units)) = (&input_state.units, publication_units) {
            crate::units::convert(1.0, pub_units, input_units).map_err(|_| RuntimeError::UnitMismatch {
                from: pub_units.to_owned(),
                to: input_units.clone(),
            })?
        } else {
            1.0
        };

        input_state.sources.push(SourceSlot { publication_name, value: None, scale });
        if !input_state.aggregation.allowed_for(input_state.sources.len()) {
            return Err(RuntimeError::NonDeterministicAggregation(input_state.key.clone()));
        }
        Ok(())
    }

    /// `setMinimumChange(delta)`: enable or disable change detection on a publication.
    /// `None` disables it (every `publish` is sent); `Some(d)` suppresses a publish
    /// whose value has not moved by at least `d` from the last one actually sent.
    pub fn set_minimum_change(&mut self, handle: InterfaceHandle, delta: Option<f64>) -> Result<(), RuntimeError> {
        let publication = self.publications.get_mut(handle).ok_or_else(|| RuntimeError::UnknownDest(format!("{handle:?}")))?;
        publication.delta = delta;
        Ok(())
    }

    pub fn set_aggregation(&mut self, input: InterfaceHandle, method: AggregationMethod) -> Result<(), RuntimeError> {
        let state = self.inputs.get_mut(input).ok_or(RuntimeError::ConcurrentOperation)?;
        if !method.allowed_for(state.sources.len()) {
            return Err(RuntimeError::NonDeterministicAggregation(state.key.clone()));
        }
        state.aggregation = method;
        Ok(())
    }

    /// Publish `value` on `handle` at `current_time`, subject to change detection.
    /// Returns `true` if the publish should actually be routed.
    pub fn publish(
        &mut self,
        handle: InterfaceHandle,
        value: Value,
        current_time: Time,
    ) -> Result<bool, RuntimeError> {
        let _ = current_time;
        let publication = self
            .publications
            .get_mut(handle)
            .ok_or_else(|| RuntimeError::UnknownDest(format!("{handle:?}")))?;
        Ok(publication.should_publish(&value))
    }

    /// Deliver `value` from `publication_name` into any input sourced from it.
    pub fn deliver(
        &mut self,
        publication_name: &str,
        value: Value,
        arrival_time: Time,
    ) -> Result<(), RuntimeError> {
        for input in self.inputs.values_mut() {
            let mut touched = false;
            for slot in input.sources.iter_mut() {
                if slot.publication_name == publication_name {
                    slot.value = Some(scale_value(&value, slot.scale));
                    touched = true;
                }
            }
            if touched {
                input.updated = true;
                input.last_update_time = arrival_time;
            }
        }
        Ok(())
    }

    /// Return the most recent aggregated value of `handle`, coerced to its declared
    /// type, clearing the is-updated flag.
    pub fn get_value(&mut self, handle: InterfaceHandle) -> Result<Value, RuntimeError> {
        let input = self.inputs.get_mut(handle).ok_or_else(|| RuntimeError::UnknownDest(format!("{handle:?}")))?;
        input.updated = false;

        if input.aggregation == AggregationMethod::Priority {
            if let Some(slot) = input.sources.get(input.priority_index) {
                if let Some(v) = &slot.value {
                    return v.coerce(input.kind, handle);
                }
            }
            if let Some(slot) = input.sources.iter().find(|s| s.value.is_some()) {
                return slot.value.clone().unwrap().coerce(input.kind, handle);
            }
            return Err(RuntimeError::TypeCoercionFail(handle));
        }

        let values: Vec<Value> = input.sources.iter().filter_map(|s| s.value.clone()).collect();
        if values.is_empty() {
            return Err(RuntimeError::TypeCoercionFail(handle));
        }
        let reduced = input.aggregation.reduce(&values)?;
        reduced.coerce(input.kind, handle)
    }

    pub fn is_updated(&self, handle: InterfaceHandle) -> bool {
        self.inputs.get(handle).map(|i| i.is_updated()).unwrap_or(false)
    }

    /// `true` if any input has a delivery pending `get_value` — feeds the time
    /// coordinator's "inputs changed since last grant" iteration condition (spec.md §4.8).
    pub fn any_input_updated(&self) -> bool {
        self.inputs.values().any(|i| i.is_updated())
    }

    pub fn publication_handle(&self, key: &str) -> Option<InterfaceHandle> {
        self.publication_names.get(key).copied()
    }

    pub fn input_handle(&self, key: &str) -> Option<InterfaceHandle> {
        self.input_names.get(key).copied()
    }

    pub fn publication(&self, handle: InterfaceHandle) -> Option<&Publication> {
        self.publications.get(handle)
    }

    pub fn input(&self, handle: InterfaceHandle) -> Option<&Input> {
        self.inputs.get(handle)
    }
}
