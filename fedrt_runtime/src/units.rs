//! Unit tagging and linear conversion for published values (spec.md §4.5).
//!
//! Units are not a full dimensional-analysis system: a [`Unit`] is a name plus a
//! linear scale factor against an implicit base unit within its family ("m" / "ft" /
//! "km" all share the "length" family). Conversion between units of different
//! families is rejected with [`UnitError::IncompatibleFamily`].

use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, thiserror::Error)]
pub enum UnitError {
    #[error("unknown unit '{0}'")]
    UnknownUnit(String),
    #[error("'{from}' and '{to}' belong to different unit families")]
    IncompatibleFamily { from: String, to: String },
}

/// A registered unit: a scale factor relative to its family's base unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    pub family: &'static str,
    pub name: &'static str,
    pub scale: f64,
}

fn table() -> &'static HashMap<&'static str, Unit> {
    static TABLE: OnceLock<HashMap<&'static str, Unit>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let units = [
            Unit { family: "length", name: "m", scale: 1.0 },
            Unit { family: "length", name: "km", scale: 1000.0 },
            Unit { family: "length", name: "cm", scale: 0.01 },
            Unit { family: "length", name: "ft", scale: 0.3048 },
            Unit { family: "length", name: "in", scale: 0.0254 },
            Unit { family: "power", name: "W", scale: 1.0 },
            Unit { family: "power", name: "kW", scale: 1000.0 },
            Unit { family: "power", name: "MW", scale: 1_000_000.0 },
            Unit { family: "angle", name: "rad", scale: 1.0 },
            Unit { family: "angle", name: "deg", scale: std::f64::consts::PI / 180.0 },
            Unit { family: "time", name: "s", scale: 1.0 },
            Unit { family: "time", name: "ms", scale: 0.001 },
            Unit { family: "time", name: "min", scale: 60.0 },
            Unit { family: "time", name: "hr", scale: 3600.0 },
        ];
        units.into_iter().map(|u| (u.name, u)).collect()
    })
}

/// Look up a registered unit by name.
pub fn lookup(name: &str) -> Result<Unit, UnitError> {
    table()
        .get(name)
        .copied()
        .ok_or_else(|| UnitError::UnknownUnit(name.to_owned()))
}

/// Convert `value`, expressed in unit `from`, into unit `to`.
pub fn convert(value: f64, from: &str, to: &str) -> Result<f64, UnitError> {
    if from == to {
        return Ok(value);
    }
    let from_unit = lookup(from)?;
    let to_unit = lookup(to)?;
    if from_unit.family != to_unit.family {
        return Err(UnitError::IncompatibleFamily {
            from: from.to_owned(),
            to: to.to_owned(),
        });
    }
    Ok(value * from_unit.scale / to_unit.scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_without_lookup() {
        assert_eq!(convert(42.0, "widgets", "widgets").unwrap(), 42.0);
    }

    #[test]
    fn km_to_m() {
        assert_eq!(convert(1.0, "km", "m").unwrap(), 1000.0);
    }

    #[test]
    fn incompatible_family_rejected() {
        assert!(matches!(
            convert(1.0, "m", "W"),
            Err(UnitError::IncompatibleFamily { .. })
        ));
    }

    #[test]
    fn unknown_unit_rejected() {
        assert!(matches!(convert(1.0, "m", "bogus"), Err(UnitError::UnknownUnit(_))));
    }
}
