#![forbid(unsafe_code)]

//! Values carried by parameters and metadata.
//!
//! # Invariants
//!
//! - Equality is bit-for-bit on floating point payloads: `NaN == NaN` and
//!   `0.0 != -0.0`. Undo must restore exactly what was there, and no-op
//!   filtering must never drop an edit that changes the stored bits.
//! - Only vector values have components beyond index 0.

use std::fmt;

/// Largest magnitude an `i64` keeps through an `f64` round trip.
const MAX_EXACT_INT: u64 = 1 << 53;

/// A typed parameter or metadata value.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Vec2([f64; 2]),
    Vec3([f64; 3]),
}

fn same_bits(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Vec2(a), Self::Vec2(b)) => same_bits(a, b),
            (Self::Vec3(a), Self::Vec3(b)) => same_bits(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    /// Short type name used in engine messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// `None` for integers a double cannot hold exactly.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) if v.unsigned_abs() <= MAX_EXACT_INT => Some(*v as f64),
            _ => None,
        }
    }

    /// Number of addressable components.
    #[must_use]
    pub const fn component_count(&self) -> usize {
        match self {
            Self::Vec2(_) => 2,
            Self::Vec3(_) => 3,
            _ => 1,
        }
    }

    /// Read one component. Vector components come back as `Float`; a scalar
    /// is its own component 0.
    #[must_use]
    pub fn component(&self, index: usize) -> Option<Value> {
        match self {
            Self::Vec2(v) => v.get(index).copied().map(Value::Float),
            Self::Vec3(v) => v.get(index).copied().map(Value::Float),
            scalar if index == 0 => Some(scalar.clone()),
            _ => None,
        }
    }

    /// Return a copy with component `index` replaced by `part`.
    ///
    /// Vector components accept any numeric value. Component 0 of a scalar
    /// accepts a value of the same type (or an `Int` for a `Float`).
    #[must_use]
    pub fn with_component(&self, index: usize, part: &Value) -> Option<Value> {
        match self {
            Self::Vec2(v) => {
                let mut out = *v;
                *out.get_mut(index)? = part.as_float()?;
                Some(Self::Vec2(out))
            }
            Self::Vec3(v) => {
                let mut out = *v;
                *out.get_mut(index)? = part.as_float()?;
                Some(Self::Vec3(out))
            }
            _ if index != 0 => None,
            Self::Float(_) => part.as_float().map(Self::Float),
            current if std::mem::discriminant(current) == std::mem::discriminant(part) => {
                Some(part.clone())
            }
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Vec2([x, y]) => write!(f, "({x}, {y})"),
            Self::Vec3([x, y, z]) => write!(f, "({x}, {y}, {z})"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<[f64; 2]> for Value {
    fn from(v: [f64; 2]) -> Self {
        Self::Vec2(v)
    }
}

impl From<[f64; 3]> for Value {
    fn from(v: [f64; 3]) -> Self {
        Self::Vec3(v)
    }
}

/// Evaluation state of an operator node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperatorState {
    #[default]
    Enabled,
    Disabled,
    /// Passes its input through without evaluating.
    Bypassed,
}

impl fmt::Display for OperatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Bypassed => "bypassed",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_float_only_for_exact_integers() {
        let edge = 1_i64 << 53;
        assert_eq!(Value::Int(edge).as_float(), Some(9_007_199_254_740_992.0));
        assert_eq!(Value::Int(-edge).as_float(), Some(-9_007_199_254_740_992.0));
        assert_eq!(Value::Int(edge + 1).as_float(), None);
        assert_eq!(Value::Int(i64::MIN).as_float(), None);
    }

    #[test]
    fn test_float_equality_is_bitwise() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
        assert_eq!(Value::Vec3([1.0, 2.0, 3.0]), Value::Vec3([1.0, 2.0, 3.0]));
        assert_ne!(Value::Vec2([1.0, 2.0]), Value::Vec3([1.0, 2.0, 0.0]));
    }

    #[test]
    fn test_mixed_variants_never_equal() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Bool(true), Value::Int(1));
    }

    #[test]
    fn test_component_access() {
        let v = Value::Vec3([1.0, 2.0, 3.0]);
        assert_eq!(v.component(1), Some(Value::Float(2.0)));
        assert_eq!(v.component(3), None);
        assert_eq!(Value::Bool(true).component(0), Some(Value::Bool(true)));
        assert_eq!(Value::Bool(true).component(1), None);
    }

    #[test]
    fn test_with_component_vector() {
        let v = Value::Vec2([0.0, 0.0]);
        assert_eq!(
            v.with_component(1, &Value::Float(5.0)),
            Some(Value::Vec2([0.0, 5.0]))
        );
        assert_eq!(v.with_component(2, &Value::Float(5.0)), None);
        assert_eq!(v.with_component(0, &Value::Text("x".into())), None);
    }

    #[test]
    fn test_with_component_scalar_type_check() {
        assert_eq!(
            Value::Float(1.0).with_component(0, &Value::Int(3)),
            Some(Value::Float(3.0))
        );
        assert_eq!(
            Value::Text("a".into()).with_component(0, &Value::Text("b".into())),
            Some(Value::Text("b".into()))
        );
        assert_eq!(Value::Bool(false).with_component(0, &Value::Int(1)), None);
    }

    #[test]
    fn test_operator_state_display() {
        assert_eq!(OperatorState::Bypassed.to_string(), "bypassed");
        assert_eq!(OperatorState::default(), OperatorState::Enabled);
    }
}
