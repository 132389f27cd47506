//! Typed extraction from values.

use crate::value::{Node, Value};
use crate::{Snapshot, ValueError};

/// Types that can be read out of a [`Value`].
///
/// `from_value` converts where it is lossless or range checked; `from_exact`
/// only succeeds when the stored variant is exactly this type's.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ValueError>;

    fn from_exact(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value.with_node(|node| match node {
            Node::Bool(b) => Ok(*b),
            other => Err(ValueError::mismatch("bool", other.kind())),
        })
    }

    fn from_exact(value: &Value) -> Option<Self> {
        Self::from_value(value).ok()
    }
}

fn integer(node: &Node, expected: &'static str) -> Result<i64, ValueError> {
    match node {
        Node::Integer(i) => Ok(*i),
        Node::Float(f) if f.is_finite() && *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
            Ok(f.trunc() as i64)
        }
        other => Err(ValueError::mismatch(expected, other.kind())),
    }
}

macro_rules! from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, ValueError> {
                    let i = value.with_node(|node| integer(node, stringify!($ty)))?;
                    <$ty>::try_from(i).map_err(|_| {
                        ValueError::mismatch(stringify!($ty), format!("integer {} out of range", i))
                    })
                }

                fn from_exact(value: &Value) -> Option<Self> {
                    value.with_node(|node| match node {
                        Node::Integer(i) => <$ty>::try_from(*i).ok(),
                        _ => None,
                    })
                }
            }
        )*
    };
}

from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value.with_node(|node| match node {
            Node::Float(f) => Ok(*f),
            Node::Integer(i) => Ok(*i as f64),
            other => Err(ValueError::mismatch("f64", other.kind())),
        })
    }

    fn from_exact(value: &Value) -> Option<Self> {
        value.with_node(|node| match node {
            Node::Float(f) => Some(*f),
            _ => None,
        })
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        f64::from_value(value).map(|f| f as f32)
    }

    fn from_exact(value: &Value) -> Option<Self> {
        f64::from_exact(value).map(|f| f as f32)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value.with_node(|node| match node {
            Node::String(s) => Ok(s.clone()),
            other => Err(ValueError::mismatch("string", other.kind())),
        })
    }

    fn from_exact(value: &Value) -> Option<Self> {
        Self::from_value(value).ok()
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value.with_node(|node| match node {
            Node::Bytes(b) => Ok(b.clone()),
            other => Err(ValueError::mismatch("bytes", other.kind())),
        })
    }

    fn from_exact(value: &Value) -> Option<Self> {
        Self::from_value(value).ok()
    }
}

impl FromValue for Snapshot {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        Ok(value.freeze())
    }

    fn from_exact(value: &Value) -> Option<Self> {
        Some(value.freeze())
    }
}

/// Null reads as `None`; anything else must convert to `T`.
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value).map(Some)
    }

    fn from_exact(value: &Value) -> Option<Self> {
        if value.is_null() {
            return Some(None);
        }
        T::from_exact(value).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_convert_between_representations() {
        assert_eq!(Value::from(3.9).to::<i32>().unwrap(), 3);
        assert_eq!(Value::from(-2.5).to::<i64>().unwrap(), -2);
        assert_eq!(Value::from(7).to::<f64>().unwrap(), 7.0);
        assert_eq!(Value::from(1.5f32).to::<f32>().unwrap(), 1.5);
    }

    #[test]
    fn narrowing_is_range_checked() {
        assert!(Value::from(300).to::<u8>().is_err());
        assert!(Value::from(-1).to::<u32>().is_err());
        assert_eq!(Value::from(255).to::<u8>().unwrap(), 255);
        assert!(Value::from(f64::NAN).to::<i64>().is_err());
        assert!(Value::from(1e300).to::<i64>().is_err());
    }

    #[test]
    fn mismatched_kinds_fail() {
        let err = Value::from("3").to::<i64>().unwrap_err();
        assert!(matches!(err, ValueError::TypeMismatch { expected: "i64", .. }));
        assert!(Value::from(1).to::<String>().is_err());
        assert!(Value::from(1).to::<bool>().is_err());
        assert!(Value::null().to::<Vec<u8>>().is_err());
    }

    #[test]
    fn option_maps_null_to_none() {
        assert_eq!(Value::null().to::<Option<i64>>().unwrap(), None);
        assert_eq!(Value::from(4).to::<Option<i64>>().unwrap(), Some(4));
        assert!(Value::from("x").to::<Option<i64>>().is_err());
    }

    #[test]
    fn inspect_requires_exact_variant() {
        let mut hits = Vec::new();
        Value::from(2)
            .inspect(|f: f64| hits.push(format!("float {}", f)))
            .inspect(|i: i64| hits.push(format!("int {}", i)))
            .inspect(|s: String| hits.push(s));
        assert_eq!(hits, vec!["int 2"]);
    }
}
