// Fixed-precision number types for the control protocol.
//
// Responses render numbers with a fixed number of decimals so that two runs
// that reach the same state produce byte-identical bodies: `F2` for
// positions, velocities, radii, distances, altitudes and gauges, `F3` for
// times, angles, masses and gravity components. The formatted digits are
// emitted as a raw JSON number (not a string). Non-finite values serialize
// as `null`.
//
// Deserialization accepts any JSON number and maps `null` back to NaN, so
// test clients can read responses into the same structs.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Error as _, Serialize, Serializer};
use serde_json::value::RawValue;
use std::fmt;

/// A float rendered with exactly `D` decimals.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Fixed<const D: usize>(pub f64);

pub type F2 = Fixed<2>;
pub type F3 = Fixed<3>;

impl<const D: usize> Fixed<D> {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl<const D: usize> From<f32> for Fixed<D> {
    fn from(v: f32) -> Self {
        Self(f64::from(v))
    }
}

impl<const D: usize> From<f64> for Fixed<D> {
    fn from(v: f64) -> Self {
        Self(v)
    }
}

impl<const D: usize> fmt::Display for Fixed<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_finite() {
            write!(f, "{:.*}", D, self.0)
        } else {
            f.write_str("null")
        }
    }
}

impl<const D: usize> Serialize for Fixed<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if !self.0.is_finite() {
            return serializer.serialize_none();
        }
        let raw = RawValue::from_string(self.to_string()).map_err(S::Error::custom)?;
        raw.serialize(serializer)
    }
}

impl<'de, const D: usize> Deserialize<'de> for Fixed<D> {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(Self(value.unwrap_or(f64::NAN)))
    }
}
