//! Compile-time unit safety for distribution quantities.
//!
//! Feeder tables mix volts and kilovolts, kW and kvar, feet and inches. Raw
//! `f64` values make it easy to hand a kV rating to a field that expects
//! volts, so the model stores these as newtypes.
//!
//! All types use `#[repr(transparent)]` and serialize as the bare number.
//!
//! ```
//! use feedr_core::units::{Kilovolts, Volts};
//!
//! let rated = Kilovolts(7.2);
//! assert_eq!(rated.to_volts(), Volts(7200.0));
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl Div<$type> for $type {
            type Output = f64;
            fn div(self, rhs: $type) -> Self::Output {
                self.0 / rhs.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $unit_name)
            }
        }

        impl $type {
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            #[inline]
            pub fn is_positive(self) -> bool {
                self.0.is_finite() && self.0 > 0.0
            }

            #[inline]
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

// =============================================================================
// Voltage
// =============================================================================

/// Voltage in volts (V), line-to-neutral unless stated otherwise
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Volts(pub f64);

impl_unit_ops!(Volts, "V");

/// Voltage in kilovolts (kV)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kilovolts(pub f64);

impl_unit_ops!(Kilovolts, "kV");

impl Kilovolts {
    #[inline]
    pub fn to_volts(self) -> Volts {
        Volts(self.0 * 1000.0)
    }
}

// =============================================================================
// Power
// =============================================================================

/// Active power in kilowatts (kW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kilowatts(pub f64);

impl_unit_ops!(Kilowatts, "kW");

/// Reactive power in kilovolt-amperes reactive (kvar)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kilovars(pub f64);

impl_unit_ops!(Kilovars, "kvar");

/// Apparent power in kilovolt-amperes (kVA)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct KilovoltAmperes(pub f64);

impl_unit_ops!(KilovoltAmperes, "kVA");

// =============================================================================
// Length & Current
// =============================================================================

/// Length in feet (ft)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Feet(pub f64);

impl_unit_ops!(Feet, "ft");

/// Current in amperes (A)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Amperes(pub f64);

impl_unit_ops!(Amperes, "A");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kilowatts_arithmetic() {
        let p1 = Kilowatts(100.0);
        let p2 = Kilowatts(50.0);

        assert_eq!((p1 + p2).value(), 150.0);
        assert_eq!((p1 - p2).value(), 50.0);
        assert_eq!((-p1).value(), -100.0);
        assert_eq!((p1 * 2.0).value(), 200.0);
        assert_eq!((p1 / 2.0).value(), 50.0);
        assert_eq!(p1 / p2, 2.0);
    }

    #[test]
    fn test_voltage_conversion() {
        assert_eq!(Kilovolts(7.2).to_volts(), Volts(7200.0));
    }

    #[test]
    fn test_is_positive() {
        assert!(Feet(2.5).is_positive());
        assert!(!Feet(0.0).is_positive());
        assert!(!Feet(f64::NAN).is_positive());
    }

    #[test]
    fn test_sum_and_display() {
        let total: KilovoltAmperes = [KilovoltAmperes(25.0), KilovoltAmperes(50.0)]
            .into_iter()
            .sum();
        assert_eq!(total.value(), 75.0);
        assert_eq!(format!("{}", Volts(120.0)), "120.0000 V");
    }

    #[test]
    fn test_serializes_as_bare_number() {
        let json = serde_json::to_string(&Volts(240.0)).unwrap();
        assert_eq!(json, "240.0");
    }
}
