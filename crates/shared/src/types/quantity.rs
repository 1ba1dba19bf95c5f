//! Fixed-point quantities.
//!
//! CRITICAL: ledgers never store floats. A quantity is an `i64` count of the
//! smallest unit, scaled by the node's configured decimal places. Only the
//! HTTP surface and the node-to-node wire use `Decimal` display units.

use rust_decimal::Decimal;

use crate::error::{CcError, CcResult};

/// Largest supported number of decimal places.
pub const MAX_DECIMAL_PLACES: u32 = 8;

/// Converts between stored integer units and display decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPoint {
    decimal_places: u32,
}

impl FixedPoint {
    /// Creates a converter for the given number of decimal places.
    #[must_use]
    pub const fn new(decimal_places: u32) -> Self {
        Self { decimal_places }
    }

    /// Number of decimal places.
    #[must_use]
    pub const fn decimal_places(self) -> u32 {
        self.decimal_places
    }

    /// Stored units to display decimal.
    #[must_use]
    pub fn to_display(self, units: i64) -> Decimal {
        Decimal::new(units, self.decimal_places)
    }

    /// Display decimal to stored units.
    ///
    /// Rejects values carrying more precision than the ledger keeps.
    pub fn to_units(self, value: Decimal) -> CcResult<i64> {
        let normalized = value.normalize();
        if normalized.scale() > self.decimal_places {
            return Err(CcError::invalid(
                "quant",
                format!("more than {} decimal places", self.decimal_places),
            ));
        }
        let mut scaled = normalized;
        scaled.rescale(self.decimal_places);
        i64::try_from(scaled.mantissa()).map_err(|_| CcError::invalid("quant", "out of range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_display() {
        assert_eq!(FixedPoint::new(2).to_display(150), dec!(1.50));
        assert_eq!(FixedPoint::new(0).to_display(7), dec!(7));
    }

    #[test]
    fn test_to_units() {
        let fp = FixedPoint::new(2);
        assert_eq!(fp.to_units(dec!(1)).unwrap(), 100);
        assert_eq!(fp.to_units(dec!(0.05)).unwrap(), 5);
        assert_eq!(fp.to_units(dec!(-3.2)).unwrap(), -320);
        assert_eq!(fp.to_units(dec!(1.500)).unwrap(), 150);
    }

    #[test]
    fn test_to_units_rejects_excess_precision() {
        let err = FixedPoint::new(2).to_units(dec!(0.001)).unwrap_err();
        assert_eq!(err.class(), "InvalidFieldsViolation");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Stored units survive a trip through the display form.
        #[test]
        fn prop_units_survive_display(units in -1_000_000_000i64..1_000_000_000i64, dp in 0u32..=MAX_DECIMAL_PLACES) {
            let fp = FixedPoint::new(dp);
            prop_assert_eq!(fp.to_units(fp.to_display(units)).unwrap(), units);
        }
    }
}
