//! Trunkward currency conversion.
//!
//! CRITICAL: Rounding strategy across node boundaries:
//! - Always round to the receiving currency's decimal places
//! - Use banker's rounding (round half to even)
//! - Store both the local and the trunkward quantity

use ccnode_shared::{CcError, CcResult, FixedPoint, NodeConfig};
use rust_decimal::{Decimal, RoundingStrategy};

/// Converts an amount using the given rate.
///
/// Uses banker's rounding (round half to even) to minimize cumulative errors.
/// Returns `None` on overflow.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal, decimal_places: u32) -> Option<Decimal> {
    amount
        .checked_mul(rate)
        .map(|converted| converted.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven))
}

/// Inverse of [`convert_amount`]. Returns `None` on overflow or a zero rate.
#[must_use]
pub fn unconvert_amount(amount: Decimal, rate: Decimal, decimal_places: u32) -> Option<Decimal> {
    amount
        .checked_div(rate)
        .map(|converted| converted.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven))
}

/// Exchange between this node's units and its trunk's units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrunkwardRate {
    rate: Decimal,
    local: FixedPoint,
    trunk: FixedPoint,
}

impl TrunkwardRate {
    /// Trunk units per local unit.
    #[must_use]
    pub const fn new(rate: Decimal, local: FixedPoint, trunk: FixedPoint) -> Self {
        Self { rate, local, trunk }
    }

    /// Reads the rate and both unit formats from the node configuration.
    #[must_use]
    pub fn from_config(config: &NodeConfig) -> Self {
        Self::new(config.conversion_rate, config.local_units(), config.trunk_units())
    }

    /// This node's unit format.
    #[must_use]
    pub const fn local(&self) -> FixedPoint {
        self.local
    }

    /// The trunk's unit format.
    #[must_use]
    pub const fn trunk(&self) -> FixedPoint {
        self.trunk
    }

    /// Local ledger units to trunk ledger units.
    pub fn to_trunk(&self, units: i64) -> CcResult<i64> {
        let display = self.local.to_display(units);
        let converted = convert_amount(display, self.rate, self.trunk.decimal_places())
            .ok_or_else(|| CcError::invalid("quant", "overflows the trunk currency"))?;
        self.trunk.to_units(converted)
    }

    /// Trunk ledger units to local ledger units.
    pub fn from_trunk(&self, trunk_units: i64) -> CcResult<i64> {
        let display = self.trunk.to_display(trunk_units);
        let converted = unconvert_amount(display, self.rate, self.local.decimal_places())
            .ok_or_else(|| CcError::invalid("quant", "cannot be converted from the trunk currency"))?;
        self.local.to_units(converted)
    }

    /// Display value of local ledger units, in trunk currency when asked.
    pub fn display(&self, units: i64, in_trunk_currency: bool) -> CcResult<Decimal> {
        if in_trunk_currency {
            Ok(self.trunk.to_display(self.to_trunk(units)?))
        } else {
            Ok(self.local.to_display(units))
        }
    }
}
