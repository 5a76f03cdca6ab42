//! Unit conversions between human-readable amounts and integer subunits.
//!
//! ## Overview
//!
//! Coins are accounted in integer subunits (`10^decimals` subunits per
//! whole coin). The book counts base size in lots of `scale_factor`
//! subunits and prices in quote subunits per lot. Conversions go through
//! `rust_decimal` so no floating point is involved.
//!
//! ## Examples
//!
//! ```
//! use critbit_lob::types::units::{from_subunits, to_subunits};
//!
//! // 1.5 of a 6-decimal coin
//! let amount = to_subunits("1.5", 6).unwrap();
//! assert_eq!(amount, 1_500_000);
//! assert_eq!(from_subunits(amount, 6), "1.500000");
//! ```

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Largest supported decimals; `10^19` no longer fits in a `u64`.
pub const MAX_DECIMALS: u32 = 18;

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert a decimal string to integer subunits.
///
/// Returns `None` for negative, malformed or out-of-range input.
pub fn to_subunits(s: &str, decimals: u32) -> Option<u64> {
    let decimal = Decimal::from_str(s).ok()?;
    decimal_to_subunits(decimal, decimals)
}

/// Convert a `Decimal` to integer subunits, rounding to the nearest unit.
pub fn decimal_to_subunits(d: Decimal, decimals: u32) -> Option<u64> {
    if d.is_sign_negative() || decimals > MAX_DECIMALS {
        return None;
    }

    let scaled = d.checked_mul(Decimal::from(10u64.pow(decimals)))?;
    scaled.round_dp(0).to_u64()
}

/// Convert integer subunits to a `Decimal`.
pub fn subunits_to_decimal(value: u64, decimals: u32) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(value), decimals.min(MAX_DECIMALS))
}

/// Format integer subunits with exactly `decimals` places.
pub fn from_subunits(value: u64, decimals: u32) -> String {
    let decimals = decimals.min(MAX_DECIMALS);
    format!("{:.*}", decimals as usize, subunits_to_decimal(value, decimals))
}

/// Lot size in subunits for the smallest decimal unit a market trades,
/// e.g. `lot_size("0.001", 8) == 100_000`.
///
/// Rounds up so one lot is never smaller than the requested unit.
pub fn lot_size(smallest_unit: &str, decimals: u32) -> Option<u64> {
    let unit = Decimal::from_str(smallest_unit).ok()?;
    if unit <= Decimal::ZERO || decimals > MAX_DECIMALS {
        return None;
    }
    let scaled = unit.checked_mul(Decimal::from(10u64.pow(decimals)))?;
    scaled.ceil().to_u64().filter(|&lots| lots > 0)
}

// ============================================================================
// Book Arithmetic
// ============================================================================

/// Base subunits held by `lots` lots, `None` on overflow.
#[inline]
pub fn lots_to_base(lots: u64, scale_factor: u64) -> Option<u64> {
    lots.checked_mul(scale_factor)
}

/// Quote subunits paid for `lots` lots at `price`, `None` on overflow.
#[inline]
pub fn quote_for(lots: u64, price: u64) -> Option<u64> {
    lots.checked_mul(price)
}

// ============================================================================
// Unit Tests
// ============================================================================
