// stakeledger/core/primitives/src/money.rs

use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits used when prices are shown to callers
pub const DISPLAY_DECIMALS: u32 = 6;

/// Round a value for display. Never feed the result back into fee math.
pub fn round_display(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}
