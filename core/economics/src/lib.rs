// stakeledger/core/economics/src/lib.rs

pub mod supply;
pub mod valuation;

pub use supply::{InMemorySupply, SupplyError, SupplyLedger, SupplySource, DEFAULT_TOTAL_SUPPLY};
pub use valuation::{
    InflationCurve, Valuation, ValuationConfig, ValuationEngine, ValuationError, ValuationReport,
    FALLBACK_PRICE,
};

/// Token symbol shown in reports
pub const TOKEN_SYMBOL: &str = "STK";
