// stakeledger/core/economics/src/valuation.rs

use crate::supply::{SupplyLedger, SupplySource};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stakeledger_primitives::round_display;
use std::sync::Arc;
use tracing::{debug, warn};

/// Price reported when no meaningful valuation can be derived (0.002)
pub const FALLBACK_PRICE: Decimal = Decimal::from_parts(2, 0, 0, false, 3);

/// Shape of the price multiplier as supply is consumed.
///
/// Every curve starts at 1 for zero usage and never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InflationCurve {
    /// `1 + slope * u`
    Linear { slope: Decimal },
    /// `1 + coefficient * u^2`
    Quadratic { coefficient: Decimal },
    /// Linear, but never above `max_factor`
    Capped { slope: Decimal, max_factor: Decimal },
}

impl Default for InflationCurve {
    fn default() -> Self {
        InflationCurve::Linear {
            slope: Decimal::new(15, 1), // 1.5 -> factor 1.75 at half usage
        }
    }
}

impl InflationCurve {
    /// Reject curves that could decrease or dip below 1
    pub fn validate(&self) -> Result<(), ValuationError> {
        match *self {
            InflationCurve::Linear { slope } if slope < Decimal::ZERO => Err(
                ValuationError::Configuration(format!("negative linear slope {}", slope)),
            ),
            InflationCurve::Quadratic { coefficient } if coefficient < Decimal::ZERO => {
                Err(ValuationError::Configuration(format!(
                    "negative quadratic coefficient {}",
                    coefficient
                )))
            }
            InflationCurve::Capped { slope, max_factor } => {
                if slope < Decimal::ZERO {
                    return Err(ValuationError::Configuration(format!(
                        "negative capped slope {}",
                        slope
                    )));
                }
                if max_factor < Decimal::ONE {
                    return Err(ValuationError::Configuration(format!(
                        "max_factor {} below 1",
                        max_factor
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Multiplier for a usage ratio. Input is clamped to [0, 1].
    pub fn factor(&self, usage: Decimal) -> Option<Decimal> {
        let u = usage.max(Decimal::ZERO).min(Decimal::ONE);
        match *self {
            InflationCurve::Linear { slope } => Decimal::ONE.checked_add(slope.checked_mul(u)?),
            InflationCurve::Quadratic { coefficient } => {
                Decimal::ONE.checked_add(coefficient.checked_mul(u.checked_mul(u)?)?)
            }
            InflationCurve::Capped { slope, max_factor } => {
                let raw = Decimal::ONE.checked_add(slope.checked_mul(u)?)?;
                Some(raw.min(max_factor))
            }
        }
    }
}

/// Valuation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationConfig {
    /// Price per token before inflation
    pub base_price: Decimal,

    /// Multiplier curve over supply usage
    #[serde(default)]
    pub curve: InflationCurve,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            base_price: Decimal::new(2, 3), // 0.002
            curve: InflationCurve::default(),
        }
    }
}

impl ValuationConfig {
    pub fn validate(&self) -> Result<(), ValuationError> {
        if self.base_price <= Decimal::ZERO {
            return Err(ValuationError::Configuration(format!(
                "base price must be positive, got {}",
                self.base_price
            )));
        }
        self.curve.validate()
    }
}

/// Price derived from one ledger snapshot. Never cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub base_price: Decimal,
    pub inflation_factor: Decimal,
    pub remaining_supply: Decimal,
    pub usage_percentage: Decimal,
    /// Unrounded; fee conversions must use this value
    pub current_price: Decimal,
    /// Set when the ledger gave no usable ratio
    pub fallback: bool,
}

impl Valuation {
    /// Documented constant used when the ledger is unusable or unreachable
    pub fn fallback() -> Self {
        Self {
            base_price: FALLBACK_PRICE,
            inflation_factor: Decimal::ONE,
            remaining_supply: Decimal::ZERO,
            usage_percentage: Decimal::ZERO,
            current_price: FALLBACK_PRICE,
            fallback: true,
        }
    }

    /// Price rounded for display
    pub fn display_price(&self) -> Decimal {
        round_display(self.current_price)
    }

    pub fn report(&self) -> ValuationReport {
        ValuationReport {
            price: self.display_price(),
            inflation_factor: self.inflation_factor,
            usage_percentage: self.usage_percentage,
            remaining_supply: self.remaining_supply,
            fallback: self.fallback,
        }
    }
}

/// What the external valuation read returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationReport {
    /// Rounded to six fractional digits
    pub price: Decimal,
    pub inflation_factor: Decimal,
    pub usage_percentage: Decimal,
    pub remaining_supply: Decimal,
    pub fallback: bool,
}

/// Derives the token price from the supply ledger on every call
pub struct ValuationEngine {
    config: ValuationConfig,
    source: Arc<dyn SupplySource>,
}

impl ValuationEngine {
    pub fn new(config: ValuationConfig, source: Arc<dyn SupplySource>) -> Result<Self, ValuationError> {
        config.validate()?;
        Ok(Self { config, source })
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Pure valuation of a given snapshot
    pub fn valuate(&self, ledger: &SupplyLedger) -> Valuation {
        let usage = match ledger.usage() {
            Some(usage) => usage,
            None => {
                warn!(
                    total_supply = %ledger.total_supply,
                    "Total supply unset, using fallback valuation"
                );
                return Valuation::fallback();
            }
        };

        let priced = self.config.curve.factor(usage).and_then(|factor| {
            self.config
                .base_price
                .checked_mul(factor)
                .map(|price| (factor, price))
        });

        match priced {
            Some((inflation_factor, current_price)) => Valuation {
                base_price: self.config.base_price,
                inflation_factor,
                remaining_supply: ledger.remaining_supply(),
                usage_percentage: usage,
                current_price,
                fallback: false,
            },
            None => {
                warn!(usage = %usage, "Price arithmetic overflowed, using fallback valuation");
                Valuation::fallback()
            }
        }
    }

    /// Valuation from a fresh ledger snapshot
    pub async fn current_valuation(&self) -> Result<Valuation, ValuationError> {
        let ledger = self
            .source
            .supply_snapshot()
            .await
            .map_err(|e| ValuationError::LedgerUnavailable(e.to_string()))?;

        let valuation = self.valuate(&ledger);
        debug!(
            price = %valuation.current_price,
            usage = %valuation.usage_percentage,
            "Computed valuation"
        );
        Ok(valuation)
    }

    /// External read. Falls back to the constant price instead of failing.
    pub async fn valuation_report(&self) -> ValuationReport {
        match self.current_valuation().await {
            Ok(valuation) => valuation.report(),
            Err(e) => {
                warn!("Valuation read degraded to fallback: {}", e);
                Valuation::fallback().report()
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValuationError {
    #[error("Supply ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Invalid valuation configuration: {0}")]
    Configuration(String),
}
