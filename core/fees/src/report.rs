// stakeledger/core/fees/src/report.rs

use crate::outcome::{FeeOutcome, FeeStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Aggregate result of one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub charged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total_collected: Decimal,
    /// Set when the run stopped before every due wallet was attempted
    pub partial: bool,
    pub outcomes: Vec<FeeOutcome>,
}

impl BatchSummary {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn retryable_failures(&self) -> impl Iterator<Item = &FeeOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == FeeStatus::Failed && o.retryable)
    }
}

/// Folds per-wallet outcomes into a `BatchSummary`
#[derive(Debug)]
pub struct BatchReporter {
    started_at: DateTime<Utc>,
    charged: usize,
    skipped: usize,
    failed: usize,
    total_collected: Decimal,
    outcomes: Vec<FeeOutcome>,
}

impl BatchReporter {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            charged: 0,
            skipped: 0,
            failed: 0,
            total_collected: Decimal::ZERO,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: FeeOutcome) {
        match outcome.status {
            FeeStatus::Charged => {
                self.charged += 1;
                self.total_collected += outcome.amount;
            }
            FeeStatus::SkippedNotDue | FeeStatus::SkippedInsufficientBalance => self.skipped += 1,
            FeeStatus::Failed => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn finish(self, completed_at: DateTime<Utc>, partial: bool) -> BatchSummary {
        info!(
            charged = self.charged,
            skipped = self.skipped,
            failed = self.failed,
            total_collected = %self.total_collected,
            partial,
            "Fee batch finished"
        );

        BatchSummary {
            started_at: self.started_at,
            completed_at,
            charged: self.charged,
            skipped: self.skipped,
            failed: self.failed,
            total_collected: self.total_collected,
            partial,
            outcomes: self.outcomes,
        }
    }
}
