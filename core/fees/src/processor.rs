// stakeledger/core/fees/src/processor.rs

use crate::config::ProcessorConfig;
use crate::error::FeeError;
use crate::outcome::FeeOutcome;
use crate::report::{BatchReporter, BatchSummary};
use chrono::{DateTime, Utc};
use futures::{future, stream, StreamExt};
use rust_decimal::Decimal;
use stakeledger_economics::ValuationEngine;
use stakeledger_primitives::{Clock, UserId};
use stakeledger_storage::{ChargeCommit, CommitResult, FeeDenomination, Wallet, WalletStore};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Charges recurring fees against due wallets.
///
/// The single-wallet path and the batch path share `charge`, which lands
/// every debit through the store's compare-and-advance. Two runs that both
/// see a wallet as due race on the same stored due date and only one commit
/// can match it.
pub struct FeeProcessor {
    config: ProcessorConfig,
    store: Arc<dyn WalletStore>,
    valuation: Arc<ValuationEngine>,
    clock: Arc<dyn Clock>,
}

impl FeeProcessor {
    pub fn new(
        config: ProcessorConfig,
        store: Arc<dyn WalletStore>,
        valuation: Arc<ValuationEngine>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FeeError> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            valuation,
            clock,
        })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Process one user's wallet on demand
    pub async fn process_one(&self, user_id: &UserId) -> Result<FeeOutcome, FeeError> {
        let wallet = self
            .timed(self.store.get_wallet(user_id))
            .await?
            .ok_or_else(|| FeeError::NotFound(user_id.clone()))?;

        let outcome = self.charge(&wallet, self.clock.now()).await?;
        log_outcome(&outcome);
        Ok(outcome)
    }

    /// Process every wallet that is due now
    pub async fn process_all_due(&self) -> Result<BatchSummary, FeeError> {
        self.process_all_due_until(&CancellationToken::new()).await
    }

    /// Batch run that stops picking up new wallets once `cancel` fires.
    ///
    /// Charges already committed stay committed; the summary is marked
    /// partial if any due wallet was left unattempted.
    pub async fn process_all_due_until(
        &self,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary, FeeError> {
        let started_at = self.clock.now();
        let span = info_span!("fee_batch", started_at = %started_at);

        async move {
            let due = self.timed(self.store.list_due(started_at)).await?;
            let due_count = due.len();
            info!(due = due_count, "Processing due wallets");

            let outcomes: Vec<FeeOutcome> = stream::iter(due)
                .take_while(|_| future::ready(!cancel.is_cancelled()))
                .map(|wallet| self.charge_in_batch(wallet))
                .buffer_unordered(self.config.max_concurrency)
                .collect()
                .await;

            let mut reporter = BatchReporter::new(started_at);
            for outcome in outcomes {
                reporter.record(outcome);
            }

            let partial = reporter.len() < due_count;
            if partial {
                warn!(
                    attempted = reporter.len(),
                    due = due_count,
                    "Fee batch cancelled before all due wallets were attempted"
                );
            }
            Ok(reporter.finish(self.clock.now(), partial))
        }
        .instrument(span)
        .await
    }

    /// Failures never escape a batch; they become outcomes
    async fn charge_in_batch(&self, wallet: Wallet) -> FeeOutcome {
        let outcome = match self.charge(&wallet, self.clock.now()).await {
            Ok(outcome) => outcome,
            Err(e) => FeeOutcome::failed(&wallet, &e),
        };
        log_outcome(&outcome);
        outcome
    }

    /// Decide and, if due and affordable, commit one period's fee
    async fn charge(&self, wallet: &Wallet, now: DateTime<Utc>) -> Result<FeeOutcome, FeeError> {
        if !wallet.is_due(now) {
            return Ok(FeeOutcome::not_due(wallet));
        }

        let amount = self.fee_in_base(wallet).await?;
        if wallet.base_balance < amount {
            return Ok(FeeOutcome::insufficient(wallet, amount, wallet.base_balance));
        }

        match self.commit(wallet, amount, now).await {
            Ok(updated) => Ok(FeeOutcome::charged(&updated, amount)),
            Err(FeeError::Conflict { current, .. }) => {
                debug!(user_id = %wallet.user_id, "Due date already advanced by a concurrent run");
                Ok(FeeOutcome::conflicted(&current))
            }
            Err(FeeError::InsufficientBalance { need, have, .. }) => {
                Ok(FeeOutcome::insufficient(wallet, need, have))
            }
            Err(e) => Err(e),
        }
    }

    async fn commit(
        &self,
        wallet: &Wallet,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Wallet, FeeError> {
        let charge = ChargeCommit {
            expected_due: wallet.next_fee_due_at,
            amount,
            processed_at: now,
        };

        match self.timed(self.store.commit_charge(&wallet.user_id, &charge)).await? {
            CommitResult::Committed(updated) => Ok(updated),
            CommitResult::Conflict { current } => Err(FeeError::Conflict {
                user_id: wallet.user_id.clone(),
                expected: charge.expected_due,
                current: Box::new(current),
            }),
            CommitResult::InsufficientBalance { balance } => Err(FeeError::InsufficientBalance {
                user_id: wallet.user_id.clone(),
                need: amount,
                have: balance,
            }),
        }
    }

    /// Fee expressed in base currency. Token fees use the unrounded price.
    async fn fee_in_base(&self, wallet: &Wallet) -> Result<Decimal, FeeError> {
        match wallet.fee_denomination {
            FeeDenomination::Base => Ok(wallet.fee_amount),
            FeeDenomination::Token => {
                let valuation = self.timed(self.valuation.current_valuation()).await?;
                wallet
                    .fee_amount
                    .checked_mul(valuation.current_price)
                    .ok_or_else(|| {
                        FeeError::Configuration(format!(
                            "fee conversion overflow for {}",
                            wallet.user_id
                        ))
                    })
            }
        }
    }

    async fn timed<T, E, F>(&self, fut: F) -> Result<T, FeeError>
    where
        F: Future<Output = Result<T, E>>,
        FeeError: From<E>,
    {
        match tokio::time::timeout(self.config.storage_timeout(), fut).await {
            Ok(result) => result.map_err(FeeError::from),
            Err(_) => Err(FeeError::Timeout {
                after_ms: self.config.storage_timeout_ms,
            }),
        }
    }
}

fn log_outcome(outcome: &FeeOutcome) {
    match &outcome.error {
        Some(e) => error!(
            user_id = %outcome.user_id,
            status = %outcome.status,
            retryable = outcome.retryable,
            "Fee processing failed: {}",
            e
        ),
        None => info!(
            user_id = %outcome.user_id,
            status = %outcome.status,
            amount = %outcome.amount,
            new_balance = %outcome.new_balance,
            "Fee processed"
        ),
    }
}
