// stakeledger/core/fees/src/lib.rs

pub mod config;
pub mod error;
pub mod outcome;
pub mod processor;
pub mod report;

pub use config::ProcessorConfig;
pub use error::FeeError;
pub use outcome::{FeeOutcome, FeeStatus};
pub use processor::FeeProcessor;
pub use report::{BatchReporter, BatchSummary};
