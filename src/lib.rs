//! # loadkit
//!
//! Test-execution support for load and functional tests against
//! multi-tenant platform HTTP APIs.
//!
//! ## Key Features
//!
//! - **Resilient calls**: bounded fixed-backoff retry on status 0, 408 and 5xx
//! - **Cursor pagination**: collect at least N matching records by following `next` links
//! - **JUnit reports**: per-run check recording rendered into CI-friendly XML
//!
//! ## Example
//!
//! ```rust,no_run
//! use loadkit::{
//!     keys, CollectionRequest, FilterSet, ItemPredicate, LoadTestConfig, RequestSpec, TestRun,
//! };
//!
//! # async fn example() -> loadkit::LoadResult<()> {
//! let config = LoadTestConfig::from_env()?;
//! let mut run = TestRun::new("hard-delete-cleanup", config)?;
//!
//! let filters = FilterSet::new()
//!     .with(keys::ORG, "ttd")?
//!     .with(keys::STATUS_IS_HARD_DELETED, true)?;
//! let collected = run
//!     .collect(CollectionRequest {
//!         base_url: "https://platform.example/storage/api/v1/instances",
//!         token: "token",
//!         filters: &filters,
//!         target_count: 50,
//!         predicate: &ItemPredicate::HardDeleteEligible,
//!     })
//!     .await?;
//!
//! for id in &collected.ids {
//!     let url = format!("https://platform.example/storage/api/v1/instances/{id}");
//!     let outcome = run.call(&RequestSpec::get(url)).await?;
//!     run.checks().record("instance is gone", outcome.status == 404);
//! }
//!
//! let (report, path) = run.finish().await?;
//! println!("{} failures, report at {}", report.failure_count(), path.display());
//! # Ok(())
//! # }
//! ```

// Allow missing errors documentation - errors are self-documenting via type signatures
#![allow(clippy::missing_errors_doc)]

pub mod logging;

pub mod checks;
pub mod config;
pub mod error;
pub mod http;
pub mod pagination;
pub mod report;
pub mod retry;
pub mod run;

#[cfg(test)]
pub mod tests;

// Re-export main types
pub use checks::{CheckGroup, CheckOutcome, CheckRecorder, CheckTally};
pub use config::LoadTestConfig;
pub use error::{LoadError, LoadResult};
pub use http::{
    HttpMethod, HttpTransport, RequestOutcome, RequestParams, RequestSpec, ReqwestTransport,
};
pub use logging::init_console_logging;
pub use pagination::{
    keys, AccumulatedResult, CollectionPage, CollectionRequest, FilterSet, FilterValue, Item,
    ItemFilter, ItemPredicate, ItemStatus, PaginatedCollector, StopReason,
};
pub use report::{escape_xml, write_report, Report, ReportCase};
pub use retry::{is_retryable_status, ResilientCaller, RetryPolicy, Sleeper, TokioSleeper};
pub use run::TestRun;
