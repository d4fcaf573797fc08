//! Test-run context
//!
//! Owns everything one execution unit needs: configuration, the resilient
//! caller, the check recorder and the run clock. Nothing here is shared
//! between runs.

use crate::checks::CheckRecorder;
use crate::config::LoadTestConfig;
use crate::error::LoadResult;
use crate::http::{HttpTransport, RequestOutcome, RequestSpec, ReqwestTransport};
use crate::logging::log_info;
use crate::pagination::{AccumulatedResult, CollectionRequest, PaginatedCollector};
use crate::report::{write_report, Report};
use crate::retry::{ResilientCaller, Sleeper, TokioSleeper};

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Instant;

pub struct TestRun<T = ReqwestTransport, S = TokioSleeper> {
    suite_name: String,
    config: LoadTestConfig,
    caller: ResilientCaller<T, S>,
    checks: CheckRecorder,
    started: Instant,
}

impl TestRun {
    /// Run over the reqwest transport
    pub fn new(suite_name: impl Into<String>, config: LoadTestConfig) -> LoadResult<Self> {
        config.validate()?;
        let caller = ResilientCaller::new(config.retry_policy.clone())?;
        Ok(Self::with_caller(suite_name, config, caller))
    }
}

impl<T, S> TestRun<T, S>
where
    T: HttpTransport,
    S: Sleeper,
{
    pub fn with_caller(
        suite_name: impl Into<String>,
        config: LoadTestConfig,
        caller: ResilientCaller<T, S>,
    ) -> Self {
        let checks = CheckRecorder::new(config.show_results);
        Self {
            suite_name: suite_name.into(),
            config,
            caller,
            checks,
            started: Instant::now(),
        }
    }

    pub fn suite_name(&self) -> &str {
        &self.suite_name
    }

    pub fn config(&self) -> &LoadTestConfig {
        &self.config
    }

    pub fn caller(&self) -> &ResilientCaller<T, S> {
        &self.caller
    }

    pub fn checks(&mut self) -> &mut CheckRecorder {
        &mut self.checks
    }

    pub async fn call(&self, request: &RequestSpec) -> LoadResult<RequestOutcome> {
        self.caller.call(request).await
    }

    pub async fn collect(&self, request: CollectionRequest<'_>) -> LoadResult<AccumulatedResult> {
        PaginatedCollector::new(&self.caller).collect(request).await
    }

    /// Aggregate every recorded check into a report
    pub fn report(&self) -> Report {
        let tree = self.checks.tree(&self.suite_name);
        Report::aggregate(&self.suite_name, &tree, self.started.elapsed())
    }

    /// Build the report and write it to the configured reports directory
    pub async fn finish(self) -> LoadResult<(Report, PathBuf)> {
        self.finish_at(Utc::now()).await
    }

    pub async fn finish_at(self, timestamp: DateTime<Utc>) -> LoadResult<(Report, PathBuf)> {
        let report = self.report();
        let document = report.to_junit_xml(timestamp);
        let path = write_report(&self.config.reports_dir, &self.suite_name, &document).await?;

        log_info!(
            suite = %self.suite_name,
            tests = report.total_count(),
            failures = report.failure_count(),
            elapsed_ms = report.elapsed.as_millis(),
            "Test run finished"
        );
        Ok((report, path))
    }
}
