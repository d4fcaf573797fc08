//! Per-run check recording
//!
//! A [`CheckRecorder`] belongs to exactly one test run. Drivers record every
//! assertion through it, and at the end of the run [`CheckRecorder::tree`]
//! folds the outcomes into the group tree the report is built from.

use crate::error::{LoadError, LoadResult};
use crate::http::RequestOutcome;
use crate::logging::{log_error, log_info};

use serde::{Deserialize, Serialize};

/// A single named pass/fail assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    pub group: Option<String>,
}

impl CheckOutcome {
    pub fn new(name: impl Into<String>, passed: bool) -> Self {
        Self {
            name: name.into(),
            passed,
            group: None,
        }
    }

    pub fn in_group(group: impl Into<String>, name: impl Into<String>, passed: bool) -> Self {
        Self {
            name: name.into(),
            passed,
            group: Some(group.into()),
        }
    }
}

/// Pass/fail observations for one check name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckTally {
    pub name: String,
    pub passes: u64,
    pub fails: u64,
}

impl CheckTally {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// At least one pass and no fails. A tally that saw nothing fails.
    pub fn passed(&self) -> bool {
        self.passes > 0 && self.fails == 0
    }

    fn observe(&mut self, passed: bool) {
        if passed {
            self.passes += 1;
        } else {
            self.fails += 1;
        }
    }
}

/// Named group of checks, possibly nested
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckGroup {
    pub name: String,
    pub checks: Vec<CheckTally>,
    pub groups: Vec<CheckGroup>,
}

impl CheckGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_check(mut self, check: CheckTally) -> Self {
        self.checks.push(check);
        self
    }

    pub fn with_group(mut self, group: CheckGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Checks in this group and every nested group
    pub fn total_count(&self) -> usize {
        self.checks.len() + self.groups.iter().map(CheckGroup::total_count).sum::<usize>()
    }

    pub fn failure_count(&self) -> usize {
        let own = self.checks.iter().filter(|check| !check.passed()).count();
        own + self
            .groups
            .iter()
            .map(CheckGroup::failure_count)
            .sum::<usize>()
    }

    fn tally_mut(&mut self, name: &str) -> &mut CheckTally {
        let index = match self.checks.iter().position(|check| check.name == name) {
            Some(index) => index,
            None => {
                self.checks.push(CheckTally::new(name));
                self.checks.len() - 1
            }
        };
        &mut self.checks[index]
    }

    fn group_mut(&mut self, name: &str) -> &mut CheckGroup {
        let index = match self.groups.iter().position(|group| group.name == name) {
            Some(index) => index,
            None => {
                self.groups.push(CheckGroup::new(name));
                self.groups.len() - 1
            }
        };
        &mut self.groups[index]
    }
}

/// Collects check outcomes for one test run
#[derive(Debug, Clone, Default)]
pub struct CheckRecorder {
    outcomes: Vec<CheckOutcome>,
    show_results: bool,
}

impl CheckRecorder {
    pub fn new(show_results: bool) -> Self {
        Self {
            outcomes: Vec::new(),
            show_results,
        }
    }

    /// Record an ungrouped check and hand `passed` back for chaining
    pub fn record(&mut self, name: impl Into<String>, passed: bool) -> bool {
        self.push(CheckOutcome::new(name, passed))
    }

    pub fn record_in(
        &mut self,
        group: impl Into<String>,
        name: impl Into<String>,
        passed: bool,
    ) -> bool {
        self.push(CheckOutcome::in_group(group, name, passed))
    }

    pub fn push(&mut self, outcome: CheckOutcome) -> bool {
        if self.show_results {
            log_info!(
                check = %outcome.name,
                group = ?outcome.group,
                passed = outcome.passed,
                "Check recorded"
            );
        }
        let passed = outcome.passed;
        self.outcomes.push(outcome);
        passed
    }

    /// Stop the iteration when a check failed.
    ///
    /// Call right after recording; `Err` is meant to be propagated with `?`.
    pub fn stop_iteration_on_fail(
        &self,
        message: &str,
        passed: bool,
        outcome: Option<&RequestOutcome>,
    ) -> LoadResult<()> {
        if passed {
            return Ok(());
        }
        let status = outcome.map(|outcome| outcome.status);
        if let Some(outcome) = outcome {
            log_error!(
                message = %message,
                status = outcome.status,
                body = %outcome.body,
                "Check failed, stopping iteration"
            );
        }
        Err(LoadError::iteration_stopped(message, status))
    }

    /// Number of failed outcomes recorded so far
    pub fn error_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| !outcome.passed).count()
    }

    pub fn outcomes(&self) -> &[CheckOutcome] {
        &self.outcomes
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Fold outcomes into a tree rooted at a group named `root`.
    ///
    /// Ungrouped checks sit directly in the root. Groups keep first-seen
    /// order; repeated check names inside a group merge into one tally.
    pub fn tree(&self, root: &str) -> CheckGroup {
        let mut tree = CheckGroup::new(root);
        for outcome in &self.outcomes {
            let group = match &outcome.group {
                Some(name) => tree.group_mut(name),
                None => &mut tree,
            };
            group.tally_mut(&outcome.name).observe(outcome.passed);
        }
        tree
    }
}
