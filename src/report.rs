//! JUnit report aggregation
//!
//! Turns a tree of check tallies into the hierarchical success/failure
//! document CI systems ingest. Rendering is pure: the timestamp is an
//! argument, so the same checks and timestamp always give the same bytes.
//! Writing the document is [`write_report`]'s job.

use crate::checks::CheckGroup;
use crate::error::{LoadError, LoadResult};
use crate::logging::log_info;

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Marker carried by every failed test case
pub const FAILURE_MESSAGE: &str = "failed";

/// Separator between nested group names in a test case `classname`
const GROUP_SEPARATOR: &str = "::";

/// One leaf of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportCase {
    pub name: String,
    /// Group path, or the suite name for ungrouped checks
    pub classname: String,
    pub passed: bool,
}

/// Read-only summary of a run's checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub suite_name: String,
    pub elapsed: Duration,
    pub cases: Vec<ReportCase>,
}

impl Report {
    /// Flatten `root` depth-first: a group's own checks, then its subgroups.
    ///
    /// The name of `root` itself is not part of any classname.
    pub fn aggregate(suite_name: impl Into<String>, root: &CheckGroup, elapsed: Duration) -> Self {
        let suite_name = suite_name.into();
        let mut cases = Vec::with_capacity(root.total_count());
        Self::flatten(root, None, &suite_name, &mut cases);
        Self {
            suite_name,
            elapsed,
            cases,
        }
    }

    fn flatten(group: &CheckGroup, path: Option<&str>, suite: &str, cases: &mut Vec<ReportCase>) {
        let classname = path.unwrap_or(suite);
        cases.extend(group.checks.iter().map(|check| ReportCase {
            name: check.name.clone(),
            classname: classname.to_string(),
            passed: check.passed(),
        }));

        for child in &group.groups {
            let child_path = match path {
                Some(parent) => format!("{parent}{GROUP_SEPARATOR}{}", child.name),
                None => child.name.clone(),
            };
            Self::flatten(child, Some(&child_path), suite, cases);
        }
    }

    pub fn total_count(&self) -> usize {
        self.cases.len()
    }

    pub fn failure_count(&self) -> usize {
        self.cases.iter().filter(|case| !case.passed).count()
    }

    pub fn all_passed(&self) -> bool {
        self.failure_count() == 0
    }

    /// Render the JUnit XML document
    pub fn to_junit_xml(&self, timestamp: DateTime<Utc>) -> String {
        let tests = self.total_count();
        let failures = self.failure_count();
        let time = format!("{:.3}", self.elapsed.as_secs_f64());
        let suite = escape_xml(&self.suite_name);

        let mut xml = String::new();
        // Writing into a String cannot fail
        let _ = writeln!(xml, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        let _ = writeln!(
            xml,
            r#"<testsuites tests="{tests}" failures="{failures}" time="{time}">"#
        );
        let _ = writeln!(
            xml,
            r#"<testsuite name="{suite}" tests="{tests}" failures="{failures}" time="{time}" timestamp="{}">"#,
            timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
        );

        for case in &self.cases {
            let name = escape_xml(&case.name);
            let classname = escape_xml(&case.classname);
            if case.passed {
                let _ = writeln!(xml, r#"<testcase name="{name}" classname="{classname}"/>"#);
            } else {
                let _ = writeln!(
                    xml,
                    r#"<testcase name="{name}" classname="{classname}"><failure message="{FAILURE_MESSAGE}"/></testcase>"#
                );
            }
        }

        xml.push_str("</testsuite>\n</testsuites>\n");
        xml
    }
}

/// Replace the five XML-significant characters with named entities
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// File name for a suite id; anything outside `[A-Za-z0-9._-]` becomes `_`
pub fn report_file_name(suite_id: &str) -> String {
    let stem: String = suite_id
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.is_empty() { "report".to_string() } else { stem };
    format!("{stem}.xml")
}

/// Write `document` to `<dir>/<suite_id>.xml`, creating `dir` if needed
pub async fn write_report(dir: &Path, suite_id: &str, document: &str) -> LoadResult<PathBuf> {
    let path = dir.join(report_file_name(suite_id));

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| LoadError::report_write(dir.display().to_string(), e))?;
    tokio::fs::write(&path, document)
        .await
        .map_err(|e| LoadError::report_write(path.display().to_string(), e))?;

    log_info!(
        path = %path.display(),
        bytes = document.len(),
        "Report written"
    );
    Ok(path)
}
