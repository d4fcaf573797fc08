//! Test helper utilities for loadkit unit tests
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

#![allow(dead_code)]

use crate::http::{MockHttpTransport, RequestOutcome, RequestSpec};
use crate::retry::{ResilientCaller, RetryPolicy, Sleeper};
use async_trait::async_trait;
use mockall::Sequence;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Sleeper that records requested waits and returns immediately
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sleeps.lock().unwrap().len()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Default policy: 3 attempts, 10s backoff (never actually waited)
pub fn test_policy() -> RetryPolicy {
    RetryPolicy::default()
}

pub fn outcome(status: u16) -> RequestOutcome {
    outcome_with_body(status, "")
}

pub fn outcome_with_body(status: u16, body: &str) -> RequestOutcome {
    RequestOutcome {
        status,
        body: body.to_string(),
        headers: BTreeMap::new(),
        timing: Duration::from_millis(5),
    }
}

/// Transport that answers with `statuses` in order, one per attempt.
///
/// An attempt beyond the scripted statuses fails the test.
pub fn scripted_transport(statuses: &[u16]) -> MockHttpTransport {
    let mut transport = MockHttpTransport::new();
    let mut seq = Sequence::new();
    for &status in statuses {
        transport
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(outcome(status)));
    }
    transport
}

pub fn caller_with(
    transport: MockHttpTransport,
) -> (ResilientCaller<MockHttpTransport, RecordingSleeper>, RecordingSleeper) {
    let sleeper = RecordingSleeper::default();
    let caller = ResilientCaller::with_parts(transport, sleeper.clone(), test_policy());
    (caller, sleeper)
}

/// JSON list page with the given ids, all hard-deleted and unconfirmed
pub fn hard_deleted_page(ids: &[&str], next: Option<&str>) -> String {
    let items: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "status": { "isHardDeleted": true, "hardDeleted": "2024-01-01T00:00:00Z" },
                "completeConfirmations": null
            })
        })
        .collect();
    serde_json::json!({ "count": ids.len(), "instances": items, "next": next }).to_string()
}

pub fn get(url: &str) -> RequestSpec {
    RequestSpec::get(url)
}
