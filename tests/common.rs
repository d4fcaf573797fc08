//! Test helper utilities for loadkit integration tests
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use async_trait::async_trait;
use loadkit::{ResilientCaller, ReqwestTransport, RetryPolicy, Sleeper};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Sleeper that only counts waits
#[derive(Debug, Clone, Default)]
pub struct CountingSleeper {
    count: Arc<AtomicUsize>,
}

impl CountingSleeper {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sleeper for CountingSleeper {
    async fn sleep(&self, _duration: Duration) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Policy with short timeouts so slow-response tests finish quickly
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        backoff: Duration::from_secs(10),
        request_timeout: Duration::from_millis(500),
        list_timeout: Duration::from_millis(500),
    }
}

pub fn create_test_caller() -> (ResilientCaller<ReqwestTransport, CountingSleeper>, CountingSleeper) {
    let sleeper = CountingSleeper::default();
    let caller = ResilientCaller::with_parts(
        ReqwestTransport::new().expect("reqwest client"),
        sleeper.clone(),
        fast_policy(),
    );
    (caller, sleeper)
}

/// Instance JSON as the storage list endpoint returns it
pub fn instance(id: &str, hard_deleted: bool, confirmed: bool) -> serde_json::Value {
    let status = if hard_deleted {
        serde_json::json!({ "isHardDeleted": true, "hardDeleted": "2024-02-01T08:00:00Z" })
    } else {
        serde_json::json!({ "isArchived": true, "archived": "2024-02-01T08:00:00Z" })
    };
    let confirmations = if confirmed {
        serde_json::json!([{ "stakeholderId": "ttd", "confirmedOn": "2024-02-02T08:00:00Z" }])
    } else {
        serde_json::Value::Null
    };
    serde_json::json!({
        "id": id,
        "status": status,
        "completeConfirmations": confirmations
    })
}

pub fn list_body(instances: Vec<serde_json::Value>, next: Option<String>) -> serde_json::Value {
    serde_json::json!({
        "count": instances.len(),
        "instances": instances,
        "next": next
    })
}
