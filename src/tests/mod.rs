// Test modules for loadkit crate
//
// Test organization follows the template pattern where each source file
// has a corresponding test file that focuses on business logic verification.

// Test helper utilities
pub mod helpers;

pub mod http;
pub mod run;

// NOTE: Real-socket tests (reqwest transport against wiremock) live in
// loadkit/tests/ as integration tests.
