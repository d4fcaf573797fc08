// Unit Tests for the HTTP boundary types
//
// UNIT UNDER TEST: RequestOutcome, RequestParams, RequestSpec
//
// TEST COVERAGE:
//   - `next` link extraction only from successful JSON list bodies
//   - Header lookup and request builders

use crate::http::{HttpMethod, RequestOutcome, RequestParams, RequestSpec, NO_RESPONSE};
use crate::tests::helpers::outcome_with_body;
use std::time::Duration;

#[cfg(test)]
mod request_outcome_tests {
    use super::*;

    #[test]
    fn test_next_link_from_successful_list_body() {
        let outcome = outcome_with_body(200, r#"{"instances":[],"next":"https://platform.test/p2"}"#);

        assert_eq!(outcome.next_link().as_deref(), Some("https://platform.test/p2"));
    }

    #[test]
    fn test_next_link_absent_for_null_errors_and_non_json() {
        assert_eq!(outcome_with_body(200, r#"{"next":null}"#).next_link(), None);
        assert_eq!(outcome_with_body(200, r#"{"instances":[]}"#).next_link(), None);
        assert_eq!(outcome_with_body(200, "<html/>").next_link(), None);
        assert_eq!(
            outcome_with_body(500, r#"{"next":"https://platform.test/p2"}"#).next_link(),
            None,
            "Only successful responses carry a usable cursor"
        );
    }

    #[test]
    fn test_no_response_outcome() {
        let outcome = RequestOutcome::no_response("connection refused", Duration::from_millis(3));

        assert_eq!(outcome.status, NO_RESPONSE);
        assert!(!outcome.is_success());
        assert!(outcome.headers.is_empty());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut outcome = outcome_with_body(200, "");
        outcome
            .headers
            .insert("content-type".to_string(), "application/json".to_string());

        assert_eq!(outcome.header("Content-Type"), Some("application/json"));
        assert_eq!(outcome.header("x-missing"), None);
    }
}

#[cfg(test)]
mod request_builder_tests {
    use super::*;

    #[test]
    fn test_bearer_params_and_builders() {
        let params = RequestParams::bearer("abc")
            .with_cookie("AltinnStudioRuntime", "token")
            .with_header("Accept", "application/json")
            .with_timeout(Duration::from_secs(120));
        let request = RequestSpec::post("https://platform.test/instances", "{}").with_params(params);

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.body.as_deref(), Some("{}"));
        assert_eq!(
            request.params.headers.get("authorization").map(String::as_str),
            Some("Bearer abc")
        );
        assert_eq!(request.params.cookies.len(), 1);
        assert_eq!(request.params.timeout, Some(Duration::from_secs(120)));
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }
}
