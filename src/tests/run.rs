// Unit Tests for the Test Run context
//
// UNIT UNDER TEST: TestRun
//
// BUSINESS RESPONSIBILITY:
//   - Composes caller, collector and recorder for one execution unit
//   - Produces and writes the run report exactly once at the end
//
// TEST COVERAGE:
//   - Calls and collections go through the run's caller
//   - finish() writes a report named after the suite with the recorded counts
//   - Construction rejects an incomplete configuration

use crate::config::LoadTestConfig;
use crate::error::LoadError;
use crate::pagination::{CollectionRequest, FilterSet, ItemPredicate};
use crate::run::TestRun;
use crate::tests::helpers::*;
use chrono::{TimeZone, Utc};

#[cfg(test)]
mod test_run_tests {
    use super::*;

    #[tokio::test]
    async fn test_run_collects_records_and_writes_report() {
        // Arrange
        let temp = tempfile::tempdir().unwrap();
        let config = LoadTestConfig {
            app_owner: "ttd".to_string(),
            app_name: "apps-test".to_string(),
            reports_dir: temp.path().to_path_buf(),
            ..LoadTestConfig::default()
        };
        let page = hard_deleted_page(&["i1", "i2"], None);
        let mut transport = crate::http::MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|request| request.url.contains("/instances?"))
            .times(1)
            .returning(move |_| Ok(outcome_with_body(200, &page)));
        transport
            .expect_send()
            .withf(|request| request.url.ends_with("/instances/i1") || request.url.ends_with("/instances/i2"))
            .times(2)
            .returning(|request| {
                let status = if request.url.ends_with("i1") { 204 } else { 409 };
                Ok(outcome(status))
            });
        let (caller, _sleeper) = caller_with(transport);
        let mut run = TestRun::with_caller("hard delete", config, caller);
        let filters = FilterSet::new().with("org", "ttd").unwrap();

        // Act
        let collected = run
            .collect(CollectionRequest {
                base_url: "https://platform.test/instances",
                token: "token",
                filters: &filters,
                target_count: 2,
                predicate: &ItemPredicate::HardDeleteEligible,
            })
            .await
            .unwrap();
        for id in &collected.ids {
            let url = format!("https://platform.test/instances/{id}");
            let result = run.call(&get(&url)).await;
            let passed = result.map(|o| o.status == 204).unwrap_or(false);
            run.checks().record_in("delete", format!("delete {id}"), passed);
        }
        let (report, path) = run
            .finish_at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            .await
            .unwrap();

        // Assert
        assert_eq!(report.total_count(), 2);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(path, temp.path().join("hard_delete.xml"));
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains(r#"<testsuite name="hard delete" tests="2" failures="1""#));
        assert!(written.contains(r#"classname="delete""#));
    }

    #[test]
    fn test_new_rejects_config_without_app() {
        // Arrange
        let config = LoadTestConfig::default();

        // Act
        let result = TestRun::new("hard delete", config);

        // Assert
        assert!(matches!(result, Err(LoadError::ConfigurationError { .. })));
    }
}
