//! Cluster version stability probe.

use tracing::error;

use crate::conditions::{condition_info, ClusterVersionRecord, AVAILABLE, FAILING, PROGRESSING};
use crate::error::{ClusterVersionIssue, Result};

/// Require Available=True, Failing=False and Progressing=False, checked in
/// that order. The first violated condition is reported.
pub fn check_cluster_version_stable(cv: &ClusterVersionRecord) -> Result<()> {
    let checks: [(&str, &str, fn(String) -> ClusterVersionIssue); 3] = [
        (AVAILABLE, "True", ClusterVersionIssue::NotAvailable),
        (FAILING, "False", ClusterVersionIssue::Failing),
        (PROGRESSING, "False", ClusterVersionIssue::Progressing),
    ];

    for (condition_type, expected, issue) in checks {
        let cond = cv.condition(condition_type);
        if cond.map(|c| c.status.as_str()) != Some(expected) {
            let info = condition_info(cond);
            error!(condition = condition_type, "ClusterVersion {condition_type}={info}");
            return Err(issue(info).into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::Condition;
    use crate::error::HealthCheckError;

    fn issue(cv: &ClusterVersionRecord) -> ClusterVersionIssue {
        match check_cluster_version_stable(cv) {
            Err(HealthCheckError::ClusterVersion(issue)) => issue,
            other => panic!("expected cluster version issue, got {other:?}"),
        }
    }

    fn cluster_version(available: &str, failing: &str, progressing: &str) -> ClusterVersionRecord {
        ClusterVersionRecord {
            conditions: vec![
                Condition::new(AVAILABLE, available),
                Condition::new(FAILING, failing),
                Condition::new(PROGRESSING, progressing),
            ],
        }
    }

    #[test]
    fn test_stable_cluster_version() {
        assert!(check_cluster_version_stable(&cluster_version("True", "False", "False")).is_ok());
    }

    #[test]
    fn test_not_available_reported_first() {
        let err = issue(&cluster_version("False", "True", "True"));
        assert!(matches!(err, ClusterVersionIssue::NotAvailable(_)));
    }

    #[test]
    fn test_failing() {
        let mut cv = cluster_version("True", "True", "False");
        cv.conditions[1].reason = Some("UpdatePayloadFailed".to_string());

        let err = issue(&cv);
        assert_eq!(
            err,
            ClusterVersionIssue::Failing("True | UpdatePayloadFailed | ".to_string())
        );
    }

    #[test]
    fn test_progressing() {
        let err = issue(&cluster_version("True", "False", "True"));
        assert!(matches!(err, ClusterVersionIssue::Progressing(_)));
    }

    #[test]
    fn test_missing_condition_is_unstable() {
        let err = issue(&ClusterVersionRecord::default());
        assert_eq!(err, ClusterVersionIssue::NotAvailable(" |  | ".to_string()));
    }
}
