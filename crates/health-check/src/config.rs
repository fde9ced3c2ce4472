//! Command-line and environment options.

use std::path::{Path, PathBuf};

use clap::Args;

use crate::source::DEFAULT_MACHINE_NAMESPACE;

/// Options for a health check run.
#[derive(Debug, Clone, Args)]
pub struct HealthCheckOptions {
    /// Directory to write the JUnit report into. No file is written when
    /// empty.
    #[arg(long, env = "JUNIT_DIR", default_value = "")]
    pub junit_dir: String,

    /// Path to kubeconfig file. Inferred from the environment when unset.
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Namespace holding Machine resources.
    #[arg(long, default_value = DEFAULT_MACHINE_NAMESPACE)]
    pub machine_namespace: String,
}

impl Default for HealthCheckOptions {
    fn default() -> Self {
        Self {
            junit_dir: String::new(),
            kubeconfig: None,
            machine_namespace: DEFAULT_MACHINE_NAMESPACE.to_string(),
        }
    }
}

impl HealthCheckOptions {
    /// Report directory, if one was configured.
    pub fn report_dir(&self) -> Option<&Path> {
        if self.junit_dir.is_empty() {
            None
        } else {
            Some(Path::new(&self.junit_dir))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        options: HealthCheckOptions,
    }

    #[test]
    fn test_defaults() {
        let options = HealthCheckOptions::default();
        assert!(options.report_dir().is_none());
        assert_eq!(options.machine_namespace, "openshift-machine-api");
    }

    #[test]
    fn test_parse_junit_dir() {
        let cli = TestCli::parse_from(["test", "--junit-dir", "/tmp/reports", "--machine-namespace", "machines"]);
        assert_eq!(cli.options.report_dir(), Some(Path::new("/tmp/reports")));
        assert_eq!(cli.options.machine_namespace, "machines");
    }

    #[test]
    fn test_empty_junit_dir_disables_report() {
        let cli = TestCli::parse_from(["test", "--junit-dir", ""]);
        assert!(cli.options.report_dir().is_none());
    }
}
