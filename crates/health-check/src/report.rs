//! Test-case accumulation and JUnit report output.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::info;

use crate::error::{HealthCheckError, Result};

/// Name of the suite written to the report.
pub const SUITE_NAME: &str = "Cluster Health Check";

/// File name prefix of persisted reports.
pub const REPORT_FILE_PREFIX: &str = "cluster-health-check";

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("ANSI escape pattern is valid")
});

/// Outcome of a single test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(String),
    Skipped(String),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    /// Failure or skip message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Passed => None,
            Self::Failed(msg) | Self::Skipped(msg) => Some(msg),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "PASS"),
            Self::Failed(_) => write!(f, "FAIL"),
            Self::Skipped(_) => write!(f, "SKIP"),
        }
    }
}

/// A named test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub outcome: Outcome,
}

/// An ordered collection of test cases with running totals.
#[derive(Debug, Clone)]
pub struct TestSuite {
    pub name: String,
    cases: Vec<TestCase>,
    num_failed: usize,
    num_skipped: usize,
}

impl Default for TestSuite {
    fn default() -> Self {
        Self::new(SUITE_NAME)
    }
}

impl TestSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
            num_failed: 0,
            num_skipped: 0,
        }
    }

    /// Record an outcome under `name`.
    pub fn push(&mut self, name: impl Into<String>, outcome: Outcome) {
        match outcome {
            Outcome::Failed(_) => self.num_failed += 1,
            Outcome::Skipped(_) => self.num_skipped += 1,
            Outcome::Passed => {}
        }
        self.cases.push(TestCase {
            name: name.into(),
            outcome,
        });
    }

    pub fn pass(&mut self, name: impl Into<String>) {
        self.push(name, Outcome::Passed);
    }

    pub fn fail(&mut self, name: impl Into<String>, message: impl Into<String>) {
        self.push(name, Outcome::Failed(message.into()));
    }

    pub fn skip(&mut self, name: impl Into<String>, message: impl Into<String>) {
        self.push(name, Outcome::Skipped(message.into()));
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Look a test case up by name.
    pub fn case(&self, name: &str) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.name == name)
    }

    pub fn num_tests(&self) -> usize {
        self.cases.len()
    }

    pub fn num_failed(&self) -> usize {
        self.num_failed
    }

    pub fn num_skipped(&self) -> usize {
        self.num_skipped
    }

    pub fn num_passed(&self) -> usize {
        self.num_tests() - self.num_failed - self.num_skipped
    }

    /// Serialize as an indented JUnit `<testsuite>` document.
    pub fn to_junit_xml(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = writeln!(
            out,
            r#"<testsuite name="{}" tests="{}" skipped="{}" failures="{}" time="0">"#,
            escape_xml(&self.name),
            self.num_tests(),
            self.num_skipped,
            self.num_failed
        );
        for case in &self.cases {
            let name = escape_xml(&case.name);
            match &case.outcome {
                Outcome::Passed => {
                    let _ = writeln!(out, r#"    <testcase name="{name}" time="0"></testcase>"#);
                }
                Outcome::Failed(msg) => {
                    let _ = writeln!(out, r#"    <testcase name="{name}" time="0">"#);
                    let _ = writeln!(
                        out,
                        r#"        <failure message="{}"></failure>"#,
                        escape_xml(msg)
                    );
                    let _ = writeln!(out, "    </testcase>");
                }
                Outcome::Skipped(msg) => {
                    let _ = writeln!(out, r#"    <testcase name="{name}" time="0">"#);
                    let _ = writeln!(
                        out,
                        r#"        <skipped message="{}"></skipped>"#,
                        escape_xml(msg)
                    );
                    let _ = writeln!(out, "    </testcase>");
                }
            }
        }
        out.push_str("</testsuite>");
        out
    }
}

/// Escape text for use inside an XML attribute value.
fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            '\n' => escaped.push_str("&#xA;"),
            '\t' => escaped.push_str("&#x9;"),
            '\r' => escaped.push_str("&#xD;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Remove ANSI escape sequences (colors, cursor movement) from `s`.
pub fn strip_ansi(s: &str) -> String {
    ANSI_ESCAPE.replace_all(s, "").into_owned()
}

/// Report file name for a run started at `at`.
pub fn report_file_name(at: DateTime<Utc>) -> String {
    format!("{REPORT_FILE_PREFIX}_{}.xml", at.format("%Y%m%d-%H%M%S"))
}

/// Persist `xml` under `dir`, with ANSI sequences stripped.
///
/// Returns the path written.
pub fn write_report(dir: &Path, xml: &str, at: DateTime<Utc>) -> Result<PathBuf> {
    let path = dir.join(report_file_name(at));
    info!(path = %path.display(), "Writing JUnit report");

    std::fs::write(&path, strip_ansi(xml)).map_err(|source| HealthCheckError::Io {
        path: path.clone(),
        source,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).map_err(
            |source| HealthCheckError::Io {
                path: path.clone(),
                source,
            },
        )?;
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_suite_counts() {
        let mut suite = TestSuite::default();
        suite.pass("a");
        suite.fail("b", "broken");
        suite.skip("c", "not found");
        suite.skip("d", "precondition failed");

        assert_eq!(suite.num_tests(), 4);
        assert_eq!(suite.num_failed(), 1);
        assert_eq!(suite.num_skipped(), 2);
        assert_eq!(suite.num_passed(), 1);
        assert_eq!(suite.case("b").and_then(|c| c.outcome.message()), Some("broken"));
    }

    #[test]
    fn test_junit_xml_layout() {
        let mut suite = TestSuite::default();
        suite.pass("operator conditions etcd");
        suite.fail("operator conditions dns", r#"Operator "dns" - Available=False"#);
        suite.skip("operator conditions console", "Operator \"console\" not found in the cluster, skipping");

        let xml = suite.to_junit_xml();
        let expected = r#"<testsuite name="Cluster Health Check" tests="3" skipped="1" failures="1" time="0">
    <testcase name="operator conditions etcd" time="0"></testcase>
    <testcase name="operator conditions dns" time="0">
        <failure message="Operator &#34;dns&#34; - Available=False"></failure>
    </testcase>
    <testcase name="operator conditions console" time="0">
        <skipped message="Operator &#34;console&#34; not found in the cluster, skipping"></skipped>
    </testcase>
</testsuite>"#;
        assert_eq!(xml, expected);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b>&'c'"), "a&lt;b&gt;&amp;&#39;c&#39;");
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[31mred\x1b[0m plain"), "red plain");
        assert_eq!(strip_ansi("no escapes"), "no escapes");
    }

    #[test]
    fn test_report_file_name_uses_utc_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(report_file_name(at), "cluster-health-check_20240309-070501.xml");
    }

    #[test]
    fn test_write_report_strips_ansi() {
        let dir = tempfile::tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let path = write_report(dir.path(), "\x1b[1m<testsuite></testsuite>\x1b[0m", at).unwrap();

        assert_eq!(path, dir.path().join("cluster-health-check_20240102-030405.xml"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<testsuite></testsuite>");
    }

    #[test]
    fn test_write_report_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = write_report(&missing, "<testsuite/>", Utc::now()).unwrap_err();
        assert!(matches!(err, HealthCheckError::Io { .. }));
    }
}
