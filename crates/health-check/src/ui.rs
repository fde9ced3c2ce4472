//! Console summary of a run.

use colored::Colorize;

use crate::report::{Outcome, TestSuite};

/// Print a per-case listing and the totals to stderr.
pub fn print_summary(suite: &TestSuite) {
    eprintln!();
    eprintln!("{}", "═".repeat(70).bright_black());
    eprintln!("{}", suite.name.cyan().bold());
    eprintln!("{}", "═".repeat(70).bright_black());

    for case in suite.cases() {
        match &case.outcome {
            Outcome::Passed => eprintln!("{} {}", "✓".green().bold(), case.name),
            Outcome::Failed(msg) => eprintln!(
                "{} {} {}",
                "✗".red().bold(),
                case.name.red(),
                msg.bright_black()
            ),
            Outcome::Skipped(msg) => eprintln!(
                "{} {} {}",
                "⏭".yellow(),
                case.name.yellow(),
                msg.bright_black()
            ),
        }
    }

    eprintln!();
    let totals = format!(
        "{} tests: {} passed, {} failed, {} skipped",
        suite.num_tests(),
        suite.num_passed(),
        suite.num_failed(),
        suite.num_skipped()
    );
    if suite.num_failed() == 0 {
        eprintln!("{}", totals.green());
    } else {
        eprintln!("{}", totals.red());
    }
}
