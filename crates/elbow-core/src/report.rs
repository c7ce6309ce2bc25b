//! Suite report: the interchange format a run produces
//!
//! Rendered to the terminal or emitted as JSON; the JSON Schema for it is
//! generated with `schemars` (see `tests/generate_schema.rs`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome of one test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    Failed,
    /// Not run because the setup chain failed
    Blocked,
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "PASS"),
            Self::Failed => write!(f, "FAIL"),
            Self::Blocked => write!(f, "BLOCKED"),
        }
    }
}

/// One executed (or blocked) test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaseReport {
    /// Display label, e.g. "GET /users (list users) [/abs/users.json]"
    pub label: String,
    pub status: CaseStatus,
    /// Error summary when the case did not pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Individual schema-validator errors, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Wall-clock duration of the case
    #[serde(default)]
    pub elapsed_ms: u64,
}

/// Whole-suite outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SuiteReport {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub blocked: u64,
    /// Setup chain failure, reported once for the whole suite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_error: Option<String>,
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    /// Append a case and update the counters.
    pub fn push(&mut self, case: CaseReport) {
        self.total += 1;
        match case.status {
            CaseStatus::Passed => self.passed += 1,
            CaseStatus::Failed => self.failed += 1,
            CaseStatus::Blocked => self.blocked += 1,
        }
        self.cases.push(case);
    }

    /// PASS iff at least one case ran and every case passed.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.total > 0 && self.passed == self.total
    }

    /// 0 = pass, 1 = case failures, 3 = setup failure or nothing ran.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.setup_error.is_some() || self.total == 0 {
            3
        } else if self.is_pass() {
            0
        } else {
            1
        }
    }

    /// Human-readable rendering, one line per case.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();
        if let Some(err) = &self.setup_error {
            lines.push(format!("SETUP FAILED: {err}"));
        }
        for case in &self.cases {
            lines.push(format!("{:<7} {}", case.status.to_string(), case.label));
            if let Some(err) = &case.error {
                lines.push(format!("        {err}"));
            }
            for e in &case.errors {
                lines.push(format!("          - {e}"));
            }
        }
        lines.push(String::new());
        lines.push(format!(
            "{} cases: {} passed, {} failed, {} blocked",
            self.total, self.passed, self.failed, self.blocked
        ));
        lines.join("\n")
    }
}

/// Generate JSON Schema for the report format.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(SuiteReport);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
