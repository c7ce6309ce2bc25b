//! Suite assembly and the built-in serial runner
//!
//! [`build_suite`] turns a schema directory into one registered case per
//! (schema, method) pair. Registration goes through the [`Registrar`] trait so
//! any runner can host the cases; [`SerialRunner`] is the one the CLI uses.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use elbow_core::{CaseReport, CaseStatus, Options, SuiteReport};

use crate::error::{CaseError, SetupChainError, SuiteError};
use crate::executor::SuiteContext;
use crate::setup::run_setup;

/// Body of one test case. `Err` is the case's failure.
pub type CaseFn = Box<dyn FnOnce() -> Result<(), CaseError> + Send>;

/// Hook run once before any case. `Err` fails the whole suite.
pub type HookFn = Box<dyn FnOnce() -> Result<(), SetupChainError> + Send>;

/// Runner hooks the suite builder registers against.
pub trait Registrar {
    /// Register a hook to run once before every case.
    fn before(&mut self, hook: HookFn);

    /// Register one test case. `timeout` is the configured per-case deadline.
    fn case(&mut self, label: String, timeout: Option<Duration>, body: CaseFn);
}

/// Load `schema_dir` and register its cases (and the setup hook, if enabled).
///
/// Returns the run context so callers can inspect the variable bag after the
/// cases have executed.
///
/// # Errors
///
/// Returns [`SuiteError`] if the schemas cannot be loaded or the HTTP client
/// cannot be built; in that case nothing has been registered.
pub fn build_suite<R: Registrar + ?Sized>(
    registrar: &mut R,
    base_url: &str,
    schema_dir: &Path,
    options: Options,
) -> Result<Arc<SuiteContext>, SuiteError> {
    tracing::debug!(dir = %schema_dir.display(), "creating test suite");
    let schemas = elbow_core::list_schemas(schema_dir, &options)?;
    let ctx = Arc::new(SuiteContext::new(options)?);

    if ctx.options().before {
        let ctx = Arc::clone(&ctx);
        let dir: PathBuf = schema_dir.to_path_buf();
        let base_url = base_url.to_string();
        registrar.before(Box::new(move || run_setup(&ctx, &dir, &base_url)));
    }

    for schema in schemas {
        if schema.methods.is_empty() {
            tracing::debug!(schema = %schema.filepath.display(), "no methods declared, no cases");
            continue;
        }
        let schema = Arc::new(schema);
        for method in &schema.methods {
            let label = ctx.options().label_for(method, &schema);
            tracing::debug!(%label, "creating test case");

            let case_ctx = Arc::clone(&ctx);
            let case_schema = Arc::clone(&schema);
            let method = method.clone();
            let base_url = base_url.to_string();
            registrar.case(
                label,
                ctx.options().timeout(),
                Box::new(move || {
                    case_ctx
                        .execute(&base_url, &method, &case_schema)
                        .map(|_| ())
                }),
            );
        }
    }

    Ok(ctx)
}

struct RegisteredCase {
    label: String,
    timeout: Option<Duration>,
    body: CaseFn,
}

/// Runs hooks once, then every case in registration order, one at a time.
///
/// If a hook fails, the remaining hooks are skipped and every case is
/// reported as blocked.
#[derive(Default)]
pub struct SerialRunner {
    hooks: Vec<HookFn>,
    cases: Vec<RegisteredCase>,
}

impl Registrar for SerialRunner {
    fn before(&mut self, hook: HookFn) {
        self.hooks.push(hook);
    }

    fn case(&mut self, label: String, timeout: Option<Duration>, body: CaseFn) {
        self.cases.push(RegisteredCase {
            label,
            timeout,
            body,
        });
    }
}

impl SerialRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels of the registered cases, in execution order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.cases.iter().map(|c| c.label.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Execute everything and collect the report.
    #[must_use]
    pub fn run(self) -> SuiteReport {
        let mut report = SuiteReport::default();

        for hook in self.hooks {
            if let Err(e) = hook() {
                tracing::error!(error = %e, "setup chain failed");
                report.setup_error = Some(e.to_string());
                break;
            }
        }

        for case in self.cases {
            if report.setup_error.is_some() {
                report.push(CaseReport {
                    label: case.label,
                    status: CaseStatus::Blocked,
                    error: Some("not run: setup chain failed".to_string()),
                    errors: Vec::new(),
                    elapsed_ms: 0,
                });
                continue;
            }
            report.push(run_case(case));
        }

        report
    }
}

fn run_case(case: RegisteredCase) -> CaseReport {
    let start = Instant::now();
    let result = (case.body)();
    let elapsed = start.elapsed();
    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    let (status, error, errors) = match result {
        Ok(()) => match case.timeout {
            Some(limit) if elapsed > limit => (
                CaseStatus::Failed,
                Some(format!("timeout of {}ms exceeded", limit.as_millis())),
                Vec::new(),
            ),
            _ => (CaseStatus::Passed, None, Vec::new()),
        },
        Err(e) => {
            let errors = e.validation_errors().to_vec();
            (CaseStatus::Failed, Some(e.to_string()), errors)
        }
    };
    tracing::debug!(label = %case.label, %status, elapsed_ms, "case finished");

    CaseReport {
        label: case.label,
        status,
        error,
        errors,
        elapsed_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn ok_case() -> CaseFn {
        Box::new(|| Ok(()))
    }

    #[test]
    fn cases_run_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut runner = SerialRunner::new();
        for i in 0..3 {
            let order = Arc::clone(&order);
            runner.case(
                format!("case {i}"),
                None,
                Box::new(move || {
                    order.lock().unwrap().push(i);
                    Ok(())
                }),
            );
        }

        let report = runner.run();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(report.passed, 3);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn failing_case_does_not_abort_siblings() {
        let mut runner = SerialRunner::new();
        runner.case("a".into(), None, ok_case());
        runner.case(
            "b".into(),
            None,
            Box::new(|| {
                Err(CaseError::Validation {
                    errors: vec!["bad".into()],
                })
            }),
        );
        runner.case("c".into(), None, ok_case());

        let report = runner.run();
        assert_eq!((report.passed, report.failed), (2, 1));
        assert_eq!(report.cases[1].errors, vec!["bad".to_string()]);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn failed_hook_blocks_every_case() {
        let ran = Arc::new(Mutex::new(false));
        let mut runner = SerialRunner::new();
        runner.before(Box::new(|| {
            Err(SetupChainError::NoMethods {
                step: "/s/setup/a.json".into(),
            })
        }));
        let flag = Arc::clone(&ran);
        runner.case(
            "a".into(),
            None,
            Box::new(move || {
                *flag.lock().unwrap() = true;
                Ok(())
            }),
        );

        let report = runner.run();
        assert!(!*ran.lock().unwrap());
        assert_eq!(report.blocked, 1);
        assert!(report.setup_error.unwrap().contains("declares no methods"));
    }

    #[test]
    fn slow_case_exceeds_timeout() {
        let mut runner = SerialRunner::new();
        runner.case(
            "slow".into(),
            Some(Duration::from_millis(5)),
            Box::new(|| {
                std::thread::sleep(Duration::from_millis(30));
                Ok(())
            }),
        );
        let report = runner.run();
        assert_eq!(report.failed, 1);
        assert_eq!(
            report.cases[0].error.as_deref(),
            Some("timeout of 5ms exceeded")
        );
    }

    #[test]
    fn load_error_registers_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.json"), r#"{"endpoint": "/a", "methods": ["get"]}"#)
            .unwrap();
        std::fs::write(tmp.path().join("b.json"), "{ broken").unwrap();

        let mut runner = SerialRunner::new();
        let err = build_suite(&mut runner, "http://127.0.0.1:9", tmp.path(), Options::default())
            .err()
            .unwrap();
        assert!(matches!(err, SuiteError::Load(_)));
        assert!(runner.is_empty());
    }

    #[test]
    fn one_case_per_method_with_default_labels() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("simple.json"),
            r#"{"endpoint": "/simple", "description": "simple", "methods": ["get", "post"]}"#,
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("zero.json"),
            r#"{"endpoint": "/zero", "description": "none", "methods": []}"#,
        )
        .unwrap();

        let mut runner = SerialRunner::new();
        build_suite(&mut runner, "http://127.0.0.1:9", tmp.path(), Options::default()).unwrap();

        let path = std::path::absolute(tmp.path().join("simple.json")).unwrap();
        let labels: Vec<&str> = runner.labels().collect();
        assert_eq!(
            labels,
            vec![
                format!("GET /simple (simple) [{}]", path.display()),
                format!("POST /simple (simple) [{}]", path.display()),
            ]
        );
    }

    #[test]
    fn custom_label_and_timeout_reach_registrar() {
        struct Recorder(Vec<(String, Option<Duration>)>, usize);
        impl Registrar for Recorder {
            fn before(&mut self, _hook: HookFn) {
                self.1 += 1;
            }
            fn case(&mut self, label: String, timeout: Option<Duration>, _body: CaseFn) {
                self.0.push((label, timeout));
            }
        }

        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("a.json"),
            r#"{"endpoint": "/a", "description": "d", "methods": ["put"]}"#,
        )
        .unwrap();
        let mut options = Options::default().with_label(|m, s| format!("{m} -> {}", s.endpoint));
        options.timeout_ms = Some(250);
        options.before = true;

        let mut recorder = Recorder(Vec::new(), 0);
        build_suite(&mut recorder, "http://127.0.0.1:9", tmp.path(), options).unwrap();

        assert_eq!(
            recorder.0,
            vec![("put -> /a".to_string(), Some(Duration::from_millis(250)))]
        );
        assert_eq!(recorder.1, 1);
    }
}
