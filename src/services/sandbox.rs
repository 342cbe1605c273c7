use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use boa_engine::{Context, Source};
use serde_json::Value as JsonValue;

use crate::models::question::TestCase;

// Engine-side bounds for hostile scripts. The wall-clock budget is the hard
// cutoff; these make the worker thread itself terminate instead of spinning
// after the caller has given up.
const LOOP_ITERATION_LIMIT: u64 = 1_000_000;
const RECURSION_LIMIT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxReport {
    pub passed: usize,
    pub total: usize,
}

/// Runs untrusted candidate JavaScript against declared test cases inside an
/// embedded interpreter. Each run gets a fresh context with no host
/// bindings: no filesystem, network, process, or shared globals. The whole
/// run is bounded by a wall-clock budget; exhaustion zeroes it.
#[derive(Debug, Clone)]
pub struct SandboxRunner {
    budget: Duration,
}

impl SandboxRunner {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    /// Never fails: timeouts, throws, and ungradable tests all come back as
    /// failed tests.
    pub fn run(&self, candidate_code: &str, tests: &[TestCase]) -> SandboxReport {
        let total = tests.len();
        if total == 0 {
            return SandboxReport { passed: 0, total: 0 };
        }

        let code = candidate_code.to_string();
        let tests = tests.to_vec();
        let (tx, rx) = mpsc::channel();

        // boa's Context is not Send, so the whole evaluation lives on the
        // worker thread and only the report crosses back.
        thread::spawn(move || {
            let report = execute(&code, &tests);
            let _ = tx.send(report);
        });

        match rx.recv_timeout(self.budget) {
            Ok(report) => report,
            Err(_) => {
                tracing::warn!(
                    budget_ms = self.budget.as_millis() as u64,
                    "sandbox run exceeded execution budget"
                );
                SandboxReport { passed: 0, total }
            }
        }
    }
}

fn execute(candidate_code: &str, tests: &[TestCase]) -> SandboxReport {
    let mut context = Context::default();
    let limits = context.runtime_limits_mut();
    limits.set_loop_iteration_limit(LOOP_ITERATION_LIMIT);
    limits.set_recursion_limit(RECURSION_LIMIT);

    // Setup phase: a throw here fails the whole run.
    if let Err(e) = context.eval(Source::from_bytes(candidate_code)) {
        tracing::debug!("candidate code failed to evaluate: {}", e);
        return SandboxReport {
            passed: 0,
            total: tests.len(),
        };
    }

    let passed = tests
        .iter()
        .filter(|test| run_test(&mut context, test))
        .count();

    SandboxReport {
        passed,
        total: tests.len(),
    }
}

fn run_test(context: &mut Context, test: &TestCase) -> bool {
    let expression = match (&test.call, &test.function_name) {
        (Some(call), _) => call.clone(),
        (None, Some(name)) => {
            let args = match &test.input {
                Some(JsonValue::Array(items)) => items
                    .iter()
                    .map(JsonValue::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
                Some(value) => value.to_string(),
                None => String::new(),
            };
            format!("{name}({args})")
        }
        // Neither call nor functionName: ungradable, always fails.
        (None, None) => return false,
    };

    // Serialize inside the engine so comparison happens on JSON, with JS
    // number semantics already applied.
    let wrapped = format!("JSON.stringify(({expression}))");
    let value = match context.eval(Source::from_bytes(&wrapped)) {
        Ok(value) => value,
        Err(_) => return false,
    };
    let Some(serialized) = value.as_string() else {
        // JSON.stringify(undefined) is undefined; nothing to compare.
        return false;
    };
    let Ok(actual) = serde_json::from_str::<JsonValue>(&serialized.to_std_string_escaped()) else {
        return false;
    };

    canonical(actual) == canonical(test.expected.clone())
}

/// Folds integral floats into integers so `2.0` and `2` compare equal (JS
/// does not distinguish them), while genuine float differences still fail.
/// Object key order never matters for `serde_json::Value` equality.
fn canonical(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Number(n) => {
            if n.is_f64() {
                let f = n.as_f64().unwrap_or(f64::NAN);
                if f.is_finite() && f.fract() == 0.0 && f.abs() <= i64::MAX as f64 {
                    return JsonValue::from(f as i64);
                }
            }
            JsonValue::Number(n)
        }
        JsonValue::Array(items) => JsonValue::Array(items.into_iter().map(canonical).collect()),
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter().map(|(k, v)| (k, canonical(v))).collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn runner() -> SandboxRunner {
        SandboxRunner::new(Duration::from_millis(1_000))
    }

    fn fn_test(name: &str, function: &str, input: JsonValue, expected: JsonValue) -> TestCase {
        TestCase {
            name: name.to_string(),
            input: Some(input),
            expected,
            function_name: Some(function.to_string()),
            call: None,
        }
    }

    #[test]
    fn passing_function_test() {
        let report = runner().run(
            "function add(a,b){return a+b;}",
            &[fn_test("2+3", "add", json!([2, 3]), json!(5))],
        );
        assert_eq!(report, SandboxReport { passed: 1, total: 1 });
    }

    #[test]
    fn infinite_loop_zeroes_the_run_within_budget() {
        let started = std::time::Instant::now();
        let report = runner().run(
            "while(true) {}",
            &[fn_test("never", "add", json!([2, 3]), json!(5))],
        );
        assert_eq!(report, SandboxReport { passed: 0, total: 1 });
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn setup_throw_fails_every_test() {
        let report = runner().run(
            "throw new Error('bad');",
            &[
                fn_test("a", "f", json!([1]), json!(1)),
                fn_test("b", "f", json!([2]), json!(2)),
            ],
        );
        assert_eq!(report, SandboxReport { passed: 0, total: 2 });
    }

    #[test]
    fn throwing_test_fails_alone() {
        let code = "function ok(){return 1;} function boom(){throw new Error('x');}";
        let report = runner().run(
            code,
            &[
                fn_test("ok", "ok", json!([]), json!(1)),
                fn_test("boom", "boom", json!([]), json!(1)),
            ],
        );
        assert_eq!(report, SandboxReport { passed: 1, total: 2 });
    }

    #[test]
    fn call_expression_runs_verbatim() {
        let report = runner().run(
            "function add(a,b){return a+b;}",
            &[TestCase {
                name: "direct".to_string(),
                input: None,
                expected: json!(7),
                function_name: None,
                call: Some("add(3, 4)".to_string()),
            }],
        );
        assert_eq!(report, SandboxReport { passed: 1, total: 1 });
    }

    #[test]
    fn test_without_call_or_function_name_fails() {
        let report = runner().run(
            "function add(a,b){return a+b;}",
            &[TestCase {
                name: "ungradable".to_string(),
                input: Some(json!([1, 2])),
                expected: json!(3),
                function_name: None,
                call: None,
            }],
        );
        assert_eq!(report, SandboxReport { passed: 0, total: 1 });
    }

    #[test]
    fn non_array_input_is_a_single_argument() {
        let report = runner().run(
            "function double(x){return x*2;}",
            &[fn_test("single", "double", json!(21), json!(42))],
        );
        assert_eq!(report, SandboxReport { passed: 1, total: 1 });
    }

    #[test]
    fn structural_equality_ignores_key_order_and_integral_floats() {
        let code = "function obj(){return {a: 1, b: 2};} function two(){return 2;}";
        let report = runner().run(
            code,
            &[
                fn_test("keys", "obj", json!([]), json!({"b": 2, "a": 1})),
                fn_test("float", "two", json!([]), json!(2.0)),
            ],
        );
        assert_eq!(report, SandboxReport { passed: 2, total: 2 });
    }

    #[test]
    fn float_precision_differences_fail() {
        let report = runner().run(
            "function sum(){return 0.1 + 0.2;}",
            &[fn_test("precision", "sum", json!([]), json!(0.3))],
        );
        assert_eq!(report, SandboxReport { passed: 0, total: 1 });
    }

    #[test]
    fn no_state_leaks_between_runs() {
        let runner = runner();
        let first = runner.run(
            "globalThis.leak = 42; function probe(){ return typeof globalThis.leak; }",
            &[fn_test("set", "probe", json!([]), json!("number"))],
        );
        assert_eq!(first, SandboxReport { passed: 1, total: 1 });

        // A fresh run must not observe the previous run's global.
        let second = runner.run(
            "function probe(){ return typeof globalThis.leak; }",
            &[fn_test("read", "probe", json!([]), json!("undefined"))],
        );
        assert_eq!(second, SandboxReport { passed: 1, total: 1 });
    }

    #[test]
    fn host_ambient_access_is_absent() {
        let code = "function probe(){ return typeof require + ':' + typeof process + ':' + typeof fetch; }";
        let report = runner().run(
            code,
            &[fn_test(
                "no-host",
                "probe",
                json!([]),
                json!("undefined:undefined:undefined"),
            )],
        );
        assert_eq!(report, SandboxReport { passed: 1, total: 1 });
    }

    #[test]
    fn empty_test_list_reports_zero_of_zero() {
        let report = runner().run("function f(){}", &[]);
        assert_eq!(report, SandboxReport { passed: 0, total: 0 });
    }

    #[test]
    fn undefined_result_fails() {
        let report = runner().run(
            "function nothing(){}",
            &[fn_test("void", "nothing", json!([]), json!(null))],
        );
        assert_eq!(report, SandboxReport { passed: 0, total: 1 });
    }
}
