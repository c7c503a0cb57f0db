//! End-to-end dispatch: validate → resolve → (adapt) → compute → normalize.

use approx::assert_abs_diff_eq;
use nc_core::{Params, Service, validate};
use proptest::prelude::*;
use serde_json::{Value, json};

fn run(service: Service, calculation: &str, data: Value) -> nc_core::Result<Value> {
    run_with(service, calculation, data, Params::new())
}

fn run_with(service: Service, calculation: &str, data: Value, params: Params) -> nc_core::Result<Value> {
    let payload = validate(&data)?;
    service.perform(calculation, &payload, &params)
}

fn float(v: &Value, key: &str) -> f64 {
    v[key].as_f64().unwrap_or_else(|| panic!("{key} missing or not a number in {v}"))
}

// ---------------------------------------------------------------------------
// Reference scenarios
// ---------------------------------------------------------------------------

#[test]
fn scenario_calculator_mean() {
    assert_eq!(run(Service::Calculator, "mean", json!([1, 2, 3, 4])).unwrap(), json!(2.5));
}

#[test]
fn scenario_calculator_sqrt() {
    assert_eq!(
        run(Service::Calculator, "sqrt", json!([4, 9, 16])).unwrap(),
        json!([2.0, 3.0, 4.0])
    );
}

#[test]
fn scenario_statistics_ttest_ind() {
    let r = run(Service::Statistics, "ttest_ind", json!({"a": [1, 2, 3], "b": [4, 5, 6]})).unwrap();
    // t = -3.6742..., p = 0.0213...
    assert_eq!(float(&r, "statistic"), -3.67);
    assert_eq!(float(&r, "pvalue"), 0.02);
    assert_eq!(float(&r, "df"), 4.0);
}

#[test]
fn scenario_statistics_linregress() {
    let r = run(Service::Statistics, "linregress", json!({"x": [1, 2, 3], "y": [2, 4, 6]})).unwrap();
    assert_eq!(float(&r, "slope"), 2.0);
    assert_eq!(float(&r, "intercept"), 0.0);
    assert_eq!(float(&r, "rvalue"), 1.0);
    let keys: Vec<&str> = r.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["slope", "intercept", "rvalue", "pvalue", "stderr", "intercept_stderr"]);
}

#[test]
fn scenario_unknown_calculation() {
    let err = run(Service::Calculator, "bogus", json!([1, 2])).unwrap_err();
    assert_eq!(err.kind(), "UnknownCalculationError");
    let msg = err.to_string();
    assert!(msg.contains("abs, arccos, arcsin, arctan, ceil"), "{msg}");
    assert!(msg.ends_with("tan, var"), "{msg}");
}

#[test]
fn scenario_flat_payload_for_two_sample_test() {
    let err = run(Service::Statistics, "ttest_ind", json!([1, 2, 3])).unwrap_err();
    assert_eq!(err.kind(), "InputShapeError");
    assert_eq!(err.calculation(), Some("ttest_ind"));
}

// ---------------------------------------------------------------------------
// Registries
// ---------------------------------------------------------------------------

#[test]
fn every_registered_name_resolves() {
    for service in Service::ALL {
        let registry = service.registry();
        for name in registry.names() {
            assert!(registry.resolve(name).is_ok(), "{service}/{name}");
        }
    }
    for name in ["bogus", "eval", "__import__", "", "MEAN", "numpy.mean"] {
        assert!(Service::Calculator.registry().resolve(name).is_err(), "{name}");
        assert!(Service::Statistics.registry().resolve(name).is_err(), "{name}");
    }
}

#[test]
fn names_are_sorted_and_unique() {
    for service in Service::ALL {
        let names = service.registry().names();
        let mut dedup = names.clone();
        dedup.dedup();
        assert_eq!(names, dedup, "{service}");
        assert!(names.windows(2).all(|w| w[0] < w[1]));
    }
}

// ---------------------------------------------------------------------------
// Calculations with params and structured results
// ---------------------------------------------------------------------------

#[test]
fn calculator_params() {
    let r = run_with(Service::Calculator, "std", json!([2, 4, 4, 4, 5, 5, 7, 9]), Params::new()).unwrap();
    assert_eq!(r, json!(2.0));
    let r = run_with(
        Service::Calculator,
        "round",
        json!([1.2345, 2.5, 3.5]),
        Params::new().with("decimals", 1),
    )
    .unwrap();
    assert_eq!(r, json!([1.2, 2.5, 3.5]));
    let r = run_with(Service::Calculator, "percentile", json!([1, 2, 3, 4, 5]), Params::new().with("q", 90))
        .unwrap();
    assert_eq!(r, json!(4.6));
}

#[test]
fn round_rejects_out_of_range_decimals() {
    for decimals in [i64::from(i32::MIN), -401, 401, i64::from(i32::MAX)] {
        let err = run_with(Service::Calculator, "round", json!([1.5]), Params::new().with("decimals", decimals))
            .unwrap_err();
        assert_eq!(err.kind(), "CalculationError", "{decimals}");
        assert!(err.to_string().contains("decimals"), "{err}");
    }
    let r = run_with(Service::Calculator, "round", json!([1250]), Params::new().with("decimals", -2)).unwrap();
    assert_eq!(r, json!([1200.0]));
}

#[test]
fn unexpected_param_is_a_calculation_error() {
    let err = run_with(Service::Calculator, "mean", json!([1, 2]), Params::new().with("axis", 0))
        .unwrap_err();
    assert_eq!(err.kind(), "CalculationError");
    assert!(err.to_string().contains("axis"));
}

#[test]
fn domain_errors_are_calculation_errors() {
    for (name, data) in [("sqrt", json!([-1])), ("log", json!([0])), ("arcsin", json!([2])), ("exp", json!([1000]))] {
        let err = run(Service::Calculator, name, data).unwrap_err();
        assert_eq!(err.kind(), "CalculationError", "{name}");
    }
    assert_eq!(run(Service::Calculator, "mean", json!([])).unwrap_err().kind(), "CalculationError");
    assert_eq!(run(Service::Calculator, "sum", json!([])).unwrap(), json!(0.0));
}

#[test]
fn describe_result_shape() {
    let r = run(Service::Statistics, "describe", json!([2, 4, 4, 4, 5, 5, 7, 9])).unwrap();
    assert_eq!(r["nobs"], json!(8));
    assert_eq!(r["minmax"], json!([2.0, 9.0]));
    assert_eq!(float(&r, "mean"), 5.0);
    assert_eq!(float(&r, "variance"), 4.57);
}

#[test]
fn mode_count_is_an_integer() {
    let r = run(Service::Statistics, "mode", json!([1, 2, 2, 3])).unwrap();
    assert_eq!(r, json!({"mode": 2.0, "count": 2}));
}

#[test]
fn contingency_and_samples() {
    let r = run(Service::Statistics, "chi2_contingency", json!({"table": [[10, 20], [30, 40]]})).unwrap();
    assert_eq!(r["dof"], json!(1));
    assert_eq!(r["expected_freq"], json!([[12.0, 18.0], [28.0, 42.0]]));
    assert_eq!(float(&r, "statistic"), 0.45);

    let r = run(Service::Statistics, "fisher_exact", json!({"table": [[8, 2], [1, 5]]})).unwrap();
    assert_eq!(float(&r, "statistic"), 20.0);
    assert_eq!(float(&r, "pvalue"), 0.03);

    let r = run(Service::Statistics, "fisher_exact", json!({"table": [[500, 500], [500, 500]]})).unwrap();
    assert_eq!(float(&r, "statistic"), 1.0);
    assert_eq!(float(&r, "pvalue"), 1.0);

    let r = run(
        Service::Statistics,
        "f_oneway",
        json!({"sample_0": [1, 2, 3], "sample_1": [4, 5, 6], "sample_2": [7, 8, 9]}),
    )
    .unwrap();
    assert_eq!(float(&r, "statistic"), 12.0);
}

#[test]
fn degenerate_statistics_become_null() {
    let r = run(Service::Statistics, "pearsonr", json!({"a": [1, 1, 1], "b": [1, 2, 3]})).unwrap();
    assert_eq!(r, json!({"statistic": null, "pvalue": null}));
}

#[test]
fn levene_needs_two_samples() {
    let err = run(Service::Statistics, "levene", json!([1, 2, 3, 4])).unwrap_err();
    assert_eq!(err.kind(), "CalculationError");
    assert!(err.to_string().contains("single flat array"), "{err}");
}

#[test]
fn ttest_1samp_requires_popmean() {
    let err = run(Service::Statistics, "ttest_1samp", json!([1, 2, 3])).unwrap_err();
    assert_eq!(err.kind(), "CalculationError");
    let r = run_with(Service::Statistics, "ttest_1samp", json!([1, 2, 3]), Params::new().with("popmean", 2))
        .unwrap();
    assert_eq!(float(&r, "statistic"), 0.0);
    assert_eq!(float(&r, "pvalue"), 1.0);
}

// ---------------------------------------------------------------------------
// Validation boundaries
// ---------------------------------------------------------------------------

#[test]
fn length_boundary_through_dispatch() {
    let ok = Value::Array(vec![json!(1); 10_000]);
    assert_eq!(run(Service::Calculator, "sum", ok).unwrap(), json!(10000.0));
    let too_long = Value::Array(vec![json!(1); 10_001]);
    assert_eq!(run(Service::Calculator, "sum", too_long).unwrap_err().kind(), "ValidationError");
}

#[test]
fn magnitude_boundary_through_dispatch() {
    let r = run(Service::Calculator, "max", json!([1e308, 1])).unwrap();
    assert_abs_diff_eq!(r.as_f64().unwrap(), 1e308, epsilon = 1e292);
    assert_eq!(run(Service::Calculator, "max", json!([1.1e308])).unwrap_err().kind(), "ValidationError");
}

#[test]
fn dispatch_is_deterministic() {
    let data = json!({"a": [1.5, 2.25, 3.0, 9.75], "b": [0.5, 4.0, 4.5, 6.25, 7.0]});
    let first = run(Service::Statistics, "mannwhitneyu", data.clone()).unwrap();
    for _ in 0..5 {
        assert_eq!(run(Service::Statistics, "mannwhitneyu", data.clone()).unwrap(), first);
    }
}

fn floats_of(v: &Value, out: &mut Vec<f64>) {
    match v {
        Value::Number(n) => out.extend(n.as_f64()),
        Value::Array(items) => items.iter().for_each(|i| floats_of(i, out)),
        Value::Object(map) => map.values().for_each(|i| floats_of(i, out)),
        _ => {}
    }
}

proptest! {
    #[test]
    fn prop_outputs_have_at_most_two_decimals(xs in proptest::collection::vec(-1e6f64..1e6, 3..40)) {
        let data = Value::Array(xs.iter().map(|&x| json!(x)).collect());
        for (service, name) in [
            (Service::Calculator, "mean"),
            (Service::Calculator, "cumsum"),
            (Service::Statistics, "describe"),
            (Service::Statistics, "zscore"),
        ] {
            let Ok(v) = run(service, name, data.clone()) else { continue };
            let mut floats = Vec::new();
            floats_of(&v, &mut floats);
            for f in floats {
                prop_assert_eq!(nc_core::result::round2(f), f);
            }
        }
    }

    #[test]
    fn prop_rounding_error_is_bounded(xs in proptest::collection::vec(-1e6f64..1e6, 1..40)) {
        let data = Value::Array(xs.iter().map(|&x| json!(x)).collect());
        let r = run(Service::Calculator, "abs", data).unwrap();
        for (out, x) in r.as_array().unwrap().iter().zip(&xs) {
            prop_assert!((out.as_f64().unwrap() - x.abs()).abs() <= 0.005 + 1e-9);
        }
    }
}
