//! End-to-end test of the reporting pipeline over a synthetic two-region dataset.
use float_cmp::assert_approx_eq;
use indexmap::IndexSet;
use macrorep::array::MultiDimArray;
use macrorep::id::{RegionID, VariableID};
use macrorep::report::run_report;
use macrorep::settings::Settings;
use macrorep::store::InMemoryStore;
use macrorep::units::{DOLLAR_PER_GJ_TO_TDOLLAR_PER_TWA, TWA_TO_EJ};

const YEARS: [u32; 3] = [2005, 2010, 2015];

fn series(regions: &[&str], years: &[u32], label: &str, values: &[f64]) -> MultiDimArray {
    let regions: IndexSet<RegionID> = regions.iter().copied().map(RegionID::new).collect();
    let variables: IndexSet<VariableID> = IndexSet::from_iter([VariableID::new(label)]);
    MultiDimArray::from_values(regions, years.to_vec(), variables, values.to_vec()).unwrap()
}

/// Two regions, three years, with CES diagnostics only available for EUR and only from
/// 2010 onwards
fn store(with_diagnostics: bool) -> InMemoryStore {
    let r = &["EUR", "USA"];
    let mut store = InMemoryStore::new();

    store.insert_array(
        "vm_cons",
        series(r, &YEARS, "vm_cons", &[1.0, 1.1, 1.2, 2.0, 2.1, 2.2]),
    );
    store.insert_array(
        "vm_cesIO",
        MultiDimArray::merge(vec![
            series(r, &YEARS, "inco", &[10.0, 11.0, 12.0, 20.0, 21.0, 22.0]),
            series(r, &YEARS, "kap", &[30.0, 31.0, 32.0, 60.0, 61.0, 62.0]),
            series(r, &YEARS, "en", &[0.5, 0.5, 0.5, 1.0, 1.0, 1.0]),
            series(r, &YEARS, "fegab", &[0.1, 0.1, 0.1, 0.2, 0.2, 0.2]),
        ])
        .unwrap(),
    );
    store.insert_array(
        "pm_shPPPMER",
        series(r, &YEARS, "pm_shPPPMER", &[0.8, 0.8, 0.8, 1.0, 1.0, 1.0]),
    );
    store.insert_array(
        "vm_damageFactor",
        series(r, &YEARS, "vm_damageFactor", &[0.95, 0.9, 0.85, 1.0, 1.0, 1.0]),
    );
    store.insert_array(
        "vm_cap",
        series(r, &YEARS, "kap", &[30.0, 31.0, 32.0, 60.0, 61.0, 62.0]),
    );
    store.insert_array(
        "vm_invMacro",
        series(r, &YEARS, "kap", &[2.0, 2.0, 2.0, 4.0, 4.0, 4.0]),
    );
    store.insert_array(
        "v_costInv",
        series(r, &YEARS, "v_costInv", &[1.0, 1.0, 1.0, 2.0, 2.0, 2.0]),
    );
    store.insert_array(
        "pm_pop",
        series(r, &YEARS, "pm_pop", &[0.5, 0.5, 0.5, 0.3, 0.3, 0.3]),
    );
    store.insert_array("pm_ies", series(r, &[2005], "pm_ies", &[1.0, 0.5]));
    store.insert_array(
        "pm_pvp",
        series(r, &YEARS, "good", &[100.0, 90.0, 80.0, 100.0, 90.0, 80.0]),
    );
    store.insert_set(
        "module2realisation",
        ["buildings.simple".to_string(), "power.IntC".to_string()],
    );
    store.insert_set("secInd37Prc", ["steel".to_string()]);

    if with_diagnostics {
        store.insert_array(
            "o01_CESderivatives",
            MultiDimArray::merge(vec![
                series(&["EUR"], &[2010, 2015], "inco", &[1.0, 1.0]),
                series(&["EUR"], &[2010, 2015], "kap", &[0.05, 0.05]),
                series(&["EUR"], &[2010, 2015], "fegab", &[0.6, 0.6]),
            ])
            .unwrap(),
        );
        store.insert_array(
            "o01_CESmrs",
            series(&["EUR"], &[2010, 2015], "fegab.fehob", &[0.42, 0.42]),
        );
    }

    store
}

fn settings() -> Settings {
    Settings {
        reporting_years: YEARS.to_vec(),
        region_groups: [("TST".to_string(), vec!["USA".to_string()])]
            .into_iter()
            .collect(),
        ..Settings::default()
    }
}

#[test]
fn test_axes() {
    let report = run_report(&store(true), &settings()).unwrap();

    // The CES diagnostics start in 2010 but are pre-extended, so they must not truncate
    // the common time grid
    assert_eq!(report.years(), YEARS);

    let regions: Vec<String> = report.regions().iter().map(ToString::to_string).collect();
    assert_eq!(regions, ["EUR", "USA", "GLO", "TST"]);
}

#[test]
fn test_unit_conversions_and_derivations() {
    let report = run_report(&store(true), &settings()).unwrap();

    assert_eq!(
        report.value("EUR", 2005, "Consumption (billion US$2017/yr)"),
        1000.0
    );
    assert_approx_eq!(
        f64,
        report.value("EUR", 2005, "GDP|PPP (billion US$2017/yr)"),
        10000.0 / 0.8
    );
    assert_approx_eq!(
        f64,
        report.value("EUR", 2010, "GDP|MER|Net of damages (billion US$2017/yr)"),
        11000.0 * 0.9
    );
    assert_approx_eq!(
        f64,
        report.value("EUR", 2010, "Investments|Total (billion US$2017/yr)"),
        3000.0
    );
    assert_approx_eq!(
        f64,
        report.value("EUR", 2005, "Internal|CES Function|CES Input|en (EJ/yr)"),
        0.5 * TWA_TO_EJ
    );
    // The buildings module is in its simple variant, so the gas carrier is reported
    assert_approx_eq!(
        f64,
        report.value("EUR", 2005, "Internal|CES Function|CES Input|fegab (EJ/yr)"),
        0.1 * TWA_TO_EJ
    );
}

#[test]
fn test_welfare_hand_calculated() {
    let report = run_report(&store(true), &settings()).unwrap();
    let welfare = "Welfare (utility/yr)";

    // EUR has ies == 1 (logarithmic form)
    assert_approx_eq!(
        f64,
        report.value("EUR", 2005, welfare),
        0.5 * (1000.0 * 1.0 / 0.5f64).ln(),
        epsilon = 1e-6
    );
    // USA has ies == 0.5 (power form with exponent -1)
    let argument: f64 = 1000.0 * 2.0 / 0.3;
    assert_approx_eq!(
        f64,
        report.value("USA", 2005, welfare),
        0.3 * (argument.powf(-1.0) - 1.0) / -1.0,
        epsilon = 1e-6
    );
}

#[test]
fn test_global_aggregation() {
    let report = run_report(&store(true), &settings()).unwrap();
    let cons = "Consumption (billion US$2017/yr)";

    // Summing the constituents reproduces the global aggregate
    assert_approx_eq!(
        f64,
        report.value("GLO", 2005, cons),
        report.value("EUR", 2005, cons) + report.value("USA", 2005, cons)
    );
    // User-defined groups are appended as pseudo-regions
    assert_approx_eq!(
        f64,
        report.value("TST", 2005, cons),
        report.value("USA", 2005, cons)
    );
    // The damage factor aggregates as a GDP-weighted mean
    assert_approx_eq!(
        f64,
        report.value("GLO", 2010, "Damage factor (1)"),
        (0.9 * 11000.0 + 1.0 * 21000.0) / (11000.0 + 21000.0)
    );
}

#[test]
fn test_ces_diagnostics_and_masking() {
    let report = run_report(&store(true), &settings()).unwrap();
    let gas_price = "Internal|CES Function|CES Price|fegab (US$2017/GJ)";
    let mrs = "Internal|CES Function|CES MRS|fegab.fehob (1)";

    assert_approx_eq!(
        f64,
        report.value("EUR", 2010, gas_price),
        0.6 / DOLLAR_PER_GJ_TO_TDOLLAR_PER_TWA
    );
    assert_approx_eq!(f64, report.value("EUR", 2010, mrs), 0.42);
    assert_approx_eq!(
        f64,
        report.value(
            "EUR",
            2010,
            "Internal|CES Function|Value|kap (billion US$2017)",
        ),
        0.05 * 31.0 * 1000.0
    );
    // Diagnostics are missing before 2010 for the region that has them
    assert!(report.value("EUR", 2005, gas_price).is_nan());

    // Regions without source diagnostic data get exactly 0, not NaN
    for region in ["USA", "GLO", "TST"] {
        assert_eq!(report.value(region, 2010, gas_price), 0.0);
        assert_eq!(report.value(region, 2010, mrs), 0.0);
    }
}

#[test]
fn test_interest_rates() {
    let report = run_report(&store(true), &settings()).unwrap();
    let fwd = "Interest Rate (t+1)/(t-1)|real (unitless)";
    let bwd = "Interest Rate t/(t-1)|real (unitless)";

    assert_approx_eq!(
        f64,
        report.value("EUR", 2010, bwd),
        1.0 - (90.0f64 / 100.0).powf(1.0 / 5.0)
    );
    assert_approx_eq!(
        f64,
        report.value("EUR", 2010, fwd),
        1.0 - (80.0f64 / 100.0).powf(1.0 / 10.0)
    );
    // Boundary time points and aggregate regions carry missing values
    assert!(report.value("EUR", 2005, bwd).is_nan());
    assert!(report.value("EUR", 2015, bwd).is_nan());
    assert!(report.value("GLO", 2010, bwd).is_nan());
}

#[test]
fn test_diagnostics_absent_block_skipped() {
    let report = run_report(&store(false), &settings()).unwrap();
    assert!(
        !report
            .variables()
            .iter()
            .any(|v| v.as_str().starts_with("Internal|CES Function|CES Price|"))
    );
    // Ordinary reporting is unaffected
    assert_eq!(
        report.value("EUR", 2005, "Consumption (billion US$2017/yr)"),
        1000.0
    );
}

#[test]
fn test_missing_required_variable_fails() {
    let err = run_report(&InMemoryStore::new(), &settings()).unwrap_err();
    assert_eq!(
        err.chain().next().unwrap().to_string(),
        "None of the candidate variables [vm_cesIO, v_cesIO] present in the store"
    );
}
