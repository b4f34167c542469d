//! Diagnostics of the nested CES production function: shadow prices, marginal rates of
//! substitution and input values.
//!
//! These variables only exist when the model run exported the derivative and MRS arrays;
//! the whole block is skipped otherwise and its variables are absent from the report, not
//! zero-filled.
use crate::array::MultiDimArray;
use crate::id::VariableID;
use crate::realisation::ReportFlags;
use crate::units::DOLLAR_PER_GJ_TO_TDOLLAR_PER_TWA;
use anyhow::Result;
use indexmap::IndexMap;
use log::warn;

/// MRS variables reported whenever their inputs are available
const MRS_CATALOGUE: &[(&str, &str)] = &[
    ("fegab", "fehob"),
    ("feelb", "fehob"),
    ("feelb", "fegab"),
    ("feh2b", "fegab"),
];

/// MRS variables for steel inputs, which only exist while steel production is represented
/// within the CES tree rather than by an explicit physical-process model
const MRS_STEEL_PAIRS: &[(&str, &str)] = &[
    ("feh2_steel", "feso_steel"),
    ("feel_steel_secondary", "feso_steel"),
];

/// The catalogue of (numerator, denominator) input pairs to report
pub fn mrs_pairs(flags: &ReportFlags) -> Vec<(&'static str, &'static str)> {
    let mut pairs = MRS_CATALOGUE.to_vec();
    if !flags.steel_process_based {
        pairs.extend(MRS_STEEL_PAIRS);
    }
    pairs
}

/// Whether a production-function input is an energy input, by naming convention
fn is_energy_input(name: &str) -> bool {
    name.starts_with("fe")
}

fn price_label(input: &str) -> String {
    if is_energy_input(input) {
        format!("Internal|CES Function|CES Price|{input} (US$2017/GJ)")
    } else {
        format!("Internal|CES Function|CES Price|{input} (US$2017/unit input)")
    }
}

fn mrs_label(numerator: &str, denominator: &str) -> String {
    format!("Internal|CES Function|CES MRS|{numerator}.{denominator} (1)")
}

fn value_label(input: &str) -> String {
    format!("Internal|CES Function|Value|{input} (billion US$2017)")
}

/// Derive CES prices, marginal rates of substitution and input values.
///
/// Both raw diagnostic arrays may start later than the reporting grid; they are
/// pre-extended with missing values so that they do not truncate the report's time axis.
///
/// # Arguments
///
/// * `derivatives` - Derivatives of aggregate output with respect to each input
/// * `mrs_raw` - Raw MRS ratios, one `numerator.denominator` sub-category per pair
/// * `quantities` - Production function input quantities
/// * `flags` - Realisation flags controlling conditional pairs
/// * `grid` - The full reporting-year grid
pub fn ces_diagnostics(
    derivatives: &MultiDimArray,
    mrs_raw: &MultiDimArray,
    quantities: &MultiDimArray,
    flags: &ReportFlags,
    grid: &[u32],
) -> Result<Vec<MultiDimArray>> {
    let derivatives = derivatives.extend_years(grid);
    let mrs_raw = mrs_raw.extend_years(grid);

    // The aggregate output has no derivative with respect to itself
    let inputs: Vec<VariableID> = derivatives
        .variables()
        .iter()
        .filter(|v| v.as_str() != "inco")
        .cloned()
        .collect();

    let mut prices = IndexMap::new();
    for input in &inputs {
        let derivative = derivatives
            .select(input.as_str())
            .expect("input taken from the variable axis");
        let price = if is_energy_input(input.as_str()) {
            derivative
                .scale(1.0 / DOLLAR_PER_GJ_TO_TDOLLAR_PER_TWA)
                .relabel(&price_label(input.as_str()))?
        } else {
            derivative.relabel(&price_label(input.as_str()))?
        };
        prices.insert(input.to_string(), price);
    }
    let mut out: Vec<MultiDimArray> = prices.values().cloned().collect();

    for (numerator, denominator) in mrs_pairs(flags) {
        let label = mrs_label(numerator, denominator);
        if let Some(ratio) = mrs_raw.select(&format!("{numerator}.{denominator}")) {
            out.push(ratio.relabel(&label)?);
        } else if let (Some(num_price), Some(den_price)) =
            (prices.get(numerator), prices.get(denominator))
        {
            // Fall back to the ratio of derived prices
            out.push(num_price.zip_with(den_price, &label, |num, den| num / den)?);
        } else {
            warn!("Cannot report MRS {numerator}/{denominator}: no raw ratio or prices");
        }
    }

    for input in &inputs {
        let Some(quantity) = quantities.select(input.as_str()) else {
            continue;
        };
        let derivative = derivatives
            .select(input.as_str())
            .expect("input taken from the variable axis")
            .expand_regions(quantity.regions())?;
        out.push(derivative.zip_with(&quantity, &value_label(input.as_str()), |price, quantity| {
            price * quantity * 1000.0
        })?);
    }

    Ok(out)
}
