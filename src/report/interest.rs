//! Real interest rates derived from the shadow price of capital.
use crate::array::MultiDimArray;
use anyhow::Result;
use indexmap::IndexSet;

/// Variable label for the forward-looking interest rate
pub const INTEREST_RATE_FWD: &str = "Interest Rate (t+1)/(t-1)|real (unitless)";

/// Variable label for the backward-looking interest rate
pub const INTEREST_RATE_BWD: &str = "Interest Rate t/(t-1)|real (unitless)";

/// Derive two annualised real-interest-rate series from the shadow price of capital.
///
/// For every interior time point of the aligned grid:
///
/// * forward: `1 - (pvp[t+1]/pvp[t-1])^(1/(year[t+1]-year[t-1]))`
/// * backward: `1 - (pvp[t]/pvp[t-1])^(1/(year[t]-year[t-1]))`
///
/// The first and last time points receive missing values. A zero or negative shadow
/// price yields NaN/Inf, which propagates into the output as a data-quality signal.
pub fn interest_rates(pvp: &MultiDimArray) -> Result<(MultiDimArray, MultiDimArray)> {
    let variable = pvp.single_variable()?.clone();
    let years = pvp.years();
    let interior = |t: usize| t > 0 && t + 1 < years.len();

    let mut fwd_values = Vec::with_capacity(pvp.regions().len() * years.len());
    let mut bwd_values = Vec::with_capacity(pvp.regions().len() * years.len());
    for region in pvp.regions() {
        let price = |t: usize| pvp.value(region.as_str(), years[t], variable.as_str());
        for t in 0..years.len() {
            if !interior(t) {
                fwd_values.push(f64::NAN);
                bwd_values.push(f64::NAN);
                continue;
            }
            let fwd_span = f64::from(years[t + 1] - years[t - 1]);
            let bwd_span = f64::from(years[t] - years[t - 1]);
            fwd_values.push(1.0 - (price(t + 1) / price(t - 1)).powf(1.0 / fwd_span));
            bwd_values.push(1.0 - (price(t) / price(t - 1)).powf(1.0 / bwd_span));
        }
    }

    let fwd = MultiDimArray::from_values(
        pvp.regions().clone(),
        years.to_vec(),
        IndexSet::from_iter([INTEREST_RATE_FWD.into()]),
        fwd_values,
    )?;
    let bwd = MultiDimArray::from_values(
        pvp.regions().clone(),
        years.to_vec(),
        IndexSet::from_iter([INTEREST_RATE_BWD.into()]),
        bwd_values,
    )?;
    Ok((fwd, bwd))
}
