//! Unit conversion of raw model variables and derived macroeconomic aggregates.
use crate::array::MultiDimArray;
use crate::realisation::ReportFlags;
use crate::store::Resolver;
use crate::units::{TRILLION_TO_BILLION, TWA_TO_EJ};
use anyhow::{Context, Result};
use log::warn;

/// Reported consumption
pub const CONSUMPTION: &str = "Consumption (billion US$2017/yr)";
/// Reported GDP at market exchange rates
pub const GDP_MER: &str = "GDP|MER (billion US$2017/yr)";
/// Reported GDP at purchasing power parity
pub const GDP_PPP: &str = "GDP|PPP (billion US$2017/yr)";
/// Reported GDP net of damages
pub const GDP_NET_OF_DAMAGES: &str = "GDP|MER|Net of damages (billion US$2017/yr)";
/// Reported capital stock
pub const CAPITAL_STOCK: &str = "Capital Stock (billion US$2017)";
/// Reported investment outside the energy system
pub const INVESTMENTS_NON_ESM: &str = "Investments|Non-ESM (billion US$2017/yr)";
/// Reported energy-system investment
pub const INVESTMENTS_ENERGY: &str = "Investments|Energy System (billion US$2017/yr)";
/// Reported total investment
pub const INVESTMENTS_TOTAL: &str = "Investments|Total (billion US$2017/yr)";
/// Reported population
pub const POPULATION: &str = "Population (million)";
/// Reported damage factor
pub const DAMAGE_FACTOR: &str = "Damage factor (1)";

/// CES inputs always reported when present
const CES_BASE_INPUTS: &[&str] = &["kap", "en"];

/// Final-energy carrier inputs which exist as separate model variables only when the
/// buildings module is in its simple variant
const CES_BUILDINGS_INPUTS: &[&str] = &["feelb", "feheb", "fegab", "fehob", "feh2b", "fesob"];

/// The raw model variables feeding the macroeconomic derivations, as resolved from the
/// store and before any unit conversion
pub struct RawMacroSeries {
    /// Consumption (trillion US$2017/yr)
    pub cons: MultiDimArray,
    /// Production function output (trillion US$2017/yr), the `inco` slice of the
    /// quantity array
    pub gdp_mer: MultiDimArray,
    /// Share of PPP in MER GDP
    pub sh_ppp_mer: MultiDimArray,
    /// Damage factor on output
    pub damage_factor: MultiDimArray,
    /// Macroeconomic capital stock (trillion US$2017)
    pub capital: MultiDimArray,
    /// Investment outside the energy system (trillion US$2017/yr)
    pub inv_macro: MultiDimArray,
    /// Energy-system investment (trillion US$2017/yr)
    pub inv_energy: MultiDimArray,
    /// Population (billion)
    pub pop: MultiDimArray,
    /// Production function input quantities, one sub-category per input
    pub ces_quantities: MultiDimArray,
}

/// Resolve the raw macroeconomic variables from the store.
///
/// Candidate name lists cover renames across model versions; a miss on any of these
/// variables aborts the report.
pub fn resolve_raw(resolver: &Resolver) -> Result<RawMacroSeries> {
    let ces_quantities = resolver.required(&["vm_cesIO", "v_cesIO"])?;
    let gdp_mer = ces_quantities
        .select("inco")
        .context("Production function quantity array has no inco sub-category")?;
    Ok(RawMacroSeries {
        cons: resolver.required(&["vm_cons"])?,
        gdp_mer,
        sh_ppp_mer: resolver.required(&["pm_shPPPMER"])?,
        damage_factor: resolver.required(&["vm_damageFactor", "vm_damage"])?,
        capital: resolver.required_field(&["vm_cap"], "kap")?,
        inv_macro: resolver.required_field(&["vm_invMacro"], "kap")?,
        inv_energy: resolver.required(&["v_costInv", "v_directteinv"])?,
        pop: resolver.required(&["pm_pop", "pm_datapop"])?,
        ces_quantities,
    })
}

/// The production-function inputs to report, given the resolved realisation flags
pub fn ces_input_names(flags: &ReportFlags) -> Vec<&'static str> {
    let mut inputs = CES_BASE_INPUTS.to_vec();
    if flags.buildings_simple {
        inputs.extend(CES_BUILDINGS_INPUTS);
    }
    inputs
}

/// Whether a production-function input is a capital rather than an energy quantity
fn is_capital_input(name: &str) -> bool {
    name.starts_with("kap")
}

/// Convert the raw series to reporting units and compute derived aggregates.
///
/// Monetary quantities scale from trillions to billions, energy quantities from TWa to
/// EJ. The GDP|PPP division is unguarded: a zero PPP share propagates as Inf/NaN.
pub fn derive_economy(raw: &RawMacroSeries, flags: &ReportFlags) -> Result<Vec<MultiDimArray>> {
    let gdp_mer = raw
        .gdp_mer
        .clone()
        .scale(TRILLION_TO_BILLION)
        .relabel(GDP_MER)?;
    let inv_macro = raw
        .inv_macro
        .clone()
        .scale(TRILLION_TO_BILLION)
        .relabel(INVESTMENTS_NON_ESM)?;
    let inv_energy = raw
        .inv_energy
        .clone()
        .scale(TRILLION_TO_BILLION)
        .relabel(INVESTMENTS_ENERGY)?;

    let mut out = vec![
        raw.cons
            .clone()
            .scale(TRILLION_TO_BILLION)
            .relabel(CONSUMPTION)?,
        gdp_mer.zip_with(&raw.sh_ppp_mer, GDP_PPP, |gdp, share| gdp / share)?,
        gdp_mer.zip_with(&raw.damage_factor, GDP_NET_OF_DAMAGES, |gdp, damage| {
            gdp * damage
        })?,
        raw.capital
            .clone()
            .scale(TRILLION_TO_BILLION)
            .relabel(CAPITAL_STOCK)?,
        inv_macro.zip_with(&inv_energy, INVESTMENTS_TOTAL, |non_esm, energy| {
            non_esm + energy
        })?,
        // billion people to million
        raw.pop.clone().scale(1000.0).relabel(POPULATION)?,
        raw.damage_factor.clone().relabel(DAMAGE_FACTOR)?,
    ];
    out.push(gdp_mer);
    out.push(inv_macro);
    out.push(inv_energy);

    for input in ces_input_names(flags) {
        let Some(quantity) = raw.ces_quantities.select(input) else {
            warn!("CES input {input} not present in the quantity array; skipping");
            continue;
        };
        let converted = if is_capital_input(input) {
            quantity.scale(TRILLION_TO_BILLION).relabel(&format!(
                "Internal|CES Function|CES Input|{input} (billion US$2017)"
            ))?
        } else {
            quantity
                .scale(TWA_TO_EJ)
                .relabel(&format!("Internal|CES Function|CES Input|{input} (EJ/yr)"))?
        };
        out.push(converted);
    }
    Ok(out)
}
