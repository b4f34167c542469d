//! The region-wise isoelastic welfare transform of consumption and population.
use crate::array::MultiDimArray;
use crate::id::RegionID;
use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};

/// Variable label for the reported welfare series
pub const WELFARE: &str = "Welfare (utility/yr)";

/// Compute per-region welfare from raw consumption and population.
///
/// For a region with intertemporal elasticity `ies`, per-capita consumption enters a
/// logarithmic utility when `ies` is 1 and the isoelastic power form otherwise. The
/// damage-coupling coefficient and the overshoot-forcing series both default to 0 where
/// absent. The ×1000 factor scales the utility argument and must be preserved exactly for
/// output comparability; it has no economic meaning.
///
/// # Arguments
///
/// * `cons` - Raw consumption (trillion US$2017/yr)
/// * `pop` - Raw population (billion)
/// * `ies` - Intertemporal elasticity of substitution per region
/// * `damage_coupling` - Damage-coupling coefficient per region (0 where absent)
/// * `overshoot_forcing` - Overshoot-forcing series per year (0 where absent)
pub fn compute_welfare(
    cons: &MultiDimArray,
    pop: &MultiDimArray,
    ies: &IndexMap<RegionID, f64>,
    damage_coupling: &IndexMap<RegionID, f64>,
    overshoot_forcing: &IndexMap<u32, f64>,
) -> Result<MultiDimArray> {
    let cons_variable = cons.single_variable()?.clone();
    let pop_variable = pop.single_variable()?.clone();
    anyhow::ensure!(
        cons.regions() == pop.regions(),
        "Consumption and population cover different regions"
    );

    // Years present in only one of the inputs are dropped
    let years: Vec<u32> = cons
        .years()
        .iter()
        .copied()
        .filter(|y| pop.years().contains(y))
        .collect();

    let mut values = Vec::with_capacity(cons.regions().len() * years.len());
    for region in cons.regions() {
        let ies = *ies.get(region.as_str()).with_context(|| {
            format!("No intertemporal elasticity parameter for region {region}")
        })?;
        let coupling = damage_coupling.get(region.as_str()).copied().unwrap_or(0.0);
        for &year in &years {
            let forcing = overshoot_forcing.get(&year).copied().unwrap_or(0.0);
            let cons = cons.value(region.as_str(), year, cons_variable.as_str());
            let pop = pop.value(region.as_str(), year, pop_variable.as_str());
            let argument = 1000.0 * cons * (1.0 - coupling * forcing) / pop;
            // Exact float equality against 1 mirrors the model's utility definition; a
            // tolerance here would change output for edge-case parameterisations
            let welfare = if ies == 1.0 {
                pop * argument.ln()
            } else {
                pop * (argument.powf(1.0 - 1.0 / ies) - 1.0) / (1.0 - 1.0 / ies)
            };
            values.push(welfare);
        }
    }
    MultiDimArray::from_values(
        cons.regions().clone(),
        years,
        IndexSet::from_iter([WELFARE.into()]),
        values,
    )
}
