//! Functionality for assembling the macroeconomic report.
//!
//! The pipeline resolves the raw model variables, derives the reported quantities,
//! aligns everything onto a common time grid, aggregates regions and finally appends the
//! interest-rate series. It either produces one complete, internally consistent array or
//! fails outright; there is no partial output.
use crate::aggregate::{append_aggregates, mask_non_aggregable};
use crate::array::MultiDimArray;
use crate::id::RegionID;
use crate::realisation::ReportFlags;
use crate::settings::Settings;
use crate::store::{AbsencePolicy, ArrayStore, Resolver};
use anyhow::{Context, Result, ensure};
use indexmap::{IndexMap, IndexSet};
use log::{info, warn};

pub mod ces;
pub mod interest;
pub mod macroeconomy;
pub mod welfare;

/// The label of the global aggregate pseudo-region
pub const GLOBAL_REGION: &str = "GLO";

/// Run the macroeconomic report over a solved model output.
///
/// # Arguments
///
/// * `store` - The array store exposing the solved model output
/// * `settings` - Report settings (reporting years, extra region groupings)
///
/// # Returns
///
/// A single array over (regions plus aggregates, aligned years, variable labels).
pub fn run_report(store: &dyn ArrayStore, settings: &Settings) -> Result<MultiDimArray> {
    let resolver = Resolver::new(store, &settings.reporting_years);
    let flags = ReportFlags::from_store(store);

    info!("Resolving raw model variables");
    let raw = macroeconomy::resolve_raw(&resolver)?;
    let model_regions = raw.cons.regions().clone();
    let ies = resolver.required(&["pm_ies"])?.as_region_param()?;
    let damage_coupling = resolver
        .resolve(&["cm_damage"], AbsencePolicy::Silent)?
        .map(|array| array.as_region_param())
        .transpose()?
        .unwrap_or_default();
    let overshoot_forcing = resolver
        .resolve(&["p15_forcOs", "pm_forcOs"], AbsencePolicy::Silent)?
        .map(|array| array.as_time_param())
        .transpose()?
        .unwrap_or_default();
    let pvp = resolver.required_field(&["pm_pvp"], "good")?;

    info!("Deriving reported quantities");
    let mut derived = macroeconomy::derive_economy(&raw, &flags)?;
    derived.push(welfare::compute_welfare(
        &raw.cons,
        &raw.pop,
        &ies,
        &damage_coupling,
        &overshoot_forcing,
    )?);

    // The CES diagnostics block runs only when both source arrays are present and
    // non-empty; its variables are absent from the report otherwise
    let derivatives = resolver.resolve(&["o01_CESderivatives"], AbsencePolicy::Silent)?;
    let mrs_raw = resolver.resolve(&["o01_CESmrs"], AbsencePolicy::Silent)?;
    let diagnostic_regions = match (&derivatives, &mrs_raw) {
        (Some(derivatives), Some(mrs_raw))
            if !derivatives.is_empty() && !mrs_raw.is_empty() =>
        {
            info!("Deriving CES production function diagnostics");
            let diagnostics = ces::ces_diagnostics(
                derivatives,
                mrs_raw,
                &raw.ces_quantities,
                &flags,
                &settings.reporting_years,
            )?;
            for array in diagnostics {
                derived.push(array.expand_regions(&model_regions)?);
            }
            Some(derivatives.regions().clone())
        }
        _ => {
            warn!("CES diagnostic arrays absent; skipping production function diagnostics");
            None
        }
    };

    info!("Aligning {} variables onto a common time grid", derived.len());
    let merged = MultiDimArray::merge(derived)?;

    info!("Aggregating regions");
    let weight = merged
        .select(macroeconomy::GDP_MER)
        .context("GDP|MER missing from merged report")?;
    let groupings = region_groupings(&model_regions, settings)?;
    let mut report = append_aggregates(
        &merged,
        &groupings,
        &weight,
        &[macroeconomy::DAMAGE_FACTOR],
    )?;
    if let Some(diagnostic_regions) = diagnostic_regions {
        mask_non_aggregable(&mut report, &diagnostic_regions);
    }

    info!("Calculating interest rates");
    let pvp = pvp.restrict_years(report.years());
    let (fwd, bwd) = interest::interest_rates(&pvp)?;
    let report_regions = report.regions().clone();
    MultiDimArray::merge(vec![
        report,
        fwd.expand_regions(&report_regions)?,
        bwd.expand_regions(&report_regions)?,
    ])
}

/// The aggregate pseudo-regions to append: the global aggregate plus any user-defined
/// groups from the settings
fn region_groupings(
    model_regions: &IndexSet<RegionID>,
    settings: &Settings,
) -> Result<IndexMap<RegionID, Vec<RegionID>>> {
    let mut groupings = IndexMap::new();
    groupings.insert(
        RegionID::new(GLOBAL_REGION),
        model_regions.iter().cloned().collect(),
    );
    for (group, members) in &settings.region_groups {
        let members: Vec<RegionID> = members
            .iter()
            .map(|member| {
                model_regions
                    .get(member.as_str())
                    .cloned()
                    .with_context(|| format!("Unknown region {member} in group {group}"))
            })
            .collect::<Result<_>>()?;
        ensure!(
            groupings
                .insert(RegionID::new(group), members)
                .is_none(),
            "Region group {group} defined twice"
        );
    }
    Ok(groupings)
}
