//! Aggregation of regions into pseudo-regions.
//!
//! The global aggregate "GLO" and any user-defined regional subsets are appended to the
//! region axis as pseudo-regions. Ordinary variables aggregate as unweighted sums;
//! intensive variables (the damage factor) aggregate as weighted means via the generic
//! weighted-aggregation operation.
use crate::array::MultiDimArray;
use crate::id::RegionID;
use anyhow::{Result, ensure};
use indexmap::{IndexMap, IndexSet};

/// A many-to-one mapping from child region to parent pseudo-region
pub type RegionMapping = IndexMap<RegionID, RegionID>;

/// Variable-label prefixes that cannot be meaningfully aggregated across regions
pub const NON_AGGREGABLE_PREFIXES: &[&str] = &[
    "Internal|CES Function|CES Price|",
    "Internal|CES Function|CES MRS|",
];

/// Sum child regions into parent pseudo-regions.
///
/// Without a weight, a parent's value is the plain sum over its children (missing child
/// values propagate as NaN). With a weight array, the value is the weighted mean
/// `sum(w*v)/sum(w)` over the children.
pub fn aggregate_regions(
    array: &MultiDimArray,
    mapping: &RegionMapping,
    weight: Option<&MultiDimArray>,
) -> Result<MultiDimArray> {
    for region in mapping.keys() {
        ensure!(
            array.regions().contains(region.as_str()),
            "Mapped region {region} not present in array"
        );
    }
    let weight_variable = match weight {
        Some(weight) => {
            for region in mapping.keys() {
                ensure!(
                    weight.regions().contains(region.as_str()),
                    "Mapped region {region} not present in weight array"
                );
            }
            ensure!(
                array.years().iter().all(|y| weight.years().contains(y)),
                "Weight array does not cover all years"
            );
            Some(weight.single_variable()?.clone())
        }
        None => None,
    };

    let groups: IndexSet<RegionID> = mapping.values().cloned().collect();
    let mut values = Vec::with_capacity(groups.len() * array.years().len() * array.variables().len());
    for group in &groups {
        let members = mapping
            .iter()
            .filter(|(_, parent)| *parent == group)
            .map(|(child, _)| child);
        let members: Vec<&RegionID> = members.collect();
        for &year in array.years() {
            for variable in array.variables() {
                let value = match (weight, &weight_variable) {
                    (Some(weight), Some(weight_variable)) => {
                        let mut value_sum = 0.0;
                        let mut weight_sum = 0.0;
                        for member in &members {
                            let w = weight.value(member.as_str(), year, weight_variable.as_str());
                            value_sum += w * array.value(member.as_str(), year, variable.as_str());
                            weight_sum += w;
                        }
                        value_sum / weight_sum
                    }
                    _ => members
                        .iter()
                        .map(|member| array.value(member.as_str(), year, variable.as_str()))
                        .sum(),
                };
                values.push(value);
            }
        }
    }
    MultiDimArray::from_values(
        groups,
        array.years().to_vec(),
        array.variables().clone(),
        values,
    )
}

/// Append aggregate pseudo-regions to an array.
///
/// Each grouping becomes one pseudo-region holding the sum of its members; variables
/// named in `weighted_variables` are instead aggregated as means weighted by `weight`.
pub fn append_aggregates(
    array: &MultiDimArray,
    groupings: &IndexMap<RegionID, Vec<RegionID>>,
    weight: &MultiDimArray,
    weighted_variables: &[&str],
) -> Result<MultiDimArray> {
    let ordinary = array.filter_variables(|v| !weighted_variables.contains(&v));
    let weighted = array.filter_variables(|v| weighted_variables.contains(&v));

    let mut regions = array.regions().clone();
    let mut pieces = Vec::with_capacity(groupings.len());
    for (group, members) in groupings {
        ensure!(
            regions.insert(group.clone()),
            "Aggregate region {group} collides with an existing region"
        );
        let mapping: RegionMapping = members
            .iter()
            .map(|member| (member.clone(), group.clone()))
            .collect();
        let mut aggregated = aggregate_regions(&ordinary, &mapping, None)?;
        if !weighted.variables().is_empty() {
            let weighted_agg = aggregate_regions(&weighted, &mapping, Some(weight))?;
            aggregated = MultiDimArray::merge(vec![aggregated, weighted_agg])?;
        }
        pieces.push(aggregated);
    }

    let mut values = Vec::with_capacity(regions.len() * array.years().len() * array.variables().len());
    for region in &regions {
        for &year in array.years() {
            for variable in array.variables() {
                let value = if array.regions().contains(region.as_str()) {
                    array.value(region.as_str(), year, variable.as_str())
                } else {
                    pieces
                        .iter()
                        .find_map(|piece| piece.get(region.as_str(), year, variable.as_str()))
                        .expect("aggregate cell must exist")
                };
                values.push(value);
            }
        }
    }
    MultiDimArray::from_values(
        regions,
        array.years().to_vec(),
        array.variables().clone(),
        values,
    )
}

/// Force non-aggregable diagnostic variables to exactly 0 for regions without source
/// diagnostic data.
///
/// A downstream scenario-comparison tool drops a variable's legend entry when it sees
/// missing values, so these cells must be 0 rather than NaN.
pub fn mask_non_aggregable(array: &mut MultiDimArray, source_regions: &IndexSet<RegionID>) {
    let targets: Vec<(RegionID, crate::id::VariableID)> = array
        .regions()
        .iter()
        .filter(|region| !source_regions.contains(region.as_str()))
        .flat_map(|region| {
            array
                .variables()
                .iter()
                .filter(|variable| {
                    NON_AGGREGABLE_PREFIXES
                        .iter()
                        .any(|prefix| variable.as_str().starts_with(prefix))
                })
                .map(|variable| (region.clone(), variable.clone()))
        })
        .collect();
    for (region, variable) in targets {
        array.fill_region_variable(region.as_str(), variable.as_str(), 0.0);
    }
}
