//! The multidimensional array type used throughout the reporting pipeline.
//!
//! A [`MultiDimArray`] holds real values over three axes: region, year and variable.
//! Arrays are always rectangular; a hole is an explicit missing value (NaN), never an
//! omitted cell. Missing values are distinct from computed zeros.
use crate::id::{RegionID, VariableID};
use anyhow::{Context, Result, ensure};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;

/// A rectangular array of real values over (region, year, variable).
///
/// The variable axis holds globally unique string labels which embed the reporting unit,
/// e.g. `"GDP|MER (billion US$2017/yr)"`. An array restricted to exactly one variable is
/// referred to as a named series; several operations require their inputs to be named
/// series and fail otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiDimArray {
    regions: IndexSet<RegionID>,
    years: Vec<u32>,
    variables: IndexSet<VariableID>,
    values: Vec<f64>,
}

/// Check that years are strictly increasing (implies uniqueness)
fn check_years(years: &[u32]) -> Result<()> {
    ensure!(
        years.iter().tuple_windows().all(|(y1, y2)| y1 < y2),
        "Years must be in order and unique"
    );
    Ok(())
}

impl MultiDimArray {
    /// Create an array with every cell set to `fill`.
    pub fn filled(
        regions: IndexSet<RegionID>,
        years: Vec<u32>,
        variables: IndexSet<VariableID>,
        fill: f64,
    ) -> Result<Self> {
        check_years(&years)?;
        let size = regions.len() * years.len() * variables.len();
        Ok(Self {
            regions,
            years,
            variables,
            values: vec![fill; size],
        })
    }

    /// Create an array from a flat value buffer.
    ///
    /// Values are laid out with region as the slowest axis, then year, then variable. The
    /// buffer length must match the axis sizes exactly; rectangularity is enforced here
    /// and preserved by every other operation.
    pub fn from_values(
        regions: IndexSet<RegionID>,
        years: Vec<u32>,
        variables: IndexSet<VariableID>,
        values: Vec<f64>,
    ) -> Result<Self> {
        check_years(&years)?;
        ensure!(
            values.len() == regions.len() * years.len() * variables.len(),
            "Array is not rectangular: expected {} values, found {}",
            regions.len() * years.len() * variables.len(),
            values.len()
        );
        Ok(Self {
            regions,
            years,
            variables,
            values,
        })
    }

    /// The region axis
    pub fn regions(&self) -> &IndexSet<RegionID> {
        &self.regions
    }

    /// The year axis
    pub fn years(&self) -> &[u32] {
        &self.years
    }

    /// The variable axis
    pub fn variables(&self) -> &IndexSet<VariableID> {
        &self.variables
    }

    /// Whether the array has no cells at all
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn index_of(&self, region: usize, year: usize, variable: usize) -> usize {
        (region * self.years.len() + year) * self.variables.len() + variable
    }

    /// Get the value for the given cell, if all three axis labels are present.
    pub fn get(&self, region: &str, year: u32, variable: &str) -> Option<f64> {
        let r = self.regions.get_index_of(region)?;
        let y = self.years.iter().position(|&y| y == year)?;
        let v = self.variables.get_index_of(variable)?;
        Some(self.values[self.index_of(r, y, v)])
    }

    /// Get the value for the given cell.
    ///
    /// Panics if any of the axis labels is absent.
    pub fn value(&self, region: &str, year: u32, variable: &str) -> f64 {
        self.get(region, year, variable)
            .unwrap_or_else(|| panic!("No cell ({region}, {year}, {variable}) in array"))
    }

    /// Set every year of a (region, variable) row to the given value.
    ///
    /// This is the one sanctioned mutation in the pipeline, used to mask non-aggregable
    /// diagnostic variables after aggregation. Panics if region or variable is absent.
    pub fn fill_region_variable(&mut self, region: &str, variable: &str, value: f64) {
        let r = self
            .regions
            .get_index_of(region)
            .unwrap_or_else(|| panic!("No region {region} in array"));
        let v = self
            .variables
            .get_index_of(variable)
            .unwrap_or_else(|| panic!("No variable {variable} in array"));
        for y in 0..self.years.len() {
            let idx = self.index_of(r, y, v);
            self.values[idx] = value;
        }
    }

    /// The array's sole variable label, or an error if it holds several.
    pub fn single_variable(&self) -> Result<&VariableID> {
        ensure!(
            self.variables.len() == 1,
            "Expected a single-variable array, found {} variables",
            self.variables.len()
        );
        Ok(self.variables.first().expect("checked above"))
    }

    /// Extract one variable as a single-variable array, or `None` if absent.
    pub fn select(&self, variable: &str) -> Option<Self> {
        let v = self.variables.get_index_of(variable)?;
        let variable = self.variables.get_index(v).expect("index from lookup");
        let values = (0..self.regions.len())
            .cartesian_product(0..self.years.len())
            .map(|(r, y)| self.values[self.index_of(r, y, v)])
            .collect();
        Some(Self {
            regions: self.regions.clone(),
            years: self.years.clone(),
            variables: IndexSet::from_iter([variable.clone()]),
            values,
        })
    }

    /// Replace the label of a single-variable array.
    pub fn relabel(mut self, label: &str) -> Result<Self> {
        self.single_variable()?;
        self.variables = IndexSet::from_iter([label.into()]);
        Ok(self)
    }

    /// Multiply every value by a constant factor (missing values stay missing).
    pub fn scale(mut self, factor: f64) -> Self {
        for value in &mut self.values {
            *value *= factor;
        }
        self
    }

    /// Combine two single-variable arrays cell-wise into a new named series.
    ///
    /// The region axes must hold the same set of regions; the year axis of the result is
    /// the intersection of the inputs' year axes, so years present in only one input are
    /// silently dropped.
    pub fn zip_with<F>(&self, other: &Self, label: &str, f: F) -> Result<Self>
    where
        F: Fn(f64, f64) -> f64,
    {
        let var_a = self.single_variable()?.clone();
        let var_b = other.single_variable()?.clone();
        ensure!(
            self.regions == other.regions,
            "Cannot combine {var_a} and {var_b}: region axes differ"
        );

        let years: Vec<u32> = self
            .years
            .iter()
            .copied()
            .filter(|y| other.years.contains(y))
            .collect();
        let values = self
            .regions
            .iter()
            .cartesian_product(&years)
            .map(|(region, &year)| {
                let a = self.value(region.as_str(), year, var_a.as_str());
                let b = other.value(region.as_str(), year, var_b.as_str());
                f(a, b)
            })
            .collect();
        Self::from_values(
            self.regions.clone(),
            years,
            IndexSet::from_iter([label.into()]),
            values,
        )
    }

    /// Restrict the year axis to the years also present in `keep`, preserving order.
    pub fn restrict_years(&self, keep: &[u32]) -> Self {
        let years: Vec<u32> = self
            .years
            .iter()
            .copied()
            .filter(|y| keep.contains(y))
            .collect();
        let values = self
            .regions
            .iter()
            .cartesian_product(&years)
            .cartesian_product(&self.variables)
            .map(|((region, &year), variable)| {
                self.value(region.as_str(), year, variable.as_str())
            })
            .collect();
        Self {
            regions: self.regions.clone(),
            years,
            variables: self.variables.clone(),
            values,
        }
    }

    /// Re-index the year axis onto `grid`, filling years absent from this array with NaN.
    ///
    /// Used to pre-extend diagnostic arrays that start later than the reporting grid.
    /// Years of this array not present in `grid` are dropped.
    pub fn extend_years(&self, grid: &[u32]) -> Self {
        let values = self
            .regions
            .iter()
            .cartesian_product(grid)
            .cartesian_product(&self.variables)
            .map(|((region, &year), variable)| {
                self.get(region.as_str(), year, variable.as_str())
                    .unwrap_or(f64::NAN)
            })
            .collect();
        Self {
            regions: self.regions.clone(),
            years: grid.to_vec(),
            variables: self.variables.clone(),
            values,
        }
    }

    /// Re-index the region axis onto a superset, filling new regions with NaN.
    pub fn expand_regions(&self, regions: &IndexSet<RegionID>) -> Result<Self> {
        ensure!(
            self.regions.is_subset(regions),
            "Target region axis is not a superset"
        );
        let values = regions
            .iter()
            .cartesian_product(&self.years)
            .cartesian_product(&self.variables)
            .map(|((region, &year), variable)| {
                self.get(region.as_str(), year, variable.as_str())
                    .unwrap_or(f64::NAN)
            })
            .collect();
        Self::from_values(
            regions.clone(),
            self.years.clone(),
            self.variables.clone(),
            values,
        )
    }

    /// Keep only the variables for which `pred` returns true.
    pub fn filter_variables<F>(&self, pred: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        let variables: IndexSet<VariableID> = self
            .variables
            .iter()
            .filter(|v| pred(v.as_str()))
            .cloned()
            .collect();
        let values = self
            .regions
            .iter()
            .cartesian_product(&self.years)
            .cartesian_product(&variables)
            .map(|((region, &year), variable)| {
                self.value(region.as_str(), year, variable.as_str())
            })
            .collect();
        Self {
            regions: self.regions.clone(),
            years: self.years.clone(),
            variables,
            values,
        }
    }

    /// Merge arrays along the variable axis.
    ///
    /// All arrays must cover the same set of regions and carry pairwise distinct variable
    /// labels. The year axis of the result is the intersection of all inputs' year axes
    /// (no interpolation; a variable with a narrower range truncates all others).
    pub fn merge(arrays: Vec<Self>) -> Result<Self> {
        let first = arrays.first().context("No arrays to merge")?;
        let regions = first.regions.clone();
        let mut years = first.years.clone();
        for array in &arrays[1..] {
            ensure!(
                array.regions == regions,
                "Cannot merge arrays with differing region axes"
            );
            years.retain(|y| array.years.contains(y));
        }

        let mut variables = IndexSet::new();
        for array in &arrays {
            for variable in &array.variables {
                ensure!(
                    variables.insert(variable.clone()),
                    "Duplicate variable label {variable}"
                );
            }
        }

        let mut values = Vec::with_capacity(regions.len() * years.len() * variables.len());
        for region in &regions {
            for &year in &years {
                for array in &arrays {
                    for variable in &array.variables {
                        values.push(
                            array
                                .get(region.as_str(), year, variable.as_str())
                                .expect("merged cell must exist"),
                        );
                    }
                }
            }
        }
        Self::from_values(regions, years, variables, values)
    }

    /// Read the array as a time-invariant per-region parameter.
    ///
    /// The array must hold a single variable; the value at its first year is taken for
    /// each region.
    pub fn as_region_param(&self) -> Result<IndexMap<RegionID, f64>> {
        let variable = self.single_variable()?.clone();
        let &year = self
            .years
            .first()
            .with_context(|| format!("Parameter {variable} has no years"))?;
        Ok(self
            .regions
            .iter()
            .map(|region| {
                (
                    region.clone(),
                    self.value(region.as_str(), year, variable.as_str()),
                )
            })
            .collect())
    }

    /// Read the array as a region-invariant time series, taken from its first region.
    pub fn as_time_param(&self) -> Result<IndexMap<u32, f64>> {
        let variable = self.single_variable()?.clone();
        let region = self
            .regions
            .first()
            .with_context(|| format!("Parameter {variable} has no regions"))?
            .clone();
        Ok(self
            .years
            .iter()
            .map(|&year| (year, self.value(region.as_str(), year, variable.as_str())))
            .collect())
    }
}
