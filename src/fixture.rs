//! Fixtures for tests

use crate::array::MultiDimArray;
use crate::id::{RegionID, VariableID};
use indexmap::IndexSet;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Build a single-variable array with values laid out region-major, then by year
pub fn series(regions: &[&str], years: &[u32], label: &str, values: &[f64]) -> MultiDimArray {
    let regions: IndexSet<RegionID> = regions.iter().copied().map(RegionID::new).collect();
    let variables: IndexSet<VariableID> = IndexSet::from_iter([VariableID::new(label)]);
    MultiDimArray::from_values(regions, years.to_vec(), variables, values.to_vec())
        .expect("valid test array")
}
