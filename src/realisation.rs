//! Module realisations of the source model.
//!
//! The optimisation model is assembled from modules which each come in one of several
//! implementation variants ("realisations"). Which raw variables exist in the solved
//! output depends on the chosen variants, so the reporting pipeline resolves them once at
//! start-up and branches on the resulting flags rather than re-querying the store.
use crate::store::ArrayStore;
use indexmap::{IndexMap, IndexSet};
use log::warn;
use std::str::FromStr;
use strum::EnumString;

/// Name of the store set mapping module names to their realisation
const MODULE_REALISATION_SET: &str = "module2realisation";

/// Name of the store set listing the industry subsectors with a process-based
/// representation
const INDUSTRY_PROCESS_SET: &str = "secInd37Prc";

/// Implementation variants of the buildings demand module
#[derive(Debug, Clone, PartialEq, Eq, EnumString, strum::Display)]
pub enum BuildingsRealisation {
    /// Buildings demand as direct final-energy inputs to the production function
    #[strum(serialize = "simple")]
    Simple,
    /// Buildings demand via energy service levels with putty-clay capital
    #[strum(serialize = "services_putty")]
    ServicesPutty,
    /// Buildings demand via energy service levels with explicit capital stocks
    #[strum(serialize = "services_with_capital")]
    ServicesWithCapital,
}

/// The module name → realisation relation, read once from the store.
///
/// Entries are stored as `"module.realisation"` labels in the source set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleRealisationMap(IndexMap<String, String>);

impl ModuleRealisationMap {
    /// Parse the relation from `"module.realisation"` labels, ignoring malformed entries.
    pub fn from_labels(labels: &IndexSet<String>) -> Self {
        let mut map = IndexMap::new();
        for label in labels {
            match label.split_once('.') {
                Some((module, realisation)) => {
                    map.insert(module.to_string(), realisation.to_string());
                }
                None => warn!("Malformed module realisation entry: {label}"),
            }
        }
        Self(map)
    }

    /// The realisation chosen for the given module, if known
    pub fn realisation(&self, module: &str) -> Option<&str> {
        self.0.get(module).map(String::as_str)
    }

    /// The realisation of the buildings module, if known and recognised
    pub fn buildings(&self) -> Option<BuildingsRealisation> {
        let raw = self.realisation("buildings")?;
        match BuildingsRealisation::from_str(raw) {
            Ok(realisation) => Some(realisation),
            Err(_) => {
                warn!("Unknown buildings realisation: {raw}");
                None
            }
        }
    }
}

/// Conditional-inclusion flags for the reporting pipeline, resolved once at start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportFlags {
    /// Whether the buildings module is in its simple variant, in which case six
    /// additional final-energy carrier inputs exist as separate model variables
    pub buildings_simple: bool,
    /// Whether steel production has an explicit physical-process representation
    pub steel_process_based: bool,
}

impl ReportFlags {
    /// Resolve the flags from the store's module and subsector sets
    pub fn from_store(store: &dyn ArrayStore) -> Self {
        let modules = ModuleRealisationMap::from_labels(&store.query_set(MODULE_REALISATION_SET));
        let buildings_simple = modules.buildings() == Some(BuildingsRealisation::Simple);
        let steel_process_based = store.query_set(INDUSTRY_PROCESS_SET).contains("steel");
        Self {
            buildings_simple,
            steel_process_based,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use rstest::rstest;

    #[rstest]
    #[case("simple", Some(BuildingsRealisation::Simple))]
    #[case("services_putty", Some(BuildingsRealisation::ServicesPutty))]
    #[case("services_with_capital", Some(BuildingsRealisation::ServicesWithCapital))]
    #[case("unknown_variant", None)]
    fn test_buildings_realisation(
        #[case] raw: &str,
        #[case] expected: Option<BuildingsRealisation>,
    ) {
        let labels = [format!("buildings.{raw}"), "power.IntC".to_string()]
            .into_iter()
            .collect();
        let map = ModuleRealisationMap::from_labels(&labels);
        assert_eq!(map.buildings(), expected);
        assert_eq!(map.realisation("power"), Some("IntC"));
        assert_eq!(map.realisation("macro"), None);
    }

    #[test]
    fn test_malformed_entries_ignored() {
        let labels = ["garbage".to_string()].into_iter().collect();
        assert_eq!(
            ModuleRealisationMap::from_labels(&labels),
            ModuleRealisationMap::default()
        );
    }

    #[test]
    fn test_flags_from_store() {
        let mut store = InMemoryStore::new();
        store.insert_set(MODULE_REALISATION_SET, ["buildings.simple".to_string()]);
        store.insert_set(INDUSTRY_PROCESS_SET, ["cement".to_string()]);
        let flags = ReportFlags::from_store(&store);
        assert!(flags.buildings_simple);
        assert!(!flags.steel_process_based);

        let flags = ReportFlags::from_store(&InMemoryStore::new());
        assert!(!flags.buildings_simple);
        assert!(!flags.steel_process_based);
    }
}
