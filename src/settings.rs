//! Code for loading report settings.
use crate::log::DEFAULT_LOG_LEVEL;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default log level for the program
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// The default reporting-year grid: five-year steps to 2060, ten-year steps to 2110, then
/// 2130 and 2150.
pub fn default_reporting_years() -> Vec<u32> {
    let mut years: Vec<u32> = (2005..=2060).step_by(5).collect();
    years.extend((2070..=2110).step_by(10));
    years.extend([2130, 2150]);
    years
}

/// Report settings from a TOML config file
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// The default program log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// The time points (calendar years) to report on
    #[serde(default = "default_reporting_years")]
    pub reporting_years: Vec<u32>,
    /// Additional aggregate pseudo-regions: group label → member regions
    #[serde(default)]
    pub region_groups: IndexMap<String, Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        toml::from_str("").expect("Cannot create settings from empty TOML file")
    }
}

impl Settings {
    /// Read settings from the specified path.
    ///
    /// If the file is not present, default values for settings will be used.
    pub fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(file_path)
            .with_context(|| format!("Could not read {}", file_path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Could not parse {}", file_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_macro::hash_map;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_reporting_years() {
        let years = default_reporting_years();
        assert_eq!(years.len(), 19);
        assert_eq!(years.first(), Some(&2005));
        assert_eq!(years.last(), Some(&2150));
        assert!(years.contains(&2060));
        assert!(years.contains(&2070));
        assert!(!years.contains(&2065));
        assert!(!years.contains(&2120));
    }

    #[test]
    fn test_settings_load_from_path_no_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("report.toml"); // NB: doesn't exist
        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings::default()
        );
    }

    #[test]
    fn test_settings_load_from_path() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("report.toml");

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "log_level = \"warn\"").unwrap();
            writeln!(file, "reporting_years = [2005, 2010]").unwrap();
            writeln!(file, "[region_groups]").unwrap();
            writeln!(file, "OECD = [\"EUR\", \"USA\"]").unwrap();
        }

        let settings = Settings::load_from_path(&file_path).unwrap();
        let expected_groups: IndexMap<String, Vec<String>> = hash_map! {
            "OECD".to_string() => vec!["EUR".to_string(), "USA".to_string()],
        }
        .into_iter()
        .collect();
        assert_eq!(
            settings,
            Settings {
                log_level: "warn".to_string(),
                reporting_years: vec![2005, 2010],
                region_groups: expected_groups,
            }
        );
    }
}
