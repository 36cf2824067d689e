use crate::units::Time;
use regex::Regex;
use serde::Deserialize;
use std::{collections::HashSet, fs, num::NonZeroUsize, path::Path};
use tletypes::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file. {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file. {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid 'max-epoch-age' value '{value}'. {source}")]
    MaxEpochAge {
        value: String,
        source: humantime::DurationError,
    },
    #[error("'workers' must be at least 1")]
    ZeroWorkers,
    #[error("Satellite selection entry {0} must contain one of the fields 'id', 'name', or 'matches'")]
    EmptySelection(usize),
    #[error("Satellite selection contains an invalid 'matches' regex '{matches}'. {source}")]
    Regex {
        matches: String,
        source: regex::Error,
    },
    #[error("Duplicate satellite selection entry (id='{id:?}', name='{name:?}', matches='{matches:?}')")]
    DuplicateSelection {
        id: Option<u32>,
        name: Option<String>,
        matches: Option<String>,
    },
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Lexically check element lines (line numbers, catalog numbers, checksums)
    /// before propagation. Defaults to true.
    pub verify_checksums: Option<bool>,
    /// Humantime duration, e.g. '30days'
    pub max_epoch_age: Option<String>,
    pub workers: Option<usize>,
    #[serde(alias = "satellite")]
    pub satellites: Vec<Satellite>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_str_checked(&content)
    }

    pub fn from_str_checked(s: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(s)?;

        cfg.max_epoch_age()?;
        cfg.workers()?;

        let mut entries = HashSet::new();
        for (idx, sat_cfg) in cfg.satellites.iter().enumerate() {
            Selector::new(idx, sat_cfg)?;
            if !entries.insert(sat_cfg) {
                return Err(ConfigError::DuplicateSelection {
                    id: sat_cfg.id,
                    name: sat_cfg.name.clone(),
                    matches: sat_cfg.matches.clone(),
                });
            }
        }

        Ok(cfg)
    }

    pub fn verify_checksums(&self) -> bool {
        self.verify_checksums.unwrap_or(true)
    }

    pub fn max_epoch_age(&self) -> Result<Option<Time>, ConfigError> {
        self.max_epoch_age
            .as_ref()
            .map(|value| {
                humantime::parse_duration(value)
                    .map(Time::from_std_duration)
                    .map_err(|source| ConfigError::MaxEpochAge {
                        value: value.clone(),
                        source,
                    })
            })
            .transpose()
    }

    /// Worker threads for parallel resolution, defaults to the available parallelism
    pub fn workers(&self) -> Result<NonZeroUsize, ConfigError> {
        match self.workers {
            Some(n) => NonZeroUsize::new(n).ok_or(ConfigError::ZeroWorkers),
            None => Ok(std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// The records matching any satellite selection entry, in feed order.
    /// Without selection entries every record is kept.
    pub fn select(&self, records: &[ElementRecord]) -> Result<Vec<ElementRecord>, ConfigError> {
        if self.satellites.is_empty() {
            return Ok(records.to_vec());
        }

        let selectors = self
            .satellites
            .iter()
            .enumerate()
            .map(|(idx, s)| Selector::new(idx, s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records
            .iter()
            .filter(|r| selectors.iter().any(|s| s.matches(r)))
            .cloned()
            .collect())
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Satellite {
    /// NORAD catalog number
    pub id: Option<u32>,
    pub name: Option<String>,
    /// Regex tested against the record name, then the catalog number
    pub matches: Option<String>,
}

enum Selector {
    Id(u32),
    Name(String),
    Matches(Regex),
}

impl Selector {
    fn new(idx: usize, cfg: &Satellite) -> Result<Self, ConfigError> {
        if let Some(id) = cfg.id {
            Ok(Selector::Id(id))
        } else if let Some(name) = cfg.name.as_ref() {
            Ok(Selector::Name(name.trim().to_string()))
        } else if let Some(regex) = cfg.matches.as_ref() {
            Regex::new(regex)
                .map(Selector::Matches)
                .map_err(|source| ConfigError::Regex {
                    matches: regex.clone(),
                    source,
                })
        } else {
            Err(ConfigError::EmptySelection(idx))
        }
    }

    fn matches(&self, record: &ElementRecord) -> bool {
        match self {
            Selector::Id(id) => record.catalog_number() == Some(*id),
            Selector::Name(name) => &record.name == name,
            Selector::Matches(re) => {
                re.is_match(&record.name)
                    || record
                        .catalog_number()
                        .map(|n| re.is_match(&n.to_string()))
                        .unwrap_or(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use indoc::indoc;

    const FULL_CONFIG_TOML: &str = indoc! {r#"
        verify-checksums = false
        max-epoch-age = '30days'
        workers = 3

        [[satellite]]
        id = 25544

        [[satellite]]
        name = 'GEO1'

        [[satellite]]
        matches = '^STARLINK-1\d+$'
    "#};

    fn feed() -> Vec<ElementRecord> {
        vec![
            ElementRecord::new("ISS (ZARYA)", "1 25544U 98067A", "2 25544"),
            ElementRecord::new("GEO1", "1 37481U 11019A", "2 37481"),
            ElementRecord::new("GEO2", "1 39120U 13011A", "2 39120"),
            ElementRecord::new("STARLINK-1007", "1 44713U 19074A", "2 44713"),
            ElementRecord::new("STARLINK-2001", "1 46000U 20055A", "2 46000"),
        ]
    }

    #[test]
    fn full_config() {
        let cfg = Config::from_str_checked(FULL_CONFIG_TOML).unwrap();
        assert!(!cfg.verify_checksums());
        assert_relative_eq!(
            cfg.max_epoch_age().unwrap().unwrap().as_secs(),
            30.0 * 86_400.0
        );
        assert_eq!(cfg.workers().unwrap().get(), 3);
        assert_eq!(cfg.satellites.len(), 3);

        let names: Vec<String> = cfg
            .select(&feed())
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["ISS (ZARYA)", "GEO1", "STARLINK-1007"]);
    }

    #[test]
    fn defaults() {
        let cfg = Config::from_str_checked("").unwrap();
        assert_eq!(cfg, Config::default());
        assert!(cfg.verify_checksums());
        assert!(cfg.max_epoch_age().unwrap().is_none());
        assert!(cfg.workers().unwrap().get() >= 1);
        assert_eq!(cfg.select(&feed()).unwrap(), feed());
    }

    #[test]
    fn regex_matches_catalog_number() {
        let cfg = Config::from_str_checked("[[satellite]]\nmatches = '^3\\d{4}$'\n").unwrap();
        let names: Vec<String> = cfg
            .select(&feed())
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["GEO1", "GEO2"]);
    }

    #[test]
    fn invalid_configs() {
        assert!(matches!(
            Config::from_str_checked("max-epoch-age = 'soon'"),
            Err(ConfigError::MaxEpochAge { .. })
        ));
        assert!(matches!(
            Config::from_str_checked("workers = 0"),
            Err(ConfigError::ZeroWorkers)
        ));
        assert!(matches!(
            Config::from_str_checked("[[satellite]]\n"),
            Err(ConfigError::EmptySelection(0))
        ));
        assert!(matches!(
            Config::from_str_checked("[[satellite]]\nmatches = '('\n"),
            Err(ConfigError::Regex { .. })
        ));
        assert!(matches!(
            Config::from_str_checked("[[satellite]]\nid = 1\n[[satellite]]\nid = 1\n"),
            Err(ConfigError::DuplicateSelection { id: Some(1), .. })
        ));
        assert!(matches!(
            Config::from_str_checked("workers = 'many'"),
            Err(ConfigError::Toml(_))
        ));
    }
}
