use serde;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::local_elevator::timing::Timings;
use crate::util::constants as setting;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("a building needs at least one elevator")]
    EmptyFleet,
    #[error("elevator id {elevator} is listed twice")]
    DuplicateElevator { elevator: String },
    #[error("floor bounds {min_floor}..={max_floor} leave nowhere to travel")]
    InvalidBounds { min_floor: i32, max_floor: i32 },
}

/// Everything needed to bring up a building. Missing fields fall back to the defaults in `constants`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BuildingConfig {
    pub building_id: String,
    pub elevator_ids: Vec<String>,
    pub min_floor: i32,
    pub max_floor: i32,
    pub travel_time_ms: u64,
    pub door_time_ms: u64,
}

impl Default for BuildingConfig {
    fn default() -> BuildingConfig {
        BuildingConfig {
            building_id: setting::BUILDING_ID.to_string(),
            elevator_ids: setting::ELEVATOR_IDS.iter().map(|id| id.to_string()).collect(),
            min_floor: setting::MIN_FLOOR,
            max_floor: setting::MAX_FLOOR,
            travel_time_ms: setting::FLOOR_TRAVEL_TIME_MS,
            door_time_ms: setting::DOOR_CYCLE_TIME_MS,
        }
    }
}

impl BuildingConfig {
    pub fn new(building_id: &str, elevator_ids: &[&str], min_floor: i32, max_floor: i32) -> BuildingConfig {
        BuildingConfig {
            building_id: building_id.to_string(),
            elevator_ids: elevator_ids.iter().map(|id| id.to_string()).collect(),
            min_floor,
            max_floor,
            ..BuildingConfig::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<BuildingConfig, ConfigError> {
        let config: BuildingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<BuildingConfig, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        BuildingConfig::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.elevator_ids.is_empty() {
            return Err(ConfigError::EmptyFleet);
        }
        if self.min_floor >= self.max_floor {
            return Err(ConfigError::InvalidBounds {
                min_floor: self.min_floor,
                max_floor: self.max_floor,
            });
        }
        let mut seen = HashSet::new();
        for id in self.elevator_ids.iter() {
            if !seen.insert(id) {
                return Err(ConfigError::DuplicateElevator {
                    elevator: id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn timings(&self) -> Timings {
        Timings::new(self.travel_time_ms, self.door_time_ms)
    }
}
