use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::StorageError;

/// Capacities a storage is created with. Fixed for the lifetime of the store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageConfig {
    /// Maximum amount a single container may hold.
    pub container_capacity: f32,
    /// Total capacity; bounds how many containers may be allocated at once.
    pub storage_capacity: f32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            container_capacity: 10.0,
            storage_capacity: 20.0,
        }
    }
}

impl StorageConfig {
    pub fn new(container_capacity: f32, storage_capacity: f32) -> Self {
        Self {
            container_capacity,
            storage_capacity,
        }
    }

    /// Parse a config from JSON, e.g. `{"containerCapacity": 10, "storageCapacity": 20}`.
    /// Missing fields fall back to the defaults. The result is not validated.
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the capacity invariants. Comparisons are written so NaN fails them.
    pub fn validate(&self) -> Result<(), StorageError> {
        if !(self.container_capacity >= 0.0) {
            return Err(StorageError::InvalidConfiguration(format!(
                "container capacity must be non-negative, got {}",
                self.container_capacity
            )));
        }
        if !(self.storage_capacity >= self.container_capacity) {
            return Err(StorageError::InvalidConfiguration(format!(
                "storage capacity {} is smaller than container capacity {}",
                self.storage_capacity, self.container_capacity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(StorageConfig::default().validate().is_ok());
    }

    #[test]
    fn negative_container_capacity_is_rejected() {
        let err = StorageConfig::new(-4.0, 10.0).validate().unwrap_err();
        assert!(matches!(err, StorageError::InvalidConfiguration(_)));
    }

    #[test]
    fn storage_smaller_than_container_is_rejected() {
        let err = StorageConfig::new(10.0, 5.0).validate().unwrap_err();
        assert!(matches!(err, StorageError::InvalidConfiguration(_)));
    }

    #[test]
    fn nan_capacities_are_rejected() {
        assert!(StorageConfig::new(f32::NAN, 10.0).validate().is_err());
        assert!(StorageConfig::new(1.0, f32::NAN).validate().is_err());
    }

    #[test]
    fn zero_capacities_are_valid() {
        assert!(StorageConfig::new(0.0, 0.0).validate().is_ok());
    }

    #[test]
    fn parses_camel_case_json() {
        let cfg = StorageConfig::from_json(r#"{"containerCapacity": 5, "storageCapacity": 15.5}"#)
            .unwrap();
        assert_eq!(cfg, StorageConfig::new(5.0, 15.5));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let cfg = StorageConfig::from_json(r#"{"storageCapacity": 40}"#).unwrap();
        assert_eq!(cfg.container_capacity, 10.0);
        assert_eq!(cfg.storage_capacity, 40.0);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = StorageConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, StorageError::Config(_)));
    }
}
