use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::cereal::Cereal;

// ============================================================================
// Snapshots - Read-only views handed across the WASM boundary
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct StorageSnapshot {
    pub container_capacity: f32,
    pub storage_capacity: f32,
    /// Allocated containers, ordered by label
    pub containers: Vec<ContainerSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSnapshot {
    pub cereal: Cereal,
    pub label: String,
    pub amount: f32,
    pub space: f32,
}

impl StorageSnapshot {
    pub fn total_amount(&self) -> f32 {
        self.containers.iter().map(|c| c.amount).sum()
    }
}
