use std::fmt;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

// ============================================================================
// Cereal - The fixed catalog of grains a storage can hold
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Cereal {
    Buckwheat,
    Rice,
    Millet,
    Peas,
    Bulgur,
}

impl Cereal {
    /// Display label used in storage summaries and for ordering entries.
    pub fn label(&self) -> &'static str {
        match self {
            Cereal::Buckwheat => "Гречка",
            Cereal::Rice => "Рис",
            Cereal::Millet => "Пшено",
            Cereal::Peas => "Горох",
            Cereal::Bulgur => "Булгур",
        }
    }

    /// Returns an iterator over all cereals
    pub fn all() -> impl Iterator<Item = Cereal> {
        [
            Cereal::Buckwheat,
            Cereal::Rice,
            Cereal::Millet,
            Cereal::Peas,
            Cereal::Bulgur,
        ]
        .into_iter()
    }
}

impl fmt::Display for Cereal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
