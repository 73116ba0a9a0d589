use wasm_bindgen::prelude::*;

mod cereal;
mod config;
mod error;
mod snapshot;
mod storage;

pub use cereal::*;
pub use config::*;
pub use error::*;
pub use snapshot::*;
pub use storage::*;

#[cfg(feature = "instrument")]
pub use instrument;

// ============================================================================
// WASM API - Warehouse
// ============================================================================

/// JS-facing handle around a [`CerealStorage`].
#[wasm_bindgen]
pub struct Warehouse {
    storage: CerealStorage,
}

#[wasm_bindgen]
impl Warehouse {
    #[wasm_bindgen(constructor)]
    pub fn new(container_capacity: f32, storage_capacity: f32) -> Result<Warehouse, JsError> {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();

        Ok(Self {
            storage: CerealStorage::new(container_capacity, storage_capacity)?,
        })
    }

    /// Build from a plain JS object shaped like `StorageConfig`
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(config: JsValue) -> Result<Warehouse, JsError> {
        console_error_panic_hook::set_once();

        let config: StorageConfig = serde_wasm_bindgen::from_value(config)?;
        Ok(Self {
            storage: CerealStorage::from_config(&config)?,
        })
    }

    /// Returns the amount that did not fit
    #[wasm_bindgen(js_name = addCereal)]
    pub fn add_cereal(&mut self, cereal: Cereal, amount: f32) -> Result<f32, JsError> {
        Ok(self.storage.add_cereal(cereal, amount)?)
    }

    /// Returns the amount actually taken
    #[wasm_bindgen(js_name = getCereal)]
    pub fn get_cereal(&mut self, cereal: Cereal, amount: f32) -> Result<f32, JsError> {
        Ok(self.storage.take_cereal(cereal, amount)?)
    }

    #[wasm_bindgen(js_name = removeContainer)]
    pub fn remove_container(&mut self, cereal: Cereal) -> bool {
        self.storage.remove_container(cereal)
    }

    #[wasm_bindgen(js_name = getAmount)]
    pub fn get_amount(&self, cereal: Cereal) -> f32 {
        self.storage.amount(cereal)
    }

    #[wasm_bindgen(js_name = getSpace)]
    pub fn get_space(&self, cereal: Cereal) -> f32 {
        self.storage.space(cereal)
    }

    /// Labels of the allocated containers, in summary order
    #[wasm_bindgen]
    pub fn labels(&self) -> js_sys::Array {
        self.storage
            .snapshot()
            .containers
            .into_iter()
            .map(|c| JsValue::from_str(&c.label))
            .collect()
    }

    #[wasm_bindgen]
    pub fn describe(&self) -> String {
        self.storage.describe()
    }

    #[wasm_bindgen]
    pub fn snapshot(&self) -> StorageSnapshot {
        self.storage.snapshot()
    }
}

impl Warehouse {
    pub fn storage(&self) -> &CerealStorage {
        &self.storage
    }
}
