// Bounded container storage: one container per cereal, a fixed number of containers

use std::collections::HashMap;
use std::fmt;

use crate::cereal::Cereal;
use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::snapshot::{ContainerSnapshot, StorageSnapshot};

const HEADER_PREFIX: &str = "Хранилище";
const EMPTY_MARKER: &str = "пусто";

/// Storage split into per-cereal containers.
///
/// A cereal present in `levels` has an allocated container; an absent cereal
/// reads as an empty, unallocated container. Every allocated container counts
/// `container_capacity` against `storage_capacity`, whatever it holds.
#[derive(Debug, Clone)]
pub struct CerealStorage {
    container_capacity: f32,
    storage_capacity: f32,
    levels: HashMap<Cereal, f32>,
}

impl CerealStorage {
    pub fn new(container_capacity: f32, storage_capacity: f32) -> Result<Self, StorageError> {
        Self::from_config(&StorageConfig::new(container_capacity, storage_capacity))
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        config.validate()?;
        Ok(Self {
            container_capacity: config.container_capacity,
            storage_capacity: config.storage_capacity,
            levels: HashMap::new(),
        })
    }

    pub fn container_capacity(&self) -> f32 {
        self.container_capacity
    }

    pub fn storage_capacity(&self) -> f32 {
        self.storage_capacity
    }

    pub fn config(&self) -> StorageConfig {
        StorageConfig::new(self.container_capacity, self.storage_capacity)
    }

    // === MUTATIONS ===

    /// Put `amount` of `cereal` into its container, allocating the container
    /// on first use. Returns the part that did not fit.
    ///
    /// The allocation check runs before anything is accepted, so even a
    /// zero-amount add to a new cereal either allocates an empty container or
    /// fails with [`StorageError::StorageFull`].
    pub fn add_cereal(&mut self, cereal: Cereal, amount: f32) -> Result<f32, StorageError> {
        if !(amount >= 0.0) {
            return Err(self.reject(cereal, StorageError::InvalidArgument { amount }));
        }

        if !self.levels.contains_key(&cereal) && !self.can_allocate() {
            let err = StorageError::StorageFull {
                cereal,
                containers: self.levels.len(),
                storage_capacity: self.storage_capacity,
            };
            return Err(self.reject(cereal, err));
        }

        let current = self.amount(cereal);
        let free = self.container_capacity - current;
        // A filling add lands on the capacity itself; `current + free` can round past it
        let (accepted, level) = if amount >= free {
            (free, self.container_capacity)
        } else {
            (amount, (current + amount).min(self.container_capacity))
        };
        self.levels.insert(cereal, level);
        let leftover = amount - accepted;

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "add_cereal",
            cereal = cereal.label(),
            requested = amount as f64,
            accepted = accepted as f64,
            leftover = leftover as f64,
            level = level as f64,
            containers = self.levels.len() as u64,
        );

        Ok(leftover)
    }

    /// Take up to `amount` of `cereal` out. Returns what was actually taken.
    ///
    /// A container emptied by the take is released. Taking nothing leaves the
    /// storage untouched, including an empty container allocated by a
    /// zero-amount add.
    pub fn take_cereal(&mut self, cereal: Cereal, amount: f32) -> Result<f32, StorageError> {
        if !(amount >= 0.0) {
            return Err(self.reject(cereal, StorageError::InvalidArgument { amount }));
        }

        let current = self.amount(cereal);
        let withdrawn = amount.min(current);
        if withdrawn <= 0.0 {
            return Ok(0.0);
        }

        let level = current - withdrawn;
        if level == 0.0 {
            self.levels.remove(&cereal);
        } else {
            self.levels.insert(cereal, level);
        }

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "take_cereal",
            cereal = cereal.label(),
            requested = amount as f64,
            withdrawn = withdrawn as f64,
            level = level as f64,
            containers = self.levels.len() as u64,
        );

        Ok(withdrawn)
    }

    /// Release the container for `cereal` if it is allocated and empty.
    pub fn remove_container(&mut self, cereal: Cereal) -> bool {
        let removed = match self.levels.get(&cereal) {
            Some(&level) if level == 0.0 => {
                self.levels.remove(&cereal);
                true
            }
            _ => false,
        };

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "remove_container",
            cereal = cereal.label(),
            removed = removed,
            containers = self.levels.len() as u64,
        );

        removed
    }

    // === QUERIES ===

    pub fn amount(&self, cereal: Cereal) -> f32 {
        match self.levels.get(&cereal) {
            Some(&level) => level,
            None => 0.0,
        }
    }

    /// Free space in the container for `cereal`, as if it were allocated.
    pub fn space(&self, cereal: Cereal) -> f32 {
        self.container_capacity - self.amount(cereal)
    }

    pub fn contains(&self, cereal: Cereal) -> bool {
        self.levels.contains_key(&cereal)
    }

    pub fn container_count(&self) -> usize {
        self.levels.len()
    }

    /// How many containers fit in the storage; `None` when containers take no space.
    pub fn max_containers(&self) -> Option<usize> {
        if self.container_capacity == 0.0 {
            return None;
        }
        Some((self.storage_capacity / self.container_capacity).floor() as usize)
    }

    pub fn total_amount(&self) -> f32 {
        self.levels.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn snapshot(&self) -> StorageSnapshot {
        StorageSnapshot {
            container_capacity: self.container_capacity,
            storage_capacity: self.storage_capacity,
            containers: self
                .sorted_levels()
                .into_iter()
                .map(|(cereal, amount)| ContainerSnapshot {
                    cereal,
                    label: cereal.label().to_string(),
                    amount,
                    space: self.container_capacity - amount,
                })
                .collect(),
        }
    }

    /// Human-readable summary; same text as the `Display` impl.
    pub fn describe(&self) -> String {
        self.to_string()
    }

    // === INTERNALS ===

    fn can_allocate(&self) -> bool {
        (self.levels.len() + 1) as f32 * self.container_capacity <= self.storage_capacity
    }

    fn sorted_levels(&self) -> Vec<(Cereal, f32)> {
        let mut entries: Vec<(Cereal, f32)> = self.levels.iter().map(|(&c, &a)| (c, a)).collect();
        entries.sort_by(|a, b| a.0.label().cmp(b.0.label()));
        entries
    }

    #[cfg_attr(not(feature = "instrument"), allow(unused_variables))]
    fn reject(&self, cereal: Cereal, err: StorageError) -> StorageError {
        #[cfg(feature = "instrument")]
        tracing::warn!(
            target: "storage_rejected",
            cereal = cereal.label(),
            kind = err.kind(),
            containers = self.levels.len() as u64,
        );
        err
    }
}

impl fmt::Display for CerealStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{HEADER_PREFIX}: вместимость = {}, размер контейнера = {}",
            format_quantity(self.storage_capacity),
            format_quantity(self.container_capacity),
        )?;

        if self.levels.is_empty() {
            return write!(f, ", {EMPTY_MARKER}");
        }

        for (cereal, amount) in self.sorted_levels() {
            write!(
                f,
                "\n{}: {}/{}",
                cereal.label(),
                format_quantity(amount),
                format_quantity(self.container_capacity),
            )?;
        }
        Ok(())
    }
}

/// Quantity text as a JVM float prints it: plain decimal in `[1e-3, 1e7)` and
/// for zero, `d.dddE<n>` otherwise; the mantissa always keeps a fraction digit.
fn format_quantity(value: f32) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        let plain = format!("{value}");
        return if plain.contains('.') { plain } else { format!("{plain}.0") };
    }

    let scientific = format!("{value:e}");
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if mantissa.contains('.') => format!("{mantissa}E{exponent}"),
        Some((mantissa, exponent)) => format!("{mantissa}.0E{exponent}"),
        None => scientific,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> CerealStorage {
        CerealStorage::new(10.0, 20.0).unwrap()
    }

    fn assert_close(expected: f32, actual: f32) {
        assert!(
            (expected - actual).abs() < 0.01,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_negative_container_capacity_fails() {
        let err = CerealStorage::new(-4.0, 10.0).unwrap_err();
        assert!(matches!(err, StorageError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_storage_smaller_than_container_fails() {
        let err = CerealStorage::new(10.0, 9.5).unwrap_err();
        assert!(matches!(err, StorageError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_add_to_empty_container() {
        let mut s = storage();
        assert_close(0.0, s.add_cereal(Cereal::Rice, 5.0).unwrap());
        assert_close(5.0, s.amount(Cereal::Rice));
    }

    #[test]
    fn test_add_returns_leftover_when_full() {
        let mut s = storage();
        s.add_cereal(Cereal::Rice, 7.0).unwrap();
        assert_close(2.0, s.add_cereal(Cereal::Rice, 5.0).unwrap());
        assert_close(10.0, s.amount(Cereal::Rice));
    }

    #[test]
    fn test_negative_add_leaves_state_unchanged() {
        let mut s = storage();
        s.add_cereal(Cereal::Rice, 3.0).unwrap();
        let err = s.add_cereal(Cereal::Rice, -5.0).unwrap_err();
        assert!(matches!(err, StorageError::InvalidArgument { .. }));
        assert_close(3.0, s.amount(Cereal::Rice));
        assert_eq!(s.container_count(), 1);
    }

    #[test]
    fn test_nan_amount_is_invalid() {
        let mut s = storage();
        assert!(matches!(
            s.add_cereal(Cereal::Rice, f32::NAN),
            Err(StorageError::InvalidArgument { .. })
        ));
        assert!(matches!(
            s.take_cereal(Cereal::Rice, f32::NAN),
            Err(StorageError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_storage_full_for_new_cereal() {
        let mut s = storage();
        s.add_cereal(Cereal::Rice, 10.0).unwrap();
        s.add_cereal(Cereal::Buckwheat, 10.0).unwrap();
        let err = s.add_cereal(Cereal::Millet, 5.0).unwrap_err();
        assert!(matches!(
            err,
            StorageError::StorageFull {
                cereal: Cereal::Millet,
                containers: 2,
                ..
            }
        ));
        assert!(!s.contains(Cereal::Millet));
    }

    #[test]
    fn test_existing_container_accepts_adds_when_storage_full() {
        let mut s = storage();
        s.add_cereal(Cereal::Rice, 4.0).unwrap();
        s.add_cereal(Cereal::Buckwheat, 10.0).unwrap();
        assert_close(0.0, s.add_cereal(Cereal::Rice, 6.0).unwrap());
        assert_close(10.0, s.amount(Cereal::Rice));
    }

    #[test]
    fn test_zero_add_allocates_empty_container() {
        let mut s = storage();
        assert_close(0.0, s.add_cereal(Cereal::Rice, 0.0).unwrap());
        assert!(s.contains(Cereal::Rice));
        assert_eq!(s.container_count(), 1);
        assert!(s.remove_container(Cereal::Rice));
        assert!(s.is_empty());
    }

    #[test]
    fn test_zero_add_fails_when_no_room() {
        let mut s = storage();
        s.add_cereal(Cereal::Rice, 1.0).unwrap();
        s.add_cereal(Cereal::Buckwheat, 1.0).unwrap();
        assert!(matches!(
            s.add_cereal(Cereal::Peas, 0.0),
            Err(StorageError::StorageFull { .. })
        ));
    }

    #[test]
    fn test_take_more_than_available() {
        let mut s = storage();
        s.add_cereal(Cereal::Rice, 5.0).unwrap();
        assert_close(5.0, s.take_cereal(Cereal::Rice, 8.0).unwrap());
        assert_close(0.0, s.amount(Cereal::Rice));
        assert!(!s.contains(Cereal::Rice));
    }

    #[test]
    fn test_take_from_unknown_cereal_is_zero() {
        let mut s = storage();
        assert_close(0.0, s.take_cereal(Cereal::Rice, 5.0).unwrap());
        assert!(s.is_empty());
    }

    #[test]
    fn test_zero_take_keeps_empty_container() {
        let mut s = storage();
        s.add_cereal(Cereal::Rice, 0.0).unwrap();
        assert_close(0.0, s.take_cereal(Cereal::Rice, 0.0).unwrap());
        assert!(s.contains(Cereal::Rice));
    }

    #[test]
    fn test_remove_non_empty_container_fails() {
        let mut s = storage();
        s.add_cereal(Cereal::Rice, 5.0).unwrap();
        assert!(!s.remove_container(Cereal::Rice));
        assert_close(5.0, s.amount(Cereal::Rice));
    }

    #[test]
    fn test_remove_missing_container_fails() {
        let mut s = storage();
        assert!(!s.remove_container(Cereal::Rice));
    }

    #[test]
    fn test_space_reports_unallocated_as_full_container() {
        let mut s = storage();
        assert_close(10.0, s.space(Cereal::Rice));
        s.add_cereal(Cereal::Rice, 7.0).unwrap();
        assert_close(3.0, s.space(Cereal::Rice));
    }

    #[test]
    fn test_max_containers() {
        assert_eq!(storage().max_containers(), Some(2));
        assert_eq!(CerealStorage::new(3.0, 10.0).unwrap().max_containers(), Some(3));
        assert_eq!(CerealStorage::new(0.0, 10.0).unwrap().max_containers(), None);
    }

    #[test]
    fn test_zero_capacity_containers_never_fill_storage() {
        let mut s = CerealStorage::new(0.0, 0.0).unwrap();
        for cereal in Cereal::all() {
            assert_close(3.0, s.add_cereal(cereal, 3.0).unwrap());
        }
        assert_eq!(s.container_count(), Cereal::all().count());
        assert_close(0.0, s.total_amount());
    }

    #[test]
    fn test_total_amount_and_snapshot_order() {
        let mut s = storage();
        s.add_cereal(Cereal::Rice, 7.5).unwrap();
        s.add_cereal(Cereal::Buckwheat, 4.0).unwrap();
        assert_close(11.5, s.total_amount());

        let snap = s.snapshot();
        let cereals: Vec<_> = snap.containers.iter().map(|c| c.cereal).collect();
        assert_eq!(cereals, vec![Cereal::Buckwheat, Cereal::Rice]);
        assert_close(2.5, snap.containers[1].space);
        assert_close(11.5, snap.total_amount());
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(20.0), "20.0");
        assert_eq!(format_quantity(7.5), "7.5");
        assert_eq!(format_quantity(0.0), "0.0");
        assert_eq!(format_quantity(0.1), "0.1");
        assert_eq!(format_quantity(1234567.0), "1234567.0");
    }

    #[test]
    fn test_format_quantity_switches_to_exponent_outside_plain_range() {
        assert_eq!(format_quantity(0.001), "0.001");
        assert_eq!(format_quantity(0.0005), "5.0E-4");
        assert_eq!(format_quantity(0.00012345), "1.2345E-4");
        assert_eq!(format_quantity(9999999.0), "9999999.0");
        assert_eq!(format_quantity(1e7), "1.0E7");
        assert_eq!(format_quantity(2e7), "2.0E7");
        assert_eq!(format_quantity(1.5e8), "1.5E8");
        assert_eq!(format_quantity(f32::INFINITY), "Infinity");
    }

    #[test]
    fn test_describe_large_and_tiny_quantities() {
        let mut s = CerealStorage::new(1e7, 2e7).unwrap();
        s.add_cereal(Cereal::Rice, 0.0005).unwrap();
        assert_eq!(
            s.describe(),
            "Хранилище: вместимость = 2.0E7, размер контейнера = 1.0E7\nРис: 5.0E-4/1.0E7"
        );
    }

    #[test]
    fn test_filling_add_lands_exactly_on_capacity() {
        let mut s = CerealStorage::new(3.3, 10.0).unwrap();
        s.add_cereal(Cereal::Rice, 0.070907).unwrap();
        let leftover = s.add_cereal(Cereal::Rice, 3.3).unwrap();

        assert_eq!(s.amount(Cereal::Rice), 3.3);
        assert_eq!(s.space(Cereal::Rice), 0.0);
        assert!(leftover > 0.0 && leftover < 0.1, "leftover {leftover}");
    }

    #[test]
    fn test_describe_empty() {
        assert_eq!(
            storage().describe(),
            "Хранилище: вместимость = 20.0, размер контейнера = 10.0, пусто"
        );
    }

    #[test]
    fn test_describe_single_cereal() {
        let mut s = storage();
        s.add_cereal(Cereal::Rice, 7.5).unwrap();
        assert_eq!(
            s.describe(),
            "Хранилище: вместимость = 20.0, размер контейнера = 10.0\nРис: 7.5/10.0"
        );
    }
}
