//! Journal of storage operations, collected from `tracing` events into
//! column-oriented tables.
//!
//! Every event target becomes a table (`add_cereal`, `take_cereal`, ...) and
//! every event field becomes a column. Columns appear the first time a field
//! is seen; rows that lack a field get a default cell.
//!
//! # Usage
//!
//! ```ignore
//! // In storage code:
//! tracing::info!(target: "add_cereal", cereal = "Рис", requested, accepted);
//!
//! // In test:
//! let journal = instrument::record(|| { /* ... drive the storage ... */ });
//! let adds = journal.table("add_cereal").unwrap();
//! assert_eq!(adds.f64_column("accepted"), Some(&[5.0][..]));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Id, Level, Metadata, Subscriber};

/// Cells of one column, all of the same type.
#[derive(Debug, Clone, PartialEq)]
pub enum Cells {
    U64(Vec<u64>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Text(Vec<String>),
}

impl Cells {
    pub fn len(&self) -> usize {
        match self {
            Cells::U64(v) => v.len(),
            Cells::I64(v) => v.len(),
            Cells::F64(v) => v.len(),
            Cells::Bool(v) => v.len(),
            Cells::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn pad_to(&mut self, rows: usize) {
        let missing = rows.saturating_sub(self.len());
        match self {
            Cells::U64(v) => v.extend(std::iter::repeat_n(0, missing)),
            Cells::I64(v) => v.extend(std::iter::repeat_n(0, missing)),
            Cells::F64(v) => v.extend(std::iter::repeat_n(0.0, missing)),
            Cells::Bool(v) => v.extend(std::iter::repeat_n(false, missing)),
            Cells::Text(v) => v.extend(std::iter::repeat_n(String::new(), missing)),
        }
    }
}

/// All events recorded under one target.
#[derive(Debug, Clone, Default)]
pub struct OperationTable {
    pub columns: HashMap<String, Cells>,
    pub row_count: usize,
}

impl OperationTable {
    /// Bring every column up to `row_count` cells.
    fn align(&mut self) {
        for cells in self.columns.values_mut() {
            cells.pad_to(self.row_count);
        }
    }

    pub fn f64_column(&self, name: &str) -> Option<&[f64]> {
        match self.columns.get(name)? {
            Cells::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn u64_column(&self, name: &str) -> Option<&[u64]> {
        match self.columns.get(name)? {
            Cells::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn bool_column(&self, name: &str) -> Option<&[bool]> {
        match self.columns.get(name)? {
            Cells::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn text_column(&self, name: &str) -> Option<&[String]> {
        match self.columns.get(name)? {
            Cells::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Tables keyed by tracing target.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    pub tables: HashMap<String, OperationTable>,
}

impl Journal {
    pub fn table(&self, target: &str) -> Option<&OperationTable> {
        self.tables.get(target)
    }

    /// Rows recorded under `target`; zero when nothing was recorded.
    pub fn rows(&self, target: &str) -> usize {
        self.table(target).map_or(0, |t| t.row_count)
    }
}

thread_local! {
    static JOURNAL: RefCell<Journal> = RefCell::default();
}

/// Writes one event's fields into the current row of a table.
struct RowWriter<'a> {
    table: &'a mut OperationTable,
}

impl RowWriter<'_> {
    /// New columns start pre-padded for earlier rows, so a push lands in the current row.
    fn cells(&mut self, field: &Field, empty: impl FnOnce() -> Cells) -> &mut Cells {
        let rows = self.table.row_count;
        self.table
            .columns
            .entry(field.name().to_string())
            .or_insert_with(|| {
                let mut cells = empty();
                cells.pad_to(rows);
                cells
            })
    }
}

impl Visit for RowWriter<'_> {
    fn record_u64(&mut self, field: &Field, value: u64) {
        if let Cells::U64(v) = self.cells(field, || Cells::U64(Vec::new())) {
            v.push(value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if let Cells::I64(v) = self.cells(field, || Cells::I64(Vec::new())) {
            v.push(value);
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let Cells::F64(v) = self.cells(field, || Cells::F64(Vec::new())) {
            v.push(value);
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if let Cells::Bool(v) = self.cells(field, || Cells::Bool(Vec::new())) {
            v.push(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if let Cells::Text(v) = self.cells(field, || Cells::Text(Vec::new())) {
            v.push(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{:?}", value));
    }
}

impl Journal {
    /// Append `event` as a new row of its target's table.
    fn append(&mut self, event: &Event<'_>) {
        let table = self
            .tables
            .entry(event.metadata().target().to_string())
            .or_default();

        table.align();
        event.record(&mut RowWriter { table: &mut *table });
        table.row_count += 1;
        table.align();
    }
}

/// Journals events at or above `threshold` into the current thread's journal.
/// Spans are not tracked.
#[derive(Debug, Clone, Copy)]
pub struct JournalSubscriber {
    threshold: Level,
}

impl JournalSubscriber {
    pub fn new(threshold: Level) -> Self {
        Self { threshold }
    }
}

impl Default for JournalSubscriber {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl Subscriber for JournalSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= self.threshold
    }

    fn max_level_hint(&self) -> Option<LevelFilter> {
        Some(LevelFilter::from_level(self.threshold))
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        JOURNAL.with(|j| j.borrow_mut().append(event));
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Journal every thread's events process-wide. Has no effect once any global
/// subscriber is set.
pub fn install(threshold: Level) {
    let _ = tracing::subscriber::set_global_default(JournalSubscriber::new(threshold));
}

pub fn take_journal() -> Journal {
    JOURNAL.with(|j| std::mem::take(&mut *j.borrow_mut()))
}

/// Journal the info-and-above events `f` emits on this thread.
pub fn record(f: impl FnOnce()) -> Journal {
    record_at(Level::INFO, f)
}

pub fn record_at(threshold: Level, f: impl FnOnce()) -> Journal {
    let _ = take_journal();
    tracing::subscriber::with_default(JournalSubscriber::new(threshold), f);
    take_journal()
}

// === Polars Integration ===

use polars::prelude::*;

impl OperationTable {
    /// Columns come out ordered by name.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut names: Vec<&String> = self.columns.keys().collect();
        names.sort();

        let columns = names
            .into_iter()
            .map(|name| match &self.columns[name] {
                Cells::U64(v) => Column::new(name.into(), v),
                Cells::I64(v) => Column::new(name.into(), v),
                Cells::F64(v) => Column::new(name.into(), v),
                Cells::Bool(v) => Column::new(name.into(), v),
                Cells::Text(v) => Column::new(name.into(), v),
            })
            .collect();

        DataFrame::new(columns)
    }
}

impl Journal {
    pub fn to_dataframes(&self) -> PolarsResult<HashMap<String, DataFrame>> {
        self.tables
            .iter()
            .map(|(target, table)| Ok((target.clone(), table.to_dataframe()?)))
            .collect()
    }
}
