use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::error::{FilterError, LoadError};
use super::filter::{apply_filters, FilterSelection};
use super::loader::load_csv;
use super::model::RecordTable;
use crate::config::NormalizeConfig;

/// 64-bit content hash used as a memo key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn of<T: Hash + ?Sized>(value: &T) -> Self {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        Fingerprint(hasher.finish())
    }
}

// ---------------------------------------------------------------------------
// Session-scoped memo of loaded and filtered tables
// ---------------------------------------------------------------------------

/// Append-only memo owned by one session. Entries are shared read-only via
/// `Arc` and never replaced once written.
#[derive(Debug, Default)]
pub struct SessionCache {
    loaded: HashMap<Fingerprint, Arc<RecordTable>>,
    filtered: HashMap<(Fingerprint, Fingerprint), Arc<RecordTable>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `content`, reusing the table from an identical earlier upload.
    pub fn load(
        &mut self,
        content: &[u8],
        config: &NormalizeConfig,
    ) -> Result<(Fingerprint, Arc<RecordTable>), LoadError> {
        let key = Fingerprint::of(&(content, config));
        if let Some(table) = self.loaded.get(&key) {
            log::debug!("Reusing cached table {key:?}");
            return Ok((key, Arc::clone(table)));
        }
        let table = Arc::new(load_csv(content, config)?);
        self.loaded.insert(key, Arc::clone(&table));
        log::debug!("{} table(s) cached this session", self.loaded.len());
        Ok((key, table))
    }

    /// Filter the table identified by `table_key`, reusing an earlier result
    /// for the same selection.
    pub fn filter(
        &mut self,
        table_key: Fingerprint,
        table: &RecordTable,
        selection: &FilterSelection,
    ) -> Result<Arc<RecordTable>, FilterError> {
        let key = (table_key, Fingerprint::of(selection));
        if let Some(filtered) = self.filtered.get(&key) {
            return Ok(Arc::clone(filtered));
        }
        let filtered = Arc::new(apply_filters(table, selection)?);
        self.filtered.insert(key, Arc::clone(&filtered));
        Ok(filtered)
    }
}
