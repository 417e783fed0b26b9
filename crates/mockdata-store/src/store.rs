//! DataStore — lock-guarded in-memory document for mockd.
//!
//! Provides single-key CRUD over the record table, the index/record join
//! behind path lookups, and offset/limit listing. A single `RwLock` guards
//! the entire document: lookups take the read lock, mutations the write lock.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::types::*;

/// RFC 850 layout, e.g. `Monday, 02-Jan-06 15:04:05 UTC`.
const STATUS_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S UTC";

/// Thread-safe handle to the in-memory document.
///
/// Cloning is cheap; all clones share the same document.
#[derive(Clone, Default)]
pub struct DataStore {
    doc: Arc<RwLock<Document>>,
}

impl DataStore {
    /// Take ownership of a loaded document.
    pub fn new(doc: Document) -> Self {
        debug!(keys = doc.len(), "data store created");
        Self {
            doc: Arc::new(RwLock::new(doc)),
        }
    }

    /// Every critical section leaves the map valid, so a poisoned lock is
    /// still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, Document> {
        self.doc.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Document> {
        self.doc.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current server time as a human-readable timestamp.
    pub fn status(&self) -> String {
        format_status_time(Utc::now())
    }

    /// Number of records in the record table.
    pub fn record_count(&self) -> usize {
        record_table(&self.read()).map_or(0, Map::len)
    }

    /// Get a record by id.
    pub fn get(&self, id: &str) -> StoreResult<Value> {
        let doc = self.read();
        lookup_record(&doc, id).cloned()
    }

    /// Join the index entry `path` against the record table.
    pub fn get_by_path(&self, path: &str) -> StoreResult<PathView> {
        let doc = self.read();
        let entry = doc
            .get(path)
            .and_then(IndexEntry::from_value)
            .ok_or_else(|| {
                debug!(path, "index entry missing or malformed");
                StoreError::NotFound(format!("path {path}"))
            })?;
        let records = record_table(&doc).ok_or_else(|| {
            debug!(path, "record table missing or malformed");
            StoreError::NotFound(RECORD_TABLE.to_string())
        })?;

        let cards = entry
            .cards
            .iter()
            .map(|id| records.get(*id).cloned().unwrap_or(Value::Null))
            .collect();

        Ok(PathView {
            cards,
            total_count: entry.total_count.clone(),
            per_page_count: entry.per_page_count.clone(),
        })
    }

    /// List up to `limit` records after skipping the first `offset`.
    ///
    /// Order is the record table's iteration order at call time; there is no
    /// snapshot across calls.
    pub fn list_all(&self, offset: usize, limit: usize) -> Vec<Value> {
        let doc = self.read();
        let Some(records) = record_table(&doc) else {
            return Vec::new();
        };
        let offset = offset.min(records.len());
        records.values().skip(offset).take(limit).cloned().collect()
    }

    /// Store `value` under `id`, overwriting any existing record.
    ///
    /// Returns the record as read back from the table.
    pub fn put<T: Serialize + ?Sized>(&self, id: &str, value: &T) -> StoreResult<Value> {
        let value = serde_json::to_value(value).map_err(|e| StoreError::Serialize(e.to_string()))?;

        let mut doc = self.write();
        let records = match doc
            .entry(RECORD_TABLE)
            .or_insert_with(|| Value::Object(Map::new()))
        {
            Value::Object(records) => records,
            _ => return Err(StoreError::NotFound(RECORD_TABLE.to_string())),
        };
        records.insert(id.to_string(), value);
        debug!(id, "record stored");

        lookup_record(&doc, id).cloned()
    }

    /// Remove `id` from the record table, then verify it is gone.
    ///
    /// Removal and verification share one write-lock critical section, so no
    /// other writer can interleave between them.
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        let mut doc = self.write();
        if let Some(Value::Object(records)) = doc.get_mut(RECORD_TABLE) {
            records.remove(id);
        }

        match lookup_record(&doc, id) {
            Err(_) => {
                debug!(id, "record deleted");
                Ok(())
            }
            Ok(_) => Err(StoreError::OperationFailed(format!("record {id} still present"))),
        }
    }
}

/// Format a timestamp the way [`DataStore::status`] reports it.
pub fn format_status_time(at: DateTime<Utc>) -> String {
    at.format(STATUS_FORMAT).to_string()
}

fn record_table(doc: &Document) -> Option<&Map<String, Value>> {
    doc.get(RECORD_TABLE).and_then(Value::as_object)
}

fn lookup_record<'a>(doc: &'a Document, id: &str) -> StoreResult<&'a Value> {
    record_table(doc)
        .and_then(|records| records.get(id))
        .ok_or_else(|| StoreError::NotFound(format!("record {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::thread;

    fn store_from(value: Value) -> DataStore {
        match value {
            Value::Object(doc) => DataStore::new(doc),
            other => panic!("test document must be an object, got {other}"),
        }
    }

    fn abc_store() -> DataStore {
        store_from(json!({"all_data": {"1": "A", "2": "B", "3": "C"}}))
    }

    // ── Status ─────────────────────────────────────────────────────

    #[test]
    fn status_uses_rfc850_layout() {
        let at = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();
        assert_eq!(format_status_time(at), "Monday, 02-Jan-06 15:04:05 UTC");
    }

    #[test]
    fn status_never_fails_on_empty_store() {
        let store = DataStore::default();
        assert!(store.status().ends_with("UTC"));
    }

    // ── Get ────────────────────────────────────────────────────────

    #[test]
    fn get_on_empty_store_is_not_found() {
        let store = DataStore::default();
        assert!(matches!(store.get("x"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn get_with_malformed_record_table_is_not_found() {
        let store = store_from(json!({"all_data": ["not", "a", "map"]}));
        assert!(matches!(store.get("0"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn get_uses_ids_verbatim() {
        let store = store_from(json!({"all_data": {"Ace": 1}}));
        assert_eq!(store.get("Ace").unwrap(), json!(1));
        assert!(store.get("ace").is_err());
        assert!(store.get(" Ace").is_err());
    }

    // ── Put ────────────────────────────────────────────────────────

    #[test]
    fn put_then_get_round_trips() {
        let store = DataStore::default();
        let stored = store.put("42", &json!({"name": "Ace"})).unwrap();
        assert_eq!(stored, json!({"name": "Ace"}));
        assert_eq!(store.get("42").unwrap(), json!({"name": "Ace"}));
    }

    #[test]
    fn put_overwrites_existing_record() {
        let store = abc_store();
        store.put("2", &json!({"rank": 2})).unwrap();
        assert_eq!(store.get("2").unwrap(), json!({"rank": 2}));
        assert_eq!(store.record_count(), 3);
    }

    #[test]
    fn put_round_trips_nested_values() {
        let store = DataStore::default();
        let value = json!({
            "name": "Ace",
            "tags": ["a", 1, 2.5, null, true],
            "nested": {"deep": {"deeper": []}}
        });
        store.put("nested", &value).unwrap();
        assert_eq!(store.get("nested").unwrap(), value);
    }

    #[test]
    fn put_accepts_typed_values() {
        #[derive(Serialize)]
        struct Card {
            name: &'static str,
            cost: u32,
        }
        let store = DataStore::default();
        store.put("c", &Card { name: "Ace", cost: 3 }).unwrap();
        assert_eq!(store.get("c").unwrap(), json!({"name": "Ace", "cost": 3}));
    }

    #[test]
    fn put_unserializable_value_is_serialization_error() {
        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8], "non-string key");
        let store = DataStore::default();
        assert!(matches!(store.put("bad", &bad), Err(StoreError::Serialize(_))));
        assert!(store.get("bad").is_err());
    }

    #[test]
    fn put_into_malformed_record_table_is_not_found() {
        let store = store_from(json!({"all_data": "oops"}));
        assert!(matches!(store.put("1", &json!(1)), Err(StoreError::NotFound(_))));
    }

    // ── Delete ─────────────────────────────────────────────────────

    #[test]
    fn delete_after_put_removes_record() {
        let store = DataStore::default();
        store.put("42", &json!({"name": "Ace"})).unwrap();
        store.delete("42").unwrap();
        assert!(matches!(store.get("42"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn delete_missing_record_succeeds() {
        let store = abc_store();
        store.delete("nope").unwrap();
        assert_eq!(store.record_count(), 3);
    }

    #[test]
    fn delete_without_record_table_succeeds() {
        let store = DataStore::default();
        store.delete("x").unwrap();
    }

    // ── Path join ──────────────────────────────────────────────────

    #[test]
    fn get_by_path_substitutes_null_for_missing_ids() {
        let store = store_from(json!({
            "all_data": {"a": "X"},
            "p": {"cards": ["a", "b"], "total_count": 2, "per_page_count": 10}
        }));
        let view = store.get_by_path("p").unwrap();
        assert_eq!(view.cards, vec![json!("X"), Value::Null]);
        assert_eq!(view.total_count, serde_json::Number::from(2u64));
        assert_eq!(view.per_page_count, serde_json::Number::from(10u64));
    }

    #[test]
    fn get_by_path_copies_counts_unchanged() {
        let store = store_from(json!({
            "all_data": {"a": "X"},
            "q": {"cards": ["a"], "total_count": 2.5, "per_page_count": -1}
        }));
        let view = store.get_by_path("q").unwrap();
        assert_eq!(view.cards, vec![json!("X")]);
        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            json!({"cards": ["X"], "total_count": 2.5, "per_page_count": -1})
        );
    }

    #[test]
    fn get_by_path_preserves_card_order_and_duplicates() {
        let store = store_from(json!({
            "all_data": {"a": 1, "b": 2},
            "p": {"cards": ["b", "a", "b"], "total_count": 3, "per_page_count": 3}
        }));
        let view = store.get_by_path("p").unwrap();
        assert_eq!(view.cards, vec![json!(2), json!(1), json!(2)]);
    }

    #[test]
    fn get_by_path_sees_later_writes() {
        let store = store_from(json!({
            "all_data": {},
            "p": {"cards": ["a"], "total_count": 1, "per_page_count": 10}
        }));
        assert_eq!(store.get_by_path("p").unwrap().cards, vec![Value::Null]);
        store.put("a", &json!("fresh")).unwrap();
        assert_eq!(store.get_by_path("p").unwrap().cards, vec![json!("fresh")]);
    }

    #[test]
    fn get_by_path_missing_key_is_not_found() {
        let store = abc_store();
        assert!(matches!(store.get_by_path("nope"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn get_by_path_wrong_shape_is_not_found() {
        let store = store_from(json!({
            "all_data": {"a": 1},
            "p": {"cards": "a", "total_count": 1, "per_page_count": 10}
        }));
        assert!(matches!(store.get_by_path("p"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn get_by_path_without_record_table_is_not_found() {
        let store = store_from(json!({
            "p": {"cards": ["a"], "total_count": 1, "per_page_count": 10}
        }));
        assert!(matches!(store.get_by_path("p"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn record_table_is_not_an_index_entry() {
        let store = abc_store();
        assert!(store.get_by_path(RECORD_TABLE).is_err());
    }

    // ── Listing ────────────────────────────────────────────────────

    #[test]
    fn list_all_skips_offset_and_honors_limit() {
        let store = abc_store();
        assert_eq!(store.list_all(1, 1), vec![json!("B")]);
        assert_eq!(store.list_all(0, 2), vec![json!("A"), json!("B")]);
        assert_eq!(store.list_all(1, 10), vec![json!("B"), json!("C")]);
    }

    #[test]
    fn list_all_out_of_range_is_empty() {
        let store = abc_store();
        assert!(store.list_all(3, 5).is_empty());
        assert!(store.list_all(usize::MAX, usize::MAX).is_empty());
        assert!(store.list_all(0, 0).is_empty());
    }

    #[test]
    fn list_all_without_record_table_is_empty() {
        let store = DataStore::default();
        assert!(store.list_all(0, 10).is_empty());
    }

    #[test]
    fn list_all_pages_cover_table_once() {
        let store = DataStore::default();
        for i in 0..25 {
            store.put(&format!("{i:02}"), &json!(i)).unwrap();
        }
        let mut seen = Vec::new();
        let mut offset = 0;
        loop {
            let page = store.list_all(offset, 10);
            assert!(page.len() <= 10);
            if page.is_empty() {
                break;
            }
            offset += page.len();
            seen.extend(page);
        }
        assert_eq!(seen, (0..25).map(|i| json!(i)).collect::<Vec<_>>());
    }

    // ── Concurrency ────────────────────────────────────────────────

    #[test]
    fn concurrent_writers_and_readers() {
        let store = DataStore::default();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        let id = format!("{t}-{i}");
                        store.put(&id, &json!({"t": t, "i": i})).unwrap();
                        assert_eq!(store.get(&id).unwrap(), json!({"t": t, "i": i}));
                        let _ = store.list_all(0, 5);
                        if i % 2 == 0 {
                            store.delete(&id).unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.record_count(), 8 * 50);
    }
}
