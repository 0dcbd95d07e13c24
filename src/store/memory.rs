//! In-memory record store.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::store::{Fields, Record, RecordStore};

/// A thread-safe store keeping records in a concurrent map.
#[derive(Debug)]
pub struct MemoryStore {
    next_id: AtomicU64,
    records: DashMap<u64, Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            records: DashMap::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn create(&self, mut fields: Fields) -> Record {
        fields.remove("id");
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = Record { id, fields };
        self.records.insert(id, record.clone());
        record
    }

    fn all(&self) -> Vec<Record> {
        let mut records: Vec<Record> = self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|r| r.id);
        records
    }

    fn find(&self, id: u64) -> Option<Record> {
        self.records.get(&id).map(|r| r.value().clone())
    }

    fn update(&self, id: u64, mut fields: Fields) -> Option<Record> {
        fields.remove("id");
        let mut entry = self.records.get_mut(&id)?;
        entry.fields.extend(fields);
        Some(entry.value().clone())
    }

    fn delete(&self, id: u64) -> Option<Record> {
        self.records.remove(&id).map(|(_, record)| record)
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_crud() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        let dune = store.create(fields(json!({"title": "Dune", "year": 2021, "id": 99})));
        let arrival = store.create(fields(json!({"title": "Arrival"})));
        assert_eq!(dune.id, 1);
        assert_eq!(arrival.id, 2);
        assert!(!dune.fields.contains_key("id"));

        let updated = store.update(2, fields(json!({"year": 2016}))).unwrap();
        assert_eq!(updated.fields["title"], "Arrival");
        assert_eq!(updated.fields["year"], 2016);

        assert_eq!(store.all().iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(store.delete(1).unwrap().fields["title"], "Dune");
        assert!(store.find(1).is_none());
        assert!(store.update(1, Fields::new()).is_none());
        assert_eq!(store.len(), 1);

        // Ids are not reused.
        assert_eq!(store.create(Fields::new()).id, 3);
    }

    #[test]
    fn test_record_serializes_flat() {
        let store = MemoryStore::new();
        let record = store.create(fields(json!({"title": "", "year": 2021})));
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"id": 1, "title": "", "year": 2021})
        );
    }

    #[test]
    fn test_concurrent_creates_get_unique_ids() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || (0..100).map(|_| store.create(Fields::new()).id).collect::<Vec<_>>())
            })
            .collect();

        let ids: HashSet<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        assert_eq!(ids.len(), 800);
        assert_eq!(store.len(), 800);
    }
}
