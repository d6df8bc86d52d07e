use serde_json::Value;
use std::collections::BTreeMap;

/// Mutable ordered key/value store that actions write to.
///
/// `snapshot` and `restore` are full-store copies: rollback discards every
/// mutation made since the snapshot, never a partial subset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataStore {
    entries: BTreeMap<String, Value>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn put(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Full copy of the store at this point in time.
    pub fn snapshot(&self) -> DataStore {
        self.clone()
    }

    /// Full replace from a previously taken snapshot.
    pub fn restore(&mut self, snapshot: DataStore) {
        self.entries = snapshot.entries;
    }
}

/// Read-only key/value store (request, subject, environment attributes).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueStore {
    entries: BTreeMap<String, Value>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for ValueStore {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_then_restore_discards_mutations() {
        let mut store = DataStore::new();
        store.put("keep", json!("before"));

        let snapshot = store.snapshot();
        store.put("keep", json!("after"));
        store.put("new", json!(1));
        store.remove("keep");

        store.restore(snapshot);
        assert_eq!(store.get("keep"), Some(&json!("before")));
        assert!(!store.contains("new"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn snapshot_is_independent() {
        let mut store = DataStore::new();
        store.put("a", json!(1));
        let snapshot = store.snapshot();
        store.put("a", json!(2));
        assert_eq!(snapshot.get("a"), Some(&json!(1)));
    }
}
