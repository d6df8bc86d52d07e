use std::collections::BTreeMap;
use verdict_types::{EntityKind, PolicyResult};

/// Decision cache keyed by `(kind, identity-key)`.
///
/// Scoped to one context by default; a host that deliberately shares a
/// cache store across calls takes responsibility for invalidation.
pub trait DecisionCache {
    fn has(&self, kind: EntityKind, key: &str) -> bool;
    fn get(&self, kind: EntityKind, key: &str) -> Option<PolicyResult>;
    fn put(&mut self, kind: EntityKind, key: &str, value: PolicyResult);
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryCache {
    entries: BTreeMap<(EntityKind, String), PolicyResult>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DecisionCache for InMemoryCache {
    fn has(&self, kind: EntityKind, key: &str) -> bool {
        self.entries.contains_key(&(kind, key.to_string()))
    }

    fn get(&self, kind: EntityKind, key: &str) -> Option<PolicyResult> {
        self.entries.get(&(kind, key.to_string())).copied()
    }

    fn put(&mut self, kind: EntityKind, key: &str, value: PolicyResult) {
        self.entries.insert((kind, key.to_string()), value);
    }
}

/// Cache that stores nothing; used when caching is disabled host-wide.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCache;

impl DecisionCache for NoopCache {
    fn has(&self, _kind: EntityKind, _key: &str) -> bool {
        false
    }

    fn get(&self, _kind: EntityKind, _key: &str) -> Option<PolicyResult> {
        None
    }

    fn put(&mut self, _kind: EntityKind, _key: &str, _value: PolicyResult) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_round_trip() {
        let mut cache = InMemoryCache::new();
        assert!(!cache.has(EntityKind::Policy, "p1"));
        cache.put(EntityKind::Policy, "p1", PolicyResult::Permit);
        assert!(cache.has(EntityKind::Policy, "p1"));
        assert_eq!(
            cache.get(EntityKind::Policy, "p1"),
            Some(PolicyResult::Permit)
        );
        // Different kind, same key: distinct slot.
        assert!(!cache.has(EntityKind::Condition, "p1"));
    }

    #[test]
    fn noop_never_stores() {
        let mut cache = NoopCache;
        cache.put(EntityKind::Policy, "p1", PolicyResult::Deny);
        assert_eq!(cache.get(EntityKind::Policy, "p1"), None);
    }
}
