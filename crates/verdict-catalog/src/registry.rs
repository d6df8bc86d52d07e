use crate::entity::CatalogEntity;
use std::collections::BTreeMap;
use std::sync::Arc;
use verdict_types::{Identity, LabelLogic, Version};

/// One id's registrations: at most one unversioned entry plus any number
/// of versioned ones.
struct Slot<T: ?Sized> {
    unversioned: Option<Arc<T>>,
    versioned: BTreeMap<Version, Arc<T>>,
}

impl<T: ?Sized> Default for Slot<T> {
    fn default() -> Self {
        Self {
            unversioned: None,
            versioned: BTreeMap::new(),
        }
    }
}

/// Versioned entity collection enforcing the lookup law:
/// `get(id, None)` prefers the unversioned registration, then the maximum
/// registered version; `get(id, Some(v))` is exact-match-or-none.
/// Re-registering an existing `(id, version)` key is a no-op.
pub struct Registry<T: ?Sized> {
    slots: BTreeMap<String, Slot<T>>,
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }
}

impl<T: ?Sized> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// First registration wins; an identical key is silently ignored.
    pub fn register(&mut self, identity: &Identity, entity: Arc<T>) {
        let slot = self.slots.entry(identity.id.clone()).or_default();
        match &identity.version {
            None => {
                if slot.unversioned.is_none() {
                    slot.unversioned = Some(entity);
                }
            }
            Some(version) => {
                slot.versioned.entry(*version).or_insert(entity);
            }
        }
    }

    pub fn get(&self, id: &str, version: Option<&Version>) -> Option<Arc<T>> {
        self.resolve(id, version).map(|(_, entity)| entity)
    }

    /// Like `get`, but also reports which registration slot answered:
    /// `None` for the unversioned entry, `Some(v)` for a versioned one.
    /// The validator uses this to address graph nodes precisely.
    pub fn resolve(&self, id: &str, version: Option<&Version>) -> Option<(Option<Version>, Arc<T>)> {
        let slot = self.slots.get(id)?;
        match version {
            Some(v) => slot
                .versioned
                .get(v)
                .map(|entity| (Some(*v), Arc::clone(entity))),
            None => slot
                .unversioned
                .as_ref()
                .map(|entity| (None, Arc::clone(entity)))
                .or_else(|| {
                    slot.versioned
                        .last_key_value()
                        .map(|(v, entity)| (Some(*v), Arc::clone(entity)))
                }),
        }
    }

    /// Every registration, in deterministic `(id, unversioned-first,
    /// ascending version)` order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Option<&Version>, &Arc<T>)> {
        self.slots.iter().flat_map(|(id, slot)| {
            slot.unversioned
                .iter()
                .map(move |entity| (id.as_str(), None, entity))
                .chain(
                    slot.versioned
                        .iter()
                        .map(move |(v, entity)| (id.as_str(), Some(v), entity)),
                )
        })
    }

    pub fn all(&self) -> Vec<Arc<T>> {
        self.entries().map(|(_, _, entity)| Arc::clone(entity)).collect()
    }

    pub fn len(&self) -> usize {
        self.slots
            .values()
            .map(|slot| slot.versioned.len() + usize::from(slot.unversioned.is_some()))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<T: ?Sized + CatalogEntity> Registry<T> {
    pub fn search_by_labels(&self, labels: &[String], logic: LabelLogic) -> Vec<Arc<T>> {
        self.entries()
            .filter(|(_, _, entity)| {
                let have = entity.labels();
                match logic {
                    LabelLogic::AnyOf => labels.iter().any(|l| have.contains(l)),
                    LabelLogic::AllOf => labels.iter().all(|l| have.contains(l)),
                }
            })
            .map(|(_, _, entity)| Arc::clone(entity))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use verdict_types::EntityRef;

    #[derive(Debug)]
    struct Stub {
        identity: Identity,
        labels: Vec<String>,
        marker: u32,
    }

    impl CatalogEntity for Stub {
        fn identity(&self) -> Option<&Identity> {
            Some(&self.identity)
        }

        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn child_refs(&self) -> Vec<EntityRef> {
            Vec::new()
        }
    }

    fn stub(identity: Identity, marker: u32) -> Arc<Stub> {
        Arc::new(Stub {
            identity,
            labels: Vec::new(),
            marker,
        })
    }

    #[test]
    fn unversioned_registration_wins_unversioned_lookup() {
        let mut reg: Registry<Stub> = Registry::new();
        reg.register(&Identity::versioned("e", Version::new(9, 0, 0)), stub(Identity::versioned("e", Version::new(9, 0, 0)), 9));
        reg.register(&Identity::new("e"), stub(Identity::new("e"), 0));

        let hit = reg.get("e", None).unwrap();
        assert_eq!(hit.marker, 0);
    }

    #[test]
    fn versionless_lookup_falls_back_to_maximum_version() {
        let mut reg: Registry<Stub> = Registry::new();
        for v in [Version::new(1, 0, 0), Version::new(1, 10, 0), Version::new(1, 2, 0)] {
            reg.register(&Identity::versioned("e", v), stub(Identity::versioned("e", v), v.minor as u32));
        }
        assert_eq!(reg.get("e", None).unwrap().marker, 10);
        assert_eq!(
            reg.get("e", Some(&Version::new(1, 2, 0))).unwrap().marker,
            2
        );
        assert!(reg.get("e", Some(&Version::new(2, 0, 0))).is_none());
        assert!(reg.get("missing", None).is_none());
    }

    #[test]
    fn first_registration_wins() {
        let mut reg: Registry<Stub> = Registry::new();
        let identity = Identity::versioned("e", Version::new(1, 0, 0));
        reg.register(&identity, stub(identity.clone(), 1));
        reg.register(&identity, stub(identity.clone(), 2));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("e", Some(&Version::new(1, 0, 0))).unwrap().marker, 1);
    }

    #[test]
    fn label_search_any_and_all() {
        let mut reg: Registry<Stub> = Registry::new();
        let mut labeled = |id: &str, labels: &[&str]| {
            let identity = Identity::new(id);
            reg.register(
                &identity,
                Arc::new(Stub {
                    identity: identity.clone(),
                    labels: labels.iter().map(|s| s.to_string()).collect(),
                    marker: 0,
                }),
            );
        };
        labeled("a", &["red", "blue"]);
        labeled("b", &["blue"]);
        labeled("c", &["green"]);

        let q = vec!["red".to_string(), "blue".to_string()];
        assert_eq!(reg.search_by_labels(&q, LabelLogic::AnyOf).len(), 2);
        assert_eq!(reg.search_by_labels(&q, LabelLogic::AllOf).len(), 1);
    }

    proptest! {
        /// Version-resolution law: with no unversioned registration, a
        /// versionless lookup always returns the maximum version.
        #[test]
        fn versionless_lookup_is_max(mut versions in proptest::collection::vec((0u64..20, 0u64..20, 0u64..20), 1..8)) {
            let mut reg: Registry<Stub> = Registry::new();
            for &(ma, mi, pa) in &versions {
                let v = Version::new(ma, mi, pa);
                reg.register(&Identity::versioned("e", v), stub(Identity::versioned("e", v), 0));
            }
            versions.sort();
            let (ma, mi, pa) = *versions.last().unwrap();
            let expected = Version::new(ma, mi, pa);
            let (slot, _) = reg.resolve("e", None).unwrap();
            prop_assert_eq!(slot, Some(expected));
        }
    }
}
