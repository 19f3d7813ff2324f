use crate::restriction::Restriction;

/// Ordered collection of restrictions for one session.
///
/// Insertion order is kept; it only decides legend order when rendering.
#[derive(Debug, Clone, Default)]
pub struct RestrictionStore {
    restrictions: Vec<Restriction>,
}

impl RestrictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, restriction: Restriction) {
        self.restrictions.push(restriction);
    }

    pub fn clear(&mut self) {
        self.restrictions.clear();
    }

    /// Owned copy of the current restrictions, in insertion order.
    pub fn snapshot(&self) -> Vec<Restriction> {
        self.restrictions.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Restriction> {
        self.restrictions.iter()
    }

    pub fn len(&self) -> usize {
        self.restrictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restrictions.is_empty()
    }
}

impl FromIterator<Restriction> for RestrictionStore {
    fn from_iter<I: IntoIterator<Item = Restriction>>(iter: I) -> Self {
        Self {
            restrictions: iter.into_iter().collect(),
        }
    }
}

impl Extend<Restriction> for RestrictionStore {
    fn extend<I: IntoIterator<Item = Restriction>>(&mut self, iter: I) {
        self.restrictions.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_empty() {
        let store = RestrictionStore::new();
        assert!(store.is_empty());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_snapshot_keeps_insertion_order() {
        let mut store = RestrictionStore::new();
        store.add(Restriction::le(1.0, 1.0, 4.0));
        store.add(Restriction::le(1.0, 0.0, 3.0));
        store.add(Restriction::ge(0.0, 1.0, 1.0));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0], Restriction::le(1.0, 1.0, 4.0));
        assert_eq!(snapshot[2], Restriction::ge(0.0, 1.0, 1.0));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = RestrictionStore::new();
        store.add(Restriction::le(1.0, 1.0, 4.0));

        let mut snapshot = store.snapshot();
        snapshot.push(Restriction::le(1.0, 0.0, 3.0));
        snapshot[0] = Restriction::ge(0.0, 0.0, 0.0);

        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot()[0], Restriction::le(1.0, 1.0, 4.0));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut store: RestrictionStore = vec![Restriction::le(1.0, 1.0, 4.0)].into_iter().collect();
        store.clear();
        assert!(store.snapshot().is_empty());
        store.clear();
        assert!(store.snapshot().is_empty());

        store.extend([Restriction::ge(1.0, 0.0, 1.0)]);
        assert_eq!(store.len(), 1);
    }
}
