//! Per-invocation sub-task outcomes.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Sub-task name -> success, in execution order. Lives for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncTally {
    entries: Vec<(String, bool)>,
}

impl SyncTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome. A repeated name overwrites its earlier outcome in place.
    pub fn record(&mut self, name: &str, ok: bool) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = ok,
            None => self.entries.push((name.to_string(), ok)),
        }
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, ok)| *ok)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.entries.iter().filter(|(_, ok)| *ok).count()
    }

    pub fn failure_count(&self) -> usize {
        self.entries.len() - self.success_count()
    }

    /// True when at least one sub-task ran and none succeeded.
    pub fn all_failed(&self) -> bool {
        !self.entries.is_empty() && self.success_count() == 0
    }

    /// True when no sub-task failed (vacuously true when empty).
    pub fn all_succeeded(&self) -> bool {
        self.entries.iter().all(|(_, ok)| *ok)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(n, ok)| (n.as_str(), *ok))
    }
}

impl FromIterator<(String, bool)> for SyncTally {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        let mut tally = SyncTally::new();
        for (name, ok) in iter {
            tally.record(&name, ok);
        }
        tally
    }
}

impl Serialize for SyncTally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, ok) in &self.entries {
            map.serialize_entry(name, ok)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(entries: &[(&str, bool)]) -> SyncTally {
        entries.iter().map(|(n, ok)| (n.to_string(), *ok)).collect()
    }

    #[test]
    fn counts_and_classification() {
        let mixed = tally(&[("a", true), ("b", false), ("c", true)]);
        assert_eq!(mixed.success_count(), 2);
        assert_eq!(mixed.failure_count(), 1);
        assert!(!mixed.all_failed());
        assert!(!mixed.all_succeeded());

        let none = tally(&[("a", false), ("b", false)]);
        assert!(none.all_failed());

        let empty = SyncTally::new();
        assert!(!empty.all_failed());
        assert!(empty.all_succeeded());
    }

    #[test]
    fn record_keeps_order_and_overwrites() {
        let mut t = SyncTally::new();
        t.record("orders", false);
        t.record("customers", true);
        t.record("orders", true);
        let names: Vec<_> = t.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["orders", "customers"]);
        assert_eq!(t.get("orders"), Some(true));
        assert_eq!(t.get("missing"), None);
    }

    #[test]
    fn serializes_in_execution_order() {
        let t = tally(&[("zeta", true), ("alpha", false)]);
        assert_eq!(
            serde_json::to_string(&t).unwrap(),
            r#"{"zeta":true,"alpha":false}"#
        );
    }
}
