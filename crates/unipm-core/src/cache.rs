use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Memoizes registry and installation version lookups across facade
/// instances. Entries store `Option<String>` so a completed lookup that
/// found nothing is distinguishable from a lookup never made.
#[derive(Debug, Default)]
pub struct VersionCache {
    latest: Mutex<HashMap<String, Option<String>>>,
    installed: Mutex<HashMap<String, Option<String>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl VersionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest-version entries are keyed by `name` or `name@constraint`,
    /// since the same package can resolve differently under a range.
    #[must_use]
    pub fn latest_key(name: &str, constraint: Option<&str>) -> String {
        match constraint {
            Some(range) => format!("{name}@{range}"),
            None => name.to_string(),
        }
    }

    #[must_use]
    pub fn get_latest(&self, key: &str) -> Option<Option<String>> {
        lock(&self.latest).get(key).cloned()
    }

    pub fn set_latest(&self, key: &str, version: Option<String>) {
        lock(&self.latest).insert(key.to_string(), version);
    }

    #[must_use]
    pub fn get_installed(&self, name: &str) -> Option<Option<String>> {
        lock(&self.installed).get(name).cloned()
    }

    pub fn set_installed(&self, name: &str, version: Option<String>) {
        lock(&self.installed).insert(name.to_string(), version);
    }

    /// Installed versions go stale after any mutating operation; the
    /// registry's idea of "latest" does not.
    pub fn invalidate_installed(&self) {
        lock(&self.installed).clear();
    }

    pub fn clear(&self) {
        lock(&self.latest).clear();
        lock(&self.installed).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_marker_is_not_a_miss() {
        let cache = VersionCache::new();
        assert_eq!(cache.get_latest("react"), None);

        cache.set_latest("react", None);
        assert_eq!(cache.get_latest("react"), Some(None));
    }

    #[test]
    fn test_constraint_gets_its_own_key() {
        assert_eq!(VersionCache::latest_key("react", None), "react");
        assert_eq!(
            VersionCache::latest_key("react", Some("^17.0.0")),
            "react@^17.0.0"
        );
    }

    #[test]
    fn test_invalidation_spares_latest_entries() {
        let cache = VersionCache::new();
        cache.set_latest("react", Some("18.2.0".to_string()));
        cache.set_installed("react", Some("17.0.2".to_string()));

        cache.invalidate_installed();
        assert_eq!(cache.get_installed("react"), None);
        assert_eq!(cache.get_latest("react"), Some(Some("18.2.0".to_string())));

        cache.clear();
        assert_eq!(cache.get_latest("react"), None);
    }
}
