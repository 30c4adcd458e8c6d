use std::collections::BTreeMap;
use std::sync::Arc;

use super::CalendarAdapter;
use super::MailAdapter;
use super::NotesAdapter;
use super::ResourceAdapter;

/// All registered adapters, keyed by short app name. Built once at startup.
#[derive(Clone)]
pub struct AdapterRegistry {
    by_name: BTreeMap<&'static str, Arc<dyn ResourceAdapter>>,
}

impl AdapterRegistry {
    pub fn with_builtin_adapters() -> Self {
        let adapters: Vec<Arc<dyn ResourceAdapter>> = vec![
            Arc::new(NotesAdapter),
            Arc::new(CalendarAdapter),
            Arc::new(MailAdapter),
        ];
        let by_name = adapters
            .into_iter()
            .map(|adapter| (adapter.info().name, adapter))
            .collect();
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ResourceAdapter>> {
        self.by_name.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ResourceAdapter>> {
        self.by_name.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_adapters_are_reachable_by_name() {
        let registry = AdapterRegistry::with_builtin_adapters();
        for (name, bundle_id) in [
            ("notes", "com.apple.Notes"),
            ("calendar", "com.apple.iCal"),
            ("mail", "com.apple.mail"),
        ] {
            let adapter = match registry.get(name) {
                Some(adapter) => adapter,
                None => panic!("missing adapter {name}"),
            };
            assert_eq!(adapter.info().bundle_id, bundle_id);
        }
        assert!(registry.get("photos").is_none());
    }
}
