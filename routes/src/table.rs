use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory cache of `domain -> backend port` mappings, shared between
/// the dispatch path (reads) and the control surface (writes).
///
/// Reads take the shared lock, writes take the exclusive lock, and the
/// lock is never held across I/O. The table starts empty; callers must
/// not rely on a reload having run before the first insert.
#[derive(Debug, Default)]
pub struct RoutingTable {
    entries: RwLock<HashMap<String, String>>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or overwrite the mapping for `domain`. The caller is
    /// responsible for having durably persisted the mapping first.
    pub fn insert(&self, domain: &str, port: &str) {
        self.entries
            .write()
            .insert(domain.to_owned(), port.to_owned());
    }

    /// Remove the mapping for `domain`. Removing an unmapped domain is a
    /// no-op.
    pub fn remove(&self, domain: &str) {
        self.entries.write().remove(domain);
    }

    /// Backend port for `domain`, or `None` when the domain is unmapped.
    pub fn get(&self, domain: &str) -> Option<String> {
        self.entries.read().get(domain).cloned()
    }

    /// A consistent copy of all current entries.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries.read().clone()
    }

    /// Atomically discard the current contents and install `entries` as
    /// the new table. Used only by reload.
    pub fn replace_all(&self, entries: HashMap<String, String>) {
        *self.entries.write() = entries;
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_insert_get_remove() {
        let table = RoutingTable::new();
        assert!(table.is_empty());

        table.insert("svc.test", "9000");
        assert_eq!(table.get("svc.test").as_deref(), Some("9000"));
        assert_eq!(table.len(), 1);

        // overwrite wins
        table.insert("svc.test", "9001");
        assert_eq!(table.get("svc.test").as_deref(), Some("9001"));
        assert_eq!(table.len(), 1);

        table.remove("svc.test");
        assert_eq!(table.get("svc.test"), None);

        // removing again is a no-op
        table.remove("svc.test");
        assert!(table.is_empty());
    }

    #[test]
    fn test_replace_all_discards_previous_contents() {
        let table = RoutingTable::new();
        table.insert("old.test", "1000");

        table.replace_all(HashMap::from([
            ("a.test".to_string(), "1".to_string()),
            ("b.test".to_string(), "2".to_string()),
        ]));

        assert_eq!(table.get("old.test"), None);
        assert_eq!(
            table.snapshot(),
            HashMap::from([
                ("a.test".to_string(), "1".to_string()),
                ("b.test".to_string(), "2".to_string()),
            ])
        );
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let table = RoutingTable::new();
        table.insert("svc.test", "9000");

        let snapshot = table.snapshot();
        table.insert("other.test", "9001");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_concurrent_mutation_does_not_corrupt_table() {
        let table = Arc::new(RoutingTable::new());
        let mut handles = Vec::new();

        for worker in 0..8 {
            let table = Arc::clone(&table);
            handles.push(std::thread::spawn(move || {
                for i in 0..500 {
                    let domain = format!("svc-{worker}-{i}.test");
                    table.insert(&domain, "9000");
                    assert_eq!(table.get(&domain).as_deref(), Some("9000"));
                    if i % 3 == 0 {
                        table.remove(&domain);
                    }
                    let _ = table.snapshot();
                }
            }));
        }

        for handle in handles {
            handle.join().expect("worker panicked");
        }

        // Every surviving entry still carries the value it was written with.
        for (domain, port) in table.snapshot() {
            assert_eq!(port, "9000", "corrupt entry for {domain}");
        }
    }
}
