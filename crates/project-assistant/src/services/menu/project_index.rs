use parking_lot::Mutex;
use tracing::debug;

use crate::collections::{Graph, HashTable, Trie};
use crate::utils::text::letter_tokens;

#[derive(Default)]
struct IndexInner {
    relations: Graph<String>,
    admin_last_project: HashTable<i64, String>,
    admin_tries: HashTable<i64, Trie>,
}

/// Service-wide project relationships and per-admin name indexes.
///
/// The containers are not thread-safe, so everything sits behind one mutex.
/// Never hold it across an `.await`.
#[derive(Default)]
pub struct ProjectIndex {
    inner: Mutex<IndexInner>,
}

impl ProjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly established project.
    ///
    /// Adds an edge from the session's previous project and, independently,
    /// from the admin's previous project, whenever those differ from `name`.
    pub fn record_project(&self, name: &str, session_previous: Option<&str>, admin_id: Option<i64>) {
        let mut inner = self.inner.lock();
        inner.relations.add_vertex(name.to_string());

        if let Some(previous) = session_previous.filter(|previous| *previous != name) {
            inner
                .relations
                .add_edge(previous.to_string(), name.to_string());
        }

        let Some(admin_id) = admin_id else {
            return;
        };

        let admin_previous = inner.admin_last_project.put(admin_id, name.to_string());
        if let Some(previous) = admin_previous.filter(|previous| previous != name) {
            inner.relations.add_edge(previous, name.to_string());
        }

        if let Some(trie) = inner.admin_tries.compute_if_absent(admin_id, |_| Some(Trie::new())) {
            for token in letter_tokens(name) {
                trie.insert(&token);
            }
        }

        debug!("Indexed project '{}' for admin {}", name, admin_id);
    }

    /// Projects reachable by one edge from `name`
    pub fn related(&self, name: &str) -> Vec<String> {
        let inner = self.inner.lock();
        inner.relations.neighbors(&name.to_string()).cloned().collect()
    }

    /// Project-name words of `admin_id` starting with `prefix`
    pub fn suggestions(&self, admin_id: i64, prefix: &str) -> Vec<String> {
        let inner = self.inner.lock();
        inner
            .admin_tries
            .get(&admin_id)
            .map(|trie| trie.words_with_prefix(prefix).iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn last_project_for_admin(&self, admin_id: i64) -> Option<String> {
        self.inner.lock().admin_last_project.get(&admin_id).cloned()
    }

    pub fn project_count(&self) -> usize {
        self.inner.lock().relations.vertex_count()
    }
}
