use std::hash::Hash;

use super::{HashTable, LinkedList};

/// Directed graph stored as vertex -> adjacency list.
///
/// Adding an edge creates both endpoints. Adjacency lists hold no duplicates.
#[derive(Debug, Default)]
pub struct Graph<V: Hash + Eq + Clone> {
    adjacency: HashTable<V, LinkedList<V>>,
}

impl<V: Hash + Eq + Clone> Graph<V> {
    pub fn new() -> Self {
        Self {
            adjacency: HashTable::new(),
        }
    }

    pub fn add_vertex(&mut self, vertex: V) {
        if !self.adjacency.contains_key(&vertex) {
            self.adjacency.put(vertex, LinkedList::new());
        }
    }

    pub fn add_edge(&mut self, from: V, to: V) {
        self.add_vertex(to.clone());
        self.add_vertex(from.clone());

        if let Some(edges) = self.adjacency.get_mut(&from) {
            if !edges.contains(&to) {
                edges.append(to);
            }
        }
    }

    pub fn has_edge(&self, from: &V, to: &V) -> bool {
        self.adjacency
            .get(from)
            .is_some_and(|edges| edges.contains(to))
    }

    pub fn neighbors<'a>(&'a self, vertex: &V) -> impl Iterator<Item = &'a V> + 'a {
        self.adjacency
            .get(vertex)
            .into_iter()
            .flat_map(|edges| edges.iter())
    }

    pub fn vertices(&self) -> LinkedList<V> {
        self.adjacency.key_set()
    }

    pub fn contains_vertex(&self, vertex: &V) -> bool {
        self.adjacency.contains_key(vertex)
    }

    /// Drop `vertex` along with every edge into or out of it.
    pub fn remove_vertex(&mut self, vertex: &V) -> bool {
        if self.adjacency.remove(vertex).is_none() {
            return false;
        }

        for other in self.vertices().iter() {
            if let Some(edges) = self.adjacency.get_mut(other) {
                edges.remove(vertex);
            }
        }
        true
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }
}
