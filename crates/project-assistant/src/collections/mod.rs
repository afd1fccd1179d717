//! Hand-rolled containers backing the session engine.
//!
//! None of these types are synchronised; shared owners wrap them in a lock.

mod error;
mod graph;
mod hash_table;
mod linked_list;
mod queue;
mod trie;

pub use error::CollectionError;
pub use graph::Graph;
pub use hash_table::HashTable;
pub use linked_list::LinkedList;
pub use queue::Queue;
pub use trie::Trie;
