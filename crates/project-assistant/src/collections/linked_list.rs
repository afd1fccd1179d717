use std::fmt;

use super::CollectionError;

#[derive(Clone)]
struct Node<T> {
    data: T,
    next: Option<usize>,
}

/// Singly linked list with head and tail links.
///
/// Nodes live in a slab and link to each other by slot index; freed slots are
/// recycled, so removals never shift other nodes.
#[derive(Clone)]
pub struct LinkedList<T> {
    nodes: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> LinkedList<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    fn node(&self, index: usize) -> Option<&Node<T>> {
        self.nodes.get(index)?.as_ref()
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut Node<T>> {
        self.nodes.get_mut(index)?.as_mut()
    }

    fn alloc(&mut self, node: Node<T>) -> usize {
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                index
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, index: usize) -> Option<T> {
        let node = self.nodes.get_mut(index)?.take()?;
        self.free.push(index);
        Some(node.data)
    }

    /// Add to the end.
    pub fn append(&mut self, data: T) {
        let index = self.alloc(Node { data, next: None });

        match self.tail {
            Some(tail) => {
                if let Some(node) = self.node_mut(tail) {
                    node.next = Some(index);
                }
            }
            None => self.head = Some(index),
        }

        self.tail = Some(index);
        self.len += 1;
    }

    /// Add to the front.
    pub fn prepend(&mut self, data: T) {
        let index = self.alloc(Node {
            data,
            next: self.head,
        });

        if self.tail.is_none() {
            self.tail = Some(index);
        }

        self.head = Some(index);
        self.len += 1;
    }

    pub fn get(&self, index: usize) -> Result<&T, CollectionError> {
        let out_of_range = CollectionError::IndexOutOfRange {
            index,
            len: self.len,
        };

        if index >= self.len {
            return Err(out_of_range);
        }

        self.iter().nth(index).ok_or(out_of_range)
    }

    pub fn first(&self) -> Option<&T> {
        self.node(self.head?).map(|node| &node.data)
    }

    pub fn last(&self) -> Option<&T> {
        self.node(self.tail?).map(|node| &node.data)
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let index = self.head?;
        let next = self.node(index)?.next;
        let data = self.release(index)?;

        self.head = next;
        if self.head.is_none() {
            self.tail = None;
        }

        self.len -= 1;
        Some(data)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Fresh front-to-back iterator; take a new one per traversal.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }
}

impl<T: PartialEq> LinkedList<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.iter().any(|item| item == value)
    }

    /// Remove the first element equal to `value`.
    pub fn remove(&mut self, value: &T) -> bool {
        let mut previous: Option<usize> = None;
        let mut cursor = self.head;

        while let Some(index) = cursor {
            let Some(node) = self.node(index) else {
                break;
            };

            if node.data == *value {
                let next = node.next;

                match previous {
                    None => self.head = next,
                    Some(prev) => {
                        if let Some(prev_node) = self.node_mut(prev) {
                            prev_node.next = next;
                        }
                    }
                }

                if self.tail == Some(index) {
                    self.tail = previous;
                }

                self.release(index);
                self.len -= 1;
                return true;
            }

            previous = Some(index);
            cursor = node.next;
        }

        false
    }
}

impl<T> Default for LinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for LinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<T> for LinkedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        for item in iter {
            list.append(item);
        }
        list
    }
}

impl<'a, T> IntoIterator for &'a LinkedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a, T> {
    list: &'a LinkedList<T>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.cursor?)?;
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(&node.data)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
