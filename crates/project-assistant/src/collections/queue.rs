use super::{CollectionError, LinkedList};

/// FIFO queue; front is the list head, back is the tail.
#[derive(Debug, Clone)]
pub struct Queue<T> {
    items: LinkedList<T>,
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self {
            items: LinkedList::new(),
        }
    }

    pub fn enqueue(&mut self, value: T) {
        self.items.append(value);
    }

    pub fn dequeue(&mut self) -> Result<T, CollectionError> {
        self.items.pop_front().ok_or(CollectionError::EmptyQueue)
    }

    pub fn peek(&self) -> Result<&T, CollectionError> {
        self.items.first().ok_or(CollectionError::EmptyQueue)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = Queue::new();
        for task in ["design", "build", "ship"] {
            queue.enqueue(task);
        }

        assert_eq!(queue.peek(), Ok(&"design"));
        assert_eq!(queue.len(), 3);

        let drained: Vec<_> = std::iter::from_fn(|| queue.dequeue().ok()).collect();
        assert_eq!(drained, vec!["design", "build", "ship"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_empty_queue_errors() {
        let mut queue: Queue<u8> = Queue::new();
        assert_eq!(queue.dequeue(), Err(CollectionError::EmptyQueue));
        assert_eq!(queue.peek(), Err(CollectionError::EmptyQueue));
    }

    #[test]
    fn test_reuse_after_drain() {
        let mut queue = Queue::new();
        queue.enqueue(1);
        assert_eq!(queue.dequeue(), Ok(1));

        // back must be reset once the last element leaves
        queue.enqueue(2);
        queue.enqueue(3);
        assert_eq!(queue.dequeue(), Ok(2));
        assert_eq!(queue.dequeue(), Ok(3));
        assert_eq!(queue.dequeue(), Err(CollectionError::EmptyQueue));
    }
}
