use thiserror::Error;

/// Contract violations raised by the container types.
///
/// These are programming errors from the caller's point of view: a well-formed
/// flow never dequeues from an empty queue or reads past the end of a list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    #[error("Queue is empty")]
    EmptyQueue,

    #[error("Index out of range: {index} (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}
