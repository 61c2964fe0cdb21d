//! Order-preserving batch splitting.

/// Maximum records per remote request. Fixed by the remote API's request limit.
pub const MAX_CHUNK_SIZE: usize = 10;

/// A numbered slice of the validated record sequence, sent as one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<T> {
    /// Position in the chunk sequence, starting at 0.
    pub index: usize,
    pub records: Vec<T>,
}

impl<T> Chunk<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Split `records` into chunks of `max_chunk_size`, keeping input order.
///
/// Every chunk but the last is full; an empty input yields no chunks.
///
/// # Panics
///
/// Panics if `max_chunk_size` is zero.
#[must_use]
pub fn split<T>(records: Vec<T>, max_chunk_size: usize) -> Vec<Chunk<T>> {
    assert!(max_chunk_size > 0, "chunk size must be positive");
    let mut chunks = Vec::with_capacity(records.len().div_ceil(max_chunk_size));
    let mut current = Vec::with_capacity(max_chunk_size.min(records.len()));
    for record in records {
        current.push(record);
        if current.len() == max_chunk_size {
            let index = chunks.len();
            chunks.push(Chunk {
                index,
                records: std::mem::take(&mut current),
            });
        }
    }
    if !current.is_empty() {
        let index = chunks.len();
        chunks.push(Chunk {
            index,
            records: current,
        });
    }
    chunks
}
