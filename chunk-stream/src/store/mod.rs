use std::future::Future;

use bytes::Bytes;
use futures::Stream;

mod options;
pub use options::*;

/// A chunk index in a chunk store.
pub type ChunkIndex = u64;

/// Byte range requested within a single chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    /// Offset of the first requested byte, relative to the chunk start.
    pub offset: usize,
    /// Number of requested bytes.
    pub length: usize,
}

impl ChunkRange {
    /// Create a new `ChunkRange`.
    #[inline]
    pub const fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Return the exclusive end offset of this range.
    #[inline]
    pub const fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Chunk store interface.
///
/// An addressable collection of fixed-size chunks, accessed by [`ChunkIndex`]. Every chunk has the same length except
/// possibly the last one. Actual chunk operations are split into capability traits:
/// - [`ReadChunk`] for stores providing `get`,
/// - [`WriteChunk`] for stores providing `put`,
/// - [`StreamChunks`] for stores able to stream themselves from any offset.
///
/// Reading or writing requires the matching capability at compile time, so a store lacking `get` or `put` simply cannot
/// be handed to [`read()`](crate::read::read) or [`write()`](crate::write::write).
pub trait ChunkStore: Send + Sync {
    /// Error reported by chunk operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Length of every chunk but the last one, used when the caller does not provide it.
    ///
    /// A `Some(0)` chunk length is considered as missing.
    fn chunk_length(&self) -> Option<usize> {
        None
    }

    /// Total logical length in bytes, used when the caller does not provide it.
    fn length(&self) -> Option<u64> {
        None
    }
}

/// Chunk store providing `get`.
pub trait ReadChunk: ChunkStore {
    /// Return exactly the `range` bytes of the chunk at `index`.
    fn get(&self, index: ChunkIndex, range: ChunkRange) -> impl Future<Output = Result<Bytes, Self::Error>> + Send;
}

/// Chunk store providing `put`.
pub trait WriteChunk: ChunkStore {
    /// Store `chunk` at `index`.
    ///
    /// Resolving to `Ok(())` acknowledges the chunk has been durably accepted by the store.
    fn put(&self, index: ChunkIndex, chunk: Bytes) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Chunk store natively streaming its content.
pub trait StreamChunks: ChunkStore {
    /// Stream the store content starting at byte `offset`.
    fn stream_from(&self, offset: u64) -> impl Stream<Item = Result<Bytes, Self::Error>> + Send;
}
