//! A small crate adapting between byte streams and chunk stores.
//!
//! A chunk store is an addressable collection of fixed-size chunks, accessed by index, each chunk being independently
//! readable and writable with possibly non-trivial latency (disk, network). This crate provides two inverse operations
//! on top of such stores:
//! - [`read()`](read::read) reconstructs a contiguous byte window `(offset, length)` as a lazy stream of byte chunks,
//!   performing partial reads at the first and last chunk boundaries;
//! - [`write()`](write::write) slices an incoming byte stream into chunks aligned to the store chunk length, and puts
//!   them at sequential indices while capping the number of puts in flight.
//!
//! Stores are only reached through the capability traits [`ReadChunk`], [`WriteChunk`] and [`StreamChunks`], on top
//! of the common [`ChunkStore`] properties. Neither operation spawns anything: concurrency only arises from the
//! in-flight store operations driven by the caller's task.
//!
//! As a **strong hypothesis**, we assume that `offset + length` never exceeds the store length when reading. This is
//! the caller's responsibility and is left to the store to report.
//!
//! ```text
//!     offset = 2, length = 3, chunk_length = 3
//!
//!     chunks     | a b c | d e f |
//!     window         [c] [d e]
//!     gets       get(0, 2..3), get(1, 0..2)
//! ```

use thiserror::Error;

mod store;
pub use store::*;

pub mod blocks;
pub mod read;
pub mod write;

#[cfg(test)]
mod test_utils;

/// A boxed error, as reported by stores or input streams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// A store `get` or `put` failed, the store error being kept as is.
    #[error("chunk store operation failed")]
    Store(#[source] BoxError),
    /// The input stream failed while writing.
    #[error("input stream failed")]
    Input(#[source] BoxError),
}

impl Error {
    #[inline]
    fn store<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Store(Box::new(err))
    }

    #[inline]
    fn input<E: Into<BoxError>>(err: E) -> Self {
        Self::Input(err.into())
    }
}
