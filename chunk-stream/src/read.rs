//! This module provides chunk store reading features.

use std::num::NonZeroUsize;

use bytes::Bytes;
use futures::stream::{self, Stream, TryStreamExt};

use crate::{ChunkIndex, ChunkRange, Error, ReadChunk, ReadConfig, ReadOptions, StreamChunks};

/// A single `get` required to reconstruct a byte window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub index: ChunkIndex,
    pub range: ChunkRange,
}

/// The ordered `get`s reconstructing a byte window out of fixed-size chunks.
///
/// When the window does not start at a chunk boundary, the first segment is a partial one starting within its chunk
/// (possibly empty when the window is). Every following segment starts at its chunk start and spans the whole chunk,
/// except for the last one which stops at the window end.
#[derive(Debug, Clone)]
pub struct Segments {
    index: ChunkIndex,
    chunk_offset: usize,
    partial: bool,
    remaining: u64,
    chunk_length: NonZeroUsize,
}

impl Segments {
    pub fn new(offset: u64, length: u64, chunk_length: NonZeroUsize) -> Self {
        let size = chunk_length.get() as u64;
        // intra-chunk offset is lower than the chunk length, so that it fits
        let chunk_offset = (offset % size) as usize;

        Self {
            index: offset / size,
            chunk_offset,
            partial: chunk_offset != 0,
            remaining: length,
            chunk_length,
        }
    }
}

impl From<ReadConfig> for Segments {
    #[inline]
    fn from(config: ReadConfig) -> Self {
        Self::new(config.offset, config.length, config.chunk_length)
    }
}

impl Iterator for Segments {
    type Item = Segment;

    fn next(&mut self) -> Option<Self::Item> {
        let partial = std::mem::take(&mut self.partial);

        if self.remaining == 0 && !partial {
            return None;
        }

        let available = self.chunk_length.get() - self.chunk_offset;
        let length = self.remaining.min(available as u64) as usize;

        let segment = Segment {
            index: self.index,
            range: ChunkRange::new(self.chunk_offset, length),
        };

        self.index += 1;
        self.chunk_offset = 0;
        self.remaining -= length as u64;

        Some(segment)
    }
}

/// Read a byte window from a chunk store.
///
/// Options are first resolved against the store properties, failing with a
/// [`ConfigurationError`](crate::ConfigurationError) before any `get` is issued.
///
/// The returned stream is lazy: each `get` is only issued once the next chunk is polled, so that at most one `get` is
/// ever in flight. A failing `get` is yielded as an [`Error::Store`] and ends the stream. The stream cannot be
/// restarted, `read()` must be called again to read the window again.
///
/// _Note: a store implementing both [`ReadChunk`] and [`StreamChunks`] is still sliced here. Stores with native range
/// streaming, which should always take precedence, must be read with [`read_streaming()`] instead._
///
/// # Example
/// ```
/// # tokio_test::block_on(async {
/// # use std::io;
/// # use bytes::Bytes;
/// # use chunk_stream::{ChunkIndex, ChunkRange, ChunkStore, ReadChunk, ReadOptions};
/// use futures::TryStreamExt;
///
/// struct Alphabet;
///
/// impl ChunkStore for Alphabet {
///     type Error = io::Error;
///
///     fn chunk_length(&self) -> Option<usize> {
///         Some(3)
///     }
///
///     fn length(&self) -> Option<u64> {
///         Some(26)
///     }
/// }
///
/// impl ReadChunk for Alphabet {
///     async fn get(&self, index: ChunkIndex, range: ChunkRange) -> io::Result<Bytes> {
///         let start = index as usize * 3 + range.offset;
///         Ok(Bytes::from_static(b"abcdefghijklmnopqrstuvwxyz").slice(start..start + range.length))
///     }
/// }
///
/// let store = Alphabet;
/// let stream = chunk_stream::read::read(&store, ReadOptions::default().with_offset(2).with_length(3)).unwrap();
/// let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
///
/// assert_eq!(chunks, vec![Bytes::from_static(b"c"), Bytes::from_static(b"de")]);
/// # })
/// ```
pub fn read<S: ReadChunk>(
    store: &S,
    options: ReadOptions,
) -> Result<impl Stream<Item = Result<Bytes, Error>> + Send + '_, Error> {
    let config = options.resolve(store)?;

    tracing::debug!(
        "Reading {} bytes at offset {} from chunk store with chunk length {}",
        config.length,
        config.offset,
        config.chunk_length
    );

    Ok(stream::try_unfold(Segments::from(config), move |mut segments| async move {
        let Some(Segment { index, range }) = segments.next() else {
            tracing::trace!("Read window exhausted");
            return Ok(None);
        };

        tracing::trace!("Getting chunk {index} range {}..{}", range.offset, range.end());

        match store.get(index, range).await {
            Ok(chunk) => Ok(Some((chunk, segments))),
            Err(err) => {
                tracing::debug!("Failed to get chunk {index}: {err}");
                Err(Error::store(err))
            }
        }
    }))
}

/// Read from a chunk store able to stream itself, starting at the options offset.
///
/// The whole reading is delegated to [`StreamChunks::stream_from()`]: neither the length nor the chunk length are
/// resolved and no slicing is performed.
pub fn read_streaming<S: StreamChunks>(
    store: &S,
    options: ReadOptions,
) -> impl Stream<Item = Result<Bytes, Error>> + Send + '_ {
    tracing::debug!("Delegating read at offset {} to self-streaming chunk store", options.offset());

    store.stream_from(options.offset()).map_err(Error::store)
}
