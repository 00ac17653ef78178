use std::num::NonZeroUsize;

use thiserror::Error;

use super::ChunkStore;

/// Default cap on the number of outstanding puts while writing.
pub const DEFAULT_MAX_OUTSTANDING_PUTS: NonZeroUsize = unsafe { NonZeroUsize::new_unchecked(16) };

/// Unusable options, detected before any store operation is attempted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("missing required `chunk_length` property")]
    MissingChunkLength,
    #[error("missing required `length` property")]
    MissingLength,
}

/// Caller-provided read options.
///
/// Missing values fall back to the store properties when resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    offset: u64,
    length: Option<u64>,
    chunk_length: Option<NonZeroUsize>,
}

impl ReadOptions {
    /// Start reading at byte `offset` (default to `0`).
    #[inline]
    pub fn with_offset(self, offset: u64) -> Self {
        Self { offset, ..self }
    }

    /// Read `length` bytes (default to the store length).
    #[inline]
    pub fn with_length(self, length: u64) -> Self {
        Self {
            length: Some(length),
            ..self
        }
    }

    /// Read chunks of `chunk_length` bytes (default to the store chunk length).
    #[inline]
    pub fn with_chunk_length(self, chunk_length: NonZeroUsize) -> Self {
        Self {
            chunk_length: Some(chunk_length),
            ..self
        }
    }

    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Resolve a fully populated [`ReadConfig`] against `store` properties.
    pub fn resolve<S: ChunkStore + ?Sized>(&self, store: &S) -> Result<ReadConfig, ConfigurationError> {
        let chunk_length = resolve_chunk_length(self.chunk_length, store)?;
        let length = self.length.or_else(|| store.length()).ok_or(ConfigurationError::MissingLength)?;

        Ok(ReadConfig {
            offset: self.offset,
            length,
            chunk_length,
        })
    }
}

/// Resolved read configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadConfig {
    pub offset: u64,
    pub length: u64,
    pub chunk_length: NonZeroUsize,
}

/// Caller-provided write options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    chunk_length: Option<NonZeroUsize>,
    max_outstanding_puts: NonZeroUsize,
    zero_padding: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            chunk_length: None,
            max_outstanding_puts: DEFAULT_MAX_OUTSTANDING_PUTS,
            zero_padding: false,
        }
    }
}

impl WriteOptions {
    /// Write chunks of `chunk_length` bytes (default to the store chunk length).
    #[inline]
    pub fn with_chunk_length(self, chunk_length: NonZeroUsize) -> Self {
        Self {
            chunk_length: Some(chunk_length),
            ..self
        }
    }

    /// Cap the number of outstanding puts (default to [`DEFAULT_MAX_OUTSTANDING_PUTS`]).
    ///
    /// _Note: a put is still admitted when exactly `max_outstanding_puts` are in flight, so that up to
    /// `max_outstanding_puts + 1` puts may be unacknowledged at once._
    #[inline]
    pub fn with_max_outstanding_puts(self, max_outstanding_puts: NonZeroUsize) -> Self {
        Self {
            max_outstanding_puts,
            ..self
        }
    }

    /// Pad the final short chunk with zero bytes up to the chunk length (default to `false`).
    #[inline]
    pub fn with_zero_padding(self, zero_padding: bool) -> Self {
        Self { zero_padding, ..self }
    }

    /// Resolve a fully populated [`WriteConfig`] against `store` properties.
    pub fn resolve<S: ChunkStore + ?Sized>(&self, store: &S) -> Result<WriteConfig, ConfigurationError> {
        Ok(WriteConfig {
            chunk_length: resolve_chunk_length(self.chunk_length, store)?,
            max_outstanding_puts: self.max_outstanding_puts,
            zero_padding: self.zero_padding,
        })
    }
}

/// Resolved write configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteConfig {
    pub chunk_length: NonZeroUsize,
    pub max_outstanding_puts: NonZeroUsize,
    pub zero_padding: bool,
}

fn resolve_chunk_length<S: ChunkStore + ?Sized>(
    chunk_length: Option<NonZeroUsize>,
    store: &S,
) -> Result<NonZeroUsize, ConfigurationError> {
    chunk_length
        .or_else(|| store.chunk_length().and_then(NonZeroUsize::new))
        .ok_or(ConfigurationError::MissingChunkLength)
}
