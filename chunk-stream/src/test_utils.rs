//! Chunk stores to run the crate against in tests.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use bytes::Bytes;

use crate::{ChunkIndex, ChunkRange, ChunkStore, ReadChunk, WriteChunk};

fn slice(chunk: Bytes, index: ChunkIndex, range: ChunkRange) -> io::Result<Bytes> {
    if range.end() > chunk.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("range {range:?} out of chunk {index} ({} bytes)", chunk.len()),
        ));
    }

    Ok(chunk.slice(range.offset..range.end()))
}

fn not_found(index: ChunkIndex) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("chunk {index} not found"))
}

/// In-memory chunk store.
#[derive(Debug)]
pub struct MemoryStore {
    chunk_length: usize,
    length: Option<u64>,
    chunks: RwLock<HashMap<ChunkIndex, Bytes>>,
}

impl MemoryStore {
    pub fn new(chunk_length: usize) -> Self {
        Self {
            chunk_length,
            length: None,
            chunks: Default::default(),
        }
    }

    #[inline]
    pub fn with_length(self, length: u64) -> Self {
        Self {
            length: Some(length),
            ..self
        }
    }

    pub fn chunk(&self, index: ChunkIndex) -> Option<Bytes> {
        self.chunks.read().unwrap().get(&index).cloned()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.read().unwrap().len()
    }
}

impl ChunkStore for MemoryStore {
    type Error = io::Error;

    fn chunk_length(&self) -> Option<usize> {
        Some(self.chunk_length)
    }

    fn length(&self) -> Option<u64> {
        self.length
    }
}

impl ReadChunk for MemoryStore {
    async fn get(&self, index: ChunkIndex, range: ChunkRange) -> io::Result<Bytes> {
        let chunk = self.chunk(index).ok_or_else(|| not_found(index))?;
        slice(chunk, index, range)
    }
}

impl WriteChunk for MemoryStore {
    async fn put(&self, index: ChunkIndex, chunk: Bytes) -> io::Result<()> {
        self.chunks.write().unwrap().insert(index, chunk);
        Ok(())
    }
}

/// Filesystem chunk store, one file per chunk in a temporary directory.
#[derive(Debug)]
pub struct FsStore {
    chunk_length: usize,
    length: Option<u64>,
    dir: tempfile::TempDir,
}

impl FsStore {
    pub fn new(chunk_length: usize) -> Self {
        Self {
            chunk_length,
            length: None,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    #[inline]
    pub fn with_length(self, length: u64) -> Self {
        Self {
            length: Some(length),
            ..self
        }
    }

    fn chunk_path(&self, index: ChunkIndex) -> PathBuf {
        self.dir.path().join(index.to_string())
    }
}

impl ChunkStore for FsStore {
    type Error = io::Error;

    fn chunk_length(&self) -> Option<usize> {
        Some(self.chunk_length)
    }

    fn length(&self) -> Option<u64> {
        self.length
    }
}

impl ReadChunk for FsStore {
    async fn get(&self, index: ChunkIndex, range: ChunkRange) -> io::Result<Bytes> {
        let chunk = match tokio::fs::read(self.chunk_path(index)).await {
            Ok(chunk) => chunk,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(not_found(index)),
            Err(err) => return Err(err),
        };

        slice(chunk.into(), index, range)
    }
}

impl WriteChunk for FsStore {
    async fn put(&self, index: ChunkIndex, chunk: Bytes) -> io::Result<()> {
        tokio::fs::write(self.chunk_path(index), chunk).await
    }
}

/// Chunk store wrapper recording calls, gauging in-flight puts and injecting failures.
#[derive(Debug)]
pub struct Instrumented<S> {
    inner: S,
    gets: Mutex<Vec<ChunkIndex>>,
    puts: Mutex<Vec<ChunkIndex>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    fail_get: Option<ChunkIndex>,
    fail_put: Option<ChunkIndex>,
    put_yields: usize,
    stalled_puts: bool,
}

impl<S> Instrumented<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            gets: Default::default(),
            puts: Default::default(),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            fail_get: None,
            fail_put: None,
            put_yields: 0,
            stalled_puts: false,
        }
    }

    /// Fail the `get` of chunk `index`.
    #[inline]
    pub fn with_failing_get(self, index: ChunkIndex) -> Self {
        Self {
            fail_get: Some(index),
            ..self
        }
    }

    /// Fail the `put` of chunk `index`, right when issued.
    #[inline]
    pub fn with_failing_put(self, index: ChunkIndex) -> Self {
        Self {
            fail_put: Some(index),
            ..self
        }
    }

    /// Keep every successful `put` pending for `yields` scheduler rounds.
    #[inline]
    pub fn with_put_yields(self, yields: usize) -> Self {
        Self {
            put_yields: yields,
            ..self
        }
    }

    /// Never acknowledge any successful `put`.
    #[inline]
    pub fn with_stalled_puts(self) -> Self {
        Self {
            stalled_puts: true,
            ..self
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn gets(&self) -> Vec<ChunkIndex> {
        self.gets.lock().unwrap().clone()
    }

    pub fn puts(&self) -> Vec<ChunkIndex> {
        self.puts.lock().unwrap().clone()
    }

    /// Highest number of puts simultaneously in flight.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl<S: ChunkStore<Error = io::Error>> ChunkStore for Instrumented<S> {
    type Error = io::Error;

    fn chunk_length(&self) -> Option<usize> {
        self.inner.chunk_length()
    }

    fn length(&self) -> Option<u64> {
        self.inner.length()
    }
}

impl<S: ReadChunk<Error = io::Error>> ReadChunk for Instrumented<S> {
    async fn get(&self, index: ChunkIndex, range: ChunkRange) -> io::Result<Bytes> {
        self.gets.lock().unwrap().push(index);

        if self.fail_get == Some(index) {
            return Err(io::Error::other(format!("injected get failure on chunk {index}")));
        }

        self.inner.get(index, range).await
    }
}

impl<S: WriteChunk<Error = io::Error>> WriteChunk for Instrumented<S> {
    async fn put(&self, index: ChunkIndex, chunk: Bytes) -> io::Result<()> {
        self.puts.lock().unwrap().push(index);

        if self.fail_put == Some(index) {
            return Err(io::Error::other(format!("injected put failure on chunk {index}")));
        }

        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(in_flight, Ordering::SeqCst);

        for _ in 0..self.put_yields {
            tokio::task::yield_now().await;
        }

        if self.stalled_puts {
            futures::future::pending::<()>().await;
        }

        let result = self.inner.put(index, chunk).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        result
    }
}
