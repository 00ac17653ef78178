//! This module provides chunk store writing features.

use std::pin::pin;

use bytes::Buf;
use futures::future::FutureExt;
use futures::stream::{FuturesUnordered, Stream, StreamExt};
use tokio::io::AsyncRead;

use crate::blocks::{blocks, reader_stream};
use crate::{BoxError, ChunkIndex, Error, WriteChunk, WriteConfig, WriteOptions};

/// Write a byte stream to a chunk store.
///
/// Options are first resolved against the store properties, failing with a
/// [`ConfigurationError`](crate::ConfigurationError) before the stream is polled.
///
/// The stream is sliced into chunks of exactly the chunk length (the final one being shorter, or zero padded when
/// asked to), which are put at indices `0, 1, 2, ...` in order. Puts are issued without waiting for previous ones to be
/// acknowledged, as long as no more than `max_outstanding_puts` are in flight. Beyond that, the stream is not polled any
/// further until a put is acknowledged, so that at most `max_outstanding_puts + 1` puts are ever in flight at once.
///
/// Everything runs on the caller's task: no task is spawned, puts are driven alongside the input stream.
///
/// Completes once the input stream is exhausted and every put has been acknowledged. The first failing put, or input
/// stream error, aborts the write: outstanding puts are dropped and neither the stream nor the store are reached
/// anymore.
pub async fn write<S, St, B, E>(store: &S, stream: St, options: WriteOptions) -> Result<(), Error>
where
    S: WriteChunk,
    St: Stream<Item = Result<B, E>>,
    B: Buf,
    E: Into<BoxError>,
{
    let WriteConfig {
        chunk_length,
        max_outstanding_puts,
        zero_padding,
    } = options.resolve(store)?;

    tracing::debug!(
        "Writing to chunk store with chunk length {chunk_length} and {max_outstanding_puts} max. outstanding puts"
    );

    let mut blocks = pin!(blocks(stream, chunk_length, zero_padding));
    let mut puts = FuturesUnordered::new();

    let mut index: ChunkIndex = 0;
    let mut exhausted = false;

    loop {
        tokio::select! {
            biased;

            Some(ack) = puts.next(), if !puts.is_empty() => {
                let (index, result) = ack;

                if let Err(err) = result {
                    tracing::debug!("Failed to put chunk {index}, aborting {} outstanding puts: {err}", puts.len());

                    return Err(Error::store(err));
                }

                tracing::trace!("Put chunk {index} acknowledged");
            }
            // admit one more put than the configured maximum
            block = blocks.next(), if !exhausted && puts.len() <= max_outstanding_puts.get() => match block {
                Some(Ok(block)) => {
                    tracing::trace!("Putting chunk {index} ({} bytes, {} outstanding)", block.len(), puts.len());

                    let put_index = index;
                    puts.push(store.put(put_index, block).map(move |result| (put_index, result)));

                    index += 1;
                }
                Some(Err(err)) => {
                    tracing::debug!("Input stream failed, aborting {} outstanding puts", puts.len());

                    return Err(Error::input(err));
                }
                None => {
                    tracing::trace!("Input stream exhausted, waiting for {} outstanding puts", puts.len());

                    exhausted = true;
                }
            },
            else => break,
        }
    }

    tracing::debug!("Wrote {index} chunks to chunk store");

    Ok(())
}

/// Write the content of an [`AsyncRead`] to a chunk store.
///
/// See [`write()`] for details, the reader being consumed as a byte stream.
pub async fn write_reader<S, R>(store: &S, reader: R, options: WriteOptions) -> Result<(), Error>
where
    S: WriteChunk,
    R: AsyncRead,
{
    let capacity = options.resolve(store)?.chunk_length;

    write(store, reader_stream(reader, capacity), options).await
}
