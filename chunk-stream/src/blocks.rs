//! This module provides block-boundary slicing of byte streams.

use std::num::NonZeroUsize;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use futures::stream::{self, Stream, TryStreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Upper bound of the buffer space reserved before each read in [`reader_stream()`].
const MAX_READ_RESERVE: usize = 64 * 1_024;

/// Slice a byte stream into blocks of exactly `chunk_length` bytes.
///
/// Incoming buffers are re-sliced regardless of their own boundaries. The final block may be shorter than `chunk_length`,
/// unless `zero_padding` is set, in which case it is padded with zero bytes up to `chunk_length`. An empty input produces
/// no block at all.
///
/// An error from the input stream is forwarded as is and ends the block stream.
///
/// # Example
/// ```
/// # tokio_test::block_on(async {
/// use bytes::Bytes;
/// use futures::{stream, TryStreamExt};
/// # use chunk_stream::blocks::blocks;
/// let input = stream::iter([Ok::<_, std::io::Error>(Bytes::from_static(b"ab")), Ok(Bytes::from_static(b"cd"))]);
///
/// let chunks: Vec<Bytes> = blocks(input, 3.try_into().unwrap(), true).try_collect().await.unwrap();
///
/// assert_eq!(chunks, vec![Bytes::from_static(b"abc"), Bytes::from_static(b"d\0\0")]);
/// # })
/// ```
pub fn blocks<S, B, E>(stream: S, chunk_length: NonZeroUsize, zero_padding: bool) -> impl Stream<Item = Result<Bytes, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: Buf,
{
    let size = chunk_length.get();
    // grow with incoming data only, chunk length may be arbitrarily large
    let state = (Box::pin(stream), BytesMut::new(), false);

    stream::try_unfold(state, move |(mut stream, mut buf, mut ended)| async move {
        loop {
            if buf.len() >= size {
                let block = buf.split_to(size).freeze();
                return Ok(Some((block, (stream, buf, ended))));
            }

            if ended {
                if buf.is_empty() {
                    return Ok(None);
                }

                if zero_padding {
                    buf.resize(size, 0);
                }

                let block = buf.split().freeze();
                return Ok(Some((block, (stream, buf, ended))));
            }

            match stream.try_next().await {
                Ok(Some(data)) => buf.put(data),
                Ok(None) => ended = true,
                Err(err) => return Err(err),
            }
        }
    })
}

/// Turn an [`AsyncRead`] into a byte stream, reading up to `capacity` bytes at once.
///
/// No more than 64 KiB are reserved before each read, whatever the `capacity`.
pub fn reader_stream<R: AsyncRead>(reader: R, capacity: NonZeroUsize) -> impl Stream<Item = std::io::Result<Bytes>> {
    let capacity = capacity.get().min(MAX_READ_RESERVE);
    let state = (Box::pin(reader), BytesMut::new());

    stream::try_unfold(state, move |(mut reader, mut buf)| async move {
        buf.reserve(capacity);

        match reader.read_buf(&mut buf).await {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some((buf.split().freeze(), (reader, buf)))),
            Err(err) => Err(err),
        }
    })
}
