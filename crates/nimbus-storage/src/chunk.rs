//! Fixed-size chunking over provider byte streams.
//!
//! Providers hand back bodies in whatever frame sizes their transport
//! produces. Everything here re-slices them so callers always see
//! `CHUNK_SIZE` chunks, with a shorter final chunk and nothing at all for an
//! empty object.

use std::future::Future;
use std::path::Path;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use tokio::io::AsyncWriteExt;

use nimbus_core::Result;

use crate::provider::ObjectStream;

/// Bytes per chunk yielded by `load_stream`.
pub const CHUNK_SIZE: usize = 1024;

/// Re-slice `source` into `chunk_size` chunks.
///
/// Buffers at most one partial chunk plus one source frame. The first error
/// from `source` is yielded and ends the stream.
pub fn fixed_chunks<S>(source: S, chunk_size: usize) -> ObjectStream
where
    S: Stream<Item = Result<Bytes>> + Send + 'static,
{
    assert!(chunk_size > 0, "chunk size must be non-zero");
    let state = (Box::pin(source), BytesMut::with_capacity(chunk_size), false);

    stream::try_unfold(state, move |(mut source, mut buf, mut exhausted)| async move {
        loop {
            if buf.len() >= chunk_size {
                let chunk = buf.split_to(chunk_size).freeze();
                return Ok(Some((chunk, (source, buf, exhausted))));
            }
            if exhausted {
                if buf.is_empty() {
                    return Ok(None);
                }
                let chunk = buf.split().freeze();
                return Ok(Some((chunk, (source, buf, exhausted))));
            }
            match source.next().await {
                Some(Ok(frame)) => buf.extend_from_slice(&frame),
                Some(Err(e)) => return Err(e),
                None => exhausted = true,
            }
        }
    })
    .boxed()
}

/// Defer `open` until the first poll, then chunk whatever body it returns.
///
/// This is the shape every adapter's `load_stream` takes: `open` issues the
/// ranged/streaming read and normalizes its errors, so a missing object shows
/// up as the first item of the stream.
pub fn lazy_chunks<F, S>(open: F) -> ObjectStream
where
    F: Future<Output = Result<S>> + Send + 'static,
    S: Stream<Item = Result<Bytes>> + Send + 'static,
{
    fixed_chunks(stream::once(open).try_flatten(), CHUNK_SIZE)
}

/// Drain `stream` into `target`, creating or truncating it.
///
/// The file is opened only after the first item arrived, so a `NotFound`
/// leaves an existing target untouched. A mid-stream failure leaves a
/// partial file behind.
pub async fn write_stream_to_file(mut stream: ObjectStream, target: &Path) -> Result<()> {
    let first = stream.try_next().await?;
    let mut file = tokio::fs::File::create(target).await?;
    if let Some(chunk) = first {
        file.write_all(&chunk).await?;
        while let Some(chunk) = stream.try_next().await? {
            file.write_all(&chunk).await?;
        }
    }
    file.flush().await?;
    Ok(())
}
