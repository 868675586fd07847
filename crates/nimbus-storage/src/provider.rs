use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use nimbus_core::Result;

use crate::chunk;

/// Lazy, finite sequence of object bytes. Each item is at most
/// [`CHUNK_SIZE`](crate::chunk::CHUNK_SIZE) bytes.
pub type ObjectStream = BoxStream<'static, Result<Bytes>>;

/// Uniform contract over every object storage backend.
///
/// Callers hold `Box<dyn ObjectStorage>` and never the concrete adapter, so
/// backends can be swapped through configuration alone.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Write `data` under `key`, replacing any existing object.
    async fn save(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Read the whole object into memory.
    async fn load_once(&self, key: &str) -> Result<Bytes>;

    /// Stream the object in fixed-size chunks.
    ///
    /// No request is made until the stream is first polled. A missing object
    /// surfaces as `NotFound` on that first poll; transport failures later on
    /// surface as `Backend` after the chunks already yielded.
    fn load_stream(&self, key: &str) -> ObjectStream;

    /// Stream the object into a local file, truncating what was there.
    ///
    /// The target is only opened once the object is known to exist.
    async fn download(&self, key: &str, target: &Path) -> Result<()> {
        chunk::write_stream_to_file(self.load_stream(key), target).await
    }

    /// Whether an object is present. Only a not-found answer maps to `false`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Remove the object. Behavior for a missing key is documented per adapter.
    async fn delete(&self, key: &str) -> Result<()>;
}
