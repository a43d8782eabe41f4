//! Transport trait for byte-stream sources

use crate::Result;

/// A serial-like byte stream the read loop polls.
///
/// The read loop is the only caller once a transport is handed to a link, so
/// methods take `&mut self`. Implementations decide how bytes arrive; the loop
/// only needs to know how many are waiting and to read them without blocking
/// for more.
#[async_trait::async_trait]
pub trait Transport: Send + 'static {
    /// Number of bytes that can be read without waiting.
    ///
    /// An error here is treated as a lost connection.
    async fn bytes_available(&mut self) -> Result<usize>;

    /// Read up to `buf.len()` bytes that are already available.
    ///
    /// Returns the number of bytes copied into `buf`.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write all of `bytes`.
    async fn write(&mut self, bytes: &[u8]) -> Result<()>;

    fn is_open(&self) -> bool;

    async fn open(&mut self) -> Result<()>;

    async fn close(&mut self) -> Result<()>;

    /// Drop bytes received but not yet read.
    async fn discard_input(&mut self) -> Result<()> {
        Ok(())
    }

    /// Drop bytes queued for sending but not yet sent.
    async fn discard_output(&mut self) -> Result<()> {
        Ok(())
    }

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        "transport"
    }
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available().await
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf).await
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes).await
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    async fn open(&mut self) -> Result<()> {
        (**self).open().await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }

    async fn discard_input(&mut self) -> Result<()> {
        (**self).discard_input().await
    }

    async fn discard_output(&mut self) -> Result<()> {
        (**self).discard_output().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
