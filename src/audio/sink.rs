use anyhow::Result;
use async_trait::async_trait;

/// Streaming destination for captured audio
///
/// Samples arrive in chunks while recording is in progress and are written as
/// they come rather than buffered until the end.
#[async_trait]
pub trait AudioSink: Send {
    /// Write audio samples. The Vec is moved to avoid copying.
    fn write_chunk(&mut self, samples: Vec<f32>) -> Result<()>;

    /// Flush everything written so far and publish the result
    async fn finalize(&mut self) -> Result<()>;

    /// Close the sink without publishing; whatever was published before stays
    async fn discard(&mut self) -> Result<()>;
}
