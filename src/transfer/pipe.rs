//! In-memory producer/consumer conduit.
//!
//! A pipe joins a streaming producer (archive encoder, multipart body builder,
//! HTTP download) to a streaming consumer (HTTP request body, archive decoder)
//! without a backing store. The channel holds a single chunk, so a producer
//! that runs ahead of its consumer blocks instead of growing memory.
//!
//! The write side closes when the [`PipeWriter`] is dropped, which makes
//! closing exactly once automatic on every exit path, including panics.
//! Producer failures come back through the task handle, never through the
//! byte stream. If the read side goes away first, further writes fail with
//! [`io::ErrorKind::BrokenPipe`].

use crate::core::{NexusError, NexusResult};
use bytes::Bytes;
use futures_util::stream::{BoxStream, StreamExt};
use std::io::{self, Read, Write};
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::PollSender;

const PIPE_SLOTS: usize = 1;

/// Owned stream of byte chunks read from a pipe
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Create a connected writer/reader pair.
pub fn pipe() -> (PipeWriter, PipeReader) {
    let (sender, receiver) = mpsc::channel::<Bytes>(PIPE_SLOTS);
    (
        PipeWriter {
            sender: PollSender::new(sender),
        },
        PipeReader {
            receiver,
            pending: Bytes::new(),
        },
    )
}

fn broken_pipe() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader closed")
}

/// Write side of a pipe.
///
/// Implements blocking [`Write`] for use on the blocking pool and
/// [`AsyncWrite`] for use from async tasks. Do not mix both on one writer.
pub struct PipeWriter {
    sender: PollSender<Bytes>,
}

impl PipeWriter {
    /// Close the write side now. Dropping the writer does the same.
    pub fn close(mut self) {
        self.sender.close();
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let sender = self.sender.get_ref().ok_or_else(broken_pipe)?;
        sender
            .blocking_send(Bytes::copy_from_slice(buf))
            .map_err(|_| broken_pipe())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsyncWrite for PipeWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }
        let this = &mut *self;
        if ready!(this.sender.poll_reserve(cx)).is_err() {
            return Poll::Ready(Err(broken_pipe()));
        }
        match this.sender.send_item(Bytes::copy_from_slice(buf)) {
            Ok(()) => Poll::Ready(Ok(buf.len())),
            Err(_) => Poll::Ready(Err(broken_pipe())),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.sender.close();
        Poll::Ready(Ok(()))
    }
}

/// Read side of a pipe
pub struct PipeReader {
    receiver: mpsc::Receiver<Bytes>,
    pending: Bytes,
}

impl PipeReader {
    /// Turn the read side into an async byte stream, e.g. an HTTP request body.
    pub fn into_stream(self) -> ByteStream {
        futures_util::stream::unfold(self, |mut reader| async move {
            if !reader.pending.is_empty() {
                let chunk = std::mem::take(&mut reader.pending);
                return Some((Ok::<Bytes, io::Error>(chunk), reader));
            }
            let chunk = reader.receiver.recv().await?;
            Some((Ok(chunk), reader))
        })
        .boxed()
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pending.is_empty() {
            match self.receiver.blocking_recv() {
                Some(chunk) => self.pending = chunk,
                None => return Ok(0),
            }
        }
        let n = buf.len().min(self.pending.len());
        let chunk = self.pending.split_to(n);
        buf[..n].copy_from_slice(&chunk);
        Ok(n)
    }
}

/// Completion report of the task on the far side of a pipe
pub struct PipeTask<T> {
    handle: JoinHandle<NexusResult<T>>,
}

impl<T> PipeTask<T> {
    /// Wait for the task and return its result.
    pub async fn wait(self) -> NexusResult<T> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(NexusError::Pipe(format!("pipe task failed: {}", e))),
        }
    }
}

/// Run a blocking producer on its own task, writing into a new pipe.
///
/// The writer is owned by the task and dropped when `produce` returns, so the
/// reader always sees end-of-stream.
pub fn spawn_producer<F>(produce: F) -> (PipeReader, PipeTask<()>)
where
    F: FnOnce(&mut PipeWriter) -> NexusResult<()> + Send + 'static,
{
    let (mut writer, reader) = pipe();
    let handle = tokio::task::spawn_blocking(move || {
        let result = produce(&mut writer);
        drop(writer);
        result
    });
    (reader, PipeTask { handle })
}

/// Run a blocking consumer on its own task, reading from a new pipe.
///
/// The caller drives the returned writer and must drop it when done.
pub fn spawn_consumer<F, T>(consume: F) -> (PipeWriter, PipeTask<T>)
where
    F: FnOnce(PipeReader) -> NexusResult<T> + Send + 'static,
    T: Send + 'static,
{
    let (writer, reader) = pipe();
    let handle = tokio::task::spawn_blocking(move || consume(reader));
    (writer, PipeTask { handle })
}
