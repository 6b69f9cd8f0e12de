use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

/// Byte and file counters shared by concurrent workers.
///
/// The byte total is an estimate. Bytes beyond it (a compressed archive can
/// outgrow its inputs) are absorbed, so the position never passes 100%.
pub struct Progress {
    max_bytes: u64,
    bytes: AtomicU64,
    total_files: usize,
    files: AtomicUsize,
    label: String,
    bar: Option<ProgressBar>,
}

impl Progress {
    /// Create an accounter, drawing a bar on stderr when `visible`.
    pub fn new(max_bytes: u64, total_files: usize, label: &str, visible: bool) -> Arc<Self> {
        let bar = visible.then(|| {
            let pb = ProgressBar::with_draw_target(Some(max_bytes), ProgressDrawTarget::stderr());
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        });
        let progress = Arc::new(Self {
            max_bytes,
            bytes: AtomicU64::new(0),
            total_files,
            files: AtomicUsize::new(0),
            label: label.to_string(),
            bar,
        });
        progress.refresh_message(0);
        progress
    }

    /// Accounter with no bar, for quiet runs and tests.
    pub fn hidden(max_bytes: u64, total_files: usize) -> Arc<Self> {
        Self::new(max_bytes, total_files, "", false)
    }

    /// Record `n` transferred bytes, capped at the estimate.
    pub fn add(&self, n: u64) {
        let max = self.max_bytes;
        let previous = self
            .bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(n).min(max))
            })
            .unwrap_or(max);
        if let Some(bar) = &self.bar {
            bar.set_position(previous.saturating_add(n).min(max));
        }
    }

    /// Mark one unit as finished.
    pub fn file_done(&self) {
        let total = self.total_files;
        let previous = self
            .files
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some((current + 1).min(total))
            })
            .unwrap_or(total);
        self.refresh_message((previous + 1).min(total));
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Acquire)
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn files_done(&self) -> usize {
        self.files.load(Ordering::Acquire)
    }

    pub fn total_files(&self) -> usize {
        self.total_files
    }

    /// `[n/total]` counter text.
    pub fn counter(&self) -> String {
        format!("[{}/{}]", self.files_done(), self.total_files)
    }

    /// Complete both counters and clear the bar.
    pub fn finish(&self) {
        self.bytes.store(self.max_bytes, Ordering::Release);
        self.files.store(self.total_files, Ordering::Release);
        if let Some(bar) = &self.bar {
            bar.set_position(self.max_bytes);
            bar.set_message(self.message(self.total_files));
            bar.finish_and_clear();
        }
    }

    fn refresh_message(&self, done: usize) {
        if let Some(bar) = &self.bar {
            bar.set_message(self.message(done));
        }
    }

    fn message(&self, done: usize) -> String {
        format!("[{}/{}] {}", done, self.total_files, self.label)
    }
}

/// `Write` adapter that reports every written byte to a [`Progress`]
pub struct CountingWriter<W> {
    inner: W,
    progress: Arc<Progress>,
}

impl<W> CountingWriter<W> {
    pub fn new(inner: W, progress: Arc<Progress>) -> Self {
        Self { inner, progress }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.progress.add(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for CountingWriter<W> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = &mut *self;
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = poll {
            this.progress.add(n as u64);
        }
        poll
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

/// Format a byte count with binary units (`1.5 MiB`).
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{} B", bytes);
    }
    let units = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    let mut value = bytes as f64 / UNIT as f64;
    let mut index = 0;
    while value >= UNIT as f64 && index < units.len() - 1 {
        value /= UNIT as f64;
        index += 1;
    }
    format!("{:.1} {}", value, units[index])
}
