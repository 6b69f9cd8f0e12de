//! Streaming `multipart/form-data` encoder.
//!
//! Unlike a buffered form, parts are written straight to the underlying
//! writer as they are produced, so a file part can be fed from a reader or an
//! archive encoder of any size.

use std::io::{self, Write};
use uuid::Uuid;

/// Fresh random boundary string.
pub fn new_boundary() -> String {
    format!("nexuscli-{}", Uuid::new_v4().simple())
}

/// `Content-Type` header value for a boundary.
pub fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={}", boundary)
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Incremental multipart writer.
///
/// Bytes written through the [`Write`] impl become the body of the part most
/// recently opened with [`MultipartWriter::begin_file`].
pub struct MultipartWriter<W: Write> {
    inner: W,
    boundary: String,
    part_open: bool,
}

impl<W: Write> MultipartWriter<W> {
    pub fn new(inner: W, boundary: impl Into<String>) -> Self {
        Self {
            inner,
            boundary: boundary.into(),
            part_open: false,
        }
    }

    fn open_part(&mut self, disposition: &str, content_type: Option<&str>) -> io::Result<()> {
        if self.part_open {
            self.inner.write_all(b"\r\n")?;
        }
        write!(self.inner, "--{}\r\n", self.boundary)?;
        write!(self.inner, "Content-Disposition: {}\r\n", disposition)?;
        if let Some(ct) = content_type {
            write!(self.inner, "Content-Type: {}\r\n", ct)?;
        }
        self.inner.write_all(b"\r\n")?;
        self.part_open = true;
        Ok(())
    }

    /// Start a file part; its content follows through `write`.
    pub fn begin_file(&mut self, field: &str, filename: &str) -> io::Result<()> {
        let disposition = format!(
            "form-data; name=\"{}\"; filename=\"{}\"",
            escape_quotes(field),
            escape_quotes(filename)
        );
        self.open_part(&disposition, Some("application/octet-stream"))
    }

    /// Write a complete text field.
    pub fn text(&mut self, field: &str, value: &str) -> io::Result<()> {
        let disposition = format!("form-data; name=\"{}\"", escape_quotes(field));
        self.open_part(&disposition, None)?;
        self.inner.write_all(value.as_bytes())
    }

    /// Write the closing boundary and hand back the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.part_open {
            self.inner.write_all(b"\r\n")?;
        }
        write!(self.inner, "--{}--\r\n", self.boundary)?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for MultipartWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
