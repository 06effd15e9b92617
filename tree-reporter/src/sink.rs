// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Output sinks for service messages.
//!
//! The result tree never interprets where its output goes: it hands each rendered line to a
//! [`MessageSink`], synchronously and in emission order. Consumers parse the stream incrementally,
//! so sinks should not reorder or batch writes across calls.

use std::io::{self, Write};

/// A destination for rendered service message lines.
///
/// For more, see the [module-level documentation](self).
pub trait MessageSink {
    /// Writes `text`, followed by a newline if `append_newline` is true.
    fn write_text(&mut self, text: &str, append_newline: bool) -> io::Result<()>;
}

impl MessageSink for String {
    fn write_text(&mut self, text: &str, append_newline: bool) -> io::Result<()> {
        self.push_str(text);
        if append_newline {
            self.push('\n');
        }
        Ok(())
    }
}

impl<T: MessageSink + ?Sized> MessageSink for &mut T {
    fn write_text(&mut self, text: &str, append_newline: bool) -> io::Result<()> {
        (**self).write_text(text, append_newline)
    }
}

impl<T: MessageSink + ?Sized> MessageSink for Box<T> {
    fn write_text(&mut self, text: &str, append_newline: bool) -> io::Result<()> {
        (**self).write_text(text, append_newline)
    }
}

/// A [`MessageSink`] over an [`io::Write`], flushing after every write.
///
/// Flushing per call keeps the stream live for consumers that render results while the run is in
/// progress, even when `W` is buffered.
#[derive(Debug)]
pub struct WriterSink<W> {
    inner: W,
}

impl<W: Write> WriterSink<W> {
    /// Creates a new sink over `inner`.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> MessageSink for WriterSink<W> {
    fn write_text(&mut self, text: &str, append_newline: bool) -> io::Result<()> {
        self.inner.write_all(text.as_bytes())?;
        if append_newline {
            self.inner.write_all(b"\n")?;
        }
        self.inner.flush()
    }
}

/// A [`MessageSink`] that forwards to a closure.
pub struct FnSink<F>(pub F);

impl<F> MessageSink for FnSink<F>
where
    F: FnMut(&str, bool) -> io::Result<()>,
{
    fn write_text(&mut self, text: &str, append_newline: bool) -> io::Result<()> {
        (self.0)(text, append_newline)
    }
}
