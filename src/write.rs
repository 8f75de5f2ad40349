//! Adaptors pushing data through a stream into a [`std::io::Write`].

use std::io::{self, Write};

use bytes::{BufMut, Bytes};

use crate::{
    fallback::BUFFER_SIZE, Compressor, Decompressor, Input, Result, ZStream, ZlibProvider,
};

/// A stream seen from the writer side: one drain operation and a way to end the input.
pub(crate) trait Drive {
    fn needs_input(&self) -> bool;
    fn finished(&self) -> bool;
    fn set_input(&mut self, input: Input) -> Result<()>;
    fn drive(&mut self, output: &mut dyn BufMut) -> Result<usize>;
    fn close(&mut self);

    /// No more input will be written.
    fn end_input(&mut self) {}

    /// The stream ended before all supplied input was used.
    fn trailing_input(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub(crate) struct Compressing<C>(pub(crate) C);

impl<C: Compressor> Drive for Compressing<C> {
    fn needs_input(&self) -> bool {
        self.0.needs_input()
    }

    fn finished(&self) -> bool {
        self.0.finished()
    }

    fn set_input(&mut self, input: Input) -> Result<()> {
        self.0.set_input(input)
    }

    fn drive(&mut self, output: &mut dyn BufMut) -> Result<usize> {
        self.0.compress(output)
    }

    fn close(&mut self) {
        self.0.close()
    }

    fn end_input(&mut self) {
        self.0.finish()
    }
}

#[derive(Debug)]
pub(crate) struct Decompressing<D>(pub(crate) D);

impl<D: Decompressor> Drive for Decompressing<D> {
    fn needs_input(&self) -> bool {
        self.0.needs_input()
    }

    fn finished(&self) -> bool {
        self.0.finished()
    }

    fn set_input(&mut self, input: Input) -> Result<()> {
        self.0.set_input(input)
    }

    fn drive(&mut self, output: &mut dyn BufMut) -> Result<usize> {
        self.0.decompress(output)
    }

    fn close(&mut self) {
        self.0.close()
    }

    fn trailing_input(&self) -> bool {
        self.0.finished() && self.0.remaining() != 0
    }
}

pub(crate) fn truncated() -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "zlib stream ended before it was complete",
    )
}

pub(crate) fn after_end() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        "extra data after end of zlib stream",
    )
}

#[derive(Debug)]
struct Writer<W, S> {
    writer: W,
    stream: S,
    block: Box<[u8]>,
    ended: bool,
}

impl<W: Write, S: Drive> Writer<W, S> {
    fn new(writer: W, stream: S) -> Self {
        Self {
            writer,
            stream,
            block: vec![0; BUFFER_SIZE].into_boxed_slice(),
            ended: false,
        }
    }

    /// Drain the stream into the writer until it needs input or is finished.
    fn pump(&mut self) -> io::Result<()> {
        while !self.stream.needs_input() && !self.stream.finished() {
            let mut out = &mut self.block[..];
            let len = self.stream.drive(&mut out)?;
            self.writer.write_all(&self.block[..len])?;
        }
        if self.stream.trailing_input() {
            return Err(after_end());
        }
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.ended || self.stream.finished() {
            return Err(after_end());
        }
        self.pump()?;
        self.stream
            .set_input(Box::new(Bytes::copy_from_slice(buf)))?;
        self.pump()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.pump()?;
        self.writer.flush()
    }

    fn finish(mut self) -> io::Result<W> {
        self.ended = true;
        self.stream.end_input();
        while !self.stream.finished() {
            if self.stream.needs_input() {
                return Err(truncated());
            }
            self.pump()?;
        }
        self.stream.close();
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Compresses everything written to it into the wrapped writer.
#[derive(Debug)]
pub struct CompressWriter<W, C = Box<dyn Compressor + Send>> {
    inner: Writer<W, Compressing<C>>,
}

impl<W: Write> CompressWriter<W> {
    /// Compress into `writer` with a new compressor from `provider`.
    pub fn new(writer: W, provider: &dyn ZlibProvider) -> Result<Self> {
        Ok(Self::with_compressor(writer, provider.create_compressor()?))
    }
}

impl<W: Write, C: Compressor> CompressWriter<W, C> {
    /// Compress into `writer` with the given compressor, which must be fresh or reset.
    pub fn with_compressor(writer: W, compressor: C) -> Self {
        Self {
            inner: Writer::new(writer, Compressing(compressor)),
        }
    }

    /// Acquires a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.inner.writer
    }

    /// Acquires a mutable reference to the underlying writer.
    ///
    /// Writing to it directly corrupts the compressed stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner.writer
    }

    /// End the stream, write its remaining output, close the compressor and return the writer.
    pub fn finish(self) -> io::Result<W> {
        self.inner.finish()
    }
}

impl<W: Write, C: Compressor> Write for CompressWriter<W, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Decompresses everything written to it into the wrapped writer.
#[derive(Debug)]
pub struct DecompressWriter<W, D = Box<dyn Decompressor + Send>> {
    inner: Writer<W, Decompressing<D>>,
}

impl<W: Write> DecompressWriter<W> {
    /// Decompress into `writer` with a new decompressor from `provider`.
    pub fn new(writer: W, provider: &dyn ZlibProvider) -> Result<Self> {
        Ok(Self::with_decompressor(writer, provider.create_decompressor()?))
    }
}

impl<W: Write, D: Decompressor> DecompressWriter<W, D> {
    /// Decompress into `writer` with the given decompressor, which must be fresh or reset.
    pub fn with_decompressor(writer: W, decompressor: D) -> Self {
        Self {
            inner: Writer::new(writer, Decompressing(decompressor)),
        }
    }

    /// Acquires a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.inner.writer
    }

    /// Acquires a mutable reference to the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner.writer
    }

    /// Check the stream is complete, close the decompressor and return the writer.
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] if the compressed data was cut short.
    pub fn finish(self) -> io::Result<W> {
        self.inner.finish()
    }
}

impl<W: Write, D: Decompressor> Write for DecompressWriter<W, D> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
