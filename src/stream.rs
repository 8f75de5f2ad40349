use crate::{Input, Result};

use bytes::BufMut;

/// Common protocol of every compression and decompression stream.
///
/// A stream is driven by alternately supplying input and draining output:
///
/// 1. while [`needs_input`](ZStream::needs_input) is true, hand it the next chunk with
///    [`set_input`](ZStream::set_input);
/// 2. drain output with [`Compressor::compress`] or [`Decompressor::decompress`];
/// 3. repeat until [`finished`](ZStream::finished).
///
/// Streams are not safe for concurrent use and do no locking of their own.
pub trait ZStream {
    /// Whether the stream has used up its input and must be given more before it can progress.
    ///
    /// Never true at the same time as [`finished`](ZStream::finished).
    fn needs_input(&self) -> bool;

    /// Attach the next chunk of input.
    ///
    /// Fails with [`Error::Protocol`](crate::Error::Protocol) unless
    /// [`needs_input`](ZStream::needs_input) is true. An input with no remaining bytes is
    /// dropped straight away and leaves the stream needing input.
    fn set_input(&mut self, input: Input) -> Result<()>;

    /// Whether the end of the stream has been reached and all output has been drained.
    fn finished(&self) -> bool;

    /// Discard buffered data and any earlier failure, keeping the backend resources so a new,
    /// independent stream can be processed.
    fn reset(&mut self) -> Result<()>;

    /// Release the backend resources. Every later operation fails with
    /// [`Error::Closed`](crate::Error::Closed).
    fn close(&mut self);
}

/// A stream turning plain data into a zlib stream.
pub trait Compressor: ZStream {
    /// Compress as much as fits into `output`, returning the number of bytes written.
    ///
    /// Does nothing when `output` has no room left or the stream is finished.
    fn compress(&mut self, output: &mut dyn BufMut) -> Result<usize>;

    /// Mark that no input will follow the input already supplied.
    fn finish(&mut self);
}

/// A stream turning a zlib stream back into plain data.
pub trait Decompressor: ZStream {
    /// Decompress as much as fits into `output`, returning the number of bytes written.
    ///
    /// Does nothing when `output` has no room left or the stream is finished.
    fn decompress(&mut self, output: &mut dyn BufMut) -> Result<usize>;

    /// Supplied input bytes the decompressor has not consumed yet.
    ///
    /// Non-zero once [`finished`](ZStream::finished) means data followed the end of the zlib
    /// stream.
    fn remaining(&self) -> usize;
}

impl<S: ZStream + ?Sized> ZStream for Box<S> {
    fn needs_input(&self) -> bool {
        (**self).needs_input()
    }

    fn set_input(&mut self, input: Input) -> Result<()> {
        (**self).set_input(input)
    }

    fn finished(&self) -> bool {
        (**self).finished()
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

impl<C: Compressor + ?Sized> Compressor for Box<C> {
    fn compress(&mut self, output: &mut dyn BufMut) -> Result<usize> {
        (**self).compress(output)
    }

    fn finish(&mut self) {
        (**self).finish()
    }
}

impl<D: Decompressor + ?Sized> Decompressor for Box<D> {
    fn decompress(&mut self, output: &mut dyn BufMut) -> Result<usize> {
        (**self).decompress(output)
    }

    fn remaining(&self) -> usize {
        (**self).remaining()
    }
}
