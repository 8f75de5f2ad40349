//! Software backend built on `flate2`'s pure-Rust codec.
//!
//! The codec only works on byte slices, so every stream stages caller input and codec output
//! through two fixed windows of [`BUFFER_SIZE`] bytes each.

use std::fmt;

use bytes::{Buf, BufMut};
use tracing::trace;

use crate::{
    codec::{Codec, FlateDecoder, FlateEncoder},
    util::Window,
    Compressor, Decompressor, Error, Input, Level, Result, ZStream, ZlibProvider,
};

/// Capacity of each staging window.
pub const BUFFER_SIZE: usize = 1024;

/// Provider of streams running entirely in Rust, always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackProvider {
    level: Level,
}

impl FallbackProvider {
    /// Create a provider whose compressors use `level`.
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl ZlibProvider for FallbackProvider {
    fn create_compressor(&self) -> Result<Box<dyn Compressor + Send>> {
        let encoder = FlateEncoder::new(self.level.into_flate2());
        Ok(Box::new(FallbackCompressor {
            inner: Staged::new(encoder),
        }))
    }

    fn create_decompressor(&self) -> Result<Box<dyn Decompressor + Send>> {
        Ok(Box::new(FallbackDecompressor {
            inner: Staged::new(FlateDecoder::new()),
        }))
    }

    fn is_accelerated(&self) -> bool {
        false
    }
}

struct Staged<C> {
    codec: C,
    input: Option<Input>,
    staged: Window,
    output: Window,
    /// The last codec call filled the output window, so it may hold more output.
    pending: bool,
    /// The codec has emitted the end of the stream.
    done: bool,
    /// No input will follow, encoders only.
    finish: bool,
    failed: bool,
    closed: bool,
}

impl<C: Codec> Staged<C> {
    fn new(codec: C) -> Self {
        Self {
            codec,
            input: None,
            staged: Window::new(BUFFER_SIZE),
            output: Window::new(BUFFER_SIZE),
            pending: false,
            done: false,
            finish: false,
            failed: false,
            closed: false,
        }
    }

    /// The end of the stream may be signalled to the codec: finish was requested and every
    /// supplied byte has been handed over.
    fn finishing(&self) -> bool {
        self.finish && self.input.is_none() && self.staged.is_drained()
    }

    /// Needs input ignoring the attached caller input: nothing is staged in either window.
    fn codec_needs_input(&self) -> bool {
        !self.done
            && !self.pending
            && !self.finishing()
            && self.staged.is_drained()
            && self.output.is_drained()
    }

    fn needs_input(&self) -> bool {
        self.input.is_none() && self.codec_needs_input()
    }

    fn finished(&self) -> bool {
        self.done && self.output.is_drained()
    }

    fn remaining(&self) -> usize {
        self.input.as_ref().map_or(0, |input| input.remaining()) + self.staged.readable().len()
    }

    fn set_input(&mut self, input: Input) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        if !self.needs_input() {
            return Err(Error::Protocol("input supplied before the previous input was used"));
        }
        if input.has_remaining() {
            self.input = Some(input);
        }
        Ok(())
    }

    fn stage_input(&mut self) {
        let mut exhausted = false;
        if let Some(input) = &mut self.input {
            self.staged.rewind();
            let space = self.staged.writable_mut();
            let len = space.len().min(input.remaining());
            input.copy_to_slice(&mut space[..len]);
            self.staged.fill(len);
            exhausted = !input.has_remaining();
            trace!(len, "staged input");
        }
        if exhausted {
            self.input = None;
        }
    }

    fn process(&mut self, output: &mut dyn BufMut) -> Result<usize> {
        if self.closed {
            return Err(Error::Closed);
        }
        if self.failed {
            return Err(Error::Protocol("stream failed and must be reset"));
        }
        if self.needs_input() {
            return Err(Error::Protocol("stream needs input"));
        }
        if self.finished() || !output.has_remaining_mut() {
            return Ok(0);
        }

        if self.output.is_drained() {
            self.output.rewind();
        }

        if !self.done && !self.output.is_full() {
            if self.codec_needs_input() {
                self.stage_input();
            }

            let finishing = self.finishing();
            let result =
                self.codec
                    .process(self.staged.readable(), self.output.writable_mut(), finishing);
            let (done, consumed, produced) = match result {
                Ok(progress) => progress,
                Err(err) => {
                    self.failed = true;
                    return Err(err);
                }
            };

            self.staged.consume(consumed);
            self.output.fill(produced);
            self.pending = self.output.is_full();
            self.done = done;
        }

        let len = output.remaining_mut().min(self.output.readable().len());
        if len != 0 {
            output.put_slice(&self.output.readable()[..len]);
            self.output.consume(len);
            trace!(len, "delivered output");
        }
        Ok(len)
    }

    fn reset(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        self.codec.reset();
        self.input = None;
        self.staged.clear();
        self.output.clear();
        self.pending = false;
        self.done = false;
        self.finish = false;
        self.failed = false;
        Ok(())
    }

    fn close(&mut self) {
        self.input = None;
        self.closed = true;
    }
}

impl<C> fmt::Debug for Staged<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Staged")
            .field("input", &self.input.as_ref().map(|input| input.remaining()))
            .field("staged", &self.staged.readable().len())
            .field("output", &self.output.readable().len())
            .field("pending", &self.pending)
            .field("done", &self.done)
            .field("finish", &self.finish)
            .field("failed", &self.failed)
            .field("closed", &self.closed)
            .finish()
    }
}

macro_rules! delegate_zstream {
    ($name:ident) => {
        impl ZStream for $name {
            fn needs_input(&self) -> bool {
                self.inner.needs_input()
            }

            fn set_input(&mut self, input: Input) -> Result<()> {
                self.inner.set_input(input)
            }

            fn finished(&self) -> bool {
                self.inner.finished()
            }

            fn reset(&mut self) -> Result<()> {
                self.inner.reset()
            }

            fn close(&mut self) {
                self.inner.close()
            }
        }
    };
}

/// Compressor of the software backend.
#[derive(Debug)]
pub struct FallbackCompressor {
    inner: Staged<FlateEncoder>,
}

delegate_zstream!(FallbackCompressor);

impl Compressor for FallbackCompressor {
    fn compress(&mut self, output: &mut dyn BufMut) -> Result<usize> {
        self.inner.process(output)
    }

    fn finish(&mut self) {
        self.inner.finish = true;
    }
}

/// Decompressor of the software backend.
#[derive(Debug)]
pub struct FallbackDecompressor {
    inner: Staged<FlateDecoder>,
}

delegate_zstream!(FallbackDecompressor);

impl Decompressor for FallbackDecompressor {
    fn decompress(&mut self, output: &mut dyn BufMut) -> Result<usize> {
        self.inner.process(output)
    }

    fn remaining(&self) -> usize {
        self.inner.remaining()
    }
}
