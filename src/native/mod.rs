//! Backend driving the system zlib directly over caller memory.
//!
//! Streams hand the caller's buffers straight to zlib without staging, so every buffer must be
//! directly addressable: see [`is_direct_input`] and [`is_direct_output`]. Anything else is
//! rejected with [`Error::InvalidBufferKind`] before zlib is called.

mod ffi;
mod handle;

use std::{fmt, os::raw::c_int, path::Path, sync::Arc};

use bytes::{Buf, BufMut};

use self::{
    ffi::{NativeLib, Z_FINISH, Z_NO_FLUSH, Z_SYNC_FLUSH},
    handle::{Handle, Mode},
};
use crate::{
    is_direct_input, is_direct_output, Compressor, Decompressor, Error, Input, Level, Result,
    ZStream, ZlibProvider,
};

pub use self::ffi::LoadError;

/// Provider of streams backed by a dynamically loaded zlib.
#[derive(Debug, Clone)]
pub struct NativeProvider {
    lib: Arc<NativeLib>,
    level: Level,
}

impl NativeProvider {
    /// Load zlib from `path`, or by its platform default name when `path` is `None`.
    pub fn load(path: Option<&Path>, level: Level) -> Result<Self, LoadError> {
        let lib = NativeLib::load(path)?;
        Ok(Self {
            lib: Arc::new(lib),
            level,
        })
    }

    /// Version string of the loaded library.
    pub fn version(&self) -> &str {
        self.lib.version().to_str().unwrap_or("unknown")
    }
}

impl ZlibProvider for NativeProvider {
    fn create_compressor(&self) -> Result<Box<dyn Compressor + Send>> {
        let handle = Handle::open(self.lib.clone(), Mode::Deflate, self.level.into_zlib())?;
        Ok(Box::new(NativeCompressor {
            inner: NativeStream::new(handle),
        }))
    }

    fn create_decompressor(&self) -> Result<Box<dyn Decompressor + Send>> {
        let handle = Handle::open(self.lib.clone(), Mode::Inflate, 0)?;
        Ok(Box::new(NativeDecompressor {
            inner: NativeStream::new(handle),
        }))
    }

    fn is_accelerated(&self) -> bool {
        true
    }
}

struct NativeStream {
    handle: Handle,
    input: Option<Input>,
    /// The last call filled the whole output, zlib may hold more.
    pending: bool,
    finished: bool,
    /// No input will follow, compressors only.
    finish: bool,
    failed: bool,
}

impl NativeStream {
    fn new(handle: Handle) -> Self {
        Self {
            handle,
            input: None,
            pending: false,
            finished: false,
            finish: false,
            failed: false,
        }
    }

    fn needs_input(&self) -> bool {
        !self.finished && !self.finish && !self.pending && self.input.is_none()
    }

    fn set_input(&mut self, input: Input) -> Result<()> {
        if !is_direct_input(&*input) {
            return Err(Error::InvalidBufferKind("input"));
        }
        if !self.handle.is_open() {
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

    fn work(&mut self, output: &mut dyn BufMut, flush: c_int) -> Result<usize> {
        if !is_direct_output(output) {
            return Err(Error::InvalidBufferKind("output"));
        }
        if !self.handle.is_open() {
            return Err(Error::Closed);
        }
        if self.failed {
            return Err(Error::Protocol("stream failed and must be reset"));
        }
        if self.needs_input() {
            return Err(Error::Protocol("stream needs input"));
        }
        if self.finished || !output.has_remaining_mut() {
            return Ok(0);
        }

        let input = self.input.as_ref().map_or(&[][..], |input| input.chunk());
        let space = output.chunk_mut();
        let capacity = space.len();
        let progress = match self.handle.work(input, space, flush) {
            Ok(progress) => progress,
            Err(err) => {
                self.failed = true;
                return Err(err);
            }
        };

        // SAFETY: zlib initialised the first `produced` bytes of the chunk.
        unsafe { output.advance_mut(progress.produced) };

        if let Some(input) = &mut self.input {
            input.advance(progress.consumed);
        }
        if self.input.as_ref().is_some_and(|input| !input.has_remaining()) {
            self.input = None;
        }

        self.pending = progress.produced == capacity;
        self.finished = progress.done;
        Ok(progress.produced)
    }

    fn reset(&mut self) -> Result<()> {
        if !self.handle.is_open() {
            return Err(Error::Closed);
        }
        self.handle.reset()?;
        self.input = None;
        self.pending = false;
        self.finished = false;
        self.finish = false;
        self.failed = false;
        Ok(())
    }

    fn close(&mut self) {
        self.input = None;
        self.handle.close();
    }
}

impl fmt::Debug for NativeStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeStream")
            .field("handle", &self.handle)
            .field("input", &self.input.as_ref().map(|input| input.remaining()))
            .field("pending", &self.pending)
            .field("finished", &self.finished)
            .field("finish", &self.finish)
            .field("failed", &self.failed)
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
                self.inner.finished
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

/// Compressor of the native backend.
#[derive(Debug)]
pub struct NativeCompressor {
    inner: NativeStream,
}

delegate_zstream!(NativeCompressor);

impl Compressor for NativeCompressor {
    fn compress(&mut self, output: &mut dyn BufMut) -> Result<usize> {
        let flush = if self.inner.finish {
            Z_FINISH
        } else {
            Z_NO_FLUSH
        };
        self.inner.work(output, flush)
    }

    fn finish(&mut self) {
        self.inner.finish = true;
    }
}

/// Decompressor of the native backend.
#[derive(Debug)]
pub struct NativeDecompressor {
    inner: NativeStream,
}

delegate_zstream!(NativeDecompressor);

impl Decompressor for NativeDecompressor {
    fn decompress(&mut self, output: &mut dyn BufMut) -> Result<usize> {
        self.inner.work(output, Z_SYNC_FLUSH)
    }

    fn remaining(&self) -> usize {
        self.inner.input.as_ref().map_or(0, |input| input.remaining())
    }
}
