use std::{
    fmt, mem,
    os::raw::{c_int, c_uint},
    ptr,
    sync::Arc,
};

use bytes::buf::UninitSlice;
use tracing::{debug, trace};

use super::ffi::{z_stream, NativeLib, Z_BUF_ERROR, Z_DATA_ERROR, Z_NEED_DICT, Z_OK, Z_STREAM_END};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Deflate,
    Inflate,
}

/// Progress made by one [`Handle::work`] call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Progress {
    /// zlib reported the end of the stream with all output written.
    pub(crate) done: bool,
    pub(crate) consumed: usize,
    pub(crate) produced: usize,
}

/// An open zlib stream, ended when closed or dropped.
pub(crate) struct Handle {
    // Boxed because zlib keeps a pointer back to the `z_stream` it was initialised with.
    stream: Box<z_stream>,
    lib: Arc<NativeLib>,
    mode: Mode,
    open: bool,
}

// SAFETY: the zlib state behind the handle is only reachable through `&mut self`, and zlib keeps
// no thread-local state, so the handle may move between threads.
unsafe impl Send for Handle {}

fn clamp(len: usize) -> c_uint {
    len.min(c_uint::MAX as usize) as c_uint
}

impl Handle {
    pub(crate) fn open(lib: Arc<NativeLib>, mode: Mode, level: c_int) -> Result<Self> {
        let mut stream = Box::new(z_stream::new());
        let size = mem::size_of::<z_stream>() as c_int;
        let version = lib.version().as_ptr();

        // SAFETY: `stream` is a freshly initialised `z_stream` and `size` matches its layout.
        let code = unsafe {
            match mode {
                Mode::Deflate => (lib.deflate_init)(&mut *stream, level, version, size),
                Mode::Inflate => (lib.inflate_init)(&mut *stream, version, size),
            }
        };
        if code != Z_OK {
            return Err(native_error(code, &stream));
        }

        trace!(?mode, "opened native stream");
        Ok(Self {
            stream,
            lib,
            mode,
            open: true,
        })
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open
    }

    /// Run zlib once over `input` into `output` with the given flush mode.
    pub(crate) fn work(
        &mut self,
        input: &[u8],
        output: &mut UninitSlice,
        flush: c_int,
    ) -> Result<Progress> {
        debug_assert!(self.open);

        let avail_in = clamp(input.len());
        let avail_out = clamp(output.len());

        let stream = &mut *self.stream;
        stream.next_in = input.as_ptr();
        stream.avail_in = avail_in;
        stream.next_out = output.as_mut_ptr();
        stream.avail_out = avail_out;

        // SAFETY: `next_in` and `next_out` describe live caller buffers for the duration of the
        // call, and zlib only ever writes to the output region.
        let code = unsafe {
            match self.mode {
                Mode::Deflate => (self.lib.deflate)(stream, flush),
                Mode::Inflate => (self.lib.inflate)(stream, flush),
            }
        };

        let progress = Progress {
            done: code == Z_STREAM_END,
            consumed: (avail_in - stream.avail_in) as usize,
            produced: (avail_out - stream.avail_out) as usize,
        };

        stream.next_in = ptr::null();
        stream.avail_in = 0;
        stream.next_out = ptr::null_mut();
        stream.avail_out = 0;

        match code {
            Z_OK | Z_STREAM_END | Z_BUF_ERROR => Ok(progress),
            Z_DATA_ERROR | Z_NEED_DICT if self.mode == Mode::Inflate => {
                let message = stream
                    .message()
                    .unwrap_or_else(|| format!("zlib error {code}"));
                Err(Error::Malformed(message.into()))
            }
            code => Err(native_error(code, stream)),
        }
    }

    pub(crate) fn reset(&mut self) -> Result<()> {
        debug_assert!(self.open);

        // SAFETY: the stream was initialised by `open` and has not been ended.
        let code = unsafe {
            match self.mode {
                Mode::Deflate => (self.lib.deflate_reset)(&mut *self.stream),
                Mode::Inflate => (self.lib.inflate_reset)(&mut *self.stream),
            }
        };
        if code != Z_OK {
            return Err(native_error(code, &self.stream));
        }
        Ok(())
    }

    pub(crate) fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;

        // SAFETY: the stream was initialised by `open` and is ended exactly once.
        let code = unsafe {
            match self.mode {
                Mode::Deflate => (self.lib.deflate_end)(&mut *self.stream),
                Mode::Inflate => (self.lib.inflate_end)(&mut *self.stream),
            }
        };
        // deflateEnd reports Z_DATA_ERROR when ended mid-stream, the memory is freed regardless
        trace!(mode = ?self.mode, code, "closed native stream");
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if self.open {
            debug!(mode = ?self.mode, "native stream dropped without being closed");
            self.close();
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("mode", &self.mode)
            .field("open", &self.open)
            .field("total_in", &self.stream.total_in)
            .field("total_out", &self.stream.total_out)
            .finish()
    }
}

fn native_error(code: c_int, stream: &z_stream) -> Error {
    Error::Native {
        code,
        message: stream.message().unwrap_or_default(),
    }
}
