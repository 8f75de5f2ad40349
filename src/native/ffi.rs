//! Minimal binding of the zlib stream API, resolved from a shared library at runtime.

#![allow(non_camel_case_types)]

use std::{
    ffi::{CStr, CString, OsStr},
    fmt,
    os::raw::{c_char, c_int, c_uint, c_ulong, c_void},
    path::Path,
    ptr,
};

use libloading::Library;
use tracing::debug;

pub(crate) const Z_NO_FLUSH: c_int = 0;
pub(crate) const Z_SYNC_FLUSH: c_int = 2;
pub(crate) const Z_FINISH: c_int = 4;

pub(crate) const Z_OK: c_int = 0;
pub(crate) const Z_STREAM_END: c_int = 1;
pub(crate) const Z_NEED_DICT: c_int = 2;
pub(crate) const Z_DATA_ERROR: c_int = -3;
pub(crate) const Z_BUF_ERROR: c_int = -5;

type alloc_func = unsafe extern "C" fn(*mut c_void, c_uint, c_uint) -> *mut c_void;
type free_func = unsafe extern "C" fn(*mut c_void, *mut c_void);

/// Layout of zlib's `z_stream`.
#[repr(C)]
#[allow(dead_code)]
pub(crate) struct z_stream {
    pub(crate) next_in: *const u8,
    pub(crate) avail_in: c_uint,
    pub(crate) total_in: c_ulong,
    pub(crate) next_out: *mut u8,
    pub(crate) avail_out: c_uint,
    pub(crate) total_out: c_ulong,
    pub(crate) msg: *const c_char,
    state: *mut c_void,
    zalloc: Option<alloc_func>,
    zfree: Option<free_func>,
    opaque: *mut c_void,
    data_type: c_int,
    adler: c_ulong,
    reserved: c_ulong,
}

impl z_stream {
    /// A stream with no buffers and zlib's default allocator.
    pub(crate) fn new() -> Self {
        Self {
            next_in: ptr::null(),
            avail_in: 0,
            total_in: 0,
            next_out: ptr::null_mut(),
            avail_out: 0,
            total_out: 0,
            msg: ptr::null(),
            state: ptr::null_mut(),
            zalloc: None,
            zfree: None,
            opaque: ptr::null_mut(),
            data_type: 0,
            adler: 0,
            reserved: 0,
        }
    }

    /// The message zlib attached to the last failure, if any.
    pub(crate) fn message(&self) -> Option<String> {
        if self.msg.is_null() {
            None
        } else {
            // SAFETY: zlib only stores pointers to static NUL-terminated strings in `msg`.
            Some(unsafe { CStr::from_ptr(self.msg) }.to_string_lossy().into_owned())
        }
    }
}

type zlib_version_fn = unsafe extern "C" fn() -> *const c_char;
type deflate_init_fn = unsafe extern "C" fn(*mut z_stream, c_int, *const c_char, c_int) -> c_int;
type inflate_init_fn = unsafe extern "C" fn(*mut z_stream, *const c_char, c_int) -> c_int;
type work_fn = unsafe extern "C" fn(*mut z_stream, c_int) -> c_int;
type stream_fn = unsafe extern "C" fn(*mut z_stream) -> c_int;

/// Reason the native library could not be used.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The library or one of its symbols could not be loaded.
    #[error("failed to load native zlib")]
    Library(#[from] libloading::Error),

    /// The library is not a zlib 1.x.
    #[error("unsupported zlib version {0:?}")]
    Version(String),
}

#[cfg(target_os = "macos")]
const DEFAULT_NAMES: &[&str] = &["libz.1.dylib", "libz.dylib"];
#[cfg(windows)]
const DEFAULT_NAMES: &[&str] = &["zlib1.dll", "zlib.dll"];
#[cfg(not(any(target_os = "macos", windows)))]
const DEFAULT_NAMES: &[&str] = &["libz.so.1", "libz.so"];

/// Entry points of a loaded zlib.
pub(crate) struct NativeLib {
    version: CString,
    pub(crate) deflate_init: deflate_init_fn,
    pub(crate) deflate: work_fn,
    pub(crate) deflate_reset: stream_fn,
    pub(crate) deflate_end: stream_fn,
    pub(crate) inflate_init: inflate_init_fn,
    pub(crate) inflate: work_fn,
    pub(crate) inflate_reset: stream_fn,
    pub(crate) inflate_end: stream_fn,
    // Declared last so the function pointers above never outlive it.
    _library: Library,
}

impl NativeLib {
    /// Load zlib from `path`, or from the platform's default library names.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, LoadError> {
        match path {
            Some(path) => Self::open(path.as_os_str()),
            // The last candidate's error is the one reported.
            None => DEFAULT_NAMES[1..].iter().fold(
                Self::open(OsStr::new(DEFAULT_NAMES[0])),
                |result, name| {
                    result.or_else(|err| {
                        debug!(error = %err, "native zlib candidate rejected");
                        Self::open(OsStr::new(name))
                    })
                },
            ),
        }
    }

    fn open(name: &OsStr) -> Result<Self, LoadError> {
        // SAFETY: zlib has no initialisation routines with preconditions, and every symbol is
        // read with the signature documented in zlib.h.
        unsafe {
            let library = Library::new(name)?;

            let zlib_version = *library.get::<zlib_version_fn>(b"zlibVersion\0")?;
            let version = CStr::from_ptr(zlib_version()).to_owned();
            if !version.to_bytes().starts_with(b"1.") {
                return Err(LoadError::Version(version.to_string_lossy().into_owned()));
            }

            let deflate_init = *library.get::<deflate_init_fn>(b"deflateInit_\0")?;
            let deflate = *library.get::<work_fn>(b"deflate\0")?;
            let deflate_reset = *library.get::<stream_fn>(b"deflateReset\0")?;
            let deflate_end = *library.get::<stream_fn>(b"deflateEnd\0")?;
            let inflate_init = *library.get::<inflate_init_fn>(b"inflateInit_\0")?;
            let inflate = *library.get::<work_fn>(b"inflate\0")?;
            let inflate_reset = *library.get::<stream_fn>(b"inflateReset\0")?;
            let inflate_end = *library.get::<stream_fn>(b"inflateEnd\0")?;

            Ok(Self {
                version,
                deflate_init,
                deflate,
                deflate_reset,
                deflate_end,
                inflate_init,
                inflate,
                inflate_reset,
                inflate_end,
                _library: library,
            })
        }
    }

    /// Version string reported by the library, passed back to its init functions.
    pub(crate) fn version(&self) -> &CStr {
        &self.version
    }
}

impl fmt::Debug for NativeLib {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeLib")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
