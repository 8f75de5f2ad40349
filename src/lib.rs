//! Incremental zlib streams over a push/pull buffer protocol.
//!
//! Every stream follows the same protocol, described on [`ZStream`]: the caller supplies input
//! whenever the stream [needs it](ZStream::needs_input), drains output into its own buffers with
//! [`Compressor::compress`] or [`Decompressor::decompress`], and stops once the stream is
//! [finished](ZStream::finished).
//!
//! Two interchangeable backends implement the protocol:
//!
//!  Backend | Provider | Buffers
//! ---------|----------|--------
//!  native  | [`NativeProvider`] | The system zlib, loaded at runtime. Works directly on caller memory, which must be [directly addressable](is_direct_input).
//!  fallback | [`FallbackProvider`] | `flate2`'s pure-Rust codec. Accepts any buffer, staging data through two small fixed windows.
//!
//! A [`Zlib`] value picks one of them once, preferring the native backend when it can be loaded:
//!
//! ```
//! use zlib_stream::{Compressor, Config, Zlib, ZStream};
//!
//! # fn main() -> zlib_stream::Result<()> {
//! let zlib = Zlib::new(&Config::default());
//! let mut compressor = zlib.create_compressor()?;
//!
//! compressor.set_input(Box::new(&b"hello, world"[..]))?;
//! compressor.finish();
//!
//! let mut block = [0u8; 1024];
//! let mut compressed = Vec::new();
//! while !compressor.finished() {
//!     let mut out = &mut block[..];
//!     let len = compressor.compress(&mut out)?;
//!     compressed.extend_from_slice(&block[..len]);
//! }
//! compressor.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//!  Feature | Does
//! ---------|------
//!  `tokio` | Adds [`tokio::write`](crate::tokio::write) adaptors over `tokio::io::AsyncWrite`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_copy_implementations,
    missing_debug_implementations
)]

mod buf;
mod codec;
mod config;
mod error;
pub mod fallback;
pub mod native;
mod provider;
mod stream;
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod tokio;
mod util;
pub mod write;

use std::{os::raw::c_int, str::FromStr};

pub use crate::{
    buf::{is_direct_input, is_direct_output, Input},
    config::Config,
    error::{Error, Result},
    fallback::FallbackProvider,
    native::NativeProvider,
    provider::{Zlib, ZlibProvider},
    stream::{Compressor, Decompressor, ZStream},
};

/// Level of compression data should be compressed with.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Level {
    /// Fastest quality of compression, usually produces bigger size.
    Fastest,
    /// Best quality of compression, usually produces the smallest size.
    Best,
    /// Default quality of compression defined by zlib.
    #[default]
    Default,
    /// Precise zlib level, clamped to 9. Level 0 stores the data uncompressed.
    Precise(u32),
}

impl Level {
    fn into_flate2(self) -> flate2::Compression {
        match self {
            Self::Fastest => flate2::Compression::fast(),
            Self::Best => flate2::Compression::best(),
            Self::Precise(quality) => flate2::Compression::new(std::cmp::min(quality, 9)),
            Self::Default => flate2::Compression::default(),
        }
    }

    fn into_zlib(self) -> c_int {
        match self {
            Self::Fastest => 1,
            Self::Best => 9,
            Self::Precise(quality) => std::cmp::min(quality, 9) as c_int,
            // Z_DEFAULT_COMPRESSION
            Self::Default => -1,
        }
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fastest" => Ok(Self::Fastest),
            "best" => Ok(Self::Best),
            "default" => Ok(Self::Default),
            _ => s
                .parse::<u32>()
                .ok()
                .filter(|quality| *quality <= 9)
                .map(Self::Precise)
                .ok_or_else(|| Error::Config(format!("unknown compression level {s:?}"))),
        }
    }
}
