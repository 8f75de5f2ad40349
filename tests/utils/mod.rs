#![allow(unused)] // Different tests use a different subset of functions

#[macro_use]
mod test_cases;

use std::io::Read;

use bytes::{BufMut, Bytes};
use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use zlib_stream::{Compressor, Decompressor, Error, Level, NativeProvider, Result, ZStream};

pub const BLOCK: usize = 1024;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .without_time()
        .with_ansi(false)
        .with_test_writer()
        .try_init();
}

/// The native provider, or `None` when no system zlib can be loaded here.
pub fn native() -> Option<NativeProvider> {
    match NativeProvider::load(None, Level::Default) {
        Ok(provider) => Some(provider),
        Err(err) => {
            eprintln!("skipping, native zlib unavailable: {err}");
            None
        }
    }
}

pub fn random_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0; len];
    rng.fill_bytes(&mut data);
    data
}

/// Runs of repeated bytes, compresses well.
pub fn runs(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(len);
    while data.len() < len {
        let byte: u8 = rng.random();
        let run = rng.random_range(1..200).min(len - data.len());
        data.extend(std::iter::repeat(byte).take(run));
    }
    data
}

/// The test inputs: seed 0 is all zeroes, the others random, all of them two blocks long.
pub fn seeded(seed: u64) -> Vec<u8> {
    match seed {
        0 => vec![0; 2 * BLOCK],
        _ => random_bytes(seed, 2 * BLOCK),
    }
}

/// Drive `stream` to completion the way a well-behaved caller does.
///
/// Input goes in whenever it is needed, one block at a time. Once the source is exhausted the
/// input is ended, then output is drained through a block of `block` bytes until the stream is
/// finished.
fn operate<S: ZStream + ?Sized>(
    stream: &mut S,
    input: &[u8],
    block: usize,
    mut end_input: impl FnMut(&mut S),
    mut drain: impl FnMut(&mut S, &mut dyn BufMut) -> Result<usize>,
) -> Result<Vec<u8>> {
    let mut chunks = input.chunks(BLOCK);
    let mut ended = false;
    let mut block = vec![0u8; block];
    let mut output = Vec::new();

    while !stream.finished() {
        assert!(!(stream.needs_input() && stream.finished()));
        if stream.needs_input() {
            match chunks.next() {
                Some(chunk) => stream.set_input(Box::new(Bytes::copy_from_slice(chunk)))?,
                None if !ended => {
                    end_input(&mut *stream);
                    ended = true;
                }
                None => return Err(Error::Protocol("stream needs input past the end of data")),
            }
            continue;
        }

        let mut out = &mut block[..];
        let out: &mut dyn BufMut = &mut out;
        let len = drain(&mut *stream, out)?;
        output.extend_from_slice(&block[..len]);
    }

    assert!(!stream.needs_input());
    Ok(output)
}

pub fn compress<C: Compressor + ?Sized>(compressor: &mut C, input: &[u8]) -> Result<Vec<u8>> {
    compress_through(compressor, input, BLOCK)
}

pub fn decompress<D: Decompressor + ?Sized>(
    decompressor: &mut D,
    input: &[u8],
) -> Result<Vec<u8>> {
    decompress_through(decompressor, input, BLOCK)
}

/// Like [`compress`], draining output `block` bytes at a time.
pub fn compress_through<C: Compressor + ?Sized>(
    compressor: &mut C,
    input: &[u8],
    block: usize,
) -> Result<Vec<u8>> {
    operate(compressor, input, block, |c| c.finish(), |c, out| c.compress(out))
}

/// Like [`decompress`], draining output `block` bytes at a time.
pub fn decompress_through<D: Decompressor + ?Sized>(
    decompressor: &mut D,
    input: &[u8],
    block: usize,
) -> Result<Vec<u8>> {
    operate(decompressor, input, block, |_| {}, |d, out| d.decompress(out))
}

/// Reference decoder.
pub fn flate2_decompress(bytes: &[u8]) -> Vec<u8> {
    let mut output = vec![];
    flate2::read::ZlibDecoder::new(bytes)
        .read_to_end(&mut output)
        .unwrap();
    output
}

/// Reference encoder.
pub fn flate2_compress(bytes: &[u8]) -> Vec<u8> {
    let mut output = vec![];
    flate2::read::ZlibEncoder::new(bytes, flate2::Compression::fast())
        .read_to_end(&mut output)
        .unwrap();
    output
}

/// Reference encoder output for `bytes` ending in a sync flush, so the stream stays open.
pub fn flate2_sync_flush(bytes: &[u8]) -> Vec<u8> {
    let mut compress = flate2::Compress::new(flate2::Compression::fast(), true);
    let mut output = Vec::with_capacity(bytes.len() * 2 + 64);
    compress
        .compress_vec(bytes, &mut output, flate2::FlushCompress::Sync)
        .unwrap();
    assert_eq!(compress.total_in() as usize, bytes.len());
    output
}
