//! Caller buffer types and the rules for which of them the native backend accepts.

use bytes::{Buf, BufMut};

/// Input handed to a stream with [`ZStream::set_input`](crate::ZStream::set_input).
///
/// The stream drains it incrementally and drops it once it has no bytes remaining.
pub type Input = Box<dyn Buf + Send>;

/// Whether every remaining byte of `input` lives in its first chunk.
///
/// The native codec reads straight out of caller memory, so it can only accept input that is one
/// contiguous region, such as [`Bytes`](bytes::Bytes) or a `&'static [u8]`. Chained buffers and
/// ring buffers are rejected.
pub fn is_direct_input(input: &dyn Buf) -> bool {
    input.chunk().len() == input.remaining()
}

/// Whether all remaining capacity of `output` is available as one contiguous region.
///
/// Fixed slices (`&mut [u8]`) qualify. Growable buffers such as `Vec<u8>` or `BytesMut` report a
/// capacity far beyond their current allocation and do not.
pub fn is_direct_output(output: &mut dyn BufMut) -> bool {
    let remaining = output.remaining_mut();
    remaining == 0 || output.chunk_mut().len() == remaining
}

#[cfg(test)]
mod tests {
    use super::{is_direct_input, is_direct_output};
    use bytes::{Buf, Bytes};
    use std::collections::VecDeque;

    #[test]
    fn contiguous_inputs_are_direct() {
        assert!(is_direct_input(&Bytes::from_static(b"abc")));
        assert!(is_direct_input(&&b"abc"[..]));
    }

    #[test]
    fn chained_input_is_not_direct() {
        let chain = Bytes::from_static(b"ab").chain(Bytes::from_static(b"cd"));
        assert!(!is_direct_input(&chain));

        let mut ring = VecDeque::with_capacity(4);
        ring.extend([1u8, 2, 3, 4]);
        ring.pop_front();
        ring.pop_front();
        ring.extend([5u8, 6]);
        if ring.as_slices().1.is_empty() {
            assert!(is_direct_input(&ring));
        } else {
            assert!(!is_direct_input(&ring));
        }
    }

    #[test]
    fn fixed_slice_output_is_direct() {
        let mut block = [0u8; 16];
        let mut out = &mut block[..];
        assert!(is_direct_output(&mut out));

        let mut empty: &mut [u8] = &mut [];
        assert!(is_direct_output(&mut empty));
    }

    #[test]
    fn growable_output_is_not_direct() {
        let mut vec = Vec::<u8>::with_capacity(16);
        assert!(!is_direct_output(&mut vec));

        let mut bytes = bytes::BytesMut::with_capacity(16);
        assert!(!is_direct_output(&mut bytes));
    }
}
