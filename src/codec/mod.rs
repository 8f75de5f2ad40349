use crate::Result;

mod flate;

pub(crate) use self::flate::{FlateDecoder, FlateEncoder};

/// A codec that only works on plain byte slices.
pub(crate) trait Codec {
    /// Return `Ok((done, input_consumed, output_produced))`
    ///
    /// `done` is set once the codec has emitted the end of the stream. `finish` is only
    /// meaningful to encoders, which terminate the stream once it is set and the input is used up.
    fn process(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        finish: bool,
    ) -> Result<(bool, usize, usize)>;

    /// Forget all state so a new, independent stream can be processed.
    fn reset(&mut self);
}
