use crate::{codec::Codec, Error, Result};

use flate2::{Decompress, FlushDecompress, Status};

#[derive(Debug)]
pub(crate) struct FlateDecoder {
    decompress: Decompress,
}

impl FlateDecoder {
    pub(crate) fn new() -> Self {
        Self {
            decompress: Decompress::new(true),
        }
    }
}

impl Codec for FlateDecoder {
    fn process(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        _finish: bool,
    ) -> Result<(bool, usize, usize)> {
        let prior_in = self.decompress.total_in();
        let prior_out = self.decompress.total_out();

        let status = self
            .decompress
            .decompress(input, output, FlushDecompress::None)
            .map_err(|err| Error::Malformed(Box::new(err)))?;

        let in_length = (self.decompress.total_in() - prior_in) as usize;
        let out_length = (self.decompress.total_out() - prior_out) as usize;

        match status {
            Status::Ok | Status::BufError => Ok((false, in_length, out_length)),
            Status::StreamEnd => Ok((true, in_length, out_length)),
        }
    }

    fn reset(&mut self) {
        self.decompress.reset(true);
    }
}
