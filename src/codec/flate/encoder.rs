use crate::{codec::Codec, Error, Result};

use flate2::{Compress, Compression, FlushCompress, Status};

#[derive(Debug)]
pub(crate) struct FlateEncoder {
    compress: Compress,
}

impl FlateEncoder {
    pub(crate) fn new(level: Compression) -> Self {
        Self {
            compress: Compress::new(level, true),
        }
    }
}

impl Codec for FlateEncoder {
    fn process(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        finish: bool,
    ) -> Result<(bool, usize, usize)> {
        let prior_in = self.compress.total_in();
        let prior_out = self.compress.total_out();

        let flush = if finish {
            FlushCompress::Finish
        } else {
            FlushCompress::None
        };
        let status = self
            .compress
            .compress(input, output, flush)
            .map_err(|err| Error::Codec(err.to_string()))?;

        let in_length = (self.compress.total_in() - prior_in) as usize;
        let out_length = (self.compress.total_out() - prior_out) as usize;

        match status {
            // BufError only means no progress was possible with the space given
            Status::Ok | Status::BufError => Ok((false, in_length, out_length)),
            Status::StreamEnd => Ok((true, in_length, out_length)),
        }
    }

    fn reset(&mut self) {
        self.compress.reset();
    }
}
