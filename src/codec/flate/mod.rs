mod decoder;
mod encoder;

pub(crate) use self::{decoder::FlateDecoder, encoder::FlateEncoder};
