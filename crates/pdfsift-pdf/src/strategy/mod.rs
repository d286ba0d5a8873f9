//! The four extraction strategies, most to least structured.

pub mod byte_pattern;
pub mod fallback;
pub mod stream_decoder;
pub mod text_layer;
