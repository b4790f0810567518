//! Payload codecs.
//!
//! A leaf is either stored verbatim or zlib-framed DEFLATE. The 2-byte zlib
//! prefix is skipped and the stream is inflated raw; output is cut at the
//! record's uncompressed size, so the trailing Adler-32 is never consulted.

use std::io::Read;

use flate2::read::DeflateDecoder;

use crate::error::{BbfsError, Result};

/// Bytes in front of the DEFLATE stream of a compressed payload.
pub const DEFLATE_PREFIX_LEN: usize = 2;

/// Upper bound on the output buffer reserved up front from a declared size.
const MAX_PREALLOC: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecId {
    Stored,
    Deflate,
}

impl CodecId {
    /// Human-readable name (for diagnostics only).
    pub fn name(self) -> &'static str {
        match self {
            CodecId::Stored  => "stored",
            CodecId::Deflate => "deflate",
        }
    }
}

// ── Codec trait ──────────────────────────────────────────────────────────────

pub trait Codec: Send + Sync {
    fn codec_id(&self) -> CodecId;
    /// Produce exactly `output_size` bytes from `payload`.
    fn decode(&self, payload: &[u8], output_size: usize) -> Result<Vec<u8>>;
}

pub struct StoredCodec;
impl Codec for StoredCodec {
    fn codec_id(&self) -> CodecId { CodecId::Stored }
    fn decode(&self, payload: &[u8], output_size: usize) -> Result<Vec<u8>> {
        payload.get(..output_size).map(<[u8]>::to_vec).ok_or_else(|| {
            BbfsError::CorruptToc(format!(
                "stored entry declares {output_size} B but only {} B are available",
                payload.len()
            ))
        })
    }
}

pub struct DeflateCodec;
impl Codec for DeflateCodec {
    fn codec_id(&self) -> CodecId { CodecId::Deflate }
    fn decode(&self, payload: &[u8], output_size: usize) -> Result<Vec<u8>> {
        let stream = payload.get(DEFLATE_PREFIX_LEN..).ok_or_else(|| {
            BbfsError::Decompression(format!("payload shorter than its {DEFLATE_PREFIX_LEN}-byte prefix"))
        })?;
        let mut out = Vec::with_capacity(output_size.min(MAX_PREALLOC));
        DeflateDecoder::new(stream)
            .take(output_size as u64)
            .read_to_end(&mut out)
            .map_err(|e| BbfsError::Decompression(e.to_string()))?;
        if out.len() < output_size {
            return Err(BbfsError::Decompression(format!(
                "stream ended after {} of {output_size} bytes",
                out.len()
            )));
        }
        Ok(out)
    }
}

// ── Factory ──────────────────────────────────────────────────────────────────

pub fn get_codec(id: CodecId) -> Box<dyn Codec> {
    match id {
        CodecId::Stored  => Box::new(StoredCodec),
        CodecId::Deflate => Box::new(DeflateCodec),
    }
}
