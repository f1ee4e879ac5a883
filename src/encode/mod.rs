mod codecs;
mod png;

use std::sync::Arc;

use image::ImageFormat;

use crate::config::EncodeConfig;
use crate::engine::{Lease, Lifecycle};
use crate::error::{AppError, AppResult};
use crate::raster::Bitmap;

pub use codecs::{CodecTable, EncoderInfo};
pub use png::encode_png;

/// Encoder resolved for one call. Holds the codec table for as long as it
/// lives, so the table stays started across overlapping calls and stops once
/// the last encoder is dropped.
#[derive(Debug)]
pub struct Encoder {
    _codecs: Lease<CodecTable>,
    info: EncoderInfo,
    config: EncodeConfig,
}

impl Encoder {
    pub fn acquire(codecs: &Arc<Lifecycle<CodecTable>>, config: &EncodeConfig) -> AppResult<Self> {
        let lease = codecs.acquire()?;
        let info = lease.find(&config.mime_type)?;
        Ok(Self {
            _codecs: lease,
            info,
            config: config.clone(),
        })
    }

    pub fn mime_type(&self) -> &'static str {
        self.info.mime_type
    }

    pub fn encode(&self, bitmap: &Bitmap) -> AppResult<Vec<u8>> {
        match self.info.format {
            ImageFormat::Png => encode_png(bitmap, self.config.compression.to_png()),
            other => Err(AppError::encoder_unavailable(format!(
                "{other:?} is not a supported lossless output format"
            ))),
        }
    }
}
