use image::ImageFormat;
use log::debug;

use crate::engine::Subsystem;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderInfo {
    pub mime_type: &'static str,
    pub format: ImageFormat,
}

/// Image encoders available on this host, discovered at startup.
#[derive(Debug)]
pub struct CodecTable {
    encoders: Vec<EncoderInfo>,
}

impl Subsystem for CodecTable {
    type Options = ();

    const NAME: &'static str = "codec table";

    fn start(_options: &()) -> AppResult<Self> {
        let encoders = ImageFormat::all()
            .filter(ImageFormat::writing_enabled)
            .map(|format| EncoderInfo {
                mime_type: format.to_mime_type(),
                format,
            })
            .collect::<Vec<_>>();
        if encoders.is_empty() {
            return Err(AppError::encoder_unavailable(
                "no image encoders are registered",
            ));
        }
        debug!("registered {} image encoders", encoders.len());
        Ok(Self { encoders })
    }
}

impl CodecTable {
    pub fn from_encoders(encoders: Vec<EncoderInfo>) -> Self {
        Self { encoders }
    }

    pub fn encoders(&self) -> &[EncoderInfo] {
        &self.encoders
    }

    pub fn find(&self, mime_type: &str) -> AppResult<EncoderInfo> {
        self.encoders
            .iter()
            .find(|info| info.mime_type.eq_ignore_ascii_case(mime_type))
            .copied()
            .ok_or_else(|| {
                AppError::encoder_unavailable(format!("no encoder registered for {mime_type}"))
            })
    }
}
