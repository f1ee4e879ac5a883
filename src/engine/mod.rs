mod lifecycle;

use std::sync::Arc;

use log::{debug, info};

use crate::backend::{HayroDocument, PageSource};
use crate::config::RenderConfig;
use crate::error::{AppError, AppResult};
use crate::raster::{Bitmap, ChannelOrder};

pub use lifecycle::{Lease, Lifecycle, Subsystem};

/// Channel order the rasterizer paints in.
pub const DEVICE_ORDER: ChannelOrder = ChannelOrder::Bgra;

/// Shared document engine. Alive while at least one document is open.
#[derive(Debug)]
pub struct RenderEngine {
    config: RenderConfig,
}

impl Subsystem for RenderEngine {
    type Options = RenderConfig;

    const NAME: &'static str = "render engine";

    fn start(options: &RenderConfig) -> AppResult<Self> {
        info!(
            "render engine initialized (row alignment {}, max {} px)",
            options.row_alignment, options.max_pixels
        );
        Ok(Self {
            config: options.clone(),
        })
    }

    fn stop(&self) {
        info!("render engine destroyed");
    }
}

impl RenderEngine {
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn parse(&self, bytes: Arc<Vec<u8>>) -> AppResult<Box<dyn PageSource>> {
        let document = HayroDocument::from_bytes(bytes)?;
        debug!(
            "parsed {} byte document with {} pages",
            document.byte_len(),
            document.page_count()
        );
        Ok(Box::new(document))
    }

    /// Allocates a device bitmap of exactly `width x height` filled with the
    /// configured background.
    pub fn allocate(&self, width: u32, height: u32) -> AppResult<Bitmap> {
        if width == 0 || height == 0 {
            return Err(AppError::invalid_input(format!(
                "render dimensions must be positive, got {width}x{height}"
            )));
        }
        let pixels = u64::from(width) * u64::from(height);
        if pixels > self.config.max_pixels {
            return Err(AppError::resource_exhaustion(format!(
                "{width}x{height} exceeds the {} pixel render limit",
                self.config.max_pixels
            )));
        }

        let mut bitmap = Bitmap::new(width, height, self.config.row_alignment, DEVICE_ORDER)?;
        bitmap.fill(self.config.background);
        Ok(bitmap)
    }

    pub fn rasterize(
        &self,
        source: &dyn PageSource,
        page: usize,
        width: u32,
        height: u32,
    ) -> AppResult<Bitmap> {
        let mut bitmap = self.allocate(width, height)?;
        source.rasterize_into(page, &mut bitmap)?;
        Ok(bitmap)
    }
}
