use std::sync::Arc;
use std::time::Instant;

use log::debug;

use crate::config::EncodeConfig;
use crate::encode::{CodecTable, Encoder};
use crate::engine::Lifecycle;
use crate::error::AppResult;
use crate::perf::RenderTimings;
use crate::raster::ensure_rgba;
use crate::session::Page;

/// Encoded page image. `width` and `height` are the requested output size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRender {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Rasterizes `page` to exactly `width x height`, brings the pixels into RGBA
/// order and encodes them. Any failure aborts the whole call.
pub fn render_page(
    page: &Page,
    width: u32,
    height: u32,
    codecs: &Arc<Lifecycle<CodecTable>>,
    encode: &EncodeConfig,
) -> AppResult<(PageRender, RenderTimings)> {
    let mut timings = RenderTimings::default();
    let (document, index) = page.resolve()?;

    let started = Instant::now();
    let mut bitmap = document.rasterize(index, width, height)?;
    drop(document);
    timings.record_rasterize(started.elapsed(), bitmap.pixel_count());

    let started = Instant::now();
    ensure_rgba(&mut bitmap);
    timings.record_reorder(started.elapsed());

    let started = Instant::now();
    let encoder = Encoder::acquire(codecs, encode)?;
    let bytes = encoder.encode(&bitmap)?;
    drop(encoder);
    timings.record_encode(started.elapsed(), bytes.len());

    debug!(
        "rendered page {index} at {width}x{height}: {:.1}ms raster, {:.1}ms reorder, {:.1}ms encode, {} bytes",
        timings.rasterize_ms,
        timings.reorder_ms,
        timings.encode_ms,
        bytes.len()
    );

    Ok((
        PageRender {
            bytes,
            width,
            height,
        },
        timings,
    ))
}
