use std::path::Path;
use std::sync::Arc;

use hayro::hayro_interpret::InterpreterSettings;
use hayro::hayro_syntax::Pdf;
use hayro::hayro_syntax::page::Page;
use hayro::vello_cpu::color::palette::css::TRANSPARENT;
use hayro::{RenderSettings, render};
use kurbo::Size;

use crate::error::{AppError, AppResult};
use crate::raster::Bitmap;

use super::traits::PageSource;

/// Largest edge a hayro pixmap can hold.
pub const MAX_PIXMAP_EDGE: u32 = u16::MAX as u32;

pub struct HayroDocument {
    pdf: Pdf,
    byte_len: usize,
}

impl PageSource for HayroDocument {
    fn page_count(&self) -> usize {
        HayroDocument::page_count(self)
    }

    fn page_size(&self, page: usize) -> AppResult<Size> {
        HayroDocument::page_size(self, page)
    }

    fn rasterize_into(&self, page: usize, target: &mut Bitmap) -> AppResult<()> {
        HayroDocument::rasterize_into(self, page, target)
    }
}

impl HayroDocument {
    pub fn read_file(path: impl AsRef<Path>) -> AppResult<Arc<Vec<u8>>> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(AppError::invalid_input("pdf path must not be empty"));
        }
        if !path.exists() {
            return Err(AppError::io_with_context(
                std::io::Error::new(std::io::ErrorKind::NotFound, "missing file"),
                format!("pdf file not found: {}", path.display()),
            ));
        }
        if !path.is_file() {
            return Err(AppError::invalid_input("pdf path must be a regular file"));
        }

        let bytes = std::fs::read(path).map_err(|source| {
            AppError::io_with_context(source, format!("failed to read {}", path.display()))
        })?;
        Ok(Arc::new(bytes))
    }

    pub fn from_bytes(bytes: Arc<Vec<u8>>) -> AppResult<Self> {
        if !bytes.as_slice().starts_with(b"%PDF-") {
            return Err(AppError::invalid_input("input is not a valid PDF header"));
        }
        let byte_len = bytes.len();
        let pdf = Pdf::new(bytes)
            .map_err(|_| AppError::invalid_input("failed to parse PDF with hayro"))?;

        Ok(Self { pdf, byte_len })
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn page_count(&self) -> usize {
        self.pdf.pages().len()
    }

    pub fn page_size(&self, page: usize) -> AppResult<Size> {
        let (width, height) = self.page(page)?.render_dimensions();
        Ok(Size::new(f64::from(width), f64::from(height)))
    }

    pub fn rasterize_into(&self, page: usize, target: &mut Bitmap) -> AppResult<()> {
        let (pixmap_width, pixmap_height) =
            (pixmap_edge(target.width())?, pixmap_edge(target.height())?);

        let page_ref = self.page(page)?;
        let (page_width, page_height) = page_ref.render_dimensions();
        if !(page_width > 0.0 && page_height > 0.0) {
            return Err(AppError::pdf_render(
                page,
                AppError::invalid_input("page has an empty media box"),
            ));
        }

        // The viewport is pinned to the target; hayro would otherwise floor
        // `page * scale` and leave the last row or column unpainted.
        let render_settings = RenderSettings {
            x_scale: target.width() as f32 / page_width,
            y_scale: target.height() as f32 / page_height,
            width: Some(pixmap_width),
            height: Some(pixmap_height),
            bg_color: TRANSPARENT,
        };
        let interpreter_settings = InterpreterSettings {
            render_annotations: true,
            ..InterpreterSettings::default()
        };
        let pixmap = render(page_ref, &interpreter_settings, &render_settings);

        composite_premultiplied(
            pixmap.data_as_u8_slice(),
            u32::from(pixmap.width()),
            u32::from(pixmap.height()),
            target,
        );
        Ok(())
    }

    fn page(&self, page: usize) -> AppResult<&Page<'_>> {
        self.pdf
            .pages()
            .get(page)
            .ok_or_else(|| AppError::invalid_input("page index is out of range"))
    }
}

fn pixmap_edge(edge: u32) -> AppResult<u16> {
    u16::try_from(edge).map_err(|_| {
        AppError::resource_exhaustion(format!(
            "{edge}px exceeds the {MAX_PIXMAP_EDGE}px rasterizer edge limit"
        ))
    })
}

/// Source-over composite of a premultiplied RGBA pixmap onto `target`,
/// anchored at the top-left corner. Rows or columns the pixmap does not cover
/// keep the target's existing pixels.
fn composite_premultiplied(src: &[u8], src_width: u32, src_height: u32, target: &mut Bitmap) {
    let order = target.order();
    let columns = src_width.min(target.width()) as usize;
    let src_stride = src_width as usize * 4;

    for (y, dst_row) in target
        .rows_mut()
        .enumerate()
        .take(src_height as usize)
    {
        let Some(src_row) = src.get(y * src_stride..y * src_stride + columns * 4) else {
            break;
        };
        let dst_pixels = bytemuck::cast_slice_mut::<u8, [u8; 4]>(dst_row);
        let src_pixels = bytemuck::cast_slice::<u8, [u8; 4]>(src_row);
        for (dst, src) in dst_pixels.iter_mut().zip(src_pixels) {
            let backdrop = order.to_rgba(*dst);
            *dst = order.from_rgba(source_over(*src, backdrop));
        }
    }
}

fn source_over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    let inverse = 255 - u16::from(src[3]);
    let blend = |s: u8, d: u8| {
        let scaled = (u16::from(d) * inverse + 127) / 255;
        (u16::from(s) + scaled).min(255) as u8
    };
    [
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        blend(src[3], dst[3]),
    ]
}
