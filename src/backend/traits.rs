use kurbo::Size;

use crate::error::AppResult;
use crate::raster::Bitmap;

/// A parsed document that can report page geometry and paint pages.
pub trait PageSource: Send {
    fn page_count(&self) -> usize;

    /// Intrinsic page size in points at default scale.
    fn page_size(&self, page: usize) -> AppResult<Size>;

    /// Paints the whole page scaled to exactly fill `target`, compositing over
    /// whatever the target already holds.
    fn rasterize_into(&self, page: usize, target: &mut Bitmap) -> AppResult<()>;
}
