mod hayro;
mod traits;

pub use hayro::{HayroDocument, MAX_PIXMAP_EDGE};
pub use traits::PageSource;
