mod bitmap;
mod channels;

pub use bitmap::{BYTES_PER_PIXEL, Bitmap, ChannelOrder};
pub use channels::{ensure_rgba, swap_red_blue};
