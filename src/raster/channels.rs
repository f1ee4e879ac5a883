use super::bitmap::{Bitmap, ChannelOrder};

/// Swaps the first and third byte of every pixel in place, flipping the
/// bitmap between BGRA and RGBA. Green, alpha and row padding are untouched.
pub fn swap_red_blue(bitmap: &mut Bitmap) {
    for row in bitmap.rows_mut() {
        for px in bytemuck::cast_slice_mut::<u8, [u8; 4]>(row) {
            px.swap(0, 2);
        }
    }
    let swapped = bitmap.order().swapped();
    bitmap.set_order(swapped);
}

/// Brings a bitmap into RGBA order, doing nothing if it already is.
pub fn ensure_rgba(bitmap: &mut Bitmap) {
    if bitmap.order() == ChannelOrder::Bgra {
        swap_red_blue(bitmap);
    }
}
