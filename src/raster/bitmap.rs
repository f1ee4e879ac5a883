use crate::error::{AppError, AppResult};

pub const BYTES_PER_PIXEL: usize = 4;

/// Byte order of the four channels in every pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Bgra,
    Rgba,
}

impl ChannelOrder {
    pub fn swapped(self) -> Self {
        match self {
            Self::Bgra => Self::Rgba,
            Self::Rgba => Self::Bgra,
        }
    }

    /// Reorders an RGBA color into this order.
    pub fn from_rgba(self, [r, g, b, a]: [u8; 4]) -> [u8; 4] {
        match self {
            Self::Rgba => [r, g, b, a],
            Self::Bgra => [b, g, r, a],
        }
    }

    /// Reorders a pixel stored in this order into RGBA.
    pub fn to_rgba(self, pixel: [u8; 4]) -> [u8; 4] {
        // The permutation is its own inverse.
        self.from_rgba(pixel)
    }
}

/// Owned row-major pixel buffer. Rows start every `stride` bytes; only the
/// first `width * 4` bytes of a row hold pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    stride: usize,
    order: ChannelOrder,
    data: Vec<u8>,
}

impl Bitmap {
    /// Allocates a zeroed bitmap whose stride is `width * 4` rounded up to
    /// `row_alignment`.
    pub fn new(width: u32, height: u32, row_alignment: usize, order: ChannelOrder) -> AppResult<Self> {
        let row_bytes = row_bytes_for(width, height)?;
        let alignment = row_alignment.max(1);
        let stride = row_bytes
            .checked_next_multiple_of(alignment)
            .ok_or_else(|| oversized(width, height))?;
        let len = stride
            .checked_mul(height as usize)
            .ok_or_else(|| oversized(width, height))?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| oversized(width, height))?;
        data.resize(len, 0);

        Ok(Self {
            width,
            height,
            stride,
            order,
            data,
        })
    }

    /// Wraps an existing buffer. `data` must hold exactly `stride * height`
    /// bytes.
    pub fn from_raw(
        width: u32,
        height: u32,
        stride: usize,
        order: ChannelOrder,
        data: Vec<u8>,
    ) -> AppResult<Self> {
        let row_bytes = row_bytes_for(width, height)?;
        if stride < row_bytes {
            return Err(AppError::invalid_input(format!(
                "stride {stride} is shorter than a {width}px row"
            )));
        }
        if Some(data.len()) != stride.checked_mul(height as usize) {
            return Err(AppError::invalid_input(
                "pixel buffer length does not match stride and height",
            ));
        }

        Ok(Self {
            width,
            height,
            stride,
            order,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub(crate) fn set_order(&mut self, order: ChannelOrder) {
        self.order = order;
    }

    pub fn row_bytes(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Raw storage including row padding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        self.data.get(start..start + self.row_bytes())
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let row_bytes = self.row_bytes();
        self.data
            .chunks_exact(self.stride)
            .map(move |row| &row[..row_bytes])
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        let row_bytes = self.row_bytes();
        self.data
            .chunks_exact_mut(self.stride)
            .map(move |row| row.split_at_mut(row_bytes).0)
    }

    /// Pixel at `(x, y)` in storage order.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width {
            return None;
        }
        let offset = x as usize * BYTES_PER_PIXEL;
        let row = self.row(y)?;
        let px: &[u8; 4] = row.get(offset..offset + BYTES_PER_PIXEL)?.try_into().ok()?;
        Some(*px)
    }

    pub fn pixel_rgba(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixel(x, y).map(|px| self.order.to_rgba(px))
    }

    /// Paints every pixel with an RGBA color, leaving row padding untouched.
    pub fn fill(&mut self, rgba: [u8; 4]) {
        let value = self.order.from_rgba(rgba);
        for row in self.rows_mut() {
            for px in bytemuck::cast_slice_mut::<u8, [u8; 4]>(row) {
                *px = value;
            }
        }
    }
}

fn row_bytes_for(width: u32, height: u32) -> AppResult<usize> {
    if width == 0 || height == 0 {
        return Err(AppError::invalid_input(format!(
            "bitmap dimensions must be positive, got {width}x{height}"
        )));
    }
    (width as usize)
        .checked_mul(BYTES_PER_PIXEL)
        .ok_or_else(|| oversized(width, height))
}

fn oversized(width: u32, height: u32) -> AppError {
    AppError::resource_exhaustion(format!("cannot allocate a {width}x{height} bitmap"))
}
