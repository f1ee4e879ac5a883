use std::time::Duration;

/// Wall-clock cost of each stage of a single render call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderTimings {
    pub rasterize_ms: f64,
    pub reorder_ms: f64,
    pub encode_ms: f64,
    pub pixels: u64,
    pub encoded_bytes: usize,
}

impl RenderTimings {
    pub fn record_rasterize(&mut self, elapsed: Duration, pixels: u64) {
        self.rasterize_ms = elapsed.as_secs_f64() * 1000.0;
        self.pixels = pixels;
    }

    pub fn record_reorder(&mut self, elapsed: Duration) {
        self.reorder_ms = elapsed.as_secs_f64() * 1000.0;
    }

    pub fn record_encode(&mut self, elapsed: Duration, encoded_bytes: usize) {
        self.encode_ms = elapsed.as_secs_f64() * 1000.0;
        self.encoded_bytes = encoded_bytes;
    }

    pub fn total_ms(&self) -> f64 {
        self.rasterize_ms + self.reorder_ms + self.encode_ms
    }

    /// Encoded size relative to the raw 4-byte-per-pixel buffer.
    pub fn compression_ratio(&self) -> f64 {
        if self.pixels == 0 {
            return 0.0;
        }
        self.encoded_bytes as f64 / (self.pixels as f64 * 4.0)
    }
}
