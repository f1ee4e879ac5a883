//! Renders pages of PDF documents to PNG images at caller-chosen sizes.
//!
//! Hosts open documents and pages through a [`Session`], which hands out
//! string ids, and call [`Session::render`] to get encoded page images.

pub mod backend;
pub mod config;
pub mod encode;
pub mod engine;
pub mod error;
pub mod perf;
pub mod pipeline;
pub mod raster;
pub mod session;

#[cfg(test)]
pub(crate) mod fixtures;

pub use pipeline::PageRender;
pub use session::{PageDetails, Session};
