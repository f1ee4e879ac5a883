use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use kurbo::Size;
use log::{debug, warn};

use crate::backend::{HayroDocument, PageSource};
use crate::engine::{Lease, RenderEngine};
use crate::error::{AppError, AppResult};
use crate::raster::Bitmap;

use super::page::Page;

/// Parsed document plus the engine hold that keeps the engine running while
/// the document is open.
pub(crate) struct LoadedDocument {
    source: Mutex<Box<dyn PageSource>>,
    engine: Lease<RenderEngine>,
}

impl LoadedDocument {
    fn source(&self) -> MutexGuard<'_, Box<dyn PageSource>> {
        self.source.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn page_count(&self) -> usize {
        self.source().page_count()
    }

    pub(crate) fn page_size(&self, index: usize) -> AppResult<Size> {
        self.source().page_size(index)
    }

    pub(crate) fn rasterize(&self, index: usize, width: u32, height: u32) -> AppResult<Bitmap> {
        let source = self.source();
        self.engine.rasterize(source.as_ref(), index, width, height)
    }
}

enum DocumentState {
    Ready(Arc<LoadedDocument>),
    Invalid {
        reason: String,
        _engine: Option<Lease<RenderEngine>>,
    },
}

/// An opened document. A document that failed to load is still a document: it
/// reports zero pages and only yields invalid pages.
pub struct Document {
    state: DocumentState,
}

impl Document {
    pub(crate) fn from_bytes(engine: Lease<RenderEngine>, bytes: Arc<Vec<u8>>) -> Self {
        match engine.parse(bytes) {
            Ok(source) => Self::from_source(engine, source),
            Err(err) => Self::failed(engine, err),
        }
    }

    pub(crate) fn from_path(engine: Lease<RenderEngine>, path: &Path) -> Self {
        match HayroDocument::read_file(path) {
            Ok(bytes) => Self::from_bytes(engine, bytes),
            Err(err) => Self::failed(engine, err),
        }
    }

    pub(crate) fn from_source(engine: Lease<RenderEngine>, source: Box<dyn PageSource>) -> Self {
        Self {
            state: DocumentState::Ready(Arc::new(LoadedDocument {
                source: Mutex::new(source),
                engine,
            })),
        }
    }

    fn failed(engine: Lease<RenderEngine>, err: AppError) -> Self {
        warn!("document failed to load: {err}");
        Self {
            state: DocumentState::Invalid {
                reason: err.to_string(),
                _engine: Some(engine),
            },
        }
    }

    /// Invalid document that holds no engine.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            state: DocumentState::Invalid {
                reason: reason.into(),
                _engine: None,
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.state, DocumentState::Ready(_))
    }

    pub fn invalid_reason(&self) -> Option<&str> {
        match &self.state {
            DocumentState::Ready(_) => None,
            DocumentState::Invalid { reason, .. } => Some(reason),
        }
    }

    /// Number of pages, or `0` for an invalid document.
    pub fn page_count(&self) -> usize {
        match &self.state {
            DocumentState::Ready(loaded) => loaded.page_count(),
            DocumentState::Invalid { .. } => 0,
        }
    }

    /// Opens page `index`. Out-of-range indices and invalid documents produce
    /// an invalid page rather than an error.
    pub fn open_page(&self, index: usize) -> Page {
        let loaded = match &self.state {
            DocumentState::Ready(loaded) => loaded,
            DocumentState::Invalid { .. } => {
                return Page::invalid("document is invalid");
            }
        };

        let page_count = loaded.page_count();
        if index >= page_count {
            debug!("page {index} requested from a {page_count} page document");
            return Page::invalid(format!(
                "page index {index} is out of range for {page_count} pages"
            ));
        }
        Page::new(Arc::downgrade(loaded), index)
    }
}
