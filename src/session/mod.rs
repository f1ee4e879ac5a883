mod arena;
mod document;
mod page;
mod registry;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use log::{debug, info, warn};

use crate::config::Config;
use crate::encode::CodecTable;
use crate::engine::{Lifecycle, RenderEngine};
use crate::error::{AppError, AppResult};
use crate::pipeline::{PageRender, render_page};

pub use arena::{Arena, Handle};
pub use document::Document;
pub use page::{Page, PageDetails};
pub use registry::{Registry, Unregistered};

/// Entry point for hosts: opens documents and pages by string id and renders
/// pages to encoded images. Safe to share across threads; the registry is one
/// lock and rendering happens outside it.
pub struct Session {
    config: Config,
    engine: Arc<Lifecycle<RenderEngine>>,
    codecs: Arc<Lifecycle<CodecTable>>,
    registry: Mutex<Registry>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            engine: Lifecycle::new(config.render.clone()),
            codecs: Lifecycle::new(()),
            registry: Mutex::new(Registry::default()),
            config,
        }
    }

    /// Process-wide session configured from the default config path.
    pub fn shared() -> &'static Session {
        static SHARED: OnceLock<Session> = OnceLock::new();
        SHARED.get_or_init(|| {
            let config = Config::load().unwrap_or_else(|err| {
                warn!("falling back to default config: {err}");
                Config::default()
            });
            Session::new(config)
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn open_document_bytes(&self, bytes: Vec<u8>) -> AppResult<String> {
        let engine = self.engine.acquire()?;
        let document = Document::from_bytes(engine, Arc::new(bytes));
        Ok(self.register_document(document))
    }

    pub fn open_document_path(&self, path: impl AsRef<Path>) -> AppResult<String> {
        let engine = self.engine.acquire()?;
        let document = Document::from_path(engine, path.as_ref());
        Ok(self.register_document(document))
    }

    fn register_document(&self, document: Document) -> String {
        let valid = document.is_valid();
        let id = self.registry().register_document(Arc::new(document));
        if valid {
            info!("document {id} opened");
        } else {
            info!("document {id} opened in invalid state");
        }
        id
    }

    pub fn lookup_document(&self, id: &str) -> AppResult<Arc<Document>> {
        self.registry()
            .lookup_document(id)
            .ok_or_else(|| AppError::stale_handle(id))
    }

    pub fn lookup_page(&self, id: &str) -> AppResult<Arc<Page>> {
        self.registry()
            .lookup_page(id)
            .ok_or_else(|| AppError::stale_handle(id))
    }

    /// Page count of an open document; `0` if it failed to load.
    pub fn page_count(&self, document_id: &str) -> AppResult<usize> {
        Ok(self.lookup_document(document_id)?.page_count())
    }

    /// Closes a document. Pages opened from it stay registered but fail with
    /// a stale-handle error from then on.
    pub fn close_document(&self, id: &str) -> AppResult<()> {
        let document = self
            .registry()
            .unregister_document(id)
            .ok_or_else(|| AppError::stale_handle(id))?;
        drop(document);
        info!("document {id} closed");
        Ok(())
    }

    pub fn open_page(&self, document_id: &str, index: usize) -> AppResult<String> {
        let document = self.lookup_document(document_id)?;
        let page = document.open_page(index);
        let valid = page.is_valid();
        let id = self.registry().register_page(Arc::new(page));
        debug!("page {id} opened from document {document_id} at index {index} (valid: {valid})");
        Ok(id)
    }

    /// Intrinsic dimensions; zero dimensions for an invalid page.
    pub fn page_details(&self, page_id: &str) -> AppResult<PageDetails> {
        self.lookup_page(page_id)?.details()
    }

    pub fn close_page(&self, id: &str) -> AppResult<()> {
        let page = self
            .registry()
            .unregister_page(id)
            .ok_or_else(|| AppError::stale_handle(id))?;
        drop(page);
        debug!("page {id} closed");
        Ok(())
    }

    /// Closes whatever `id` names, document or page.
    pub fn unregister(&self, id: &str) -> AppResult<Unregistered> {
        self.registry()
            .unregister(id)
            .ok_or_else(|| AppError::stale_handle(id))
    }

    /// Renders a page to an encoded image of exactly `width x height`.
    pub fn render(&self, page_id: &str, width: u32, height: u32) -> AppResult<PageRender> {
        let page = self.lookup_page(page_id)?;
        let (render, _timings) =
            render_page(&page, width, height, &self.codecs, &self.config.encode)?;
        Ok(render)
    }

    /// Closes every document and page.
    pub fn close_all(&self) {
        let drained = self.registry().drain();
        if !drained.is_empty() {
            info!("closed {} open entries", drained.len());
        }
    }

    pub fn engine_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn engine_starts(&self) -> u64 {
        self.engine.starts()
    }

    pub fn live_documents(&self) -> usize {
        self.registry().document_count()
    }

    pub fn live_pages(&self) -> usize {
        self.registry().page_count()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
