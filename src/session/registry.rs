use std::collections::HashMap;
use std::sync::Arc;

use super::arena::{Arena, Handle};
use super::document::Document;
use super::page::Page;

#[derive(Debug, Clone, Copy)]
enum Entry {
    Document(Handle),
    Page(Handle),
}

/// What [`Registry::unregister`] took out of the tables.
pub enum Unregistered {
    Document(Arc<Document>),
    Page(Arc<Page>),
}

/// Two typed tables keyed by caller-visible string ids. Documents and pages
/// draw ids from one counter, so an id names at most one entity and is never
/// handed out twice.
#[derive(Default)]
pub struct Registry {
    last_id: u64,
    ids: HashMap<String, Entry>,
    documents: Arena<Arc<Document>>,
    pages: Arena<Arc<Page>>,
}

impl Registry {
    fn allocate_id(&mut self) -> String {
        self.last_id += 1;
        self.last_id.to_string()
    }

    pub fn register_document(&mut self, document: Arc<Document>) -> String {
        let id = self.allocate_id();
        let handle = self.documents.insert(document);
        self.ids.insert(id.clone(), Entry::Document(handle));
        id
    }

    pub fn register_page(&mut self, page: Arc<Page>) -> String {
        let id = self.allocate_id();
        let handle = self.pages.insert(page);
        self.ids.insert(id.clone(), Entry::Page(handle));
        id
    }

    pub fn lookup_document(&self, id: &str) -> Option<Arc<Document>> {
        match self.ids.get(id)? {
            Entry::Document(handle) => self.documents.get(*handle).cloned(),
            Entry::Page(_) => None,
        }
    }

    pub fn lookup_page(&self, id: &str) -> Option<Arc<Page>> {
        match self.ids.get(id)? {
            Entry::Page(handle) => self.pages.get(*handle).cloned(),
            Entry::Document(_) => None,
        }
    }

    pub fn unregister(&mut self, id: &str) -> Option<Unregistered> {
        match self.ids.remove(id)? {
            Entry::Document(handle) => self.documents.remove(handle).map(Unregistered::Document),
            Entry::Page(handle) => self.pages.remove(handle).map(Unregistered::Page),
        }
    }

    pub fn unregister_document(&mut self, id: &str) -> Option<Arc<Document>> {
        if !matches!(self.ids.get(id), Some(Entry::Document(_))) {
            return None;
        }
        match self.unregister(id)? {
            Unregistered::Document(document) => Some(document),
            Unregistered::Page(_) => None,
        }
    }

    pub fn unregister_page(&mut self, id: &str) -> Option<Arc<Page>> {
        if !matches!(self.ids.get(id), Some(Entry::Page(_))) {
            return None;
        }
        match self.unregister(id)? {
            Unregistered::Page(page) => Some(page),
            Unregistered::Document(_) => None,
        }
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Empties both tables, returning everything that was registered so the
    /// caller can drop it outside its lock.
    pub fn drain(&mut self) -> Vec<Unregistered> {
        let ids: Vec<String> = self.ids.keys().cloned().collect();
        ids.iter().filter_map(|id| self.unregister(id)).collect()
    }
}
