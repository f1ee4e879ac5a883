use std::sync::{Arc, Weak};

use kurbo::Size;
use serde::Serialize;

use crate::error::{AppError, AppResult};

use super::document::LoadedDocument;

/// Intrinsic page size in whole points at default scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PageDetails {
    pub width: u32,
    pub height: u32,
}

impl PageDetails {
    /// Rounds half up; negative or non-finite edges become `0`.
    pub fn from_size(size: Size) -> Self {
        Self {
            width: round_half_up(size.width),
            height: round_half_up(size.height),
        }
    }
}

fn round_half_up(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    (value + 0.5).floor().min(f64::from(u32::MAX)) as u32
}

enum PageState {
    Ready {
        document: Weak<LoadedDocument>,
        index: usize,
    },
    Invalid {
        reason: String,
    },
}

/// One page of a document. The page does not keep its document open: once
/// the document is closed every operation on the page fails with
/// [`AppError::StaleHandle`].
pub struct Page {
    state: PageState,
}

impl Page {
    pub(crate) fn new(document: Weak<LoadedDocument>, index: usize) -> Self {
        Self {
            state: PageState::Ready { document, index },
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            state: PageState::Invalid {
                reason: reason.into(),
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.state, PageState::Ready { .. })
    }

    pub fn index(&self) -> Option<usize> {
        match self.state {
            PageState::Ready { index, .. } => Some(index),
            PageState::Invalid { .. } => None,
        }
    }

    /// Intrinsic dimensions, or zero dimensions for an invalid page.
    pub fn details(&self) -> AppResult<PageDetails> {
        match &self.state {
            PageState::Invalid { .. } => Ok(PageDetails::default()),
            PageState::Ready { .. } => {
                let (document, index) = self.resolve()?;
                document.page_size(index).map(PageDetails::from_size)
            }
        }
    }

    /// Upgrades to the live document for the duration of one operation.
    pub(crate) fn resolve(&self) -> AppResult<(Arc<LoadedDocument>, usize)> {
        match &self.state {
            PageState::Ready { document, index } => document
                .upgrade()
                .map(|document| (document, *index))
                .ok_or_else(|| AppError::StaleHandle("page's document has been closed".to_string())),
            PageState::Invalid { reason } => Err(AppError::invalid_input(format!(
                "page is invalid: {reason}"
            ))),
        }
    }
}
