pub type AppResult<T> = Result<T, AppError>;

/// Coarse classification hosts branch on without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    ResourceExhaustion,
    EncoderUnavailable,
    StaleHandle,
    Io,
    Internal,
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },
    #[error("rasterization failed for page {page}")]
    PdfRender {
        page: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("image encoding failed")]
    Encode {
        #[source]
        source: image::ImageError,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("resource exhausted: {0}")]
    ResourceExhaustion(String),
    #[error("encoder unavailable: {0}")]
    EncoderUnavailable(String),
    #[error("stale handle: {0}")]
    StaleHandle(String),
}

impl From<std::io::Error> for AppError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            context: "I/O operation failed".to_string(),
        }
    }
}

impl From<image::ImageError> for AppError {
    fn from(source: image::ImageError) -> Self {
        Self::Encode { source }
    }
}

impl AppError {
    pub fn io_with_context(source: std::io::Error, context: impl Into<String>) -> Self {
        Self::Io {
            source,
            context: context.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn resource_exhaustion(message: impl Into<String>) -> Self {
        Self::ResourceExhaustion(message.into())
    }

    pub fn encoder_unavailable(message: impl Into<String>) -> Self {
        Self::EncoderUnavailable(message.into())
    }

    pub fn stale_handle(id: impl std::fmt::Display) -> Self {
        Self::StaleHandle(format!("no live entry for id {id}"))
    }

    pub fn pdf_render(page: usize, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::PdfRender {
            page,
            source: Box::new(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::ResourceExhaustion(_) => ErrorKind::ResourceExhaustion,
            Self::EncoderUnavailable(_) => ErrorKind::EncoderUnavailable,
            Self::StaleHandle(_) => ErrorKind::StaleHandle,
            Self::Io { .. } => ErrorKind::Io,
            Self::PdfRender { .. } | Self::Encode { .. } => ErrorKind::Internal,
        }
    }
}
