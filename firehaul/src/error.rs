use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Fetch failed for '{collection}': {reason}")]
    Fetch { collection: String, reason: String },

    #[error("Store request failed (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Write error: {0}")]
    Write(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error aborts the whole run. Everything else is scoped
    /// to the collection subtree that raised it.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Credential(_) | Error::Config(_) => true,
            Error::Http(e) => e.is_connect(),
            _ => false,
        }
    }

    /// Attribute a store-level failure to the collection subtree that
    /// raised it. Fatal errors pass through untouched.
    pub(crate) fn scoped_to(self, collection: &str) -> Error {
        if self.is_fatal() || matches!(self, Error::Fetch { .. }) {
            self
        } else {
            Error::Fetch {
                collection: collection.to_string(),
                reason: self.to_string(),
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
