use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("{0}")]
    MissingCredentials(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No data: {0}")]
    NoData(String),
}

