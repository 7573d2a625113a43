//! Post sources for the social platforms the scanner watches.
//!
//! Both clients produce `signal_core::Post` values and implement
//! `PostSource`, so the scanner treats them interchangeably.

pub mod chan;
pub mod reddit;
pub mod text;

pub use chan::{ChanClient, ChanConfig};
pub use reddit::{RedditClient, RedditConfig, DEFAULT_SUBREDDITS};
pub use text::clean_html;

use signal_core::ScanError;

/// Turn a non-success response into `ScanError::Api`, passing successes through.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ScanError> {
    if response.status().is_success() {
        return Ok(response);
    }
    Err(ScanError::Api {
        status: response.status().as_u16(),
        body: response.text().await.unwrap_or_default(),
    })
}

pub(crate) fn http_error(e: reqwest::Error) -> ScanError {
    ScanError::Http(e.to_string())
}

pub(crate) fn decode_error(e: reqwest::Error) -> ScanError {
    ScanError::InvalidResponse(e.to_string())
}
