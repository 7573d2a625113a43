//! Ticker spike detection and signal assembly.
//!
//! `tickers` finds and counts cash tags, `signals` regroups enriched posts
//! per spiking ticker, and `scanner` runs the whole fetch, enrich and
//! aggregate pass behind the `/scan` endpoint.

pub mod scanner;
pub mod signals;
pub mod tickers;

pub use scanner::{ScanSettings, Scanner};
pub use signals::{assemble_signal, dedup_sources, majority_sentiment, related_posts, sources_phrase};
pub use tickers::{detect_spikes, extract_cash_tags, extract_tickers, SpikeSet};
