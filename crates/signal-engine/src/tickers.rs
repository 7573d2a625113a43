use lazy_static::lazy_static;
use regex::Regex;
use signal_core::EnrichedPost;
use std::collections::HashMap;

lazy_static! {
    static ref CASH_TAG: Regex = Regex::new(r"\$[A-Za-z]{1,5}").unwrap();
}

/// Every cash tag in `text`, in order of appearance.
///
/// Matching is greedy and unanchored: `$TSLAQQ` yields `$TSLAQ`, and case is
/// preserved, so `$btc` and `$BTC` count as different tickers.
pub fn extract_cash_tags(text: &str) -> Vec<String> {
    CASH_TAG
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Cash tags mentioned in each post's title, summary and snippet, in that
/// order. A ticker repeated across fields is counted once per field.
pub fn extract_tickers(posts: &[EnrichedPost]) -> Vec<String> {
    let mut tickers = Vec::new();
    for post in posts {
        tickers.extend(extract_cash_tags(&post.post.title));
        tickers.extend(extract_cash_tags(&post.summary));
        tickers.extend(extract_cash_tags(&post.post.snippet));
    }
    tickers
}

/// Tickers whose mention count reached the spike threshold.
///
/// Entries keep the order in which each ticker was first mentioned, which
/// is what breaks ties in `ranked`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpikeSet {
    entries: Vec<(String, usize)>,
}

impl SpikeSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, ticker: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(t, _)| t == ticker)
            .map(|(_, n)| *n)
    }

    /// Highest count first; equal counts stay in first-mention order.
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .entries
            .iter()
            .map(|(t, n)| (t.as_str(), *n))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

/// Count mentions and keep tickers seen at least `threshold` times.
pub fn detect_spikes(tickers: &[String], threshold: usize) -> SpikeSet {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for ticker in tickers {
        match index.get(ticker.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(ticker.as_str(), counts.len());
                counts.push((ticker.clone(), 1));
            }
        }
    }

    SpikeSet {
        entries: counts.into_iter().filter(|(_, n)| *n >= threshold).collect(),
    }
}
