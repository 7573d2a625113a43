use signal_core::{EnrichedPost, SentimentLabel, Signal};

use crate::tickers::extract_cash_tags;

/// Posts that mention `ticker` in their full text or their summary.
pub fn related_posts<'a>(ticker: &str, posts: &'a [EnrichedPost]) -> Vec<&'a EnrichedPost> {
    posts
        .iter()
        .filter(|p| {
            let haystack = format!("{} {}", p.full_text, p.summary);
            extract_cash_tags(&haystack).iter().any(|t| t == ticker)
        })
        .collect()
}

/// Most common label. Ties go to whichever tied label appeared first;
/// no labels at all is `Neutral`.
pub fn majority_sentiment(labels: &[SentimentLabel]) -> SentimentLabel {
    let mut counts: Vec<(SentimentLabel, usize)> = Vec::new();
    for label in labels {
        match counts.iter_mut().find(|(l, _)| l == label) {
            Some(entry) => entry.1 += 1,
            None => counts.push((*label, 1)),
        }
    }

    let mut best: Option<(SentimentLabel, usize)> = None;
    for (label, count) in counts {
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((label, count)),
        }
    }

    best.map(|(label, _)| label).unwrap_or_default()
}

/// Non-empty post URLs, first occurrence wins.
pub fn dedup_sources(posts: &[&EnrichedPost]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for post in posts {
        let url = &post.post.url;
        if !url.is_empty() && !sources.contains(url) {
            sources.push(url.clone());
        }
    }
    sources
}

/// "Reddit", "Reddit and 4chan", "A, B and C"
pub fn sources_phrase(names: &[&str]) -> String {
    match names {
        [] => "social media".to_string(),
        [only] => only.to_string(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}

/// Build the feed entry for one spiking ticker from its related posts and
/// a headline already generated over them.
pub fn assemble_signal(
    ticker: &str,
    mentions: usize,
    related: &[&EnrichedPost],
    headline: String,
    across: &str,
    timestamp: &str,
) -> Signal {
    let sentiments: Vec<SentimentLabel> = related.iter().map(|p| p.sentiment).collect();

    Signal {
        title: format!("{} mentioned {} times across {}", ticker, mentions, across),
        timestamp: timestamp.to_string(),
        summary: headline,
        sentiment: majority_sentiment(&sentiments),
        sources: dedup_sources(related),
        spike_tickers: vec![ticker.to_string()],
    }
}
