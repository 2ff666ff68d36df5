// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered search attempts for resolving a lazy song.

use cadence_core::types::{LookupOptions, Song, is_http_url};

/// One upstream query to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchAttempt {
    pub query: String,
    pub options: LookupOptions,
}

/// Strip separators and brackets that hurt search matching.
pub fn clean_title(title: &str) -> String {
    title
        .replace(" - ", " ")
        .replace(['(', ')'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Attempts in order: the page URL when it is a direct link, then
/// `"<clean> audio"`, `"<clean> official"`, `"<clean>"`, and the raw title
/// as searches. Empty and repeated queries are dropped.
pub fn build_attempts(song: &Song) -> Vec<SearchAttempt> {
    let mut attempts: Vec<SearchAttempt> = Vec::with_capacity(5);
    let mut push = |query: String, options: LookupOptions| {
        let query = query.trim().to_string();
        if !query.is_empty() && !attempts.iter().any(|a| a.query == query) {
            attempts.push(SearchAttempt { query, options });
        }
    };

    if let Some(url) = song.canonical_page_url.as_deref()
        && is_http_url(url)
    {
        push(url.to_string(), LookupOptions::direct());
    }

    let clean = clean_title(&song.title);
    if !clean.is_empty() {
        push(format!("{clean} audio"), LookupOptions::search_one());
        push(format!("{clean} official"), LookupOptions::search_one());
        push(clean, LookupOptions::search_one());
    }
    push(song.title.clone(), LookupOptions::search_one());

    attempts
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::types::{LookupMode, UserId};

    fn queries(song: &Song) -> Vec<String> {
        build_attempts(song).into_iter().map(|a| a.query).collect()
    }

    #[test]
    fn url_first_then_title_variants() {
        let song = Song::lazy(
            "Artist - Track (Live)",
            Some("https://video.example/watch?v=1".into()),
            UserId(1),
        );
        let attempts = build_attempts(&song);
        assert_eq!(attempts[0].options.mode, LookupMode::Direct);
        assert_eq!(
            queries(&song),
            vec![
                "https://video.example/watch?v=1",
                "Artist Track Live audio",
                "Artist Track Live official",
                "Artist Track Live",
                "Artist - Track (Live)",
            ]
        );
        assert!(
            attempts[1..]
                .iter()
                .all(|a| a.options.mode == LookupMode::Search { results: 1 })
        );
    }

    #[test]
    fn plain_title_skips_duplicate_raw_query() {
        let song = Song::lazy("plain title", None, UserId(1));
        assert_eq!(
            queries(&song),
            vec!["plain title audio", "plain title official", "plain title"]
        );
    }

    #[test]
    fn non_http_page_url_is_not_a_direct_attempt() {
        let song = Song::lazy("q", Some("ytsearch:q".into()), UserId(1));
        assert!(
            build_attempts(&song)
                .iter()
                .all(|a| a.options.mode != LookupMode::Direct)
        );
    }

    #[test]
    fn clean_title_collapses_whitespace() {
        assert_eq!(clean_title("A - B  (C)"), "A B C");
    }
}
