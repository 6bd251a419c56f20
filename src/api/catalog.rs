//! Sample Catalogue
//!
//! Deterministic stand-in for the article repository so the cached route has
//! something to serve. Bodies are padded so listings of a few articles cross
//! the default compression threshold.

use crate::models::Article;

const SUMMARY: &str = "Generated briefing covering the most discussed stories of the day, \
with background, key figures and reactions from people involved.";

/// Returns `limit` articles for `category`, newest first.
pub fn articles_for(category: &str, limit: usize) -> Vec<Article> {
    let slug = category.to_lowercase().replace(char::is_whitespace, "-");
    (1..=limit)
        .map(|rank| Article {
            id: format!("{}-{}", slug, rank),
            title: format!("{} headline #{}", category, rank),
            category: category.to_string(),
            summary: SUMMARY.repeat(8),
        })
        .collect()
}
