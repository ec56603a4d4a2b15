use common::{SearchHit, Song};

use crate::{Catalog, CatalogError};

const EXACT_TOKEN_SCORE: u32 = 3;
const PREFIX_TOKEN_SCORE: u32 = 2;
const INNER_TOKEN_SCORE: u32 = 1;
const TITLE_WEIGHT: u32 = 2;
const ARTIST_WEIGHT: u32 = 1;

impl Catalog {
    /// Songs whose title or artist contain any of the query terms, best first.
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>, CatalogError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::InvalidArgument(
                "search query is required".to_string(),
            ));
        }
        let mut terms = tokenize(trimmed);
        terms.sort();
        terms.dedup();
        if terms.is_empty() {
            return Err(CatalogError::InvalidArgument(
                "search query has no searchable terms".to_string(),
            ));
        }

        let mut hits: Vec<SearchHit> = self
            .all_songs()?
            .into_iter()
            .filter_map(|song| {
                let score = score_song(&terms, &song);
                (score > 0).then_some(SearchHit { song, score })
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.song.seq.cmp(&b.song.seq))
        });
        Ok(hits)
    }
}

/// Lower-cased alphanumeric runs of `value`.
pub fn tokenize(value: &str) -> Vec<String> {
    value
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect()
}

/// Relevance of `song` for already tokenized `terms`; 0 means no match.
pub fn score_song(terms: &[String], song: &Song) -> u32 {
    let title = tokenize(&song.title);
    let artist = tokenize(&song.artist);
    terms
        .iter()
        .map(|term| {
            field_score(term, &title) * TITLE_WEIGHT + field_score(term, &artist) * ARTIST_WEIGHT
        })
        .sum()
}

fn field_score(term: &str, tokens: &[String]) -> u32 {
    tokens
        .iter()
        .map(|token| {
            if token == term {
                EXACT_TOKEN_SCORE
            } else if token.starts_with(term) {
                PREFIX_TOKEN_SCORE
            } else if token.contains(term) {
                INNER_TOKEN_SCORE
            } else {
                0
            }
        })
        .sum()
}
