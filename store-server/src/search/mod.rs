//! In-process full-text index over the product catalog
//!
//! A disposable projection of the relational store: documents are fed in by
//! the index-sync consumer and the startup resynchronization, and the whole
//! index can be rebuilt from Postgres at any time. Queries match `name` and
//! `description` tokens with fuzzy tolerance and return hits ranked by a
//! tf-idf score.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Indexed projection of a product (never authoritative)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocument {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image: Option<String>,
    pub category: Option<String>,
}

/// Ranked search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub document: SearchDocument,
    pub score: f64,
}

#[derive(Default)]
struct Inner {
    docs: HashMap<Uuid, SearchDocument>,
    /// term -> (doc id -> term frequency)
    postings: HashMap<String, HashMap<Uuid, u32>>,
}

/// Thread-safe inverted index shared between the HTTP handlers and the
/// index-sync worker
pub struct SearchIndex {
    inner: RwLock<Inner>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Insert or replace a document
    pub fn upsert(&self, doc: SearchDocument) {
        let mut inner = self.inner.write().expect("search index lock poisoned");
        remove_postings(&mut inner, doc.id);
        for token in tokenize(&searchable_text(&doc)) {
            *inner
                .postings
                .entry(token)
                .or_default()
                .entry(doc.id)
                .or_insert(0) += 1;
        }
        inner.docs.insert(doc.id, doc);
    }

    /// Remove a document; unknown ids are a no-op
    pub fn remove(&self, id: Uuid) {
        let mut inner = self.inner.write().expect("search index lock poisoned");
        remove_postings(&mut inner, id);
        inner.docs.remove(&id);
    }

    /// Drop every document (start of a full resynchronization)
    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("search index lock poisoned");
        inner.docs.clear();
        inner.postings.clear();
    }

    /// Number of indexed documents
    pub fn doc_count(&self) -> usize {
        self.inner
            .read()
            .expect("search index lock poisoned")
            .docs
            .len()
    }

    /// Fuzzy multi-token query over name and description, ranked by score
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let inner = self.inner.read().expect("search index lock poisoned");
        let doc_count = inner.docs.len();
        if doc_count == 0 {
            return Vec::new();
        }

        let mut scores: HashMap<Uuid, f64> = HashMap::new();
        for token in tokenize(query) {
            let budget = fuzz_budget(&token);
            for (term, postings) in &inner.postings {
                let Some(distance) = edit_distance_within(&token, term, budget) else {
                    continue;
                };
                let idf = (1.0 + doc_count as f64 / (1.0 + postings.len() as f64)).ln();
                for (doc_id, tf) in postings {
                    let term_score = f64::from(*tf) * idf / (1.0 + distance as f64);
                    *scores.entry(*doc_id).or_insert(0.0) += term_score;
                }
            }
        }

        let mut hits: Vec<SearchHit> = scores
            .into_iter()
            .filter_map(|(id, score)| {
                inner.docs.get(&id).map(|doc| SearchHit {
                    document: doc.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        hits
    }
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn searchable_text(doc: &SearchDocument) -> String {
    match &doc.description {
        Some(desc) => format!("{} {}", doc.name, desc),
        None => doc.name.clone(),
    }
}

fn remove_postings(inner: &mut Inner, id: Uuid) {
    if let Some(old) = inner.docs.get(&id) {
        for token in tokenize(&searchable_text(old)) {
            if let Some(postings) = inner.postings.get_mut(&token) {
                postings.remove(&id);
                if postings.is_empty() {
                    inner.postings.remove(&token);
                }
            }
        }
    }
}

/// Lowercased alphanumeric tokens, single characters dropped
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(str::to_string)
        .collect()
}

/// Edit-distance tolerance by token length (the classic AUTO fuzziness
/// ladder: short tokens exact, medium one edit, long two)
fn fuzz_budget(token: &str) -> usize {
    match token.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

/// Levenshtein distance, or `None` when it exceeds `budget`
fn edit_distance_within(a: &str, b: &str, budget: usize) -> Option<usize> {
    if a == b {
        return Some(0);
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > budget {
        return None;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
            row_min = row_min.min(curr[j + 1]);
        }
        if row_min > budget {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[b.len()];
    (distance <= budget).then_some(distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn doc(id: u128, name: &str, description: &str) -> SearchDocument {
        SearchDocument {
            id: Uuid::from_u128(id),
            name: name.to_string(),
            description: Some(description.to_string()),
            price: Decimal::from_str("9.99").unwrap(),
            image: None,
            category: Some("Electronics".to_string()),
        }
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Wireless Mouse, 2.4GHz!"),
            vec!["wireless", "mouse", "4ghz"]
        );
        assert!(tokenize("a b c").is_empty());
    }

    #[test]
    fn test_fuzz_budget_ladder() {
        assert_eq!(fuzz_budget("tv"), 0);
        assert_eq!(fuzz_budget("lamp"), 1);
        assert_eq!(fuzz_budget("keyboard"), 2);
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance_within("mouse", "mouse", 2), Some(0));
        assert_eq!(edit_distance_within("mouse", "house", 2), Some(1));
        assert_eq!(edit_distance_within("mouse", "mousse", 2), Some(1));
        assert_eq!(edit_distance_within("mouse", "keyboard", 2), None);
    }

    #[test]
    fn test_exact_search_ranks_by_frequency() {
        let index = SearchIndex::new();
        index.upsert(doc(1, "Wireless Mouse", "A wireless mouse with wireless receiver"));
        index.upsert(doc(2, "Mouse Pad", "Cloth surface"));

        let hits = index.search("wireless", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.id, Uuid::from_u128(1));
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn test_fuzzy_match_finds_typos() {
        let index = SearchIndex::new();
        index.upsert(doc(1, "Mechanical Keyboard", "Tenkeyless layout"));

        // one substitution away from "keyboard"
        let hits = index.search("keybaord", 10);
        assert_eq!(hits.len(), 1);

        // exact match scores higher than the same query with a typo
        let exact = index.search("keyboard", 10)[0].score;
        let fuzzy = index.search("keybaord", 10)[0].score;
        assert!(exact > fuzzy);
    }

    #[test]
    fn test_short_tokens_do_not_fuzz() {
        let index = SearchIndex::new();
        index.upsert(doc(1, "LED TV", "55 inch panel"));

        assert_eq!(index.search("tv", 10).len(), 1);
        // "tb" is one edit from "tv" but short tokens require exact match
        assert!(index.search("tb", 10).is_empty());
    }

    #[test]
    fn test_multi_token_query_accumulates() {
        let index = SearchIndex::new();
        index.upsert(doc(1, "Wireless Mouse", "Ergonomic"));
        index.upsert(doc(2, "Wireless Keyboard", "Low profile"));

        let hits = index.search("wireless mouse", 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.id, Uuid::from_u128(1));
    }

    #[test]
    fn test_upsert_replaces_old_postings() {
        let index = SearchIndex::new();
        index.upsert(doc(1, "Espresso Machine", "15 bar pump"));
        assert_eq!(index.search("espresso", 10).len(), 1);

        index.upsert(doc(1, "Drip Brewer", "12 cup carafe"));
        assert!(index.search("espresso", 10).is_empty());
        assert_eq!(index.search("brewer", 10).len(), 1);
        assert_eq!(index.doc_count(), 1);
    }

    #[test]
    fn test_remove_and_rebuild_reproduces_count() {
        let index = SearchIndex::new();
        let products: Vec<SearchDocument> = (1..=8)
            .map(|i| doc(i, &format!("Product {i}"), "generic description"))
            .collect();

        for p in &products {
            index.upsert(p.clone());
        }
        assert_eq!(index.doc_count(), products.len());

        index.clear();
        assert_eq!(index.doc_count(), 0);
        assert!(index.search("generic", 10).is_empty());

        for p in &products {
            index.upsert(p.clone());
        }
        assert_eq!(index.doc_count(), products.len());
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let index = SearchIndex::new();
        index.upsert(doc(1, "Desk Lamp", "Warm light"));
        index.remove(Uuid::from_u128(42));
        assert_eq!(index.doc_count(), 1);
    }

    #[test]
    fn test_limit_truncates() {
        let index = SearchIndex::new();
        for i in 1..=20 {
            index.upsert(doc(i, &format!("Widget {i}"), "common text"));
        }
        assert_eq!(index.search("common", 5).len(), 5);
    }
}
