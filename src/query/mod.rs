//! Catalog query engine.
//!
//! Derives the visible, ordered subset of the catalog for a search term, a
//! category filter, and a sort order. Pure: the input slice is never mutated
//! and the same inputs always yield the same output.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::errors::AppError;
use crate::models::{category, CatalogItem, ItemKind};

/// Arabic tatweel (kashida), a purely typographic stretch character.
const TATWEEL: char = '\u{0640}';

/// Field the result is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Rating,
    Popularity,
    Created,
}

impl SortKey {
    /// Parse a sort key. `downloads` and `users` are accepted as the
    /// per-listing names for popularity.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "name" => Ok(SortKey::Name),
            "rating" => Ok(SortKey::Rating),
            "popularity" | "downloads" | "users" => Ok(SortKey::Popularity),
            "created" => Ok(SortKey::Created),
            other => Err(AppError::InvalidArgument(format!(
                "unknown sort key: {:?}",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Rating => "rating",
            SortKey::Popularity => "popularity",
            SortKey::Created => "created",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(AppError::InvalidArgument(format!(
                "unknown sort direction: {:?}",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// A validated catalog query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search_term: String,
    /// Empty or the "all" sentinel disables category filtering.
    pub category: String,
    pub sort_key: SortKey,
    pub direction: SortDirection,
    pub kind: Option<ItemKind>,
}

impl Default for CatalogQuery {
    /// Initial state of a listing page: everything, best rated first.
    fn default() -> Self {
        Self {
            search_term: String::new(),
            category: String::new(),
            sort_key: SortKey::Rating,
            direction: SortDirection::Desc,
            kind: None,
        }
    }
}

impl CatalogQuery {
    /// Build a query from raw string inputs, rejecting unknown sort keys and directions.
    pub fn new(
        search_term: impl Into<String>,
        category: impl Into<String>,
        sort_key: &str,
        direction: &str,
    ) -> Result<Self, AppError> {
        Ok(Self {
            search_term: search_term.into(),
            category: category.into(),
            sort_key: SortKey::parse(sort_key)?,
            direction: SortDirection::parse(direction)?,
            kind: None,
        })
    }

    pub fn with_kind(mut self, kind: Option<ItemKind>) -> Self {
        self.kind = kind;
        self
    }
}

/// Run `query` over `items`, returning the filtered items in sort order.
pub fn run(items: &[CatalogItem], query: &CatalogQuery) -> Vec<CatalogItem> {
    let needle = query.search_term.to_lowercase();

    let mut matched: Vec<CatalogItem> = items
        .iter()
        .filter(|item| query.kind.map_or(true, |kind| item.kind() == kind))
        .filter(|item| matches_search(item, &needle))
        .filter(|item| matches_category(item, &query.category))
        .cloned()
        .collect();

    // `sort_by` is stable, and reversing the comparator keeps ties in input order.
    matched.sort_by(|a, b| {
        let ordering = compare(a, b, query.sort_key);
        match query.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    tracing::debug!(
        total = items.len(),
        matched = matched.len(),
        sort = query.sort_key.as_str(),
        dir = query.direction.as_str(),
        "Catalog query evaluated"
    );

    matched
}

/// Case-insensitive substring match on name, descriptions, and tags.
///
/// `needle` must already be lowercased; an empty needle matches everything.
pub fn matches_search(item: &CatalogItem, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let hit = |text: &str| text.to_lowercase().contains(needle);

    hit(&item.name)
        || hit(&item.description)
        || hit(&item.short_description)
        || item.tags.iter().any(|tag| hit(tag))
}

pub fn matches_category(item: &CatalogItem, selected: &str) -> bool {
    selected.is_empty() || category::is_all_sentinel(selected) || item.category == selected
}

/// Ascending base comparison for `key`.
///
/// A missing creation time orders below every present one.
pub fn compare(a: &CatalogItem, b: &CatalogItem, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => collate(&a.name, &b.name),
        SortKey::Rating => a.rating.total_cmp(&b.rating),
        SortKey::Popularity => a.popularity.cmp(&b.popularity),
        SortKey::Created => a.created_at.cmp(&b.created_at),
    }
}

/// Locale-aware name ordering.
///
/// Primary strength ignores case, diacritics, and tatweel (so `أ` and `ا`,
/// `é` and `e` sort together). On equal keys lowercase sorts ahead of
/// uppercase, then exact code point order breaks the remaining ties.
pub fn collate(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| case_key(a).cmp(&case_key(b)))
        .then_with(|| a.cmp(b))
}

fn collation_key(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c) && *c != TATWEEL)
        .flat_map(char::to_lowercase)
        .collect()
}

// Swapping case makes code point order put lowercase first.
fn case_key(s: &str) -> String {
    let mut key = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_lowercase() {
            key.extend(c.to_uppercase());
        } else {
            key.extend(c.to_lowercase());
        }
    }
    key
}
