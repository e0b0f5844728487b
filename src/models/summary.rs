//! Home page and dashboard projections over the catalog.

use serde::Serialize;

use super::CatalogItem;

/// Number of items shown in the featured strip.
pub const FEATURED_COUNT: usize = 3;

/// Number of items shown in the popular grid.
pub const POPULAR_COUNT: usize = 6;

/// Items surfaced on the home page, taken in store order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogOverview {
    pub featured: Vec<CatalogItem>,
    pub popular: Vec<CatalogItem>,
}

impl CatalogOverview {
    pub fn from_items(items: &[CatalogItem]) -> Self {
        Self {
            featured: items.iter().take(FEATURED_COUNT).cloned().collect(),
            popular: items.iter().take(POPULAR_COUNT).cloned().collect(),
        }
    }
}

/// Aggregate counters for the dashboard.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_items: usize,
    pub total_popularity: u64,
    pub total_reviews: u64,
    pub total_guilds: u64,
    pub average_rating: f64,
}

impl CatalogStats {
    pub fn from_items(items: &[CatalogItem]) -> Self {
        let total_items = items.len();
        let total_popularity = saturating_total(items.iter().map(|i| i.popularity));
        let total_reviews = saturating_total(items.iter().map(|i| i.review_count));
        let total_guilds = saturating_total(items.iter().map(|i| i.details.guild_count()));

        let average_rating = if total_items == 0 {
            0.0
        } else {
            let sum: f64 = items.iter().map(|i| i.rating).sum();
            (sum / total_items as f64 * 10.0).round() / 10.0
        };

        Self {
            total_items,
            total_popularity,
            total_reviews,
            total_guilds,
            average_rating,
        }
    }
}

/// Counter totals pin at `u64::MAX` instead of overflowing.
fn saturating_total(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0u64, |acc, n| acc.saturating_add(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemDetails;

    fn bot(id: &str, users: u64, guilds: u64, rating: f64) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            name: format!("Bot {}", id),
            short_description: String::new(),
            description: String::new(),
            category: "Fun".to_string(),
            tags: vec![],
            image: None,
            popularity: users,
            rating,
            review_count: 10,
            created_at: None,
            updated_at: None,
            details: ItemDetails::Bot {
                prefix: "!".to_string(),
                invite_url: None,
                support_server: None,
                guild_count: guilds,
                featured: false,
            },
        }
    }

    #[test]
    fn test_stats_empty() {
        let stats = CatalogStats::from_items(&[]);
        assert_eq!(stats.total_items, 0);
        assert_eq!(stats.average_rating, 0.0);
    }

    #[test]
    fn test_stats_sums_and_rounds() {
        let items = vec![bot("a", 100, 3, 4.5), bot("b", 50, 2, 4.0)];
        let stats = CatalogStats::from_items(&items);

        assert_eq!(stats.total_items, 2);
        assert_eq!(stats.total_popularity, 150);
        assert_eq!(stats.total_reviews, 20);
        assert_eq!(stats.total_guilds, 5);
        assert_eq!(stats.average_rating, 4.3);
    }

    #[test]
    fn test_stats_totals_saturate_on_huge_counters() {
        let huge = i64::MAX as u64;
        let items: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|id| {
                let mut item = bot(id, huge, huge, 5.0);
                item.review_count = huge;
                item
            })
            .collect();
        let stats = CatalogStats::from_items(&items);

        assert_eq!(stats.total_items, 3);
        assert_eq!(stats.total_popularity, u64::MAX);
        assert_eq!(stats.total_reviews, u64::MAX);
        assert_eq!(stats.total_guilds, u64::MAX);
        assert_eq!(stats.average_rating, 5.0);
    }

    #[test]
    fn test_overview_takes_store_order() {
        let items: Vec<_> = (0..8).map(|n| bot(&n.to_string(), 0, 0, 0.0)).collect();
        let overview = CatalogOverview::from_items(&items);

        let featured: Vec<_> = overview.featured.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(featured, vec!["0", "1", "2"]);
        assert_eq!(overview.popular.len(), POPULAR_COUNT);
        assert_eq!(overview.popular[5].id, "5");
    }
}
