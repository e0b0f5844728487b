//! Catalog item model shared by file and bot listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{category, timestamp};
use crate::errors::AppError;

/// Highest rating an item can carry.
pub const MAX_RATING: f64 = 5.0;

/// Rating given to freshly uploaded items.
pub const DEFAULT_RATING: f64 = 0.0;

/// Listing kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Bot,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::File => "file",
            ItemKind::Bot => "bot",
        }
    }

    /// Parse a kind, rejecting anything outside the enumerated set.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "file" => Ok(ItemKind::File),
            "bot" => Ok(ItemKind::Bot),
            other => Err(AppError::InvalidArgument(format!(
                "unknown item kind: {:?}",
                other
            ))),
        }
    }
}

/// Kind-specific descriptive fields. Opaque to the query engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemDetails {
    #[serde(rename_all = "camelCase")]
    File {
        #[serde(default = "default_version")]
        version: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_size: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        download_url: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Bot {
        #[serde(default = "default_prefix")]
        prefix: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        invite_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        support_server: Option<String>,
        #[serde(default)]
        guild_count: u64,
        #[serde(default)]
        featured: bool,
    },
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_prefix() -> String {
    "!".to_string()
}

impl ItemDetails {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemDetails::File { .. } => ItemKind::File,
            ItemDetails::Bot { .. } => ItemKind::Bot,
        }
    }

    /// Number of servers a bot is installed in; zero for files.
    pub fn guild_count(&self) -> u64 {
        match self {
            ItemDetails::Bot { guild_count, .. } => *guild_count,
            ItemDetails::File { .. } => 0,
        }
    }
}

/// A single listed entity (file or bot).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Download count for files, user count for bots
    #[serde(default)]
    pub popularity: u64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u64,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub details: ItemDetails,
}

impl CatalogItem {
    pub fn kind(&self) -> ItemKind {
        self.details.kind()
    }

    /// Check the invariants an item must hold before it enters the store.
    ///
    /// Used for imported records; uploads go through [`CreateItemRequest::into_item`].
    pub fn validate(&self) -> Result<(), AppError> {
        if self.id.trim().is_empty() {
            return Err(AppError::Validation("Item id is required".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "Item {} has an empty name",
                self.id
            )));
        }
        if !self.rating.is_finite() || !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(AppError::Validation(format!(
                "Item {} rating {} is outside 0-{}",
                self.id, self.rating, MAX_RATING
            )));
        }
        if !category::is_known(self.kind(), &self.category) {
            return Err(AppError::Validation(format!(
                "Item {} has unknown {} category {:?}",
                self.id,
                self.kind().as_str(),
                self.category
            )));
        }
        Ok(())
    }

    /// Round the rating to the one-decimal scale the catalog displays.
    pub fn normalize_rating(&mut self) {
        self.rating = (self.rating * 10.0).round() / 10.0;
    }
}

/// Request body for uploading a new item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(flatten)]
    pub details: ItemDetails,
}

impl CreateItemRequest {
    /// Validate the upload and build the stored item.
    pub fn into_item(self, id: String, now: DateTime<Utc>) -> Result<CatalogItem, AppError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }

        let kind = self.details.kind();
        if category::is_all_sentinel(&self.category) || !category::is_known(kind, &self.category)
        {
            return Err(AppError::Validation(format!(
                "Unknown {} category: {:?}",
                kind.as_str(),
                self.category
            )));
        }

        let tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(CatalogItem {
            id,
            name,
            short_description: self.short_description.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category,
            tags,
            image: self.image.filter(|i| !i.trim().is_empty()),
            popularity: 0,
            rating: DEFAULT_RATING,
            review_count: 0,
            created_at: Some(now),
            updated_at: Some(now),
            details: self.details,
        })
    }
}
