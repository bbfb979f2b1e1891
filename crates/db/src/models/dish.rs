//! Menu dishes.

use pausedej_core::recommendation::DishFeatures;
use pausedej_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `dishes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Dish {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    pub dietary_tags: Vec<String>,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Dish {
    /// The attributes the recommendation scorer looks at.
    pub fn features(&self) -> DishFeatures {
        DishFeatures {
            id: self.id,
            category: self.category.clone(),
            tags: self.dietary_tags.clone(),
            price: self.price,
            is_available: self.is_available,
        }
    }
}

/// DTO for creating a dish.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDish {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(length(min = 1, max = 60))]
    pub category: String,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

/// DTO for partially updating a dish.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDish {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(length(min = 1, max = 60))]
    pub category: Option<String>,
    pub dietary_tags: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

/// Filters for listing dishes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DishFilter {
    pub category: Option<String>,
    #[serde(default)]
    pub available_only: bool,
}
