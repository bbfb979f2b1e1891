//! Personalised dish recommendations.
//!
//! Scores every available dish for one customer from their order history,
//! favorites and dietary preferences, then keeps the best
//! [`MAX_RECOMMENDATIONS`]. The scorer is a pure function of its inputs.
//!
//! ```text
//! score = 1
//!       + 5  × times ordered
//!       + 10 × favorite
//!       + 3  × dietary tags matching the customer's preferences
//!       + Σ similarity(dish, other ordered dish) × quantity
//! score × 0.7 when the dish was ordered more than 3 times
//! ```

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Every dish starts with this score.
pub const BASE_SCORE: f64 = 1.0;
/// Added per previous order of the dish.
pub const ORDER_WEIGHT: f64 = 5.0;
/// Added when the dish is a favorite.
pub const FAVORITE_WEIGHT: f64 = 10.0;
/// Added per dietary tag matching the customer's preferences.
pub const DIETARY_WEIGHT: f64 = 3.0;

/// Similarity weight of a shared category.
pub const CATEGORY_SIMILARITY: f64 = 0.5;
/// Similarity weight of the tag overlap ratio.
pub const TAG_SIMILARITY: f64 = 0.3;
/// Similarity weight of price proximity.
pub const PRICE_SIMILARITY: f64 = 0.2;

/// Dishes ordered more often than this are damped to favour discovery.
pub const DISCOVERY_THRESHOLD: u32 = 3;
/// Multiplier applied past [`DISCOVERY_THRESHOLD`].
pub const DISCOVERY_FACTOR: f64 = 0.7;

/// Number of recommendations returned.
pub const MAX_RECOMMENDATIONS: usize = 12;

/// Price gap (euros) under which two dishes are "close" in price.
const CLOSE_PRICE_GAP: f64 = 2.0;
/// Price gap (euros) under which two dishes are "near" in price.
const NEAR_PRICE_GAP: f64 = 5.0;

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// The attributes of a dish the scorer looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct DishFeatures {
    pub id: DbId,
    pub category: String,
    pub tags: Vec<String>,
    pub price: f64,
    pub is_available: bool,
}

/// One line of the customer's order history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryLine {
    pub dish_id: DbId,
    pub quantity: i32,
}

/// Everything known about the customer.
#[derive(Debug, Clone, Default)]
pub struct CustomerContext {
    pub history: Vec<HistoryLine>,
    pub favorites: HashSet<DbId>,
    pub dietary_preferences: Vec<String>,
}

/// A recommended dish and its score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredDish {
    pub dish_id: DbId,
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Similarity
// ---------------------------------------------------------------------------

fn lowercase_set(tags: &[String]) -> HashSet<String> {
    tags.iter().map(|t| t.trim().to_lowercase()).collect()
}

/// Ratio of shared tags to all tags (`|A ∩ B| / |A ∪ B|`), 0 when both are empty.
pub fn tag_overlap(a: &[String], b: &[String]) -> f64 {
    let a = lowercase_set(a);
    let b = lowercase_set(b);
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// Price proximity bucket: 1.0 within 2 €, 0.5 within 5 €, 0 beyond.
pub fn price_proximity(a: f64, b: f64) -> f64 {
    let gap = (a - b).abs();
    if gap <= CLOSE_PRICE_GAP {
        1.0
    } else if gap <= NEAR_PRICE_GAP {
        0.5
    } else {
        0.0
    }
}

/// Similarity between two dishes, in `[0, 1]`.
pub fn similarity(a: &DishFeatures, b: &DishFeatures) -> f64 {
    let same_category = a.category.eq_ignore_ascii_case(&b.category);
    CATEGORY_SIMILARITY * f64::from(u8::from(same_category))
        + TAG_SIMILARITY * tag_overlap(&a.tags, &b.tags)
        + PRICE_SIMILARITY * price_proximity(a.price, b.price)
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Number of history lines per dish.
fn order_counts(history: &[HistoryLine]) -> HashMap<DbId, u32> {
    let mut counts = HashMap::new();
    for line in history {
        *counts.entry(line.dish_id).or_insert(0) += 1;
    }
    counts
}

/// Score one dish.
///
/// `catalog` resolves history dish ids to their features; history lines for
/// dishes missing from it (deleted dishes) contribute nothing to similarity.
pub fn score_dish(
    dish: &DishFeatures,
    customer: &CustomerContext,
    catalog: &HashMap<DbId, &DishFeatures>,
    times_ordered: u32,
) -> f64 {
    let preferences = lowercase_set(&customer.dietary_preferences);
    let dietary_matches = lowercase_set(&dish.tags)
        .intersection(&preferences)
        .count();

    let history_affinity: f64 = customer
        .history
        .iter()
        .filter(|line| line.dish_id != dish.id)
        .filter_map(|line| {
            catalog
                .get(&line.dish_id)
                .map(|other| similarity(dish, other) * f64::from(line.quantity.max(0)))
        })
        .sum();

    let favorite = customer.favorites.contains(&dish.id);

    let score = BASE_SCORE
        + ORDER_WEIGHT * f64::from(times_ordered)
        + FAVORITE_WEIGHT * f64::from(u8::from(favorite))
        + DIETARY_WEIGHT * dietary_matches as f64
        + history_affinity;

    if times_ordered > DISCOVERY_THRESHOLD {
        score * DISCOVERY_FACTOR
    } else {
        score
    }
}

/// Rank the available dishes for a customer.
///
/// Returns at most [`MAX_RECOMMENDATIONS`] dishes by descending score, ties
/// broken by ascending dish id.
pub fn recommend(dishes: &[DishFeatures], customer: &CustomerContext) -> Vec<ScoredDish> {
    let catalog: HashMap<DbId, &DishFeatures> = dishes.iter().map(|d| (d.id, d)).collect();
    let counts = order_counts(&customer.history);

    let mut scored: Vec<ScoredDish> = dishes
        .iter()
        .filter(|d| d.is_available)
        .map(|d| ScoredDish {
            dish_id: d.id,
            score: score_dish(
                d,
                customer,
                &catalog,
                counts.get(&d.id).copied().unwrap_or(0),
            ),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.dish_id.cmp(&b.dish_id))
    });
    scored.truncate(MAX_RECOMMENDATIONS);
    scored
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
