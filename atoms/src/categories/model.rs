use serde::{Deserialize, Serialize};

/// Gap left between successive categories so they can be reordered by hand.
pub const SORT_ORDER_STEP: i64 = 10;

/// Category domain model - shared, globally readable grouping of photos
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryPayload {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i64,
}

/// Result of the store-level atomic insert
#[derive(Debug, Clone)]
pub enum CategoryInsert {
    Created(Category),
    /// Another writer already holds this name
    Existing(Category),
}

impl CategoryInsert {
    pub fn into_category(self) -> Category {
        match self {
            CategoryInsert::Created(c) | CategoryInsert::Existing(c) => c,
        }
    }
}

/// Next sort key after the current maximum; the first category gets one step.
pub fn next_sort_order(categories: &[Category]) -> i64 {
    categories
        .iter()
        .map(|c| c.sort_order)
        .max()
        .unwrap_or(0)
        + SORT_ORDER_STEP
}
