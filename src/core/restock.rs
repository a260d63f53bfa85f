//! Store-floor restock queue policy
//!
//! Products from a few store-floor categories (lubricants, safety equipment,
//! farm accessories) that show up in a partial upload are queued for shelf
//! replenishment. The queue is append-only: entries are resolved, never
//! deleted, and entries older than the expiry window drop out of the pending
//! view on their own.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::classify::Category;
use crate::core::record::ParsedRow;

/// Days an unresolved entry stays visible as pending
pub const DEFAULT_EXPIRY_DAYS: i64 = 7;

/// Longest accepted expiry window (about a century)
pub const MAX_EXPIRY_DAYS: i64 = 36_500;

/// Categories queued for restock unless configured otherwise
pub const DEFAULT_CATEGORIES: &[Category] = &[
    Category::Lubricants,
    Category::SafetyEquipment,
    Category::FarmAccessories,
];

/// An item waiting to be put back on the store shelves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockEntry {
    /// Assigned by the store; `0` until pushed
    pub id: i64,
    pub code: String,
    pub product_name: String,
    pub category: Category,
    pub quantity_sold: i64,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Which categories are queued and for how long entries stay pending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestockPolicy {
    categories: Vec<Category>,
    expiry_days: i64,
}

impl Default for RestockPolicy {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.to_vec(),
            expiry_days: DEFAULT_EXPIRY_DAYS,
        }
    }
}

impl RestockPolicy {
    pub fn new(categories: Vec<Category>, expiry_days: i64) -> Self {
        Self {
            categories,
            expiry_days: expiry_days.clamp(0, MAX_EXPIRY_DAYS),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn expiry_days(&self) -> i64 {
        self.expiry_days
    }

    pub fn is_eligible(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    /// Oldest creation time still shown as pending at `now`
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(Duration::days(self.expiry_days))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Unresolved and not yet expired
    pub fn is_pending(&self, entry: &RestockEntry, now: DateTime<Utc>) -> bool {
        !entry.resolved && entry.created_at >= self.cutoff(now)
    }

    /// Queue entry for `row`, if its category is eligible
    ///
    /// Uses the sold quantity when the row carries one, the system quantity
    /// otherwise.
    pub fn candidate(&self, row: &ParsedRow, now: DateTime<Utc>) -> Option<RestockEntry> {
        if !self.is_eligible(row.category) {
            return None;
        }
        Some(RestockEntry {
            id: 0,
            code: row.code.clone(),
            product_name: row.product_name.clone(),
            category: row.category,
            quantity_sold: row.quantity_sold.unwrap_or(row.system_quantity),
            created_at: now,
            resolved: false,
            resolved_at: None,
        })
    }
}
