//! Per-user cart contents, stored as one JSON document per user.
//!
//! Every entry present in the map has a quantity of at least 1. Dropping the
//! last unit is never implicit: `decrement` refuses at 1 and callers must
//! `remove` the entry instead.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub quantity: u32,
    pub added_time: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be a positive integer")]
    InvalidQuantity,

    #[error("commodity {0} is not in the cart")]
    NotInCart(String),

    #[error("quantity of {code} cannot be reduced to 0, delete the item instead")]
    WouldReachZero { code: String, current_quantity: u32 },
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::InvalidQuantity => AppError::BadRequest(err.to_string()),
            CartError::NotInCart(_) => AppError::NotFound(err.to_string()),
            CartError::WouldReachZero { .. } => AppError::BadRequest(err.to_string()),
        }
    }
}

/// Outcome of a batch removal.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RemovalReport {
    pub deleted: Vec<String>,
    pub not_found: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartContents(BTreeMap<String, CartEntry>);

impl CartContents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::new());
        }
        serde_json::from_value(value.clone())
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }

    pub fn get(&self, code: &str) -> Option<&CartEntry> {
        self.0.get(code)
    }

    pub fn quantity_of(&self, code: &str) -> u32 {
        self.0.get(code).map(|e| e.quantity).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adds `qty` units, creating the entry if absent.
    pub fn add(&mut self, code: &str, qty: u32, now: DateTime<Utc>) -> Result<u32, CartError> {
        if qty == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let entry = self.0.entry(code.to_string()).or_insert(CartEntry {
            quantity: 0,
            added_time: now,
        });
        entry.quantity = entry.quantity.saturating_add(qty);
        entry.added_time = now;
        Ok(entry.quantity)
    }

    pub fn set_quantity(
        &mut self,
        code: &str,
        qty: u32,
        now: DateTime<Utc>,
    ) -> Result<u32, CartError> {
        if qty == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let entry = self
            .0
            .get_mut(code)
            .ok_or_else(|| CartError::NotInCart(code.to_string()))?;
        entry.quantity = qty;
        entry.added_time = now;
        Ok(qty)
    }

    pub fn increment(
        &mut self,
        code: &str,
        delta: u32,
        now: DateTime<Utc>,
    ) -> Result<u32, CartError> {
        if delta == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let current = self
            .get(code)
            .ok_or_else(|| CartError::NotInCart(code.to_string()))?
            .quantity;
        self.set_quantity(code, current.saturating_add(delta), now)
    }

    pub fn decrement(&mut self, code: &str, now: DateTime<Utc>) -> Result<u32, CartError> {
        let current = self
            .get(code)
            .ok_or_else(|| CartError::NotInCart(code.to_string()))?
            .quantity;
        if current <= 1 {
            return Err(CartError::WouldReachZero {
                code: code.to_string(),
                current_quantity: current,
            });
        }
        self.set_quantity(code, current - 1, now)
    }

    /// Returns whether the code was present.
    pub fn remove(&mut self, code: &str) -> bool {
        self.0.remove(code).is_some()
    }

    pub fn remove_many<I, S>(&mut self, codes: I) -> RemovalReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = RemovalReport::default();
        for code in codes {
            let code = code.as_ref();
            if self.remove(code) {
                report.deleted.push(code.to_string());
            } else {
                report.not_found.push(code.to_string());
            }
        }
        report
    }

    /// Empties the cart and returns how many distinct items were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.0.len();
        self.0.clear();
        count
    }

    pub fn total_quantity(&self) -> u64 {
        self.0.values().map(|e| u64::from(e.quantity)).sum()
    }

    /// Newest first; equal timestamps fall back to code order.
    pub fn items_by_recency(&self) -> Vec<(&str, &CartEntry)> {
        let mut items: Vec<_> = self.0.iter().map(|(k, v)| (k.as_str(), v)).collect();
        items.sort_by(|a, b| b.1.added_time.cmp(&a.1.added_time).then(a.0.cmp(b.0)));
        items
    }
}
