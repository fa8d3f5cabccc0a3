//! Line-item editing and the derived totals.
//!
//! Nothing here does I/O. Totals are never stored: [`recompute_totals`] is a
//! pure function of the items and the tax rate, so a caller that reads them
//! after any mutation always sees a consistent set.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::error::ItemError;
use crate::model::LineItem;

/// Subtotal, tax and grand total for one invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// A single edit to one line item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemField {
    Description(String),
    Quantity(u32),
    UnitPrice(Decimal),
}

/// Ordered line items. Never empty: construction seeds one blank row and
/// removal refuses to take the last one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LineItems(Vec<LineItem>);

impl LineItems {
    pub fn new() -> Self {
        Self(vec![LineItem::default()])
    }

    /// Builds a list from existing rows; an empty input gets one blank row.
    pub fn from_items(items: Vec<LineItem>) -> Self {
        if items.is_empty() {
            Self::new()
        } else {
            Self(items)
        }
    }

    pub fn as_slice(&self) -> &[LineItem] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LineItem> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.0.iter()
    }

    /// Applies one field edit. Quantity and price edits recompute the row's
    /// amount from the new value and the row's other, unchanged field.
    pub fn set_field(&mut self, index: usize, field: ItemField) -> Result<(), ItemError> {
        let len = self.0.len();
        let item = self
            .0
            .get_mut(index)
            .ok_or(ItemError::OutOfRange { index, len })?;

        match field {
            ItemField::Description(text) => item.description = text,
            ItemField::Quantity(quantity) => item.set_quantity(quantity),
            ItemField::UnitPrice(price) => item.set_unit_price(price),
        }
        tracing::debug!(index, amount = %item.amount(), "line item updated");
        Ok(())
    }

    /// Appends a blank row (one unit at zero) and returns its index.
    pub fn add(&mut self) -> usize {
        self.0.push(LineItem::default());
        self.0.len() - 1
    }

    /// Removes the row at `index`. Returns `None` without touching the list
    /// when it is the only row or the index is out of range.
    pub fn remove(&mut self, index: usize) -> Option<LineItem> {
        if self.0.len() <= 1 || index >= self.0.len() {
            tracing::debug!(index, len = self.0.len(), "line item removal ignored");
            return None;
        }
        Some(self.0.remove(index))
    }
}

impl Default for LineItems {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest unit price accepted from input: 1,000,000,000,000.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Largest tax rate, in percent, accepted from input.
pub const MAX_TAX_RATE: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

/// Sums item amounts and applies `tax_rate_percent`, or `None` if any step
/// overflows.
pub fn try_recompute_totals(items: &[LineItem], tax_rate_percent: Decimal) -> Option<Totals> {
    let subtotal = items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.amount()))?;
    let tax_amount = subtotal
        .checked_mul(tax_rate_percent)?
        .checked_div(Decimal::ONE_HUNDRED)?;
    let total = subtotal.checked_add(tax_amount)?;
    Some(Totals {
        subtotal,
        tax_amount,
        total,
    })
}

/// Like [`try_recompute_totals`], but totals that cannot be represented
/// read as zero.
pub fn recompute_totals(items: &[LineItem], tax_rate_percent: Decimal) -> Totals {
    try_recompute_totals(items, tax_rate_percent).unwrap_or_else(|| {
        tracing::warn!(items = items.len(), %tax_rate_percent, "totals overflow, showing zero");
        Totals::default()
    })
}

/// Parses a decimal in `0..=max`, or zero for anything else.
fn parse_bounded(raw: &str, max: Decimal) -> Decimal {
    match Decimal::from_str(raw.trim()) {
        Ok(value) if value >= Decimal::ZERO && value <= max => value,
        _ => Decimal::ZERO,
    }
}

/// Tax rate in percent from free-form input. Empty, malformed, negative or
/// above [`MAX_TAX_RATE`] yields zero.
pub fn parse_tax_rate(raw: &str) -> Decimal {
    parse_bounded(raw, MAX_TAX_RATE)
}

/// Unit price from free-form input, bounded by [`MAX_UNIT_PRICE`]; same
/// coercion rules as the tax rate.
pub fn parse_price(raw: &str) -> Decimal {
    parse_bounded(raw, MAX_UNIT_PRICE)
}

/// Whole quantity from free-form input. Fractions are truncated; anything
/// unparseable or negative is zero.
pub fn parse_quantity(raw: &str) -> u32 {
    let raw = raw.trim();
    raw.parse::<u32>().unwrap_or_else(|_| {
        parse_bounded(raw, Decimal::from(u32::MAX))
            .trunc()
            .to_u32()
            .unwrap_or(0)
    })
}

/// `$1234.50`: symbol, then the amount fixed to two decimals. No grouping.
pub fn format_currency(amount: Decimal, symbol: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{symbol}{rounded:.2}")
}
