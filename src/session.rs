//! One invoice being filled in.
//!
//! An [`InvoiceState`] lives for a single form session. It is seeded from a
//! country preset and from whatever sender details were saved last time;
//! everything else starts fresh. Derived totals are not fields: [`InvoiceState::totals`]
//! computes them from the current items and tax rate on every call.

use chrono::{Days, Local, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::calc::{self, ItemField, LineItems, Totals};
use crate::error::ItemError;
use crate::model::{ClientDetails, SenderDetails};
use crate::preset::Country;
use crate::storage::{self, Storage};

/// Days between the issue date and the default due date.
pub const PAYMENT_TERM_DAYS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderField {
    Name,
    Address,
    Email,
    Phone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientField {
    Name,
    Address,
    Email,
}

#[derive(Debug, Clone)]
pub struct InvoiceState {
    sender: SenderDetails,
    pub client: ClientDetails,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    items: LineItems,
    tax_rate: Decimal,
    pub notes: String,
    country: Country,
    currency_code: &'static str,
    currency_symbol: &'static str,
}

/// `INV-` followed by four random digits.
pub fn generate_invoice_number() -> String {
    format!("INV-{:04}", Uuid::new_v4().as_u128() % 10_000)
}

impl InvoiceState {
    /// Starts a session dated today.
    pub fn start(country: Country, storage: &dyn Storage) -> Self {
        Self::new(country, Local::now().date_naive(), storage)
    }

    pub fn new(country: Country, today: NaiveDate, storage: &dyn Storage) -> Self {
        let preset = country.preset();
        let due_date = today
            .checked_add_days(Days::new(PAYMENT_TERM_DAYS))
            .unwrap_or(today);

        let state = Self {
            sender: storage::load_sender(storage),
            client: ClientDetails::default(),
            invoice_number: generate_invoice_number(),
            issue_date: today,
            due_date,
            items: LineItems::new(),
            tax_rate: preset.default_tax_rate(),
            notes: String::new(),
            country,
            currency_code: preset.currency_code,
            currency_symbol: preset.currency_symbol,
        };
        tracing::info!(
            country = country.key(),
            invoice = %state.invoice_number,
            "invoice session started"
        );
        state
    }

    pub fn sender(&self) -> &SenderDetails {
        &self.sender
    }

    /// Updates one sender field and writes the whole sender record back.
    /// A failed write is logged; the edit itself always sticks.
    pub fn set_sender_field(
        &mut self,
        field: SenderField,
        value: impl Into<String>,
        storage: &dyn Storage,
    ) {
        let value = value.into();
        match field {
            SenderField::Name => self.sender.name = value,
            SenderField::Address => self.sender.address = value,
            SenderField::Email => self.sender.email = value,
            SenderField::Phone => self.sender.phone = value,
        }
        self.persist_sender(storage);
    }

    fn persist_sender(&self, storage: &dyn Storage) {
        if let Err(e) = storage::save_sender(storage, &self.sender) {
            tracing::warn!(error = %e, "could not save sender details");
        }
    }

    pub fn set_client_field(&mut self, field: ClientField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ClientField::Name => self.client.name = value,
            ClientField::Address => self.client.address = value,
            ClientField::Email => self.client.email = value,
        }
    }

    pub fn country(&self) -> Country {
        self.country
    }

    /// Switches country: currency and tax rate are reset to that country's
    /// defaults, line items are kept.
    pub fn apply_country(&mut self, country: Country) {
        let preset = country.preset();
        self.country = country;
        self.currency_code = preset.currency_code;
        self.currency_symbol = preset.currency_symbol;
        self.tax_rate = preset.default_tax_rate();
        tracing::debug!(country = country.key(), "country preset applied");
    }

    pub fn currency_code(&self) -> &'static str {
        self.currency_code
    }

    pub fn currency_symbol(&self) -> &'static str {
        self.currency_symbol
    }

    pub fn tax_label(&self) -> &'static str {
        self.country.preset().tax_label
    }

    pub fn items(&self) -> &LineItems {
        &self.items
    }

    pub fn set_item_field(&mut self, index: usize, field: ItemField) -> Result<(), ItemError> {
        self.items.set_field(index, field)
    }

    pub fn add_item(&mut self) -> usize {
        self.items.add()
    }

    /// Returns false when nothing was removed (the last row is kept).
    pub fn remove_item(&mut self, index: usize) -> bool {
        self.items.remove(index).is_some()
    }

    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    /// Sets the tax rate from raw input; unusable input means 0%.
    pub fn set_tax_rate_input(&mut self, raw: &str) -> Decimal {
        self.tax_rate = calc::parse_tax_rate(raw);
        self.tax_rate
    }

    pub fn totals(&self) -> Totals {
        calc::recompute_totals(self.items.as_slice(), self.tax_rate)
    }

    pub fn format_amount(&self, amount: Decimal) -> String {
        calc::format_currency(amount, self.currency_symbol)
    }

    /// `invoice-<number>.pdf`, with path separators in the number replaced.
    pub fn pdf_file_name(&self) -> String {
        let number: String = self
            .invoice_number
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
            .collect();
        format!("invoice-{number}.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_defaults_from_preset() {
        let storage = MemoryStorage::new();
        let state = InvoiceState::new(Country::Uk, today(), &storage);

        assert_eq!(state.currency_code(), "GBP");
        assert_eq!(state.currency_symbol(), "£");
        assert_eq!(state.tax_rate(), Decimal::from(20));
        assert_eq!(state.tax_label(), "VAT");
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.totals(), Totals::default());
    }

    #[test]
    fn test_default_dates() {
        let storage = MemoryStorage::new();
        let state = InvoiceState::new(Country::Usa, today(), &storage);
        assert_eq!(state.issue_date, today());
        assert_eq!(state.due_date, NaiveDate::from_ymd_opt(2026, 11, 15).unwrap());
    }

    #[test]
    fn test_invoice_number_format() {
        for _ in 0..50 {
            let number = generate_invoice_number();
            let suffix = number.strip_prefix("INV-").unwrap();
            assert_eq!(suffix.len(), 4);
            assert!(suffix.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_sender_edits_are_persisted() {
        let storage = MemoryStorage::new();
        let mut state = InvoiceState::new(Country::Usa, today(), &storage);
        state.set_sender_field(SenderField::Name, "Jane Doe", &storage);
        state.set_sender_field(SenderField::Phone, "555-0101", &storage);

        let next = InvoiceState::new(Country::Canada, today(), &storage);
        assert_eq!(next.sender().name, "Jane Doe");
        assert_eq!(next.sender().phone, "555-0101");
        assert_eq!(next.client, ClientDetails::default());
    }

    #[test]
    fn test_tax_rate_edits_recompute_totals() {
        let storage = MemoryStorage::new();
        let mut state = InvoiceState::new(Country::Usa, today(), &storage);
        state.set_item_field(0, ItemField::Quantity(2)).unwrap();
        state
            .set_item_field(0, ItemField::UnitPrice(Decimal::from(10)))
            .unwrap();
        let index = state.add_item();
        state
            .set_item_field(index, ItemField::UnitPrice(Decimal::from(5)))
            .unwrap();

        state.set_tax_rate_input("10");
        let totals = state.totals();
        assert_eq!(totals.subtotal, Decimal::from(25));
        assert_eq!(totals.tax_amount, Decimal::new(250, 2));
        assert_eq!(state.format_amount(totals.total), "$27.50");

        assert_eq!(state.set_tax_rate_input("abc"), Decimal::ZERO);
        let totals = state.totals();
        assert_eq!(totals.tax_amount, Decimal::ZERO);
        assert_eq!(totals.total, totals.subtotal);
    }

    #[test]
    fn test_country_switch_keeps_items() {
        let storage = MemoryStorage::new();
        let mut state = InvoiceState::new(Country::Usa, today(), &storage);
        state
            .set_item_field(0, ItemField::UnitPrice(Decimal::from(100)))
            .unwrap();

        state.apply_country(Country::Germany);
        assert_eq!(state.currency_symbol(), "€");
        assert_eq!(state.tax_rate(), Decimal::from(19));
        assert_eq!(state.totals().total, Decimal::from(119));
    }

    #[test]
    fn test_remove_sole_item() {
        let storage = MemoryStorage::new();
        let mut state = InvoiceState::new(Country::Usa, today(), &storage);
        let before = state.totals();
        assert!(!state.remove_item(0));
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.totals(), before);
    }

    #[test]
    fn test_pdf_file_name() {
        let storage = MemoryStorage::new();
        let mut state = InvoiceState::new(Country::Usa, today(), &storage);
        state.invoice_number = "INV-0042".into();
        assert_eq!(state.pdf_file_name(), "invoice-INV-0042.pdf");
        state.invoice_number = "2026/07".into();
        assert_eq!(state.pdf_file_name(), "invoice-2026-07.pdf");
    }
}
