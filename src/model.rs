use rust_decimal::Decimal;
use serde::Serialize;

/// The "from" block of an invoice. This is the only part of the form that
/// survives between sessions; see `storage` for the persisted layout.
#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct SenderDetails {
    pub name: String,
    pub address: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct ClientDetails {
    pub name: String,
    pub address: String,
    pub email: String,
}

/// One invoice row. `amount` is always `quantity * unit_price`; the setters
/// keep it in step.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LineItem {
    pub description: String,
    quantity: u32,
    unit_price: Decimal,
    amount: Decimal,
}

fn line_amount(quantity: u32, unit_price: Decimal) -> Option<Decimal> {
    Decimal::from(quantity).checked_mul(unit_price)
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        let mut item = Self {
            description: description.into(),
            quantity,
            unit_price: Decimal::ZERO,
            amount: Decimal::ZERO,
        };
        item.set_unit_price(unit_price);
        item
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// A quantity whose amount would overflow is treated as zero.
    pub fn set_quantity(&mut self, quantity: u32) {
        match line_amount(quantity, self.unit_price) {
            Some(amount) => {
                self.quantity = quantity;
                self.amount = amount;
            }
            None => {
                tracing::warn!(quantity, "line amount overflows, quantity reset to 0");
                self.quantity = 0;
                self.amount = Decimal::ZERO;
            }
        }
    }

    /// Negative prices are clamped to zero, as are prices whose amount would
    /// overflow.
    pub fn set_unit_price(&mut self, unit_price: Decimal) {
        let unit_price = unit_price.max(Decimal::ZERO);
        match line_amount(self.quantity, unit_price) {
            Some(amount) => {
                self.unit_price = unit_price;
                self.amount = amount;
            }
            None => {
                tracing::warn!(%unit_price, "line amount overflows, price reset to 0");
                self.unit_price = Decimal::ZERO;
                self.amount = Decimal::ZERO;
            }
        }
    }
}

impl Default for LineItem {
    /// A freshly added row: one unit at zero.
    fn default() -> Self {
        LineItem::new(String::new(), 1, Decimal::ZERO)
    }
}
