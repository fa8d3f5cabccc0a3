//! The document view of an invoice.
//!
//! [`InvoiceView`] is the flattened, display-ready copy of an
//! [`InvoiceState`]: every amount is already currency-formatted. It feeds
//! both the Typst document (through a Tera template) and the terminal
//! preview table.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use comfy_table::{Attribute, Cell, CellAlignment, Table};
use serde::Serialize;
use tera::{Context, Tera, Value};

use crate::error::RenderError;
use crate::model::{ClientDetails, SenderDetails};
use crate::session::InvoiceState;

pub const TEMPLATE_NAME: &str = "invoice.tera";

// Embedded so a fresh data root always has a template to start from.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/invoice.tera");

#[derive(Debug, Clone, Serialize)]
pub struct ItemRow {
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceView {
    pub invoice_number: String,
    pub issue_date: String,
    pub due_date: String,
    pub sender: SenderDetails,
    pub client: ClientDetails,
    pub items: Vec<ItemRow>,
    pub currency_code: String,
    pub tax_label: String,
    pub tax_rate: String,
    pub subtotal: String,
    pub tax_amount: String,
    pub total: String,
    pub notes: String,
}

impl InvoiceView {
    pub fn from_state(state: &InvoiceState) -> Self {
        let totals = state.totals();
        let items = state
            .items()
            .iter()
            .map(|item| ItemRow {
                description: item.description.clone(),
                quantity: item.quantity().to_string(),
                unit_price: state.format_amount(item.unit_price()),
                amount: state.format_amount(item.amount()),
            })
            .collect();

        Self {
            invoice_number: state.invoice_number.clone(),
            issue_date: state.issue_date.format("%Y-%m-%d").to_string(),
            due_date: state.due_date.format("%Y-%m-%d").to_string(),
            sender: state.sender().clone(),
            client: state.client.clone(),
            items,
            currency_code: state.currency_code().to_string(),
            tax_label: state.tax_label().to_string(),
            tax_rate: state.tax_rate().normalize().to_string(),
            subtotal: state.format_amount(totals.subtotal),
            tax_amount: state.format_amount(totals.tax_amount),
            total: state.format_amount(totals.total),
            notes: state.notes.clone(),
        }
    }
}

/// Escapes a value for use inside a Typst string literal.
fn typst_str(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            c => escaped.push(c),
        }
    }
    Ok(Value::String(escaped))
}

pub struct InvoiceTemplate {
    tera: Tera,
}

impl InvoiceTemplate {
    /// The template compiled into the binary.
    pub fn builtin() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, DEFAULT_TEMPLATE)?;
        tera.register_filter("typst_str", typst_str);
        Ok(Self { tera })
    }

    /// Loads `<root>/templates/*.tera`, writing the default template first if
    /// the user has none.
    pub fn from_data_root(root: &Path) -> Result<Self, RenderError> {
        let template_dir = root.join("templates");
        fs::create_dir_all(&template_dir).map_err(|source| RenderError::Io {
            path: template_dir.clone(),
            source,
        })?;

        let template_path = template_dir.join(TEMPLATE_NAME);
        if !template_path.exists() {
            tracing::info!(path = ?template_path, "initializing default template");
            fs::write(&template_path, DEFAULT_TEMPLATE).map_err(|source| RenderError::Io {
                path: template_path.clone(),
                source,
            })?;
        }

        let glob = template_dir.join("*.tera");
        let mut tera = Tera::new(&glob.to_string_lossy())?;
        tera.register_filter("typst_str", typst_str);
        Ok(Self { tera })
    }

    /// Typst source for the invoice view.
    pub fn render(&self, view: &InvoiceView) -> Result<String, RenderError> {
        let context = Context::from_serialize(view)?;
        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }
}

/// Terminal rendition of the same view: one row per item, then the totals.
pub fn preview_table(view: &InvoiceView) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("#"),
        Cell::new("Description"),
        Cell::new("Quantity"),
        Cell::new("Price"),
        Cell::new("Amount"),
    ]);

    for (index, item) in view.items.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&item.description),
            Cell::new(&item.quantity).set_alignment(CellAlignment::Right),
            Cell::new(&item.unit_price).set_alignment(CellAlignment::Right),
            Cell::new(&item.amount).set_alignment(CellAlignment::Right),
        ]);
    }

    let summary = [
        ("Subtotal".to_string(), &view.subtotal),
        (format!("{} ({}%)", view.tax_label, view.tax_rate), &view.tax_amount),
    ];
    for (label, value) in summary {
        table.add_row(vec![
            Cell::new(""),
            Cell::new(label),
            Cell::new(""),
            Cell::new(""),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new(""),
        Cell::new(format!("Total ({})", view.currency_code)).add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(&view.total)
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
    ]);
    table
}
