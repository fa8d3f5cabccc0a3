//! Invoice maker: fill in an invoice with country presets for currency and
//! tax, preview it, and export it as a one-page PDF.
//!
//! ```text
//!   preset ──► session (InvoiceState) ◄── storage (sender cache)
//!                 │      ▲
//!                 │      └── calc (items, totals)
//!                 ▼
//!              render (InvoiceView → Typst) ──► export (snapshot → A4 PDF)
//! ```
//!
//! `preset`, `calc` and `model` are pure. Anything touching the filesystem or
//! an external process lives in `storage`, `settings`, `render` and `export`.

pub mod calc;
pub mod error;
pub mod export;
pub mod model;
pub mod preset;
pub mod render;
pub mod routes;
pub mod session;
pub mod settings;
pub mod storage;

pub use calc::{format_currency, recompute_totals, ItemField, LineItems, Totals};
pub use model::{ClientDetails, LineItem, SenderDetails};
pub use preset::{Country, CountryPreset};
pub use session::InvoiceState;

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise warnings everywhere and info for this
/// crate.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,invoice_maker=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
