use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Datelike;
use clap::{CommandFactory, Parser, Subcommand};
use comfy_table::{Cell, CellAlignment, Table};
use inquire::{Confirm, DateSelect, InquireError, Select, Text};
use thiserror::Error;

use invoice_maker::calc::{parse_price, parse_quantity, ItemField};
use invoice_maker::error::{RenderError, SettingsError, StorageError};
use invoice_maker::export::{self, TypstRasterizer};
use invoice_maker::render::{self, InvoiceTemplate, InvoiceView};
use invoice_maker::routes::{self, EntryPoint};
use invoice_maker::session::{ClientField, SenderField};
use invoice_maker::settings::{self, AppSettings};
use invoice_maker::storage::{self, FileStorage};
use invoice_maker::{Country, InvoiceState, SenderDetails};

// ==========================================
// Constants
// ==========================================
const ACTION_PREVIEW: &str = "👀 Preview";
const ACTION_EDIT_ITEM: &str = "✏️  Edit Item";
const ACTION_ADD_ITEM: &str = "➕ Add Item";
const ACTION_REMOVE_ITEM: &str = "➖ Remove Item";
const ACTION_TAX: &str = "💲 Set Tax Rate";
const ACTION_COUNTRY: &str = "🌍 Change Country";
const ACTION_NOTES: &str = "📝 Edit Notes";
const ACTION_EXPORT: &str = "📄 Export PDF";
const ACTION_QUIT: &str = "🚪 Quit";

// ==========================================
// CLI
// ==========================================

#[derive(Parser)]
#[command(
    name = "invoice-maker",
    version,
    about = "Create invoices with country tax presets and export them as PDF"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new invoice
    New {
        /// Country preset (usa, canada, australia, uk, germany, singapore)
        #[arg(short, long)]
        country: Option<String>,
        /// Start from an entry page path, e.g. /uk-invoice-generator
        #[arg(long)]
        route: Option<String>,
        /// Output directory (defaults to <data root>/output/<year>/<client>)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// List country presets
    Presets {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the entry page text for a path
    Page {
        /// Path such as / or /germany-invoice-generator
        path: String,
    },
    /// Edit the saved sender details
    Sender,
    /// Configure data directory
    Config,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Prompt(#[from] InquireError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

// ==========================================
// Main Function
// ==========================================

fn main() {
    invoice_maker::init_tracing();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help().ok();
        return;
    };

    let result = match command {
        Commands::New { country, route, out } => run_new(country, route, out),
        Commands::Presets { json } => list_presets(json),
        Commands::Page { path } => {
            show_page(&path);
            Ok(())
        }
        Commands::Sender => edit_sender(),
        Commands::Config => setup_config_wizard().map(|_| ()),
    };

    match result {
        Ok(()) => {}
        Err(CliError::Prompt(
            InquireError::OperationCanceled | InquireError::OperationInterrupted,
        )) => {
            println!("Cancelled");
        }
        Err(e) => {
            eprintln!("❌ Error: {e}");
            std::process::exit(1);
        }
    }
}

// ==========================================
// 1. Invoice Session
// ==========================================

fn run_new(
    country: Option<String>,
    route: Option<String>,
    out: Option<PathBuf>,
) -> Result<(), CliError> {
    let settings = load_or_setup_settings()?;
    let root = settings.resolved_root();
    let storage = FileStorage::new(&root);

    let entry = route.as_deref().map_or(EntryPoint::Generic, routes::resolve);
    let country = match country.as_deref() {
        Some(key) => {
            let resolved = Country::lookup(Some(key));
            if resolved.key() != key.trim().to_ascii_lowercase() {
                println!("⚠️  Unknown country '{key}', using {resolved}.");
            }
            resolved
        }
        None => entry.country(),
    };

    let page = entry.page();
    println!("\n{}", page.heading);
    println!("{}\n", page.intro);

    let mut state = InvoiceState::start(country, &storage);
    println!("✅ Country: {} ({} {})", country, state.currency_code(), state.currency_symbol());

    enter_sender(&mut state, &storage)?;
    enter_client(&mut state)?;
    enter_invoice_details(&mut state)?;
    enter_items(&mut state)?;

    let template = InvoiceTemplate::from_data_root(&root)?;
    let rasterizer = TypstRasterizer::default();
    print_preview(&state);

    loop {
        let actions = vec![
            ACTION_PREVIEW,
            ACTION_EDIT_ITEM,
            ACTION_ADD_ITEM,
            ACTION_REMOVE_ITEM,
            ACTION_TAX,
            ACTION_COUNTRY,
            ACTION_NOTES,
            ACTION_EXPORT,
            ACTION_QUIT,
        ];
        let action = Select::new("What next?", actions)
            .with_starting_cursor(7)
            .prompt()?;

        match action {
            ACTION_PREVIEW => print_preview(&state),
            ACTION_EDIT_ITEM => edit_item(&mut state)?,
            ACTION_ADD_ITEM => {
                let index = state.add_item();
                fill_item(&mut state, index)?;
                print_preview(&state);
            }
            ACTION_REMOVE_ITEM => remove_item(&mut state)?,
            ACTION_TAX => {
                enter_tax_rate(&mut state)?;
                print_preview(&state);
            }
            ACTION_COUNTRY => {
                let countries = Country::ALL.to_vec();
                let current = countries.iter().position(|c| *c == state.country()).unwrap_or(0);
                let picked = Select::new("Select Country:", countries)
                    .with_starting_cursor(current)
                    .prompt()?;
                state.apply_country(picked);
                println!(
                    "✅ {} preset: {} {}%",
                    picked,
                    state.tax_label(),
                    state.tax_rate().normalize()
                );
                print_preview(&state);
            }
            ACTION_NOTES => {
                state.notes = prompt_multiline(
                    "Notes (payment terms, thank you notes, etc.):",
                    &state.notes,
                )?;
            }
            ACTION_EXPORT => {
                let out_dir = out.clone().unwrap_or_else(|| {
                    settings.output_dir(state.issue_date.year(), &state.client.name)
                });
                println!("\n🔨 Generating PDF...");
                match export::export_pdf(&state, &template, &rasterizer, &out_dir) {
                    Ok(path) => {
                        println!("✅ PDF Generated: {:?}", path);
                        open_and_reveal(&path);
                        return Ok(());
                    }
                    // The form stays as it was; the user can fix things and retry.
                    Err(e) => println!("⚠️  Export failed: {e}"),
                }
            }
            _ => return Ok(()),
        }
    }
}

fn enter_sender(state: &mut InvoiceState, storage: &FileStorage) -> Result<(), CliError> {
    let saved = state.sender().clone();
    if saved != SenderDetails::default() {
        println!("📇 Saved sender: {} <{}>", saved.name, saved.email);
        if Confirm::new("Use saved sender details?").with_default(true).prompt()? {
            return Ok(());
        }
    }

    println!("\n--- Your Details ---");
    println!("💡 Tip: Use '\\n' for new lines.");
    let fields = [
        (SenderField::Name, "Name/Business Name:", saved.name.as_str()),
        (SenderField::Address, "Address:", saved.address.as_str()),
        (SenderField::Email, "Email:", saved.email.as_str()),
        (SenderField::Phone, "Phone:", saved.phone.as_str()),
    ];
    for (field, prompt, current) in fields {
        let value = prompt_multiline(prompt, current)?;
        if value != current {
            state.set_sender_field(field, value, storage);
        }
    }
    Ok(())
}

fn enter_client(state: &mut InvoiceState) -> Result<(), CliError> {
    println!("\n--- Client Details ---");
    let name = Text::new("Client Name:").prompt()?;
    state.set_client_field(ClientField::Name, name);
    let address = prompt_multiline("Client Address:", "")?;
    state.set_client_field(ClientField::Address, address);
    let email = Text::new("Client Email:").prompt()?;
    state.set_client_field(ClientField::Email, email);
    Ok(())
}

fn enter_invoice_details(state: &mut InvoiceState) -> Result<(), CliError> {
    println!("\n--- Invoice Details ---");
    state.invoice_number = Text::new("Invoice Number:")
        .with_default(&state.invoice_number)
        .prompt()?;
    state.issue_date = DateSelect::new("Invoice Date:")
        .with_default(state.issue_date)
        .prompt()?;
    state.due_date = DateSelect::new("Due Date:")
        .with_default(state.due_date)
        .prompt()?;
    Ok(())
}

fn enter_items(state: &mut InvoiceState) -> Result<(), CliError> {
    println!("\n--- Invoice Items ---");
    println!("(Leave Description empty to finish)");

    let mut index = 0;
    loop {
        let description = Text::new("Description (leave empty to finish):").prompt()?;
        if description.trim().is_empty() {
            break;
        }
        if index > 0 {
            state.add_item();
        }
        set_item(state, index, ItemField::Description(description));
        prompt_quantity_and_price(state, index)?;
        index += 1;
    }

    enter_tax_rate(state)
}

fn fill_item(state: &mut InvoiceState, index: usize) -> Result<(), CliError> {
    let description = Text::new("Description:").prompt()?;
    set_item(state, index, ItemField::Description(description));
    prompt_quantity_and_price(state, index)
}

fn prompt_quantity_and_price(state: &mut InvoiceState, index: usize) -> Result<(), CliError> {
    let Some(item) = state.items().get(index) else {
        return Ok(());
    };
    let quantity_default = item.quantity().to_string();
    let price_default = item.unit_price().to_string();

    let quantity = Text::new("Quantity:").with_default(&quantity_default).prompt()?;
    set_item(state, index, ItemField::Quantity(parse_quantity(&quantity)));

    let price = Text::new(&format!("Price ({}):", state.currency_symbol()))
        .with_default(&price_default)
        .prompt()?;
    set_item(state, index, ItemField::UnitPrice(parse_price(&price)));
    Ok(())
}

fn set_item(state: &mut InvoiceState, index: usize, field: ItemField) {
    if let Err(e) = state.set_item_field(index, field) {
        tracing::warn!(error = %e, "item edit ignored");
    }
}

fn item_labels(state: &InvoiceState) -> Vec<String> {
    state
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let description = if item.description.is_empty() {
                "(no description)"
            } else {
                item.description.as_str()
            };
            format!("{}. {} | {}", i + 1, description, state.format_amount(item.amount()))
        })
        .collect()
}

fn edit_item(state: &mut InvoiceState) -> Result<(), CliError> {
    let index = Select::new("Select Item:", item_labels(state)).raw_prompt()?.index;
    let Some(item) = state.items().get(index).cloned() else {
        return Ok(());
    };

    let fields = vec!["Description", "Quantity", "Price"];
    match Select::new("Field:", fields).prompt()? {
        "Description" => {
            let value = Text::new("Description:").with_default(&item.description).prompt()?;
            set_item(state, index, ItemField::Description(value));
        }
        "Quantity" => {
            let value = Text::new("Quantity:")
                .with_default(&item.quantity().to_string())
                .prompt()?;
            set_item(state, index, ItemField::Quantity(parse_quantity(&value)));
        }
        _ => {
            let value = Text::new("Price:")
                .with_default(&item.unit_price().to_string())
                .prompt()?;
            set_item(state, index, ItemField::UnitPrice(parse_price(&value)));
        }
    }
    print_preview(state);
    Ok(())
}

fn remove_item(state: &mut InvoiceState) -> Result<(), CliError> {
    if state.items().len() == 1 {
        println!("⚠️  An invoice needs at least one item.");
        return Ok(());
    }
    let index = Select::new("Select Item to Remove:", item_labels(state)).raw_prompt()?.index;
    if state.remove_item(index) {
        print_preview(state);
    }
    Ok(())
}

fn enter_tax_rate(state: &mut InvoiceState) -> Result<(), CliError> {
    let current = state.tax_rate().normalize().to_string();
    let raw = Text::new(&format!("{} Rate %:", state.tax_label()))
        .with_default(&current)
        .prompt()?;
    state.set_tax_rate_input(&raw);
    Ok(())
}

fn print_preview(state: &InvoiceState) {
    let view = InvoiceView::from_state(state);
    println!("\n--- {} | {} → due {} ---", view.invoice_number, view.issue_date, view.due_date);
    println!("{}", render::preview_table(&view));
}

// Inquire has no multi-line text input, so '\n' is typed literally.
fn prompt_multiline(prompt: &str, current: &str) -> Result<String, CliError> {
    let shown = current.replace('\n', "\\n");
    let value = Text::new(prompt).with_default(&shown).prompt()?;
    Ok(value.replace("\\n", "\n"))
}

// ==========================================
// 2. Presets & Entry Pages
// ==========================================

fn list_presets(json: bool) -> Result<(), CliError> {
    if json {
        let presets: Vec<_> = Country::ALL
            .iter()
            .map(|c| {
                let p = c.preset();
                serde_json::json!({
                    "key": p.key,
                    "name": p.display_name,
                    "currency": p.currency_code,
                    "currency_symbol": p.currency_symbol,
                    "default_tax_rate": p.default_tax_rate().to_string(),
                    "tax_name": p.tax_label,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&presets)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Key"),
        Cell::new("Country"),
        Cell::new("Currency"),
        Cell::new("Tax"),
        Cell::new("Default Rate"),
    ]);
    for country in Country::ALL {
        let p = country.preset();
        table.add_row(vec![
            Cell::new(p.key),
            Cell::new(p.display_name),
            Cell::new(format!("{} ({})", p.currency_code, p.currency_symbol)),
            Cell::new(p.tax_label),
            Cell::new(format!("{}%", p.default_tax_rate())).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn show_page(path: &str) {
    let entry = routes::resolve(path);
    let page = entry.page();
    let preset = entry.country().preset();

    println!("{}", page.heading);
    println!("{}\n", page.intro);
    println!("Title:       {}", page.title);
    println!("Description: {}", page.description);
    println!("URL:         {}", page.canonical_url);
    println!(
        "Preset:      {} ({} {}, {} {}%)",
        preset.display_name,
        preset.currency_code,
        preset.currency_symbol,
        preset.tax_label,
        preset.default_tax_rate()
    );
}

// ==========================================
// 3. Sender Details
// ==========================================

fn edit_sender() -> Result<(), CliError> {
    let settings = load_or_setup_settings()?;
    let storage = FileStorage::new(settings.resolved_root());
    let current = storage::load_sender(&storage);

    println!("\n--- Your Details ---");
    println!("💡 Tip: Use '\\n' for new lines.");
    let sender = SenderDetails {
        name: prompt_multiline("Name/Business Name:", &current.name)?,
        address: prompt_multiline("Address:", &current.address)?,
        email: prompt_multiline("Email:", &current.email)?,
        phone: prompt_multiline("Phone:", &current.phone)?,
    };

    storage::save_sender(&storage, &sender)?;
    println!("✅ Sender details saved to {:?}", storage.path_for(storage::SENDER_KEY));
    Ok(())
}

// ==========================================
// 4. Config & Utilities
// ==========================================

fn load_or_setup_settings() -> Result<AppSettings, CliError> {
    match settings::load() {
        Some(settings) => Ok(settings),
        None => setup_config_wizard(),
    }
}

fn setup_config_wizard() -> Result<AppSettings, CliError> {
    println!("\n⚙️  --- Configuration Setup ---");
    let default_val = settings::load().unwrap_or_default().data_root;

    println!("📂 Opening folder picker...");
    let picked_path = rfd::FileDialog::new()
        .set_title("Select Root Data Directory")
        .pick_folder();

    let new_root = match picked_path {
        Some(path) => path.to_string_lossy().to_string(),
        None => {
            println!("❌ No folder selected. Falling back to manual input.");
            Text::new("Enter Root Data Directory:")
                .with_default(&default_val)
                .prompt()?
        }
    };

    let settings = AppSettings { data_root: new_root };
    settings::save(&settings)?;
    println!("✅ Settings saved.");
    Ok(settings)
}

// Open the exported file and reveal it in Finder/Explorer
fn open_and_reveal(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg("-R").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer")
        .arg(format!("/select,{}", path.to_string_lossy()))
        .spawn()
        .ok();

    #[cfg(target_os = "linux")]
    Command::new("xdg-open").arg(path).spawn().ok();
}
