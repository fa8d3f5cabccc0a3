use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use image::{Rgb, RgbImage};
use rust_decimal::Decimal;
use uuid::Uuid;

use invoice_maker::calc::{parse_price, MAX_UNIT_PRICE};
use invoice_maker::error::ExportError;
use invoice_maker::export::{self, Rasterizer};
use invoice_maker::preset;
use invoice_maker::render::InvoiceTemplate;
use invoice_maker::routes::{self, EntryPoint};
use invoice_maker::session::SenderField;
use invoice_maker::storage::{self, FileStorage, MemoryStorage, Storage, SENDER_KEY};
use invoice_maker::{recompute_totals, Country, InvoiceState, ItemField, LineItem, SenderDetails};

fn scratch_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("invoice-maker-{label}-{}", Uuid::new_v4()))
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

/// Pretends to render: a white page whose height grows with the source.
struct BlankRasterizer;

impl Rasterizer for BlankRasterizer {
    fn rasterize(&self, source: &str) -> Result<RgbImage, ExportError> {
        let height = 400 + source.lines().count() as u32;
        Ok(RgbImage::from_pixel(300, height, Rgb([255, 255, 255])))
    }
}

struct FailingRasterizer;

impl Rasterizer for FailingRasterizer {
    fn rasterize(&self, _source: &str) -> Result<RgbImage, ExportError> {
        Err(ExportError::Rasterize("renderer crashed".into()))
    }
}

#[test]
fn totals_hold_after_every_mutation() {
    let storage = MemoryStorage::new();
    let mut state = InvoiceState::new(Country::Australia, today(), &storage);

    let check = |state: &InvoiceState| {
        let expected_subtotal: Decimal = state
            .items()
            .iter()
            .map(|i| Decimal::from(i.quantity()) * i.unit_price())
            .sum();
        let totals = state.totals();
        assert_eq!(totals.subtotal, expected_subtotal);
        assert_eq!(
            totals.tax_amount,
            expected_subtotal * state.tax_rate() / Decimal::ONE_HUNDRED
        );
        assert_eq!(totals.total, totals.subtotal + totals.tax_amount);
    };

    check(&state);
    state.set_item_field(0, ItemField::Quantity(3)).unwrap();
    check(&state);
    state
        .set_item_field(0, ItemField::UnitPrice(Decimal::new(1999, 2)))
        .unwrap();
    check(&state);
    let second = state.add_item();
    check(&state);
    state
        .set_item_field(second, ItemField::UnitPrice(Decimal::new(4250, 2)))
        .unwrap();
    check(&state);
    state.set_tax_rate_input("12.5");
    check(&state);
    assert!(state.remove_item(0));
    check(&state);
    state.apply_country(Country::Singapore);
    check(&state);
}

#[test]
fn huge_inputs_keep_the_form_alive() {
    let storage = MemoryStorage::new();
    let mut state = InvoiceState::new(Country::Usa, today(), &storage);
    let huge = "79228162514264337593543950335";

    state.set_item_field(0, ItemField::Quantity(2)).unwrap();
    state
        .set_item_field(0, ItemField::UnitPrice(parse_price(huge)))
        .unwrap();
    assert_eq!(state.items().get(0).unwrap().unit_price(), Decimal::ZERO);

    assert_eq!(state.set_tax_rate_input(huge), Decimal::ZERO);

    let second = state.add_item();
    let price = parse_price("50000000000000000000000000000");
    for index in [0, second] {
        state
            .set_item_field(index, ItemField::UnitPrice(price))
            .unwrap();
    }
    let totals = state.totals();
    assert_eq!(totals.total, totals.subtotal + totals.tax_amount);

    state
        .set_item_field(0, ItemField::UnitPrice(MAX_UNIT_PRICE))
        .unwrap();
    state.set_item_field(0, ItemField::Quantity(u32::MAX)).unwrap();
    state.set_tax_rate_input("1000");
    let totals = state.totals();
    assert_eq!(totals.subtotal, Decimal::from(u32::MAX) * MAX_UNIT_PRICE);
    assert_eq!(totals.total, totals.subtotal + totals.tax_amount);
    assert!(state.format_amount(totals.total).starts_with('$'));
}

#[test]
fn documented_scenario() {
    let items = vec![
        LineItem::new("A", 2, Decimal::new(1000, 2)),
        LineItem::new("B", 1, Decimal::new(500, 2)),
    ];
    let totals = recompute_totals(&items, Decimal::from(10));
    assert_eq!(totals.subtotal, Decimal::new(2500, 2));
    assert_eq!(totals.tax_amount, Decimal::new(250, 2));
    assert_eq!(totals.total, Decimal::new(2750, 2));
}

#[test]
fn add_item_keeps_existing_rows() {
    let storage = MemoryStorage::new();
    let mut state = InvoiceState::new(Country::Usa, today(), &storage);
    state
        .set_item_field(0, ItemField::Description("Retainer".into()))
        .unwrap();
    state
        .set_item_field(0, ItemField::UnitPrice(Decimal::from(300)))
        .unwrap();
    let first = state.items().get(0).cloned().unwrap();
    let totals = state.totals();

    state.add_item();

    assert_eq!(state.items().len(), 2);
    assert_eq!(state.items().get(0), Some(&first));
    assert_eq!(state.totals(), totals);
}

#[test]
fn unknown_country_matches_usa() {
    assert_eq!(preset::lookup(Some("france")), preset::lookup(Some("usa")));
    assert_eq!(Country::lookup(Some("france")), Country::Usa);
}

#[test]
fn sender_round_trip_through_file_storage() {
    let dir = scratch_dir("storage");
    let storage = FileStorage::new(&dir);

    let mut first = InvoiceState::new(Country::Uk, today(), &storage);
    first.set_sender_field(SenderField::Name, "Northwind Traders", &storage);
    first.set_sender_field(SenderField::Address, "12 High St\nLondon", &storage);
    first.set_sender_field(SenderField::Email, "accounts@northwind.test", &storage);
    first.set_sender_field(SenderField::Phone, "+44 20 7946 0000", &storage);

    let reloaded = InvoiceState::new(Country::Germany, today(), &storage);
    assert_eq!(
        reloaded.sender(),
        &SenderDetails {
            name: "Northwind Traders".into(),
            address: "12 High St\nLondon".into(),
            email: "accounts@northwind.test".into(),
            phone: "+44 20 7946 0000".into(),
        }
    );
    assert_eq!(reloaded.notes, "");
    assert_ne!(reloaded.currency_code(), first.currency_code());

    fs::remove_dir_all(dir).ok();
}

#[test]
fn corrupt_storage_reads_as_empty() {
    let dir = scratch_dir("corrupt");
    let storage = FileStorage::new(&dir);
    storage.write(SENDER_KEY, "[[[not toml").unwrap();

    let state = InvoiceState::new(Country::Usa, today(), &storage);
    assert_eq!(state.sender(), &SenderDetails::default());
    assert!(storage::try_load_sender(&storage).is_err());

    fs::remove_dir_all(dir).ok();
}

#[test]
fn country_entry_point_seeds_session() {
    let entry = routes::resolve("/canada-invoice-generator");
    assert_eq!(entry, EntryPoint::Country(Country::Canada));

    let storage = MemoryStorage::new();
    let state = InvoiceState::new(entry.country(), today(), &storage);
    assert_eq!(state.currency_symbol(), "CA$");
    assert_eq!(state.tax_rate(), Decimal::from(13));
    assert_eq!(entry.page().heading, "Canada Invoice Generator");
}

#[test]
fn export_writes_named_pdf() {
    let storage = MemoryStorage::new();
    let mut state = InvoiceState::new(Country::Singapore, today(), &storage);
    state.invoice_number = "INV-1234".into();
    state
        .set_item_field(0, ItemField::UnitPrice(Decimal::from(80)))
        .unwrap();

    let out_dir = scratch_dir("export");
    let template = InvoiceTemplate::builtin().unwrap();
    let path = export::export_pdf(&state, &template, &BlankRasterizer, &out_dir).unwrap();

    assert_eq!(path, out_dir.join("invoice-INV-1234.pdf"));
    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    fs::remove_dir_all(out_dir).ok();
}

#[test]
fn failed_export_leaves_state_and_disk_untouched() {
    let storage = MemoryStorage::new();
    let mut state = InvoiceState::new(Country::Usa, today(), &storage);
    state
        .set_item_field(0, ItemField::UnitPrice(Decimal::from(50)))
        .unwrap();
    let before = state.totals();

    let out_dir = scratch_dir("failed-export");
    let template = InvoiceTemplate::builtin().unwrap();
    let err = export::export_pdf(&state, &template, &FailingRasterizer, &out_dir).unwrap_err();

    assert!(matches!(err, ExportError::Rasterize(_)));
    assert!(!out_dir.exists());
    assert_eq!(state.totals(), before);
    assert_eq!(state.items().len(), 1);
}
