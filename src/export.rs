//! PDF export: snapshot the rendered invoice view as an image and place it on
//! a single A4 portrait page.
//!
//! Rasterizing is behind [`Rasterizer`] so the page assembly can run without
//! an external renderer. The stock implementation shells out to `typst`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::RgbImage;
use printpdf::{ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Px};
use uuid::Uuid;

use crate::error::ExportError;
use crate::render::{InvoiceTemplate, InvoiceView};
use crate::session::InvoiceState;

pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// Distance from the top of the page to the top of the snapshot.
pub const TOP_OFFSET_MM: f32 = 30.0;

/// Twice the 96 ppi base resolution.
pub const SNAPSHOT_PPI: u32 = 192;

const MM_PER_INCH: f32 = 25.4;

/// Turns the Typst source of a view into pixels.
pub trait Rasterizer {
    fn rasterize(&self, source: &str) -> Result<RgbImage, ExportError>;
}

pub struct TypstRasterizer {
    binary: String,
    ppi: u32,
}

impl Default for TypstRasterizer {
    fn default() -> Self {
        Self {
            binary: "typst".to_string(),
            ppi: SNAPSHOT_PPI,
        }
    }
}

impl TypstRasterizer {
    pub fn new(binary: impl Into<String>, ppi: u32) -> Self {
        Self {
            binary: binary.into(),
            ppi,
        }
    }

    pub fn is_installed(&self) -> bool {
        Command::new(&self.binary).arg("--version").output().is_ok()
    }
}

impl Rasterizer for TypstRasterizer {
    fn rasterize(&self, source: &str) -> Result<RgbImage, ExportError> {
        if !self.is_installed() {
            return Err(ExportError::TypstMissing);
        }

        let work_dir = std::env::temp_dir().join(format!("invoice-maker-{}", Uuid::new_v4()));
        fs::create_dir_all(&work_dir)?;
        let result = self.compile_png(&work_dir, source);
        if let Err(e) = fs::remove_dir_all(&work_dir) {
            tracing::debug!(error = %e, dir = ?work_dir, "could not clean up snapshot dir");
        }
        result
    }
}

impl TypstRasterizer {
    fn compile_png(&self, work_dir: &Path, source: &str) -> Result<RgbImage, ExportError> {
        let typ_path = work_dir.join("invoice.typ");
        let png_path = work_dir.join("invoice.png");
        fs::write(&typ_path, source)?;

        tracing::debug!(ppi = self.ppi, "rasterizing invoice view");
        let output = Command::new(&self.binary)
            .arg("compile")
            .arg("--format")
            .arg("png")
            .arg("--ppi")
            .arg(self.ppi.to_string())
            .arg(&typ_path)
            .arg(&png_path)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExportError::Rasterize(stderr.trim().to_string()));
        }

        Ok(image::open(&png_path)?.to_rgb8())
    }
}

/// Where the snapshot lands on the page, in millimetres from the bottom-left
/// corner (PDF coordinates).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Scales a `width_px` x `height_px` snapshot to fit below the top offset,
/// keeping its aspect ratio, centred horizontally.
pub fn fit_to_page(width_px: u32, height_px: u32) -> Placement {
    let available_height = A4_HEIGHT_MM - TOP_OFFSET_MM;
    let ratio = (A4_WIDTH_MM / width_px as f32).min(available_height / height_px as f32);
    let width = width_px as f32 * ratio;
    let height = height_px as f32 * ratio;

    Placement {
        x: (A4_WIDTH_MM - width) / 2.0,
        y: A4_HEIGHT_MM - TOP_OFFSET_MM - height,
        width,
        height,
    }
}

/// Builds the one-page PDF around `snapshot`.
pub fn build_pdf(snapshot: &RgbImage, title: &str) -> Result<Vec<u8>, ExportError> {
    let (width_px, height_px) = snapshot.dimensions();
    if width_px == 0 || height_px == 0 {
        return Err(ExportError::EmptySnapshot {
            width: width_px,
            height: height_px,
        });
    }

    let (doc, page, layer) = PdfDocument::new(title, Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), "Invoice");
    let layer = doc.get_page(page).get_layer(layer);

    let placement = fit_to_page(width_px, height_px);
    let image = Image::from(ImageXObject {
        width: Px(width_px as usize),
        height: Px(height_px as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: snapshot.as_raw().clone(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // printpdf sizes images by DPI, so derive it from the target width.
    let dpi = width_px as f32 / (placement.width / MM_PER_INCH);
    image.add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(placement.x)),
            translate_y: Some(Mm(placement.y)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );

    doc.save_to_bytes()
        .map_err(|e| ExportError::Pdf(e.to_string()))
}

/// Renders, rasterizes and writes `invoice-<number>.pdf` into `out_dir`.
///
/// Nothing is written unless every step succeeds. The state is only read, so
/// a failed export leaves the form exactly as it was.
pub fn export_pdf(
    state: &InvoiceState,
    template: &InvoiceTemplate,
    rasterizer: &dyn Rasterizer,
    out_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let view = InvoiceView::from_state(state);
    let source = template.render(&view)?;
    let snapshot = rasterizer.rasterize(&source)?;
    let bytes = build_pdf(&snapshot, &format!("Invoice {}", state.invoice_number))?;

    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(state.pdf_file_name());
    fs::write(&path, bytes)?;

    tracing::info!(path = ?path, invoice = %state.invoice_number, "invoice exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_portrait_snapshot_is_height_bound() {
        // 1000 x 2000 px: height limits the scale
        let placement = fit_to_page(1000, 2000);
        assert!((placement.height - 267.0).abs() < 1e-3);
        assert!((placement.width - 133.5).abs() < 1e-3);
        assert!((placement.x - 38.25).abs() < 1e-3);
        assert!(placement.y.abs() < 1e-3);
    }

    #[test]
    fn test_fit_wide_snapshot_is_width_bound() {
        let placement = fit_to_page(2100, 1000);
        assert!((placement.width - 210.0).abs() < 1e-3);
        assert!((placement.height - 100.0).abs() < 1e-3);
        assert!(placement.x.abs() < 1e-3);
        // top edge sits 30mm below the page top
        assert!((placement.y + placement.height - (A4_HEIGHT_MM - TOP_OFFSET_MM)).abs() < 1e-3);
    }

    #[test]
    fn test_empty_snapshot_rejected() {
        let err = build_pdf(&RgbImage::new(0, 10), "empty").unwrap_err();
        assert!(matches!(err, ExportError::EmptySnapshot { width: 0, height: 10 }));
    }

    #[test]
    fn test_build_pdf_produces_document() {
        let snapshot = RgbImage::from_pixel(40, 60, image::Rgb([255, 255, 255]));
        let bytes = build_pdf(&snapshot, "Invoice INV-0001").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
