use std::path::PathBuf;

use thiserror::Error;

/// Edits addressed to a line item that does not exist.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemError {
    #[error("line item {index} out of range (invoice has {len} items)")]
    OutOfRange { index: usize, len: usize },
}

/// Failures of the local key-value store holding sender details.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("stored record is not valid TOML: {0}")]
    Decode(#[from] toml::de::Error),
    #[error("failed to serialize record: {0}")]
    Encode(#[from] toml::ser::Error),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
    #[error("failed to prepare template directory {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything that can abort a PDF export. None of these touch the form state.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("'typst' is not installed (brew install typst / cargo install typst-cli)")]
    TypstMissing,
    #[error("rasterizing the invoice view failed: {0}")]
    Rasterize(String),
    #[error("rendered view is empty ({width}x{height} px)")]
    EmptySnapshot { width: u32, height: u32 },
    #[error("failed to decode snapshot: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to assemble PDF: {0}")]
    Pdf(String),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("export I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("no platform config directory available")]
    NoConfigDir,
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file is not valid TOML: {0}")]
    Decode(#[from] toml::de::Error),
    #[error("failed to serialize settings: {0}")]
    Encode(#[from] toml::ser::Error),
}
