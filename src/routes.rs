//! Entry points: the generic form and one page per country.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::preset::Country;

pub const SITE_URL: &str = "https://invoice-generator.com";

const GENERIC_TITLE: &str = "Invoice Generator";
const GENERIC_INTRO: &str = "Create and download professional invoices in seconds";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    Generic,
    Country(Country),
}

/// Descriptive text an entry point exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageText {
    pub title: &'static str,
    pub description: &'static str,
    pub heading: &'static str,
    pub intro: &'static str,
    pub canonical_url: String,
}

fn country_path() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^/([a-z]+)-invoice-generator/?$").expect("route pattern is valid")
    })
}

/// Maps a path to its entry point. Unmatched paths, including country-shaped
/// paths for countries without a preset, land on the generic form.
pub fn resolve(path: &str) -> EntryPoint {
    let path = path.trim();
    country_path()
        .captures(path)
        .and_then(|caps| caps[1].parse::<Country>().ok())
        .map_or(EntryPoint::Generic, EntryPoint::Country)
}

impl EntryPoint {
    /// Country pre-selected by this entry point. The generic form uses the
    /// US preset.
    pub fn country(self) -> Country {
        match self {
            EntryPoint::Generic => Country::default(),
            EntryPoint::Country(country) => country,
        }
    }

    pub fn path(self) -> String {
        match self {
            EntryPoint::Generic => "/".to_string(),
            EntryPoint::Country(country) => format!("/{}-invoice-generator", country.key()),
        }
    }

    pub fn page(self) -> PageText {
        let canonical_url = format!("{SITE_URL}{}", self.path());
        match self {
            EntryPoint::Generic => PageText {
                title: GENERIC_TITLE,
                description: GENERIC_INTRO,
                heading: GENERIC_TITLE,
                intro: GENERIC_INTRO,
                canonical_url,
            },
            EntryPoint::Country(country) => {
                let preset = country.preset();
                PageText {
                    title: preset.meta_title,
                    description: preset.meta_description,
                    heading: preset.heading,
                    intro: preset.intro,
                    canonical_url,
                }
            }
        }
    }

    pub fn all() -> impl Iterator<Item = EntryPoint> {
        std::iter::once(EntryPoint::Generic)
            .chain(Country::ALL.into_iter().map(EntryPoint::Country))
    }
}
