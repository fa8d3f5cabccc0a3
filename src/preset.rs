//! Country presets: currency, default tax rate and the descriptive text shown
//! on each country's entry page.
//!
//! The set is closed. Lookups never fail; anything unrecognised resolves to
//! [`Country::Usa`].

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Country {
    #[default]
    Usa,
    Canada,
    Australia,
    Uk,
    Germany,
    Singapore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryPreset {
    pub key: &'static str,
    pub display_name: &'static str,
    pub currency_code: &'static str,
    pub currency_symbol: &'static str,
    /// Hundredths of a percent, so 7.5% is 750.
    pub default_tax_rate_bps: i64,
    pub tax_label: &'static str,
    pub meta_title: &'static str,
    pub meta_description: &'static str,
    pub heading: &'static str,
    pub intro: &'static str,
}

impl CountryPreset {
    /// Default tax rate in percent (7.5 for the US).
    pub fn default_tax_rate(&self) -> Decimal {
        Decimal::new(self.default_tax_rate_bps, 2).normalize()
    }
}

static USA: CountryPreset = CountryPreset {
    key: "usa",
    display_name: "United States",
    currency_code: "USD",
    currency_symbol: "$",
    default_tax_rate_bps: 750,
    tax_label: "Sales Tax",
    meta_title: "Free USA Invoice Generator | Create Professional Invoices",
    meta_description: "Generate professional invoices for US clients with our free invoice generator. Includes sales tax calculation and USD currency. No signup required.",
    heading: "USA Invoice Generator",
    intro: "Create professional invoices for US clients with proper sales tax calculation and USD currency formatting.",
};

static CANADA: CountryPreset = CountryPreset {
    key: "canada",
    display_name: "Canada",
    currency_code: "CAD",
    currency_symbol: "CA$",
    default_tax_rate_bps: 1300,
    tax_label: "GST/HST",
    meta_title: "Free Canada Invoice Generator | GST/HST Support",
    meta_description: "Generate professional invoices for Canadian clients with our free invoice generator. Includes GST/HST calculation and CAD currency. No signup required.",
    heading: "Canada Invoice Generator",
    intro: "Create professional invoices for Canadian clients with proper GST/HST calculation and CAD currency formatting.",
};

static AUSTRALIA: CountryPreset = CountryPreset {
    key: "australia",
    display_name: "Australia",
    currency_code: "AUD",
    currency_symbol: "A$",
    default_tax_rate_bps: 1000,
    tax_label: "GST",
    meta_title: "Free Australia Invoice Generator | GST Support",
    meta_description: "Generate professional invoices for Australian clients with our free invoice generator. Includes GST calculation and AUD currency. No signup required.",
    heading: "Australia Invoice Generator",
    intro: "Create professional invoices for Australian clients with proper GST calculation and AUD currency formatting.",
};

static UK: CountryPreset = CountryPreset {
    key: "uk",
    display_name: "United Kingdom",
    currency_code: "GBP",
    currency_symbol: "£",
    default_tax_rate_bps: 2000,
    tax_label: "VAT",
    meta_title: "Free UK Invoice Generator | VAT Support",
    meta_description: "Generate professional invoices for UK clients with our free invoice generator. Includes VAT calculation and GBP currency. No signup required.",
    heading: "UK Invoice Generator",
    intro: "Create professional invoices for UK clients with proper VAT calculation and GBP currency formatting.",
};

static GERMANY: CountryPreset = CountryPreset {
    key: "germany",
    display_name: "Germany",
    currency_code: "EUR",
    currency_symbol: "€",
    default_tax_rate_bps: 1900,
    tax_label: "MwSt",
    meta_title: "Free Germany Invoice Generator | MwSt Support",
    meta_description: "Generate professional invoices for German clients with our free invoice generator. Includes MwSt calculation and EUR currency. No signup required.",
    heading: "Germany Invoice Generator",
    intro: "Create professional invoices for German clients with proper MwSt calculation and EUR currency formatting.",
};

static SINGAPORE: CountryPreset = CountryPreset {
    key: "singapore",
    display_name: "Singapore",
    currency_code: "SGD",
    currency_symbol: "S$",
    default_tax_rate_bps: 800,
    tax_label: "GST",
    meta_title: "Free Singapore Invoice Generator | GST Support",
    meta_description: "Generate professional invoices for Singapore clients with our free invoice generator. Includes GST calculation and SGD currency. No signup required.",
    heading: "Singapore Invoice Generator",
    intro: "Create professional invoices for Singapore clients with proper GST calculation and SGD currency formatting.",
};

impl Country {
    /// Display order used by selectors and listings.
    pub const ALL: [Country; 6] = [
        Country::Usa,
        Country::Canada,
        Country::Australia,
        Country::Uk,
        Country::Germany,
        Country::Singapore,
    ];

    /// Resolves a country key, falling back to the US preset for unknown or
    /// missing keys.
    pub fn lookup(key: Option<&str>) -> Country {
        match key.map(str::parse::<Country>) {
            Some(Ok(country)) => country,
            Some(Err(UnknownCountry(raw))) => {
                tracing::debug!(key = %raw, "unknown country key, using usa preset");
                Country::Usa
            }
            None => Country::Usa,
        }
    }

    pub fn preset(self) -> &'static CountryPreset {
        match self {
            Country::Usa => &USA,
            Country::Canada => &CANADA,
            Country::Australia => &AUSTRALIA,
            Country::Uk => &UK,
            Country::Germany => &GERMANY,
            Country::Singapore => &SINGAPORE,
        }
    }

    pub fn key(self) -> &'static str {
        self.preset().key
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.preset().display_name)
    }
}

/// Strict parse failure. Most callers want [`Country::lookup`] instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown country key: {0}")]
pub struct UnknownCountry(pub String);

impl FromStr for Country {
    type Err = UnknownCountry;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Country::ALL
            .into_iter()
            .find(|c| c.key() == key)
            .ok_or_else(|| UnknownCountry(s.to_string()))
    }
}

/// Looks up the preset for `key`, or the US preset when the key is unknown.
pub fn lookup(key: Option<&str>) -> &'static CountryPreset {
    Country::lookup(key).preset()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_presets() {
        let expected = [
            ("usa", "USD", "$", Decimal::new(75, 1)),
            ("canada", "CAD", "CA$", Decimal::new(13, 0)),
            ("australia", "AUD", "A$", Decimal::new(10, 0)),
            ("uk", "GBP", "£", Decimal::new(20, 0)),
            ("germany", "EUR", "€", Decimal::new(19, 0)),
            ("singapore", "SGD", "S$", Decimal::new(8, 0)),
        ];

        for (key, code, symbol, rate) in expected {
            let preset = lookup(Some(key));
            assert_eq!(preset.key, key);
            assert_eq!(preset.currency_code, code);
            assert_eq!(preset.currency_symbol, symbol);
            assert_eq!(preset.default_tax_rate(), rate);
        }
    }

    #[test]
    fn test_unknown_key_falls_back_to_usa() {
        assert_eq!(lookup(Some("france")), lookup(Some("usa")));
        assert_eq!(lookup(Some("")), &USA);
        assert_eq!(lookup(None), &USA);
    }

    #[test]
    fn test_parse_is_case_insensitive_but_strict() {
        assert_eq!("UK".parse::<Country>(), Ok(Country::Uk));
        assert_eq!(" germany ".parse::<Country>(), Ok(Country::Germany));
        assert_eq!(
            "france".parse::<Country>(),
            Err(UnknownCountry("france".to_string()))
        );
    }

    #[test]
    fn test_all_keys_round_trip() {
        for country in Country::ALL {
            assert_eq!(Country::lookup(Some(country.key())), country);
        }
    }

    #[test]
    fn test_tax_labels() {
        assert_eq!(Country::Germany.preset().tax_label, "MwSt");
        assert_eq!(Country::Canada.preset().tax_label, "GST/HST");
        assert_eq!(Country::Usa.preset().tax_label, "Sales Tax");
    }
}
