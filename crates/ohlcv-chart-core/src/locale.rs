use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Language for every user-facing string on a chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    English,
    Spanish,
}

/// User-facing strings for one locale.
#[derive(Debug)]
pub struct Strings {
    pub buy: &'static str,
    pub sell: &'static str,
    /// Connective between coin and price in a callout ("1 BTC at 40000 €").
    pub at: &'static str,
    pub price_axis: &'static str,
    pub volume_axis: &'static str,
    pub time_axis: &'static str,
}

static ENGLISH: Strings = Strings {
    buy: "Buy",
    sell: "Sell",
    at: "at",
    price_axis: "Price (€)",
    volume_axis: "Volume",
    time_axis: "Time",
};

static SPANISH: Strings = Strings {
    buy: "Compra",
    sell: "Venta",
    at: "a",
    price_axis: "Precio (€)",
    volume_axis: "Volumen",
    time_axis: "Tiempo",
};

impl Locale {
    pub fn strings(&self) -> &'static Strings {
        match self {
            Locale::English => &ENGLISH,
            Locale::Spanish => &SPANISH,
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::English),
            "es" | "spanish" | "español" => Ok(Locale::Spanish),
            other => Err(format!("unknown locale: {other}. Expected: en, es")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_locale_codes() {
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::English);
        assert_eq!("ES".parse::<Locale>().unwrap(), Locale::Spanish);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn axis_titles_per_locale() {
        assert_eq!(Locale::English.strings().price_axis, "Price (€)");
        assert_eq!(Locale::Spanish.strings().volume_axis, "Volumen");
        assert_eq!(Locale::Spanish.strings().time_axis, "Tiempo");
    }
}
