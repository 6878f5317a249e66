// src/heuristics/mod.rs

mod code_key;
mod line;
mod quantity;

pub use code_key::canonical_key;

use crate::config::ParseConfig;
use line::{NoiseFilter, parse_item_header};
use quantity::QuantityResolver;
use serde::Serialize;
use tracing::debug;

/// A single order line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedItem {
    /// Canonical product code key.
    pub key: String,
    /// `None` when no quantity marker belongs to the item.
    pub quantity: Option<u32>,
}

/// Extracts order items from the plain text of one document.
#[derive(Debug, Clone)]
pub struct ItemParser {
    noise: NoiseFilter,
    quantity: QuantityResolver,
}

impl ItemParser {
    pub fn new(cfg: &ParseConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            noise: NoiseFilter::new(cfg),
            quantity: QuantityResolver::new(&cfg.unit, cfg.lookahead)?,
        })
    }

    /// Items in document order. Repeated codes stay separate items.
    pub fn parse(&self, text: &str) -> Vec<ParsedItem> {
        let lines = split_lines(text);
        let mut items = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            if self.noise.is_noise(line) {
                continue;
            }
            let Some(header) = parse_item_header(line) else {
                continue;
            };

            let quantity = self.quantity.resolve(&lines, i);
            debug!(
                line = i,
                position = header.position,
                shape = ?header.shape,
                key = %header.key,
                quantity = ?quantity,
                text = header.remainder,
                "Item"
            );
            items.push(ParsedItem {
                key: header.key,
                quantity,
            });
        }

        items
    }
}

/// Characters that end a line, including vertical tab, form feed and the
/// Unicode separators.
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\u{b}', '\u{c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}',
    '\u{2029}',
];

/// Trimmed, non-empty lines.
fn split_lines(text: &str) -> Vec<&str> {
    text.split(LINE_BREAKS)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ItemParser {
        ItemParser::new(&ParseConfig::default()).unwrap()
    }

    fn item(key: &str, quantity: Option<u32>) -> ParsedItem {
        ParsedItem {
            key: key.to_string(),
            quantity,
        }
    }

    #[test]
    fn items_with_lookahead_and_noise() {
        let text = [
            "1 123456 WIDGET",
            "2 darab",
            "Poz. Cikkszám Megnevezés",
            "2 223344556677 BAR",
            "no marker here",
        ]
        .join("\n");

        assert_eq!(
            parser().parse(&text),
            vec![item("123456", Some(2)), item("223344556677", None)]
        );
    }

    #[test]
    fn duplicates_are_kept_in_order() {
        let text = "1 123456 A 3 darab\n2 654321 B 1 darab\n3 123456 A 4 darab";
        assert_eq!(
            parser().parse(text),
            vec![
                item("123456", Some(3)),
                item("654321", Some(1)),
                item("123456", Some(4)),
            ]
        );
    }

    #[test]
    fn noise_lines_never_become_items() {
        let text = "1 123456 Vevőszám 10 darab\n2 654321 WIDGET 1 darab";
        assert_eq!(parser().parse(text), vec![item("654321", Some(1))]);
    }

    #[test]
    fn blank_lines_and_padding_are_ignored() {
        let text = "\r\n   1 14936 000 1000 Csavar  \r\n\r\n\t\r\n   10 darab\r\n";
        assert_eq!(parser().parse(text), vec![item("149360001000", Some(10))]);
    }

    #[test]
    fn page_breaks_split_lines() {
        let text = "1 09858 000 1 Anya\u{c}7 darab";
        assert_eq!(parser().parse(text), vec![item("09858000", Some(7))]);
    }

    #[test]
    fn unicode_line_separators_split_lines() {
        for sep in ['\u{b}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}'] {
            let text = format!("1 123456 WIDGET{sep}2 654321 BAR{sep}3 darab");
            assert_eq!(
                parser().parse(&text),
                vec![item("123456", None), item("654321", Some(3))],
                "separator {sep:?}"
            );
        }
    }

    #[test]
    fn text_without_items_is_empty() {
        assert!(parser().parse("").is_empty());
        assert!(parser().parse("Megrendelés\nSzállítási cím\n5 12 34").is_empty());
    }

    #[test]
    fn configured_unit_is_used() {
        let parser = ItemParser::new(&ParseConfig {
            unit: "pcs".to_string(),
            ..ParseConfig::default()
        })
        .unwrap();
        let text = "1 123456 WIDGET\n4 pcs\n2 654321 BAR 9 darab";
        assert_eq!(
            parser.parse(text),
            vec![item("123456", Some(4)), item("654321", None)]
        );
    }
}
