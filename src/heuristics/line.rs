use super::code_key::{digit_tokens, key_from_tokens};
use crate::config::ParseConfig;
use regex::Regex;
use std::sync::LazyLock;

// 1-3 digit position number, whitespace, then the rest of the row.
static POSITION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,3})\s+(.*)$").unwrap());

/// Digit-block layouts a product code may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeShape {
    /// First block has at least six digits: `123456`.
    Long,
    /// `14936 000 1000`
    Grouped534,
    /// `09858 000 1`
    Grouped53,
}

impl CodeShape {
    pub fn of(tokens: &[&str]) -> Option<Self> {
        match tokens {
            [first, ..] if first.len() >= 6 => Some(CodeShape::Long),
            [a, b, c, ..] if (a.len(), b.len(), c.len()) == (5, 3, 4) => {
                Some(CodeShape::Grouped534)
            }
            [a, b, ..] if (a.len(), b.len()) == (5, 3) => Some(CodeShape::Grouped53),
            _ => None,
        }
    }
}

/// The parts of a line that opens a new order item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemHeader<'a> {
    pub position: u16,
    /// Everything after the position number, trimmed.
    pub remainder: &'a str,
    pub shape: CodeShape,
    pub key: String,
}

/// Parses `line` as an item start. `None` means the line does not open an item.
pub fn parse_item_header(line: &str) -> Option<ItemHeader<'_>> {
    let caps = POSITION_PREFIX.captures(line)?;
    let position = caps.get(1)?.as_str().parse().ok()?;
    let remainder = caps.get(2)?.as_str().trim();

    let tokens = digit_tokens(remainder);
    let shape = CodeShape::of(&tokens)?;
    let key = key_from_tokens(&tokens)?;

    Some(ItemHeader {
        position,
        remainder,
        shape,
        key,
    })
}

pub fn is_item_start(line: &str) -> bool {
    parse_item_header(line).is_some()
}

/// Column headers and order metadata that must never be read as items.
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    position_prefix: String,
    order_prefix: String,
    buyer_number: String,
}

impl NoiseFilter {
    pub fn new(cfg: &ParseConfig) -> Self {
        Self {
            position_prefix: cfg.position_marker.to_lowercase(),
            order_prefix: cfg.order_marker.to_lowercase(),
            buyer_number: cfg.buyer_number_marker.to_lowercase(),
        }
    }

    pub fn is_noise(&self, line: &str) -> bool {
        let low = line.to_lowercase();
        let hit = |marker: &str, found: bool| !marker.is_empty() && found;

        hit(&self.position_prefix, low.starts_with(&self.position_prefix))
            || hit(&self.order_prefix, low.starts_with(&self.order_prefix))
            || hit(&self.buyer_number, low.contains(&self.buyer_number))
    }
}
