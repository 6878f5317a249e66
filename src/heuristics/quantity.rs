use super::line::is_item_start;
use regex::Regex;

/// Finds `<digits> <unit>` quantity markers for an item, either on the item's
/// own line or in the lines that follow it.
#[derive(Debug, Clone)]
pub struct QuantityResolver {
    marker: Regex,
    lookahead: usize,
}

impl QuantityResolver {
    pub fn new(unit: &str, lookahead: usize) -> Result<Self, regex::Error> {
        let unit = unit.trim();
        // \b only makes sense after a word character
        let boundary = if unit.chars().last().is_some_and(char::is_alphanumeric) {
            r"\b"
        } else {
            ""
        };
        let marker = Regex::new(&format!(
            r"(?i)([0-9]+)\s+{}{boundary}",
            regex::escape(unit)
        ))?;
        Ok(Self { marker, lookahead })
    }

    /// First quantity marker on a single line.
    pub fn on_line(&self, line: &str) -> Option<u32> {
        self.marker.captures(line)?.get(1)?.as_str().parse().ok()
    }

    /// Quantity for the item starting at `lines[index]`.
    ///
    /// Scans at most `lookahead` following lines and gives up at the next item
    /// start, so a later item's marker is never attributed to this one.
    pub fn resolve(&self, lines: &[&str], index: usize) -> Option<u32> {
        if let Some(qty) = self.on_line(lines.get(index)?) {
            return Some(qty);
        }

        for line in lines.iter().skip(index + 1).take(self.lookahead) {
            if is_item_start(line) {
                return None;
            }
            if let Some(qty) = self.on_line(line) {
                return Some(qty);
            }
        }
        None
    }
}
