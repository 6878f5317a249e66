// src/report.rs

use crate::heuristics::ParsedItem;
use crate::lookup::LookupTable;
use serde::Serialize;

/// One output row. Unmatched rows carry the raw key as their code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub code: String,
    pub name: Option<String>,
    pub quantity: Option<u32>,
    pub matched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub missing: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub summary: MatchSummary,
}

/// Joins parsed items against the lookup table, keeping item order.
pub fn build_report(items: &[ParsedItem], lookup: &LookupTable) -> Report {
    let mut missing = 0;

    let rows = items
        .iter()
        .map(|item| match lookup.get(&item.key) {
            Some(entry) => ReportRow {
                code: entry.display_code.clone(),
                name: Some(entry.name.clone()),
                quantity: item.quantity,
                matched: true,
            },
            None => {
                missing += 1;
                ReportRow {
                    code: item.key.clone(),
                    name: None,
                    quantity: item.quantity,
                    matched: false,
                }
            }
        })
        .collect();

    Report {
        rows,
        summary: MatchSummary {
            missing,
            total: items.len(),
        },
    }
}
