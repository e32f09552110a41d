use std::collections::{BTreeMap, HashMap};

use log::debug;
use serde::Deserialize;

use super::model::{CellValue, Table};
use crate::error::EngineError;

/// Where the embedded references live and how they are written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct XrefSettings {
    /// Protein column holding the quoted references.
    pub reference_field: String,
    /// Drug column the parsed identifiers are matched against.
    pub identifier_field: String,
    /// Segments starting with this are identifier candidates.
    pub prefix: String,
    /// Ends the identifier inside a segment.
    pub separator: char,
}

impl Default for XrefSettings {
    fn default() -> Self {
        XrefSettings {
            reference_field: "DrugBank-reference".to_string(),
            identifier_field: "DrugBank ID".to_string(),
            prefix: "DB".to_string(),
            separator: ';',
        }
    }
}

/// Parse identifiers out of a reference string such as
/// `"DB00123; AspirinX" "DB00456; Other"`.
///
/// Duplicates are dropped; first-seen order is kept.
pub fn parse_reference_ids<'a>(text: &'a str, prefix: &str, separator: char) -> Vec<&'a str> {
    let mut ids: Vec<&str> = Vec::new();
    for segment in text.split('"') {
        let segment = segment.trim();
        if !segment.starts_with(prefix) {
            continue;
        }
        let id = segment.split(separator).next().unwrap_or_default().trim();
        if !id.is_empty() && !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Non-empty reference text of a protein row, if it has any.
fn reference_text<'t>(protein: &'t Table, row: usize, settings: &XrefSettings) -> Option<&'t str> {
    match protein.cell(row, &settings.reference_field)? {
        CellValue::String(s) if !s.trim().is_empty() => Some(s.as_str()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// DrugIndex – identifier → drug row positions
// ---------------------------------------------------------------------------

/// Lookup from drug identifier to every drug row carrying it.
///
/// Derived from one immutable drug table; rebuild it when the table is replaced.
#[derive(Debug, Clone, Default)]
pub struct DrugIndex {
    by_id: HashMap<String, Vec<usize>>,
}

impl DrugIndex {
    pub fn build(drug: &Table, settings: &XrefSettings) -> Self {
        let mut by_id: HashMap<String, Vec<usize>> = HashMap::new();
        if let Some(column) = drug.column(&settings.identifier_field) {
            for (row, value) in column.values.iter().enumerate() {
                if let Some(id) = value.as_text() {
                    by_id.entry(id.trim().to_string()).or_default().push(row);
                }
            }
        }
        DrugIndex { by_id }
    }

    /// Drug rows referenced by one protein row, deduplicated, first-match order.
    /// Empty when the row has no reference or none of its identifiers is known.
    pub fn resolve(&self, protein_row: usize, protein: &Table, settings: &XrefSettings) -> Vec<usize> {
        match reference_text(protein, protein_row, settings) {
            Some(text) => self.lookup(text, settings),
            None => Vec::new(),
        }
    }

    /// Resolve every protein row that carries a non-empty reference field.
    ///
    /// Rows without a reference are left out of the map, whereas
    /// [`resolve`](Self::resolve) answers them with an empty list.
    pub fn resolve_all(&self, protein: &Table, settings: &XrefSettings) -> BTreeMap<usize, Vec<usize>> {
        protein
            .positions()
            .filter_map(|row| {
                reference_text(protein, row, settings).map(|text| (row, self.lookup(text, settings)))
            })
            .collect()
    }

    fn lookup(&self, text: &str, settings: &XrefSettings) -> Vec<usize> {
        let mut rows: Vec<usize> = Vec::new();
        for id in parse_reference_ids(text, &settings.prefix, settings.separator) {
            match self.by_id.get(id) {
                Some(matches) => {
                    for &row in matches {
                        if !rows.contains(&row) {
                            rows.push(row);
                        }
                    }
                }
                None => debug!("Drug identifier {id} not present in drug table"),
            }
        }
        rows
    }
}

/// Resolve a single protein row against a drug table.
pub fn resolve(protein_row: usize, protein: &Table, drug: &Table, settings: &XrefSettings) -> Vec<usize> {
    DrugIndex::build(drug, settings).resolve(protein_row, protein, settings)
}

/// Resolve every referencing protein row against a drug table.
pub fn resolve_all(protein: &Table, drug: &Table, settings: &XrefSettings) -> BTreeMap<usize, Vec<usize>> {
    DrugIndex::build(drug, settings).resolve_all(protein, settings)
}

/// Precondition for cross-referencing: at least one protein row must carry a
/// non-empty reference field.
pub fn require_references(protein: &Table, settings: &XrefSettings) -> Result<(), EngineError> {
    if protein
        .positions()
        .any(|row| reference_text(protein, row, settings).is_some())
    {
        Ok(())
    } else {
        Err(EngineError::Precondition(format!(
            "no row of '{}' has a non-empty '{}' field",
            protein.label(),
            settings.reference_field
        )))
    }
}
