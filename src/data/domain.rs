use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::fields::{FieldCatalog, FieldKind};
use super::model::{CellValue, Column, Table};
use super::text;
use crate::error::UnknownFieldError;

// ---------------------------------------------------------------------------
// Domain: the legal filter operands of one column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Domain {
    /// Observed (or, for percent fields without data, default) bounds.
    Range { min: f64, max: f64 },
    /// Distinct non-missing values, sorted.
    Values { values: Vec<CellValue> },
    /// Distinct upper-cased tokens, sorted.
    Tokens { tokens: Vec<String> },
    /// Free text: any substring query is legal.
    Text,
    /// A numeric column without a single observed number.
    Empty,
}

pub type Domains = BTreeMap<String, Domain>;

/// Tunables for domain extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainSettings {
    /// Reported for a percent field when no cell yields a percentage, so the
    /// caller always receives a usable range.
    pub percent_default_range: (f64, f64),
}

impl Default for DomainSettings {
    fn default() -> Self {
        DomainSettings {
            percent_default_range: (0.0, 100.0),
        }
    }
}

/// Derive, for every requested field, the operands a filter may use.
///
/// Pure: repeated calls on the same table return equal results.
pub fn extract_domains<S: AsRef<str>>(
    table: &Table,
    catalog: &FieldCatalog,
    fields: &[S],
    settings: &DomainSettings,
) -> Result<Domains, UnknownFieldError> {
    let mut domains = Domains::new();
    for field in fields {
        let field = field.as_ref();
        let column = table.column(field).ok_or_else(|| UnknownFieldError {
            table: table.label().to_string(),
            field: field.to_string(),
        })?;
        let domain = match catalog.kind_of(field) {
            FieldKind::Numeric => numeric_domain(column),
            FieldKind::Categorical => categorical_domain(column),
            FieldKind::MultiToken => token_domain(column),
            FieldKind::Percent => percent_domain(column, settings),
            FieldKind::FreeText | FieldKind::Reference => Domain::Text,
        };
        domains.insert(field.to_string(), domain);
    }
    Ok(domains)
}

fn numeric_domain(column: &Column) -> Domain {
    min_max(column.values.iter().filter_map(CellValue::as_f64)).unwrap_or(Domain::Empty)
}

fn categorical_domain(column: &Column) -> Domain {
    let distinct: BTreeSet<&CellValue> = column.values.iter().filter(|v| !v.is_missing()).collect();
    Domain::Values {
        values: distinct.into_iter().cloned().collect(),
    }
}

fn token_domain(column: &Column) -> Domain {
    let distinct: BTreeSet<String> = column
        .values
        .iter()
        .filter_map(CellValue::as_text)
        .flat_map(|t| text::tokens(&t).collect::<Vec<_>>())
        .collect();
    Domain::Tokens {
        tokens: distinct.into_iter().collect(),
    }
}

/// First percentage of each cell; unparsable cells contribute nothing.
fn percent_domain(column: &Column, settings: &DomainSettings) -> Domain {
    let observed = column
        .values
        .iter()
        .filter_map(CellValue::as_text)
        .filter_map(|t| text::first_percentage(&t));
    min_max(observed).unwrap_or_else(|| {
        let (min, max) = settings.percent_default_range;
        Domain::Range { min, max }
    })
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<Domain> {
    values.fold(None, |acc, v| match acc {
        None => Some(Domain::Range { min: v, max: v }),
        Some(Domain::Range { min, max }) => Some(Domain::Range {
            min: min.min(v),
            max: max.max(v),
        }),
        other => other,
    })
}
