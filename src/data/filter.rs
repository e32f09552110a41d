use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::fields::{FieldCatalog, FieldKind};
use super::model::{CellValue, Table};
use super::text;

// ---------------------------------------------------------------------------
// Criterion: one column-scoped rule
// ---------------------------------------------------------------------------

/// A single filter rule for one column.
///
/// Serialised form (criteria files, CLI):
/// ```json
/// { "Mass": { "range": { "lower": 50, "upper": 150 } },
///   "Organism": { "one_of": ["Human"] },
///   "Sequence": { "contains": "mktl" },
///   "Gene Names": { "any_token": ["ESR1"] } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Inclusive numeric bounds.
    Range { lower: f64, upper: f64 },
    /// Accepted literals, OR-combined. Empty means no constraint.
    OneOf(Vec<CellValue>),
    /// Case- and whitespace-insensitive substring. Blank means no constraint.
    Contains(String),
    /// Any accepted token occurring in the cell. Empty means no constraint.
    AnyToken(Vec<String>),
}

impl Criterion {
    pub fn range(lower: f64, upper: f64) -> Self {
        Criterion::Range { lower, upper }
    }

    pub fn one_of<V: Into<CellValue>>(values: impl IntoIterator<Item = V>) -> Self {
        Criterion::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn contains(query: impl Into<String>) -> Self {
        Criterion::Contains(query.into())
    }

    pub fn any_token<T: Into<String>>(tokens: impl IntoIterator<Item = T>) -> Self {
        Criterion::AnyToken(tokens.into_iter().map(Into::into).collect())
    }

    /// Whether this criterion leaves every row through.
    pub fn is_noop(&self) -> bool {
        match self {
            Criterion::Range { .. } => false,
            Criterion::OneOf(values) => values.is_empty(),
            Criterion::Contains(query) => query.trim().is_empty(),
            Criterion::AnyToken(tokens) => tokens.iter().all(|t| t.trim().is_empty()),
        }
    }
}

/// Column → criterion for one query. Built per request and then dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Criteria(BTreeMap<String, Criterion>);

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, column: impl Into<String>, criterion: Criterion) -> Self {
        self.insert(column, criterion);
        self
    }

    /// Set the criterion for a column, replacing any previous one.
    pub fn insert(&mut self, column: impl Into<String>, criterion: Criterion) {
        self.0.insert(column.into(), criterion);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Criterion)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ---------------------------------------------------------------------------
// Matcher: a criterion specialised for its column's kind
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Matcher {
    Range { lower: f64, upper: f64 },
    PercentRange { lower: f64, upper: f64 },
    OneOf(Vec<CellValue>),
    Contains(String),
    AnyToken(Vec<String>),
}

impl Matcher {
    /// `None` when the criterion does not constrain anything.
    fn compile(kind: FieldKind, criterion: &Criterion) -> Option<Matcher> {
        if criterion.is_noop() {
            return None;
        }
        let matcher = match (kind, criterion) {
            (FieldKind::Percent, Criterion::Range { lower, upper }) => Matcher::PercentRange {
                lower: *lower,
                upper: *upper,
            },
            (_, Criterion::Range { lower, upper }) => Matcher::Range {
                lower: *lower,
                upper: *upper,
            },
            // Packed token cells are matched token-wise even when the caller
            // sends literal values.
            (FieldKind::MultiToken, Criterion::OneOf(values)) => Matcher::AnyToken(
                values
                    .iter()
                    .filter_map(CellValue::as_text)
                    .map(|t| t.trim().to_uppercase())
                    .filter(|t| !t.is_empty())
                    .collect(),
            ),
            (_, Criterion::OneOf(values)) => Matcher::OneOf(values.clone()),
            (_, Criterion::Contains(query)) => Matcher::Contains(text::clean_for_search(query)),
            (_, Criterion::AnyToken(tokens)) => Matcher::AnyToken(
                tokens
                    .iter()
                    .map(|t| t.trim().to_uppercase())
                    .filter(|t| !t.is_empty())
                    .collect(),
            ),
        };
        Some(matcher)
    }

    /// Missing cells are rejected before this is called.
    fn accepts(&self, cell: &CellValue) -> bool {
        match self {
            Matcher::Range { lower, upper } => cell
                .as_f64()
                .is_some_and(|v| *lower <= v && v <= *upper),
            Matcher::PercentRange { lower, upper } => cell.as_text().is_some_and(|t| {
                text::percentages(&t)
                    .into_iter()
                    .any(|v| *lower <= v && v <= *upper)
            }),
            Matcher::OneOf(values) => values.iter().any(|lit| cell.matches_literal(lit)),
            Matcher::Contains(query) => cell
                .as_text()
                .is_some_and(|t| text::clean_for_search(&t).contains(query.as_str())),
            // Substring containment, not token equality: "ESR1" also hits "ESR10".
            Matcher::AnyToken(tokens) => cell.as_text().is_some_and(|t| {
                let haystack = t.to_uppercase();
                tokens.iter().any(|tok| haystack.contains(tok.as_str()))
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Return the ascending row positions that satisfy every criterion.
///
/// A row passes a column's criterion when:
/// * the column is absent from the table → passes (no constraint)
/// * the criterion is empty → passes (no constraint)
/// * the cell is missing → fails
/// * otherwise the column's matcher decides
pub fn evaluate(table: &Table, catalog: &FieldCatalog, criteria: &Criteria) -> Vec<usize> {
    let mut survivors: Vec<usize> = table.positions().collect();
    if criteria.is_empty() {
        return survivors;
    }

    for (name, criterion) in criteria.iter() {
        let Some(column) = table.column(name) else {
            warn!("Ignoring criterion on absent column '{name}' of {}", table.label());
            continue;
        };
        let Some(matcher) = Matcher::compile(catalog.kind_of(name), criterion) else {
            debug!("Criterion on '{name}' is empty, skipping");
            continue;
        };
        if let Criterion::Range { lower, upper } = criterion {
            if lower > upper {
                warn!("Range on '{name}' is inverted ({lower} > {upper}); nothing can match");
            }
        }

        survivors.retain(|&row| {
            let cell = &column.values[row];
            !cell.is_missing() && matcher.accepts(cell)
        });
        debug!("'{name}': {} rows remain", survivors.len());

        if survivors.is_empty() {
            break;
        }
    }

    survivors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proteins() -> Table {
        Table::from_rows(
            "proteins",
            vec![
                "Entry".into(),
                "Mass".into(),
                "Organism".into(),
                "Gene Names".into(),
                "Sequence".into(),
            ],
            vec![
                vec![
                    "P1".into(),
                    CellValue::Integer(100),
                    "Human".into(),
                    "ESR1 ESR NR3A1".into(),
                    "MTMT LLV".into(),
                ],
                vec![
                    "P2".into(),
                    CellValue::Integer(300),
                    "Mouse".into(),
                    "esr10".into(),
                    "GGA".into(),
                ],
                vec![
                    "P3".into(),
                    CellValue::Integer(500),
                    "Human".into(),
                    CellValue::Null,
                    CellValue::Null,
                ],
                vec![
                    "P4".into(),
                    CellValue::Float(f64::NAN),
                    CellValue::Null,
                    "GPER1".into(),
                    "mtm".into(),
                ],
            ],
        )
        .unwrap()
    }

    fn run(table: &Table, criteria: Criteria) -> Vec<usize> {
        evaluate(table, &FieldCatalog::protein(), &criteria)
    }

    #[test]
    fn empty_criteria_select_every_row() {
        let none = Criteria::new();
        assert!(none.is_empty());
        assert_eq!(run(&proteins(), none), vec![0, 1, 2, 3]);
        assert!(!Criteria::new().with("Mass", Criterion::range(0.0, 1.0)).is_empty());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let c = Criteria::new().with("Mass", Criterion::range(100.0, 500.0));
        assert_eq!(run(&proteins(), c), vec![0, 1, 2]);
    }

    #[test]
    fn inverted_range_matches_nothing() {
        let c = Criteria::new().with("Mass", Criterion::range(500.0, 100.0));
        assert!(run(&proteins(), c).is_empty());
    }

    #[test]
    fn value_sets_are_or_combined() {
        let c = Criteria::new().with("Organism", Criterion::one_of(["Human", "Mouse"]));
        assert_eq!(run(&proteins(), c), vec![0, 1, 2]);
    }

    #[test]
    fn empty_value_set_is_a_noop() {
        let base = Criteria::new().with("Mass", Criterion::range(50.0, 350.0));
        let with_empty = base
            .clone()
            .with("Organism", Criterion::OneOf(Vec::new()));
        assert_eq!(run(&proteins(), base), run(&proteins(), with_empty));
    }

    #[test]
    fn absent_column_is_a_noop() {
        let c = Criteria::new().with("Resolution", Criterion::range(1.0, 2.0));
        assert_eq!(run(&proteins(), c), vec![0, 1, 2, 3]);
    }

    #[test]
    fn missing_cells_never_pass() {
        let c = Criteria::new().with("Mass", Criterion::range(f64::MIN, f64::MAX));
        assert_eq!(run(&proteins(), c), vec![0, 1, 2]);
        let c = Criteria::new().with("Sequence", Criterion::contains("M"));
        assert_eq!(run(&proteins(), c), vec![0, 3]);
    }

    #[test]
    fn substring_query_ignores_case_and_whitespace() {
        let c = Criteria::new().with("Sequence", Criterion::contains("tl l"));
        assert_eq!(run(&proteins(), c), vec![0]);

        let names = Table::from_rows(
            "drugs",
            vec!["Name".into()],
            vec![
                vec!["ASPIRIN".into()],
                vec!["Aspirin Compound".into()],
                vec!["Ibuprofen".into()],
            ],
        )
        .unwrap();
        let c = Criteria::new().with("Name", Criterion::contains("asp"));
        assert_eq!(evaluate(&names, &FieldCatalog::drug(), &c), vec![0, 1]);
    }

    #[test]
    fn token_match_is_case_insensitive_substring() {
        let c = Criteria::new().with("Gene Names", Criterion::any_token(["esr1"]));
        // "esr10" contains "ESR1": documented loose matching.
        assert_eq!(run(&proteins(), c), vec![0, 1]);

        let c = Criteria::new().with("Gene Names", Criterion::any_token(["NR3A1", "GPER1"]));
        assert_eq!(run(&proteins(), c), vec![0, 3]);
    }

    #[test]
    fn value_set_on_token_field_uses_token_matching() {
        let c = Criteria::new().with("Gene Names", Criterion::one_of(["gper1"]));
        assert_eq!(run(&proteins(), c), vec![3]);
    }

    #[test]
    fn columns_are_and_combined() {
        let c = Criteria::new()
            .with("Organism", Criterion::one_of(["Human"]))
            .with("Mass", Criterion::range(50.0, 150.0));
        assert_eq!(run(&proteins(), c), vec![0]);
    }

    #[test]
    fn percent_range_uses_any_match() {
        let drugs = Table::from_rows(
            "drugs",
            vec!["Absorption".into()],
            vec![
                vec!["80%, 95% (reduced in renal impairment)".into()],
                vec!["Approximately 50% absorbed".into()],
                vec!["Not Available".into()],
            ],
        )
        .unwrap();
        let c = Criteria::new().with("Absorption", Criterion::range(90.0, 100.0));
        assert_eq!(evaluate(&drugs, &FieldCatalog::drug(), &c), vec![0]);
    }

    #[test]
    fn numeric_literals_match_across_int_and_float() {
        let c = Criteria::new().with("Mass", Criterion::one_of([CellValue::Float(300.0)]));
        assert_eq!(run(&proteins(), c), vec![1]);
    }

    #[test]
    fn criteria_deserialize_from_json() {
        let c: Criteria = serde_json::from_str(
            r#"{ "Organism": { "one_of": ["Human"] },
                 "Mass": { "range": { "lower": 50, "upper": 150 } } }"#,
        )
        .unwrap();
        assert_eq!(
            c,
            Criteria::new()
                .with("Organism", Criterion::one_of(["Human"]))
                .with("Mass", Criterion::range(50.0, 150.0))
        );
        assert_eq!(run(&proteins(), c.clone()), run(&proteins(), c));
    }
}
