use std::collections::BTreeMap;

use super::model::{CellValue, Table};
use crate::error::{EngineError, UnknownFieldError};

/// Column-oriented result: field → values, index-aligned with the requested rows.
pub type Projection = BTreeMap<String, Vec<CellValue>>;

/// Materialise `fields` at `rows`, keeping the order of `rows` (duplicates included).
///
/// Missing cells come back as [`CellValue::Null`]. Every field is validated
/// before any value is copied.
pub fn project<S: AsRef<str>>(table: &Table, rows: &[usize], fields: &[S]) -> Result<Projection, EngineError> {
    let columns = fields
        .iter()
        .map(|f| {
            table.column(f.as_ref()).ok_or_else(|| UnknownFieldError {
                table: table.label().to_string(),
                field: f.as_ref().to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(&row) = rows.iter().find(|&&r| r >= table.len()) {
        return Err(EngineError::RowOutOfRange {
            table: table.label().to_string(),
            row,
            len: table.len(),
        });
    }

    Ok(columns
        .into_iter()
        .map(|col| {
            let values = rows.iter().map(|&r| col.values[r].clone()).collect();
            (col.name.clone(), values)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drugs() -> Table {
        let names = ["A", "B", "C", "D", "E", "F", "G", "H"];
        Table::from_rows(
            "drugs",
            vec!["Name".into(), "UNII".into()],
            names
                .iter()
                .enumerate()
                .map(|(i, n)| {
                    let unii = if i % 2 == 0 { CellValue::Null } else { CellValue::from(format!("U{i}")) };
                    vec![CellValue::from(*n), unii]
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn values_follow_requested_row_order() {
        let p = project(&drugs(), &[3, 1, 7], &["Name"]).unwrap();
        assert_eq!(p["Name"], vec![CellValue::from("D"), CellValue::from("B"), CellValue::from("H")]);
    }

    #[test]
    fn missing_cells_stay_null() {
        let p = project(&drugs(), &[0, 1], &["UNII", "Name"]).unwrap();
        assert_eq!(p["UNII"], vec![CellValue::Null, CellValue::from("U1")]);
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn unknown_field_is_an_error() {
        let err = project(&drugs(), &[0], &["Name", "Nmae"]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnknownField(UnknownFieldError { ref field, .. }) if field == "Nmae"
        ));
    }

    #[test]
    fn out_of_range_row_is_an_error() {
        let err = project(&drugs(), &[2, 8], &["Name"]).unwrap_err();
        assert!(matches!(err, EngineError::RowOutOfRange { row: 8, len: 8, .. }));
    }

    #[test]
    fn empty_row_list_gives_empty_columns() {
        let p = project(&drugs(), &[], &["Name"]).unwrap();
        assert_eq!(p["Name"], Vec::<CellValue>::new());
    }
}
