use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::TableId;

/// How a column is interpreted by domain extraction and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Plain numbers; filtered by inclusive range.
    Numeric,
    /// A small set of literal values; filtered by set membership.
    Categorical,
    /// Several whitespace-separated tokens per cell (e.g. gene names).
    MultiToken,
    /// Arbitrary text; filtered by substring query.
    FreeText,
    /// Text embedding percentages such as `"87% absorbed"`.
    Percent,
    /// Text embedding quoted identifiers of another table.
    Reference,
}

/// UniProt columns and their kinds.
const PROTEIN_FIELDS: &[(&str, FieldKind)] = &[
    ("Entry", FieldKind::FreeText),
    ("Entry Name", FieldKind::FreeText),
    ("Protein names", FieldKind::FreeText),
    ("Gene Names", FieldKind::MultiToken),
    ("Organism", FieldKind::Categorical),
    ("Sequence", FieldKind::FreeText),
    ("Length", FieldKind::Numeric),
    ("Mass", FieldKind::Numeric),
    ("Tissue specificity", FieldKind::FreeText),
    ("Subcellular location", FieldKind::Categorical),
    ("Function", FieldKind::FreeText),
    ("Involvement in disease", FieldKind::FreeText),
    ("Mutagenesis", FieldKind::FreeText),
    ("PubMed ID", FieldKind::FreeText),
    ("PDB", FieldKind::FreeText),
    ("AlphaFoldDB", FieldKind::FreeText),
    ("DrugBank-reference", FieldKind::Reference),
];

/// DrugBank columns and their kinds.
const DRUG_FIELDS: &[(&str, FieldKind)] = &[
    ("DrugBank ID", FieldKind::Categorical),
    ("Name", FieldKind::FreeText),
    ("Type", FieldKind::Categorical),
    ("Groups", FieldKind::Categorical),
    ("Description", FieldKind::FreeText),
    ("Synonyms", FieldKind::MultiToken),
    ("Absorption", FieldKind::Percent),
    ("Protein Binding", FieldKind::Percent),
    ("Molecular Weight", FieldKind::Numeric),
    ("Chemical Formula", FieldKind::FreeText),
    ("IUPAC Name", FieldKind::FreeText),
    ("CAS Number", FieldKind::FreeText),
    ("InChIKey", FieldKind::FreeText),
    ("UNII", FieldKind::FreeText),
    ("Patents", FieldKind::FreeText),
    ("Spectra", FieldKind::FreeText),
];

/// Static per-field type table of one dataset.
///
/// Columns not listed are treated as [`FieldKind::Categorical`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCatalog {
    kinds: BTreeMap<String, FieldKind>,
}

impl FieldCatalog {
    pub fn new(kinds: impl IntoIterator<Item = (String, FieldKind)>) -> Self {
        FieldCatalog {
            kinds: kinds.into_iter().collect(),
        }
    }

    pub fn protein() -> Self {
        Self::from_static(PROTEIN_FIELDS)
    }

    pub fn drug() -> Self {
        Self::from_static(DRUG_FIELDS)
    }

    pub fn for_table(id: TableId) -> Self {
        match id {
            TableId::Protein => Self::protein(),
            TableId::Drug => Self::drug(),
        }
    }

    fn from_static(fields: &[(&str, FieldKind)]) -> Self {
        Self::new(fields.iter().map(|(name, kind)| (name.to_string(), *kind)))
    }

    /// Replace or add kinds, e.g. from the configuration file.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, FieldKind>) -> Self {
        for (name, kind) in overrides {
            self.kinds.insert(name.clone(), *kind);
        }
        self
    }

    pub fn kind_of(&self, field: &str) -> FieldKind {
        self.kinds
            .get(field)
            .copied()
            .unwrap_or(FieldKind::Categorical)
    }

    /// Registered field names, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_cover_the_filterable_columns() {
        let protein = FieldCatalog::protein();
        assert_eq!(protein.kind_of("Gene Names"), FieldKind::MultiToken);
        assert_eq!(protein.kind_of("Mass"), FieldKind::Numeric);
        assert_eq!(protein.kind_of("DrugBank-reference"), FieldKind::Reference);

        let drug = FieldCatalog::for_table(TableId::Drug);
        assert_eq!(drug.kind_of("Absorption"), FieldKind::Percent);
        assert_eq!(drug.kind_of("Type"), FieldKind::Categorical);
    }

    #[test]
    fn unlisted_fields_default_to_categorical_and_overrides_win() {
        let overrides = BTreeMap::from([
            ("Annotation".to_string(), FieldKind::Numeric),
            ("Organism".to_string(), FieldKind::FreeText),
        ]);
        let catalog = FieldCatalog::protein();
        assert_eq!(catalog.kind_of("Annotation"), FieldKind::Categorical);

        let catalog = catalog.with_overrides(&overrides);
        assert_eq!(catalog.kind_of("Annotation"), FieldKind::Numeric);
        assert_eq!(catalog.kind_of("Organism"), FieldKind::FreeText);
    }
}
