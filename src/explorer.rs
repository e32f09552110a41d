use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info};

use crate::config::EngineConfig;
use crate::data::domain::{self, Domains};
use crate::data::filter::{self, Criteria};
use crate::data::loader::load_file;
use crate::data::model::{Table, TableId};
use crate::data::project::{self, Projection};
use crate::data::xref::{self, DrugIndex};
use crate::error::{EngineError, Result};

// ---------------------------------------------------------------------------
// Explorer: the operation surface for presentation layers
// ---------------------------------------------------------------------------

/// Both loaded tables plus everything derived from them once.
///
/// Cloning is cheap and shares the tables. Nothing here is mutated after
/// construction; to pick up new source files build a fresh `Explorer`
/// (see [`reload`](Self::reload)) and swap it in.
#[derive(Debug, Clone)]
pub struct Explorer {
    config: Arc<EngineConfig>,
    protein: Arc<Table>,
    drug: Arc<Table>,
    drug_index: Arc<DrugIndex>,
}

impl Explorer {
    /// Load both tables from the paths in `config`.
    pub fn load_tables(config: EngineConfig) -> Result<Self> {
        let load = |id: TableId| {
            load_file(config.tables.path(id)).map_err(|source| EngineError::Load { table: id, source })
        };
        let protein = load(TableId::Protein)?;
        let drug = load(TableId::Drug)?;
        Ok(Self::from_tables(protein, drug, config))
    }

    /// Wrap already loaded tables.
    pub fn from_tables(protein: Table, drug: Table, config: EngineConfig) -> Self {
        let drug_index = DrugIndex::build(&drug, &config.cross_reference);
        info!(
            "Explorer ready: {} proteins, {} drugs",
            protein.len(),
            drug.len()
        );
        Explorer {
            config: Arc::new(config),
            protein: Arc::new(protein),
            drug: Arc::new(drug),
            drug_index: Arc::new(drug_index),
        }
    }

    /// Load the configured sources again into a new, independent explorer.
    pub fn reload(&self) -> Result<Self> {
        Self::load_tables(EngineConfig::clone(&self.config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn table(&self, id: TableId) -> &Table {
        match id {
            TableId::Protein => &self.protein,
            TableId::Drug => &self.drug,
        }
    }

    /// Legal filter operands for `fields` of one table.
    pub fn extract_domains<S: AsRef<str>>(&self, id: TableId, fields: &[S]) -> Result<Domains> {
        let domains = domain::extract_domains(
            self.table(id),
            &self.config.catalog(id),
            fields,
            &self.config.domain_settings(),
        )?;
        Ok(domains)
    }

    /// Ascending row positions of `id` satisfying all `criteria`.
    pub fn filter(&self, id: TableId, criteria: &Criteria) -> Vec<usize> {
        let rows = filter::evaluate(self.table(id), &self.config.catalog(id), criteria);
        debug!("{id} filter kept {} of {} rows", rows.len(), self.table(id).len());
        rows
    }

    /// Drug rows referenced by one protein row.
    pub fn resolve_cross_reference(&self, protein_row: usize) -> Result<Vec<usize>> {
        self.check_row(TableId::Protein, protein_row)?;
        Ok(self
            .drug_index
            .resolve(protein_row, &self.protein, &self.config.cross_reference))
    }

    /// Every referencing protein row → its drug rows. Rows without a
    /// reference field are omitted.
    pub fn resolve_all(&self) -> Result<BTreeMap<usize, Vec<usize>>> {
        xref::require_references(&self.protein, &self.config.cross_reference)?;
        Ok(self
            .drug_index
            .resolve_all(&self.protein, &self.config.cross_reference))
    }

    /// Bridge protein filter results into the drug table: the union of the
    /// drug rows referenced by `protein_rows`, first-match order.
    pub fn drugs_for_proteins(&self, protein_rows: &[usize]) -> Result<Vec<usize>> {
        let mut drugs: Vec<usize> = Vec::new();
        for &row in protein_rows {
            for drug in self.resolve_cross_reference(row)? {
                if !drugs.contains(&drug) {
                    drugs.push(drug);
                }
            }
        }
        Ok(drugs)
    }

    /// Columnar values of `fields` at `rows`, in the order of `rows`.
    pub fn project<S: AsRef<str>>(&self, id: TableId, rows: &[usize], fields: &[S]) -> Result<Projection> {
        project::project(self.table(id), rows, fields)
    }

    fn check_row(&self, id: TableId, row: usize) -> Result<()> {
        let table = self.table(id);
        if row < table.len() {
            Ok(())
        } else {
            Err(EngineError::RowOutOfRange {
                table: table.label().to_string(),
                row,
                len: table.len(),
            })
        }
    }
}
