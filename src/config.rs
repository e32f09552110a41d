use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::data::domain::DomainSettings;
use crate::data::fields::{FieldCatalog, FieldKind};
use crate::data::model::TableId;
use crate::data::xref::XrefSettings;
use crate::error::ConfigError;

/// Engine configuration, usually read from a TOML file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub tables: TablePaths,
    pub cross_reference: XrefSettings,
    pub domains: DomainConfig,
    pub fields: FieldOverrides,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TablePaths {
    pub protein: PathBuf,
    pub drug: PathBuf,
}

impl Default for TablePaths {
    fn default() -> Self {
        TablePaths {
            protein: PathBuf::from("data/uniprot.csv"),
            drug: PathBuf::from("data/drugbank_data.csv"),
        }
    }
}

impl TablePaths {
    pub fn path(&self, id: TableId) -> &Path {
        match id {
            TableId::Protein => &self.protein,
            TableId::Drug => &self.drug,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DomainConfig {
    pub percent_default_range: [f64; 2],
}

impl Default for DomainConfig {
    fn default() -> Self {
        DomainConfig {
            percent_default_range: [0.0, 100.0],
        }
    }
}

impl From<DomainConfig> for DomainSettings {
    fn from(c: DomainConfig) -> Self {
        let [min, max] = c.percent_default_range;
        DomainSettings {
            percent_default_range: (min, max),
        }
    }
}

/// Per-table [`FieldKind`] overrides layered on the built-in catalogs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldOverrides {
    pub protein: BTreeMap<String, FieldKind>,
    pub drug: BTreeMap<String, FieldKind>,
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Built-in catalog of `id` with the configured overrides applied.
    pub fn catalog(&self, id: TableId) -> FieldCatalog {
        let overrides = match id {
            TableId::Protein => &self.fields.protein,
            TableId::Drug => &self.fields.drug,
        };
        FieldCatalog::for_table(id).with_overrides(overrides)
    }

    pub fn domain_settings(&self) -> DomainSettings {
        self.domains.into()
    }
}
