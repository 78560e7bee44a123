//! Reference spreadsheet loading and caching
//!
//! The reference file is maintained outside this tool. It is read once per
//! path and kept in a [`ReferenceCache`]; later changes to the file are not
//! picked up until a new cache is built.

use chrono::{DateTime, Local};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::workbook::{read_sheet, WorkbookError};
use crate::entities::{same_text, ReferenceItem};

/// Default name of the sheet holding the reference rows
pub const REFERENCE_SHEET: &str = "Project";

const COL_RACK: &str = "RACK";
const COL_YAZAKI: &str = "CÓD Yazaki";
const COL_CABLE: &str = "Codigo Cabo";
const COL_SECTION: &str = "Secção";
const COL_COLOR: &str = "Cor";
const COL_CLIENT: &str = "Cliente";
const COL_LOCATION: &str = "Locação";
const COL_PROJECT: &str = "Projeto";
const COL_OES: &str = "Cod OES";

const REQUIRED_COLUMNS: [&str; 7] = [
    COL_RACK,
    COL_YAZAKI,
    COL_CABLE,
    COL_SECTION,
    COL_COLOR,
    COL_CLIENT,
    COL_LOCATION,
];

/// Errors loading the reference spreadsheet
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("cannot read reference file {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("reference file {path} has no sheet named '{sheet}'")]
    MissingSheet { path: PathBuf, sheet: String },

    #[error("reference file {path} is missing column '{column}'")]
    MissingColumn { path: PathBuf, column: String },
}

/// Read every row of the reference sheet
///
/// Text is trimmed, missing cells become `""`, and each kept row gets a
/// 1-based id following sheet order.
pub fn load_reference(path: &Path, sheet: &str) -> Result<Vec<ReferenceItem>, ReferenceError> {
    let table = read_sheet(path, sheet).map_err(|e| match e {
        WorkbookError::MissingSheet { path, sheet } => ReferenceError::MissingSheet { path, sheet },
        other => ReferenceError::Io {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    })?;

    if let Some(column) = REQUIRED_COLUMNS
        .iter()
        .find(|c| table.column(c).is_none())
    {
        return Err(ReferenceError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        });
    }

    let text = |row: &[String], col: &str| table.value(row, col).trim().to_string();
    let optional = |row: &[String], col: &str| {
        let value = table.value(row, col).trim();
        (!value.is_empty()).then(|| value.to_string())
    };

    let items: Vec<ReferenceItem> = table
        .rows()
        .iter()
        .enumerate()
        .map(|(idx, row)| ReferenceItem {
            id: idx + 1,
            rack: text(row, COL_RACK),
            cod_yazaki: text(row, COL_YAZAKI),
            codigo_cabo: text(row, COL_CABLE),
            seccao: text(row, COL_SECTION),
            cor: text(row, COL_COLOR),
            cliente: text(row, COL_CLIENT),
            locacao: text(row, COL_LOCATION),
            projeto: optional(row, COL_PROJECT),
            cod_oes: optional(row, COL_OES),
        })
        .collect();

    info!(path = %path.display(), rows = items.len(), "Loaded reference spreadsheet");
    Ok(items)
}

/// A cached reference load
#[derive(Debug, Clone)]
pub struct CachedReference {
    pub items: Arc<Vec<ReferenceItem>>,
    pub loaded_at: DateTime<Local>,
}

/// Per-path memo of reference loads
#[derive(Debug)]
pub struct ReferenceCache {
    sheet: String,
    entries: HashMap<PathBuf, CachedReference>,
}

impl Default for ReferenceCache {
    fn default() -> Self {
        Self::new(REFERENCE_SHEET)
    }
}

impl ReferenceCache {
    pub fn new(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            entries: HashMap::new(),
        }
    }

    /// Return the cached rows for `path`, loading the file on first use
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<Vec<ReferenceItem>>, ReferenceError> {
        if let Some(cached) = self.entries.get(path) {
            debug!(path = %path.display(), "Reference cache hit");
            return Ok(Arc::clone(&cached.items));
        }

        let items = Arc::new(load_reference(path, &self.sheet)?);
        self.entries.insert(
            path.to_path_buf(),
            CachedReference {
                items: Arc::clone(&items),
                loaded_at: Local::now(),
            },
        );
        Ok(items)
    }

    /// When `path` was loaded, if it is cached
    pub fn loaded_at(&self, path: &Path) -> Option<DateTime<Local>> {
        self.entries.get(path).map(|c| c.loaded_at)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Distinct clients, sorted
pub fn clients(items: &[ReferenceItem]) -> Vec<String> {
    items
        .iter()
        .filter(|i| !i.cliente.is_empty())
        .map(|i| i.cliente.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct racks of a client (case-insensitive), sorted
pub fn racks(items: &[ReferenceItem], client: &str) -> Vec<String> {
    items
        .iter()
        .filter(|i| same_text(&i.cliente, client) && !i.rack.is_empty())
        .map(|i| i.rack.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Locations of a client's rack in sheet order
pub fn locations<'a>(items: &'a [ReferenceItem], client: &str, rack: &str) -> Vec<&'a str> {
    items
        .iter()
        .filter(|i| i.is_in_rack(client, rack))
        .map(|i| i.locacao.as_str())
        .collect()
}

/// Rows matching the given client and/or rack (case-insensitive equality)
pub fn filter<'a>(
    items: &'a [ReferenceItem],
    client: Option<&str>,
    rack: Option<&str>,
) -> Vec<&'a ReferenceItem> {
    items
        .iter()
        .filter(|i| client.map_or(true, |c| same_text(&i.cliente, c)))
        .filter(|i| rack.map_or(true, |r| same_text(&i.rack, r)))
        .collect()
}

pub fn find_by_id(items: &[ReferenceItem], id: usize) -> Option<&ReferenceItem> {
    items.iter().find(|i| i.id == id)
}

/// First row at the given client, rack and location
pub fn find_location<'a>(
    items: &'a [ReferenceItem],
    client: &str,
    rack: &str,
    location: &str,
) -> Option<&'a ReferenceItem> {
    items
        .iter()
        .find(|i| i.is_in_rack(client, rack) && same_text(&i.locacao, location))
}
