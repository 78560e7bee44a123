//! Order store - orders and their line items in one spreadsheet
//!
//! Every operation re-reads the file. Mutations load both tables, change
//! them in memory, back up the current file, then replace it whole. There
//! is no locking: two processes saving at once lose one of the writes.

use chrono::Local;
use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::core::backup::{BackupError, BackupRotator, DEFAULT_KEEP};
use crate::core::sync::{MirrorSync, Publish, SyncOutcome};
use crate::core::workbook::{OrderTables, WorkbookError};
use crate::entities::{format_timestamp, InvalidOrder, NewOrder, Order, OrderLine, ORDER_PREFIX};

/// Errors from order store operations
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("invalid order: {0}")]
    #[diagnostic(
        code(creq::store::input),
        help("client, rack, requester and at least one item with quantity >= 1 are required")
    )]
    Input(#[from] InvalidOrder),

    #[error("order not found: {order_number}")]
    #[diagnostic(
        code(creq::store::not_found),
        help("list existing orders with `creq order list`")
    )]
    NotFound { order_number: String },

    #[error("order store error: {0}")]
    #[diagnostic(transparent)]
    Persistence(#[from] WorkbookError),

    #[error("backup failed, order store left untouched: {0}")]
    #[diagnostic(code(creq::store::backup))]
    Backup(#[from] BackupError),
}

/// Where the store and its backups live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub store: PathBuf,
    pub backup_dir: PathBuf,
    pub backup_keep: usize,
}

impl StorePaths {
    /// Store file with a `backup/` directory next to it
    pub fn beside(store: impl Into<PathBuf>) -> Self {
        let store = store.into();
        let backup_dir = store
            .parent()
            .map(|p| p.join("backup"))
            .unwrap_or_else(|| PathBuf::from("backup"));
        Self {
            store,
            backup_dir,
            backup_keep: DEFAULT_KEEP,
        }
    }
}

/// Optional filters for [`OrderStore::find_orders`]
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Case-insensitive substring of the order number
    pub number: Option<String>,
    /// Case-insensitive substring of the client
    pub client: Option<String>,
    /// Exact status label
    pub status: Option<String>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            match needle.as_deref() {
                Some(n) if !n.is_empty() => haystack.to_lowercase().contains(&n.to_lowercase()),
                _ => true,
            }
        }

        contains(&order.number, &self.number)
            && contains(&order.client, &self.client)
            && match self.status.as_deref() {
                Some(s) if !s.is_empty() => order.status == s,
                _ => true,
            }
    }
}

/// An order with its lines
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct OrderDetails {
    pub info: Order,
    #[serde(rename = "itens")]
    pub lines: Vec<OrderLine>,
    pub status: String,
}

/// How the mirror sync went after a save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// No remote configured
    Disabled,
    Synced(Publish),
    /// Non-fatal; the local save already succeeded
    Failed(String),
}

/// Receipt for a saved order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedOrder {
    pub order_number: String,
    pub sync: SyncStatus,
}

/// Next number after the last row, `REQ-001` when empty or unparsable
///
/// Falling back on a parse failure can hand out a number that is already
/// in use.
pub fn next_order_id(orders: &[Order]) -> String {
    let next = orders
        .last()
        .and_then(|last| last.number.split('-').nth(1))
        .and_then(|digits| digits.trim().parse::<u32>().ok())
        .map_or(1, |n| n.saturating_add(1));
    format!("{}-{:03}", ORDER_PREFIX, next)
}

/// The order store
pub struct OrderStore {
    paths: StorePaths,
    backups: BackupRotator,
    sync: Option<Box<dyn MirrorSync>>,
}

impl OrderStore {
    pub fn new(paths: StorePaths) -> Self {
        let backups = BackupRotator::new(paths.backup_dir.clone(), paths.backup_keep);
        Self {
            paths,
            backups,
            sync: None,
        }
    }

    /// Mirror the store after each saved order
    pub fn with_sync(mut self, sync: Box<dyn MirrorSync>) -> Self {
        self.sync = Some(sync);
        self
    }

    pub fn path(&self) -> &Path {
        &self.paths.store
    }

    pub fn backups(&self) -> &BackupRotator {
        &self.backups
    }

    fn read(&self) -> Result<OrderTables, StoreError> {
        Ok(OrderTables::read(&self.paths.store)?)
    }

    fn write(&self, tables: &OrderTables) -> Result<(), StoreError> {
        self.backups.rotate(&self.paths.store)?;
        tables.write_atomic(&self.paths.store)?;
        Ok(())
    }

    /// Number the next saved order would get
    pub fn generate_order_id(&self) -> String {
        match self.read() {
            Ok(tables) => next_order_id(&tables.orders),
            Err(e) => {
                warn!(error = %e, "Cannot read orders for numbering, starting at 1");
                next_order_id(&[])
            }
        }
    }

    /// Append an order and its lines, then sync the mirror
    ///
    /// Field validation is the caller's job (see [`NewOrder::validate`]).
    pub fn save_order(&self, order: &NewOrder) -> Result<SavedOrder, StoreError> {
        let mut tables = self.read()?;
        let number = next_order_id(&tables.orders);

        tables.orders.push(order.to_order(&number));
        tables.lines.extend(
            order
                .lines
                .iter()
                .cloned()
                .map(|line| line.into_line(&number)),
        );

        self.write(&tables)?;
        info!(order = %number, lines = order.lines.len(), client = %order.client, "Saved order");

        let sync = match &self.sync {
            None => SyncStatus::Disabled,
            Some(sync) => match sync.sync_files() {
                SyncOutcome::Synced { publish, .. } => SyncStatus::Synced(publish),
                SyncOutcome::Failed { message, .. } => {
                    warn!(order = %number, %message, "Order saved locally but mirror sync failed");
                    SyncStatus::Failed(message)
                }
            },
        };

        Ok(SavedOrder {
            order_number: number,
            sync,
        })
    }

    /// Orders matching the filter, in file order
    pub fn find_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .read()?
            .orders
            .into_iter()
            .filter(|o| filter.matches(o))
            .collect())
    }

    /// An order and its lines; the first row wins if the number repeats
    pub fn get_order_details(&self, order_number: &str) -> Result<OrderDetails, StoreError> {
        let tables = self.read()?;
        let info = tables
            .orders
            .into_iter()
            .find(|o| o.number == order_number)
            .ok_or_else(|| StoreError::NotFound {
                order_number: order_number.to_string(),
            })?;

        let lines = tables
            .lines
            .into_iter()
            .filter(|l| l.order_number == order_number)
            .collect();

        Ok(OrderDetails {
            status: info.status.clone(),
            info,
            lines,
        })
    }

    /// Overwrite status, update time and responsible of an order
    ///
    /// `new_status` is stored as given.
    pub fn update_status(
        &self,
        order_number: &str,
        new_status: &str,
        responsible: &str,
    ) -> Result<(), StoreError> {
        let mut tables = self.read()?;
        let order = tables
            .orders
            .iter_mut()
            .find(|o| o.number == order_number)
            .ok_or_else(|| StoreError::NotFound {
                order_number: order_number.to_string(),
            })?;

        order.status = new_status.to_string();
        order.last_update = format_timestamp(&Local::now().naive_local());
        order.updated_by = responsible.to_string();

        self.write(&tables)?;
        info!(order = %order_number, status = %new_status, by = %responsible, "Updated order status");
        Ok(())
    }
}
