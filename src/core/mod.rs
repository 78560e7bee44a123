//! Core module - spreadsheets, persistence and synchronization

pub mod backup;
pub mod config;
pub mod git;
pub mod logging;
pub mod project;
pub mod reference;
pub mod retry;
pub mod store;
pub mod sync;
pub mod workbook;
pub mod workspace;

pub use backup::{BackupEntry, BackupError, BackupRotator, Rotation};
pub use config::Config;
pub use git::{Git, GitError, GitIdentity};
pub use project::{Project, ProjectError};
pub use reference::{load_reference, ReferenceCache, ReferenceError};
pub use retry::{with_retry, RetryOutcome, RetryPolicy, Sleeper, ThreadSleeper};
pub use store::{
    OrderDetails, OrderFilter, OrderStore, SavedOrder, StoreError, StorePaths, SyncStatus,
};
pub use sync::{GitMirror, ManagedFile, MirrorBackend, MirrorSync, Publish, RemoteSync, SyncError, SyncOutcome};
pub use workbook::{OrderTables, WorkbookError};
pub use workspace::Workspace;
