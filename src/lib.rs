//! creq: cable requisition orders
//!
//! Records rack cable orders against a reference spreadsheet, keeps them in
//! an order workbook with rotating backups, and mirrors both files to a git
//! remote.

pub mod cli;
pub mod core;
pub mod entities;
