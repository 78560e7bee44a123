//! Spreadsheet codec for the order store
//!
//! The store is one `.xlsx` file with two sheets, `Pedidos` and `Itens`.
//! Reading maps columns by header name; writing always emits the full
//! column set and replaces the file through a temp file + rename.

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::NaiveDateTime;
use miette::Diagnostic;
use rust_xlsxwriter::{Workbook, XlsxError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::entities::{Order, OrderLine, TIMESTAMP_FORMAT};

pub const ORDERS_SHEET: &str = "Pedidos";
pub const LINES_SHEET: &str = "Itens";

pub const ORDER_COLUMNS: [&str; 10] = [
    "Numero_Pedido",
    "Data",
    "Cliente",
    "RACK",
    "Localizacao",
    "Solicitante",
    "Observacoes",
    "Status",
    "Ultima_Atualizacao",
    "Responsavel_Atualizacao",
];

pub const LINE_COLUMNS: [&str; 6] = [
    "Numero_Pedido",
    "cod_yazaki",
    "codigo_cabo",
    "seccao",
    "cor",
    "quantidade",
];

/// Errors reading or writing spreadsheet files
#[derive(Debug, Error, Diagnostic)]
pub enum WorkbookError {
    #[error("cannot open {path}: {message}")]
    #[diagnostic(code(creq::workbook::open))]
    Open { path: PathBuf, message: String },

    #[error("sheet '{sheet}' not found in {path}")]
    #[diagnostic(code(creq::workbook::missing_sheet))]
    MissingSheet { path: PathBuf, sheet: String },

    #[error("invalid value '{value}' in column '{column}' of sheet '{sheet}' (row {row})")]
    #[diagnostic(
        code(creq::workbook::invalid_cell),
        help("enter a whole number in '{column}' at row {row} of '{sheet}', or roll back with `creq backup restore`")
    )]
    InvalidCell {
        sheet: String,
        column: String,
        row: usize,
        value: String,
    },

    #[error("cannot write {path}: {message}")]
    #[diagnostic(code(creq::workbook::write))]
    Write { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(creq::workbook::io))]
    Io(#[from] std::io::Error),
}

/// Render a cell as text; empty cells become `""`
///
/// Whole floats drop their fractional part so codes typed as numbers in
/// Excel (`7000123`) come back as `"7000123"` rather than `"7000123.0"`.
/// Date cells use the store's `dd/mm/yyyy HH:MM` format.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) if !dt.is_duration() => match dt.as_datetime() {
            Some(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
            None => dt.to_string(),
        },
        Data::DateTimeIso(s) => match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            Ok(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
            Err(_) => s.clone(),
        },
        other => other.to_string(),
    }
}

/// A sheet read as text, with its header row split off
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SheetTable {
    /// Build a table from a calamine range; the first row is the header
    pub fn from_range(range: &Range<Data>) -> Self {
        let mut iter = range.rows();
        let headers = iter
            .next()
            .map(|row| row.iter().map(|c| cell_text(c).trim().to_string()).collect())
            .unwrap_or_default();

        let rows = iter
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
            .collect();

        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Index of a column by header name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Value of a named column in a row, `""` when the column is absent
    pub fn value<'a>(&self, row: &'a [String], name: &str) -> &'a str {
        self.column(name)
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}

fn open_xlsx(path: &Path) -> Result<Xlsx<std::io::BufReader<fs::File>>, WorkbookError> {
    open_workbook(path).map_err(|e: calamine::XlsxError| WorkbookError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn sheet_from(
    workbook: &mut Xlsx<std::io::BufReader<fs::File>>,
    path: &Path,
    sheet: &str,
) -> Result<SheetTable, WorkbookError> {
    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(WorkbookError::MissingSheet {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
        });
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| WorkbookError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(SheetTable::from_range(&range))
}

/// Read one sheet of an `.xlsx` file
pub fn read_sheet(path: &Path, sheet: &str) -> Result<SheetTable, WorkbookError> {
    let mut workbook = open_xlsx(path)?;
    sheet_from(&mut workbook, path, sheet)
}

/// Both tables of the order store, held fully in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderTables {
    pub orders: Vec<Order>,
    pub lines: Vec<OrderLine>,
}

impl OrderTables {
    /// Read the store; a missing file is an empty store
    pub fn read(path: &Path) -> Result<Self, WorkbookError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let mut workbook = open_xlsx(path)?;
        let orders_table = sheet_from(&mut workbook, path, ORDERS_SHEET)?;
        let lines_table = sheet_from(&mut workbook, path, LINES_SHEET)?;

        let orders = orders_table
            .rows()
            .iter()
            .map(|row| Order {
                number: orders_table.value(row, "Numero_Pedido").to_string(),
                created: orders_table.value(row, "Data").to_string(),
                client: orders_table.value(row, "Cliente").to_string(),
                rack: orders_table.value(row, "RACK").to_string(),
                location: orders_table.value(row, "Localizacao").to_string(),
                requester: orders_table.value(row, "Solicitante").to_string(),
                notes: orders_table.value(row, "Observacoes").to_string(),
                status: orders_table.value(row, "Status").to_string(),
                last_update: orders_table.value(row, "Ultima_Atualizacao").to_string(),
                updated_by: orders_table.value(row, "Responsavel_Atualizacao").to_string(),
            })
            .collect();

        let mut lines = Vec::with_capacity(lines_table.rows().len());
        for (idx, row) in lines_table.rows().iter().enumerate() {
            let raw_qty = lines_table.value(row, "quantidade").trim();
            let quantity = raw_qty
                .parse::<u32>()
                .map_err(|_| WorkbookError::InvalidCell {
                    sheet: LINES_SHEET.to_string(),
                    column: "quantidade".to_string(),
                    row: idx + 2,
                    value: raw_qty.to_string(),
                })?;

            lines.push(OrderLine {
                order_number: lines_table.value(row, "Numero_Pedido").to_string(),
                cod_yazaki: lines_table.value(row, "cod_yazaki").to_string(),
                codigo_cabo: lines_table.value(row, "codigo_cabo").to_string(),
                seccao: lines_table.value(row, "seccao").to_string(),
                cor: lines_table.value(row, "cor").to_string(),
                quantity,
            });
        }

        Ok(Self { orders, lines })
    }

    /// Encode both sheets into an in-memory `.xlsx`
    pub fn to_xlsx_bytes(&self) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();

        let sheet = workbook.add_worksheet();
        sheet.set_name(ORDERS_SHEET)?;
        for (col, header) in ORDER_COLUMNS.iter().enumerate() {
            sheet.write_string(0, col as u16, *header)?;
        }
        for (idx, order) in self.orders.iter().enumerate() {
            let row = (idx + 1) as u32;
            let values = [
                &order.number,
                &order.created,
                &order.client,
                &order.rack,
                &order.location,
                &order.requester,
                &order.notes,
                &order.status,
                &order.last_update,
                &order.updated_by,
            ];
            for (col, value) in values.iter().enumerate() {
                if !value.is_empty() {
                    sheet.write_string(row, col as u16, value.as_str())?;
                }
            }
        }

        let sheet = workbook.add_worksheet();
        sheet.set_name(LINES_SHEET)?;
        for (col, header) in LINE_COLUMNS.iter().enumerate() {
            sheet.write_string(0, col as u16, *header)?;
        }
        for (idx, line) in self.lines.iter().enumerate() {
            let row = (idx + 1) as u32;
            let values = [
                &line.order_number,
                &line.cod_yazaki,
                &line.codigo_cabo,
                &line.seccao,
                &line.cor,
            ];
            for (col, value) in values.iter().enumerate() {
                if !value.is_empty() {
                    sheet.write_string(row, col as u16, value.as_str())?;
                }
            }
            sheet.write_number(row, 5, f64::from(line.quantity))?;
        }

        workbook.save_to_buffer()
    }

    /// Replace the store file with these tables
    ///
    /// The workbook is written next to the target and renamed over it, so a
    /// failure never leaves a half-written store behind.
    pub fn write_atomic(&self, path: &Path) -> Result<(), WorkbookError> {
        let bytes = self.to_xlsx_bytes().map_err(|e| WorkbookError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = temp_path(path);
        fs::write(&tmp, &bytes)?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(WorkbookError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            });
        }

        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "store.xlsx".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
