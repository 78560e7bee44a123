//! Order and order line entities
//!
//! Field names serialize to the column headers of the order store so that
//! JSON/YAML output lines up with the spreadsheet.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::entities::reference::{same_text, ReferenceItem};

/// Timestamp layout used for `Data` and `Ultima_Atualizacao`
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Prefix of every order number
pub const ORDER_PREFIX: &str = "REQ";

/// Format a timestamp the way the order store keeps it
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Order status labels as stored in the `Status` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Em Processamento")]
    InProcessing,
    #[serde(rename = "Concluído")]
    Completed,
    /// Legacy value, not produced by current flows
    #[serde(rename = "Aceito")]
    Accepted,
    /// Legacy value, not produced by current flows
    #[serde(rename = "Em Preparação")]
    InPreparation,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pendente",
            OrderStatus::InProcessing => "Em Processamento",
            OrderStatus::Completed => "Concluído",
            OrderStatus::Accepted => "Aceito",
            OrderStatus::InPreparation => "Em Preparação",
        }
    }

    /// Statuses offered by the current flows
    pub fn current() -> &'static [OrderStatus] {
        &[
            OrderStatus::Pending,
            OrderStatus::InProcessing,
            OrderStatus::Completed,
        ]
    }

    pub fn all() -> &'static [OrderStatus] {
        &[
            OrderStatus::Pending,
            OrderStatus::InProcessing,
            OrderStatus::Completed,
            OrderStatus::Accepted,
            OrderStatus::InPreparation,
        ]
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = InvalidOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        OrderStatus::all()
            .iter()
            .copied()
            .find(|status| same_text(status.as_str(), s))
            .ok_or_else(|| InvalidOrder::UnknownStatus(s.to_string()))
    }
}

/// One row of the `Pedidos` sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "Numero_Pedido")]
    pub number: String,

    #[serde(rename = "Data")]
    pub created: String,

    #[serde(rename = "Cliente")]
    pub client: String,

    #[serde(rename = "RACK")]
    pub rack: String,

    #[serde(rename = "Localizacao")]
    pub location: String,

    #[serde(rename = "Solicitante")]
    pub requester: String,

    #[serde(rename = "Observacoes")]
    pub notes: String,

    /// Free text; the store does not restrict it to [`OrderStatus`] labels
    #[serde(rename = "Status")]
    pub status: String,

    #[serde(rename = "Ultima_Atualizacao")]
    pub last_update: String,

    #[serde(rename = "Responsavel_Atualizacao")]
    pub updated_by: String,
}

/// One row of the `Itens` sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(rename = "Numero_Pedido")]
    pub order_number: String,
    pub cod_yazaki: String,
    pub codigo_cabo: String,
    pub seccao: String,
    pub cor: String,
    #[serde(rename = "quantidade")]
    pub quantity: u32,
}

/// A requested line before it is assigned to an order number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub cod_yazaki: String,
    pub codigo_cabo: String,
    pub seccao: String,
    pub cor: String,
    pub quantity: u32,
}

impl NewOrderLine {
    /// Build a line from a reference row
    pub fn from_reference(item: &ReferenceItem, quantity: u32) -> Self {
        Self {
            cod_yazaki: item.cod_yazaki.clone(),
            codigo_cabo: item.codigo_cabo.clone(),
            seccao: item.seccao.clone(),
            cor: item.cor.clone(),
            quantity,
        }
    }

    pub fn into_line(self, order_number: &str) -> OrderLine {
        OrderLine {
            order_number: order_number.to_string(),
            cod_yazaki: self.cod_yazaki,
            codigo_cabo: self.codigo_cabo,
            seccao: self.seccao,
            cor: self.cor,
            quantity: self.quantity,
        }
    }
}

/// Order information submitted by the requester
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub created: NaiveDateTime,
    pub client: String,
    pub rack: String,
    pub location: String,
    pub requester: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub lines: Vec<NewOrderLine>,
}

impl NewOrder {
    /// Check the fields a requester must fill in
    pub fn validate(&self) -> Result<(), InvalidOrder> {
        for (field, value) in [
            ("client", &self.client),
            ("rack", &self.rack),
            ("requester", &self.requester),
        ] {
            if value.trim().is_empty() {
                return Err(InvalidOrder::MissingField(field));
            }
        }

        if self.lines.is_empty() {
            return Err(InvalidOrder::NoLines);
        }

        if let Some(pos) = self.lines.iter().position(|l| l.quantity == 0) {
            return Err(InvalidOrder::ZeroQuantity { line: pos + 1 });
        }

        Ok(())
    }

    /// Build the `Pedidos` row for this order
    pub fn to_order(&self, number: &str) -> Order {
        Order {
            number: number.to_string(),
            created: format_timestamp(&self.created),
            client: self.client.clone(),
            rack: self.rack.clone(),
            location: self.location.clone(),
            requester: self.requester.clone(),
            notes: self.notes.clone().unwrap_or_default(),
            status: OrderStatus::Pending.to_string(),
            last_update: String::new(),
            updated_by: String::new(),
        }
    }
}

/// Problems with a submitted order
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidOrder {
    #[error("required field '{0}' is empty")]
    MissingField(&'static str),

    #[error("an order needs at least one line item")]
    NoLines,

    #[error("line {line} has quantity 0 (must be at least 1)")]
    ZeroQuantity { line: usize },

    #[error("unknown status '{0}'")]
    UnknownStatus(String),
}
