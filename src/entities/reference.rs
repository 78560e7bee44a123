//! Reference spreadsheet rows (valid client/rack/location/cable combinations)

use serde::{Deserialize, Serialize};

/// One row of the reference spreadsheet
///
/// Rows are read once and never modified; `id` is the 1-based position of
/// the row in the sheet (header excluded, blank rows skipped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub id: usize,
    pub rack: String,
    pub cod_yazaki: String,
    pub codigo_cabo: String,
    pub seccao: String,
    pub cor: String,
    pub cliente: String,
    pub locacao: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projeto: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cod_oes: Option<String>,
}

/// Equality ignoring case, including accented letters (`LOCAÇÃO` = `locação`)
pub fn same_text(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl ReferenceItem {
    /// Case-insensitive match on client and rack
    pub fn is_in_rack(&self, client: &str, rack: &str) -> bool {
        same_text(&self.cliente, client) && same_text(&self.rack, rack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> ReferenceItem {
        ReferenceItem {
            id: 1,
            rack: "R-01".to_string(),
            cod_yazaki: "7000123".to_string(),
            codigo_cabo: "CB-10".to_string(),
            seccao: "0.5".to_string(),
            cor: "AZ".to_string(),
            cliente: "Renault".to_string(),
            locacao: "A1".to_string(),
            projeto: None,
            cod_oes: None,
        }
    }

    #[test]
    fn test_is_in_rack_ignores_case() {
        let item = item();
        assert!(item.is_in_rack("renault", "r-01"));
        assert!(!item.is_in_rack("ford", "R-01"));
        assert!(!item.is_in_rack("Renault", "R-02"));
    }

    #[test]
    fn test_same_text_folds_accents_case() {
        assert!(same_text("LOCAÇÃO 3", "Locação 3"));
        assert!(same_text("Citroën", "CITROËN"));
        assert!(!same_text("Locacao", "Locação"));
    }

    #[test]
    fn test_is_in_rack_with_accented_client() {
        let mut item = item();
        item.cliente = "Citroën".to_string();
        assert!(item.is_in_rack("CITROËN", "R-01"));
    }

    #[test]
    fn test_optional_fields_skipped_in_yaml() {
        let yaml = serde_yml::to_string(&item()).unwrap();
        assert!(!yaml.contains("projeto"));
        assert!(yaml.contains("cliente: Renault"));
    }
}
