// src/config.rs

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};
use tracing::debug;

use crate::error::{BulletinError, Result};
use crate::process::reader::column_index;
use crate::schema::Regime;

/// Field names used by the bulletin tables and every export.
pub mod fields {
    pub const ID: &str = "unidadeId";
    pub const NAME: &str = "unidadeNome";
    pub const LOCALITY: &str = "unidadeLocalidade";
    pub const FACILITY_TYPE: &str = "unidadeTipo";
    pub const ABBREVIATION: &str = "unidadeSigla";
    pub const REGIME: &str = "efetivoRegime";
    pub const GENDER: &str = "efetivoGenero";
    pub const CAPACITY_ORIGINAL: &str = "capacidadeOriginal";
    pub const CAPACITY_UNHEALTHY: &str = "capacidadeInospito";
    pub const CAPACITY_CURRENT: &str = "capacidadeAtual";
    pub const NOMINAL: &str = "efetivoNominal";
    pub const DISCHARGED: &str = "efetivoBaixados";
    pub const SAFEGUARDED: &str = "efetivoAcautelado";
    pub const ACTUAL: &str = "efetivoReal";
    pub const EXCESS: &str = "excesso";
    pub const VACANCIES: &str = "vagas";

    /// Fields the normalizer reads; a mapping lacking any of them is rejected.
    pub const REQUIRED: &[&str] = &[
        ID,
        NAME,
        LOCALITY,
        REGIME,
        CAPACITY_ORIGINAL,
        CAPACITY_UNHEALTHY,
        CAPACITY_CURRENT,
        NOMINAL,
        DISCHARGED,
        SAFEGUARDED,
        ACTUAL,
    ];
}

/// Default attribution stamped on document-store records.
pub const SEAP_SOURCE: &str =
    "Secretaria de Estado de Administração Penitenciária do Rio de Janeiro";

/// Maps one spreadsheet column letter to a field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub column: String,
    pub field: String,
}

impl ColumnMapping {
    pub fn new(column: &str, field: &str) -> Self {
        Self {
            column: column.to_string(),
            field: field.to_string(),
        }
    }
}

/// Literal id-column texts that open each subtotal section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMarkers {
    pub female: String,
    /// Spelled as in the published bulletins, typo included.
    pub shelter: String,
    pub hospital: String,
}

impl Default for SectionMarkers {
    fn default() -> Self {
        Self {
            female: "UNIDADES FEMININAS".to_string(),
            shelter: "CASA DO ALBERGARDO".to_string(),
            hospital: "UNIDADES HOSPITALARES".to_string(),
        }
    }
}

/// Layout and vocabulary of one bulletin family.
///
/// `Default` describes the SEAP/RJ weekly custody bulletin. Any subset of the
/// fields can be overridden from YAML:
///
/// ```yaml
/// sheet_name: Efetivo Completo
/// data_start_row: 8
/// regimes:
///   "Med. de Seg.": Medidas de Segurança
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletinConfig {
    pub sheet_name: String,
    /// Zero-based sheet row holding the free-text date statement.
    pub date_row: u32,
    /// Zero-based sheet row where facility rows begin.
    pub data_start_row: u32,
    pub columns: Vec<ColumnMapping>,
    pub markers: SectionMarkers,
    /// Raw regime label → standardized regime. Labels not listed here become
    /// `Não Informado`.
    pub regimes: BTreeMap<String, Regime>,
    pub source_name: String,
}

impl Default for BulletinConfig {
    fn default() -> Self {
        let columns = vec![
            ColumnMapping::new("A", fields::ID),
            ColumnMapping::new("B", fields::NAME),
            ColumnMapping::new("C", fields::LOCALITY),
            ColumnMapping::new("D", fields::REGIME),
            // column E is merged into D
            ColumnMapping::new("F", fields::CAPACITY_ORIGINAL),
            ColumnMapping::new("G", fields::CAPACITY_UNHEALTHY),
            ColumnMapping::new("H", fields::CAPACITY_CURRENT),
            ColumnMapping::new("I", fields::NOMINAL),
            ColumnMapping::new("J", fields::DISCHARGED),
            ColumnMapping::new("K", fields::SAFEGUARDED),
            ColumnMapping::new("L", fields::ACTUAL),
            ColumnMapping::new("M", fields::EXCESS),
            ColumnMapping::new("N", fields::VACANCIES),
        ];

        let regimes = [
            ("Aberto", Regime::Open),
            ("Fechado", Regime::Closed),
            ("Med. de Seg.", Regime::SecurityMeasures),
            ("Provisório", Regime::Provisional),
            ("Semiaberto", Regime::SemiOpen),
        ]
        .into_iter()
        .map(|(label, regime)| (label.to_string(), regime))
        .collect();

        Self {
            sheet_name: "Efetivo Completo".to_string(),
            date_row: 4,
            data_start_row: 8,
            columns,
            markers: SectionMarkers::default(),
            regimes,
            source_name: SEAP_SOURCE.to_string(),
        }
    }
}

impl BulletinConfig {
    /// Load overrides from a YAML file; absent keys keep their defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| BulletinError::io(path, e))?;
        let config = Self::from_yaml_str(&text)
            .map_err(|e| BulletinError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loaded bulletin config");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| BulletinError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject mappings the pipeline cannot run against.
    pub fn validate(&self) -> Result<()> {
        let mut seen = Vec::with_capacity(self.columns.len());
        for mapping in &self.columns {
            if column_index(&mapping.column).is_none() {
                return Err(BulletinError::ColumnMappingError(format!(
                    "'{}' is not a spreadsheet column",
                    mapping.column
                )));
            }
            if seen.contains(&mapping.field.as_str()) {
                return Err(BulletinError::ColumnMappingError(format!(
                    "field '{}' is mapped more than once",
                    mapping.field
                )));
            }
            seen.push(mapping.field.as_str());
        }
        for required in fields::REQUIRED {
            if !seen.contains(required) {
                return Err(BulletinError::ColumnMappingError(format!(
                    "required field '{required}' is not mapped"
                )));
            }
        }
        if self.data_start_row <= self.date_row {
            return Err(BulletinError::Config(format!(
                "data_start_row ({}) must come after date_row ({})",
                self.data_start_row, self.date_row
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_valid() {
        let config = BulletinConfig::default();
        config.validate().unwrap();
        assert_eq!(config.columns.len(), 13);
        assert!(!config.columns.iter().any(|c| c.column == "E"));
        assert_eq!(
            config.regimes.get("Med. de Seg."),
            Some(&Regime::SecurityMeasures)
        );
    }

    #[test]
    fn yaml_overrides_keep_other_defaults() {
        let yaml = r#"
sheet_name: Planilha1
data_start_row: 10
regimes:
  Aberto: Aberto
  "Regime Fechado": Fechado
"#;
        let config = BulletinConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.sheet_name, "Planilha1");
        assert_eq!(config.data_start_row, 10);
        assert_eq!(config.date_row, 4);
        assert_eq!(config.regimes.len(), 2);
        assert_eq!(config.regimes["Regime Fechado"], Regime::Closed);
        assert_eq!(config.markers.shelter, "CASA DO ALBERGARDO");
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let yaml = r#"
columns:
  - { column: A, field: unidadeId }
  - { column: B, field: unidadeNome }
"#;
        let err = BulletinConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, BulletinError::ColumnMappingError(_)));
    }

    #[test]
    fn bad_column_letter_is_rejected() {
        let mut config = BulletinConfig::default();
        config.columns[0].column = "A1".to_string();
        assert!(matches!(
            config.validate(),
            Err(BulletinError::ColumnMappingError(_))
        ));
    }

    #[test]
    fn unknown_regime_label_in_yaml_is_a_config_error() {
        let yaml = "regimes:\n  Aberto: Livre\n";
        assert!(matches!(
            BulletinConfig::from_yaml_str(yaml),
            Err(BulletinError::Config(_))
        ));
    }
}
