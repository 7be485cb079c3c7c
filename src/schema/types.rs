// src/schema/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label the bulletin uses for anything uncertain or not informed.
pub const NOT_INFORMED: &str = "Não Informado";

/// Facility category, inferred from the subtotal section a row sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FacilityType {
    /// Prison-like units; the bulletin does not say which kind.
    #[serde(rename = "Não Informado")]
    NotInformed,
    #[serde(rename = "Casa do Albergado")]
    Shelter,
    #[serde(rename = "Hospital de Custódia e Tratamento Psiquiátrico")]
    CustodyHospital,
}

impl FacilityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacilityType::NotInformed => NOT_INFORMED,
            FacilityType::Shelter => "Casa do Albergado",
            FacilityType::CustodyHospital => "Hospital de Custódia e Tratamento Psiquiátrico",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "Masculino")]
    Male,
    #[serde(rename = "Feminino")]
    Female,
    #[serde(rename = "Não Informado")]
    NotInformed,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Masculino",
            Gender::Female => "Feminino",
            Gender::NotInformed => NOT_INFORMED,
        }
    }
}

/// Legal custody regime of an imprisoned-count row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Regime {
    #[serde(rename = "Aberto")]
    Open,
    #[serde(rename = "Fechado")]
    Closed,
    #[serde(rename = "Medidas de Segurança")]
    SecurityMeasures,
    #[serde(rename = "Provisório")]
    Provisional,
    #[serde(rename = "Semiaberto")]
    SemiOpen,
    #[serde(rename = "Não Informado")]
    NotInformed,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Open => "Aberto",
            Regime::Closed => "Fechado",
            Regime::SecurityMeasures => "Medidas de Segurança",
            Regime::Provisional => "Provisório",
            Regime::SemiOpen => "Semiaberto",
            Regime::NotInformed => NOT_INFORMED,
        }
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_labels_match_display() {
        for regime in [
            Regime::Open,
            Regime::Closed,
            Regime::SecurityMeasures,
            Regime::Provisional,
            Regime::SemiOpen,
            Regime::NotInformed,
        ] {
            let json = serde_json::to_value(regime).unwrap();
            assert_eq!(json.as_str(), Some(regime.as_str()));
        }
        let json = serde_json::to_value(FacilityType::CustodyHospital).unwrap();
        assert_eq!(
            json.as_str(),
            Some("Hospital de Custódia e Tratamento Psiquiátrico")
        );
        assert_eq!(Gender::NotInformed.to_string(), "Não Informado");
    }

    #[test]
    fn regime_labels_deserialize() {
        let r: Regime = serde_json::from_str("\"Medidas de Segurança\"").unwrap();
        assert_eq!(r, Regime::SecurityMeasures);
    }
}
