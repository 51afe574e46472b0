//! Per-disease QOF indicator catalogue.
//!
//! Static configuration keyed by disease type, loaded once at startup from
//! the bundled NHS resource or an override file, then shared read-only.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::QofError;
use crate::models::enums::{DiseaseType, ReviewFrequency};
use crate::models::SnomedCode;

const BUILTIN_CATALOGUE: &str = include_str!("../../resources/indicator_catalogue.json");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorCatalogue {
    diseases: BTreeMap<DiseaseType, DiseaseIndicators>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiseaseIndicators {
    #[serde(default)]
    pub snomed_codes: Vec<SnomedCode>,
    #[serde(default)]
    pub indicators: BTreeMap<String, IndicatorDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDefinition {
    pub qof_points: f64,
    pub unit: Option<String>,
    pub target: Option<f64>,
    #[serde(default)]
    pub thresholds: BTreeMap<String, f64>,
    pub review_frequency: Option<ReviewFrequency>,
}

impl DiseaseIndicators {
    pub fn total_points(&self) -> f64 {
        self.indicators.values().map(|i| i.qof_points).sum()
    }

    pub fn indicator_count(&self) -> usize {
        self.indicators.len()
    }
}

impl IndicatorCatalogue {
    /// The bundled NHS catalogue.
    pub fn builtin() -> Result<Self, QofError> {
        Self::from_json(BUILTIN_CATALOGUE)
    }

    pub fn load(path: &Path) -> Result<Self, QofError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| QofError::Catalogue(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, QofError> {
        let catalogue: Self =
            serde_json::from_str(json).map_err(|e| QofError::Catalogue(e.to_string()))?;
        catalogue.validate()?;
        Ok(catalogue)
    }

    pub fn from_diseases(diseases: BTreeMap<DiseaseType, DiseaseIndicators>) -> Self {
        Self { diseases }
    }

    pub fn disease(&self, disease_type: DiseaseType) -> Option<&DiseaseIndicators> {
        self.diseases.get(&disease_type)
    }

    pub fn disease_types(&self) -> impl Iterator<Item = DiseaseType> + '_ {
        self.diseases.keys().copied()
    }

    /// Points must be finite and non-negative. A disease with no indicators is allowed.
    pub fn validate(&self) -> Result<(), QofError> {
        for (disease, entry) in &self.diseases {
            for (name, indicator) in &entry.indicators {
                if !indicator.qof_points.is_finite() || indicator.qof_points < 0.0 {
                    return Err(QofError::Catalogue(format!(
                        "{disease}.{name}: qof_points must be a non-negative number"
                    )));
                }
            }
        }
        Ok(())
    }
}
