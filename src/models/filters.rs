use uuid::Uuid;

use super::enums::DiseaseType;

#[derive(Debug, Default, Clone)]
pub struct DiseaseIndicatorFilter {
    pub disease_type: Option<DiseaseType>,
    pub patient_id: Option<Uuid>,
    pub limit: Option<u32>,
    pub newest_first: bool,
}

impl DiseaseIndicatorFilter {
    pub fn for_disease(disease_type: DiseaseType) -> Self {
        Self {
            disease_type: Some(disease_type),
            ..Self::default()
        }
    }

    pub fn latest(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            newest_first: true,
            ..Self::default()
        }
    }
}
