use serde::{Deserialize, Serialize};

use crate::pixel_grid::PixelGrid;
use crate::window_level::WindowLevel;

/// Descriptive attributes read from a dataset, empty when absent
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataFields {
    pub patient_name: String,
    pub patient_id: String,
    pub study_date: String,
    pub modality: String,
    pub series_description: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageMetadata {
    pub patient_name: String,
    #[serde(rename = "PatientID")]
    pub patient_id: String,
    pub study_date: String,
    pub modality: String,
    pub series_description: String,
    pub window_width: f64,
    pub window_center: f64,
    pub image_width: usize,
    pub image_height: usize,
}

impl ImageMetadata {
    pub fn new(fields: MetadataFields, grid: &PixelGrid, window: WindowLevel) -> Self {
        Self {
            patient_name: fields.patient_name,
            patient_id: fields.patient_id,
            study_date: fields.study_date,
            modality: fields.modality,
            series_description: fields.series_description,
            window_width: window.width,
            window_center: window.center,
            image_width: grid.width(),
            image_height: grid.height(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_serialized_keys() {
        let fields = MetadataFields {
            patient_name: "DOE^JANE".into(),
            patient_id: "P-17".into(),
            modality: "CT".into(),
            ..Default::default()
        };
        let grid = PixelGrid::from_i16(Array2::zeros((4, 6)));
        let metadata = ImageMetadata::new(fields, &grid, WindowLevel { center: 40.0, width: 400.0 });

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["PatientName"], "DOE^JANE");
        assert_eq!(json["PatientID"], "P-17");
        assert_eq!(json["StudyDate"], "");
        assert_eq!(json["WindowWidth"], 400.0);
        assert_eq!(json["WindowCenter"], 40.0);
        assert_eq!(json["ImageWidth"], 6);
        assert_eq!(json["ImageHeight"], 4);
    }
}
