use serde::{Deserialize, Serialize};

/// Overall verdict for the analyzed plant. Extensible: statuses this build
/// does not know about are preserved as plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Other(String),
}

impl From<String> for HealthStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "healthy" => Self::Healthy,
            "unhealthy" => Self::Unhealthy,
            _ => Self::Other(s),
        }
    }
}

impl From<HealthStatus> for String {
    fn from(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Healthy => "healthy".to_string(),
            HealthStatus::Unhealthy => "unhealthy".to_string(),
            HealthStatus::Other(s) => s,
        }
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::Other("unknown".to_string())
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Axis-aligned box in source-image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One detected region of interest with its classification label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Abnormality {
    /// Short category label, e.g. "Bacterial Spot".
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub coordinates: SourceRect,
    pub confidence_score_abnormality: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlantAnalysis {
    #[serde(default)]
    pub status: HealthStatus,
    #[serde(default)]
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
    /// Insertion order is preserved for stable label placement.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abnormalities: Vec<Abnormality>,
}

/// Full analysis payload. Field names match the provider wire format.
///
/// Deserialization is deliberately lenient: a partial payload still carries
/// whatever textual fields it has, while defaulted (zero) image dimensions
/// keep the overlay mapping switched off downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub plant_analysis: PlantAnalysis,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub processing_time_ms: u64,
    /// Natural pixel dimensions of the analyzed source image.
    #[serde(default)]
    pub image_width: u32,
    #[serde(default)]
    pub image_height: u32,
}

impl AnalysisResponse {
    pub fn is_healthy(&self) -> bool {
        self.plant_analysis.status == HealthStatus::Healthy
    }

    /// Detected abnormalities in insertion order.
    pub fn abnormalities(&self) -> &[Abnormality] {
        &self.plant_analysis.abnormalities
    }
}

/// Error body shape returned by HTTP providers on a non-success status.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIRE_RESPONSE: &str = r#"{
        "plant_analysis": {
            "status": "unhealthy",
            "details": "Bacterial spot detected on multiple leaves.",
            "recommendations": "Apply copper-based fungicides.",
            "abnormalities": [
                {
                    "type": "Bacterial Spot",
                    "description": "A lesion indicative of bacterial spot.",
                    "coordinates": { "x": 75, "y": 110, "width": 40, "height": 35 },
                    "confidence_score_abnormality": 0.95
                }
            ]
        },
        "confidence_score": 0.85,
        "processing_time_ms": 250,
        "image_width": 400,
        "image_height": 300
    }"#;

    #[test]
    fn test_deserialize_wire_response() {
        let response: AnalysisResponse = serde_json::from_str(WIRE_RESPONSE).unwrap();
        assert_eq!(response.plant_analysis.status, HealthStatus::Unhealthy);
        assert!(!response.is_healthy());
        assert_eq!(response.image_width, 400);
        assert_eq!(response.image_height, 300);
        assert_eq!(response.abnormalities().len(), 1);
        let ab = &response.abnormalities()[0];
        assert_eq!(ab.kind, "Bacterial Spot");
        assert_eq!(ab.coordinates.x, 75.0);
        assert_eq!(ab.coordinates.height, 35.0);
    }

    #[test]
    fn test_serialize_uses_wire_field_names() {
        let response: AnalysisResponse = serde_json::from_str(WIRE_RESPONSE).unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["plant_analysis"]["status"], "unhealthy");
        assert_eq!(
            json["plant_analysis"]["abnormalities"][0]["type"],
            "Bacterial Spot"
        );
        assert_eq!(
            json["plant_analysis"]["abnormalities"][0]["confidence_score_abnormality"],
            0.95
        );
        assert_eq!(json["processing_time_ms"], 250);
    }

    #[test]
    fn test_partial_payload_defaults_instead_of_failing() {
        // Missing image dimensions must not break parsing; the zero defaults
        // keep the overlay off while the text still renders.
        let response: AnalysisResponse = serde_json::from_str(
            r#"{ "plant_analysis": { "status": "unhealthy", "details": "Wilting observed." } }"#,
        )
        .unwrap();
        assert_eq!(response.image_width, 0);
        assert_eq!(response.image_height, 0);
        assert!(response.abnormalities().is_empty());
        assert_eq!(response.plant_analysis.details, "Wilting observed.");
    }

    #[test]
    fn test_unknown_status_round_trips_as_string() {
        let status: HealthStatus = serde_json::from_str(r#""nutrient_deficiency""#).unwrap();
        assert_eq!(status, HealthStatus::Other("nutrient_deficiency".into()));
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            r#""nutrient_deficiency""#
        );
    }

    #[test]
    fn test_healthy_with_no_abnormalities() {
        let response: AnalysisResponse = serde_json::from_str(
            r#"{
                "plant_analysis": { "status": "healthy", "details": "All good.", "abnormalities": [] },
                "confidence_score": 0.98,
                "processing_time_ms": 120,
                "image_width": 640,
                "image_height": 480
            }"#,
        )
        .unwrap();
        assert!(response.is_healthy());
        assert!(response.abnormalities().is_empty());
        assert!(response.plant_analysis.recommendations.is_none());
    }
}
