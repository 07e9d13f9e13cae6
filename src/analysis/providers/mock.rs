/// Built-in mock provider: fabricates a plausible diagnosis without any real
/// image analysis, standing in for the backend during development.
///
/// The verdict is derived from a content hash of the upload, so the same
/// image always gets the same diagnosis and tests stay reproducible.
use std::time::Duration;

use async_trait::async_trait;

use crate::analysis::provider::AnalysisProvider;
use crate::analysis::types::{
    Abnormality, AnalysisResponse, HealthStatus, PlantAnalysis, SourceRect,
};
use crate::config::MockConfig;
use crate::errors::LeafLensResult;
use crate::upload::ImageUpload;

pub const MOCK_PROVIDER_ID: &str = "mock";

struct AbnormalityTemplate {
    kind: &'static str,
    description: &'static str,
    /// Fractional box (x, y, width, height) in 0.0-1.0 image space, scaled to
    /// the upload's real dimensions so the box always stays in bounds.
    frac: (f64, f64, f64, f64),
    confidence: f64,
}

struct IssueTemplate {
    details: &'static str,
    recommendations: &'static str,
    abnormalities: &'static [AbnormalityTemplate],
}

const ISSUES: &[IssueTemplate] = &[
    IssueTemplate {
        details: "Bacterial spot detected on multiple leaves. Early signs of nutrient deficiency also present.",
        recommendations: "Apply copper-based fungicides. Ensure proper plant spacing. Consider a balanced NPK fertilizer.",
        abnormalities: &[
            AbnormalityTemplate {
                kind: "Bacterial Spot",
                description: "A lesion indicative of bacterial spot.",
                frac: (0.19, 0.37, 0.10, 0.12),
                confidence: 0.95,
            },
            AbnormalityTemplate {
                kind: "Bacterial Spot",
                description: "Another area showing bacterial spot symptoms.",
                frac: (0.38, 0.60, 0.12, 0.15),
                confidence: 0.89,
            },
            AbnormalityTemplate {
                kind: "Nutrient Deficiency",
                description: "Slight yellowing of lower leaf, possibly Nitrogen deficiency.",
                frac: (0.13, 0.67, 0.15, 0.17),
                confidence: 0.75,
            },
        ],
    },
    IssueTemplate {
        details: "Yellowing leaves detected, possible nutrient deficiency (Nitrogen).",
        recommendations: "Apply a balanced liquid fertilizer rich in Nitrogen. Follow product instructions carefully.",
        abnormalities: &[AbnormalityTemplate {
            kind: "Nutrient Deficiency",
            description: "Yellowing concentrated along the leaf margins.",
            frac: (0.12, 0.55, 0.20, 0.18),
            confidence: 0.78,
        }],
    },
    IssueTemplate {
        details: "Signs of pest damage (aphids) on lower leaves.",
        recommendations: "Spray the plant with insecticidal soap, focusing on the undersides of leaves. Repeat application if necessary.",
        abnormalities: &[AbnormalityTemplate {
            kind: "Pest Damage",
            description: "Cluster of aphids on the underside of a lower leaf.",
            frac: (0.40, 0.62, 0.18, 0.20),
            confidence: 0.83,
        }],
    },
    IssueTemplate {
        details: "Dark spots on leaves, potential early blight.",
        recommendations: "Remove and destroy affected leaves immediately. Ensure good air circulation around the plant. Consider applying a fungicide if the problem persists.",
        abnormalities: &[
            AbnormalityTemplate {
                kind: "Early Blight",
                description: "Concentric dark lesion typical of early blight.",
                frac: (0.30, 0.25, 0.14, 0.12),
                confidence: 0.81,
            },
            AbnormalityTemplate {
                kind: "Early Blight",
                description: "Smaller lesion forming on an adjacent leaf.",
                frac: (0.55, 0.40, 0.10, 0.10),
                confidence: 0.77,
            },
        ],
    },
    IssueTemplate {
        details: "Wilting observed, check soil moisture levels.",
        recommendations: "Water the plant thoroughly if the soil is dry. Ensure proper drainage to prevent overwatering.",
        abnormalities: &[AbnormalityTemplate {
            kind: "Wilting",
            description: "Drooping stem section with loss of turgor.",
            frac: (0.20, 0.12, 0.45, 0.30),
            confidence: 0.70,
        }],
    },
];

pub struct MockAnalysisProvider {
    config: MockConfig,
}

impl MockAnalysisProvider {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Cheap content hash over a byte sample, enough to spread verdicts
    /// across different uploads while staying stable per image.
    fn sample_hash(bytes: &[u8]) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        let step = (bytes.len() / 1000).max(1);
        for i in (0..bytes.len()).step_by(step) {
            bytes[i].hash(&mut hasher);
        }
        hasher.finish()
    }

    fn healthy_response(&self, width: u32, height: u32) -> AnalysisResponse {
        AnalysisResponse {
            plant_analysis: PlantAnalysis {
                status: HealthStatus::Healthy,
                details: "Plant appears to be in good health. No significant issues detected."
                    .into(),
                recommendations: None,
                abnormalities: Vec::new(),
            },
            confidence_score: 0.98,
            processing_time_ms: self.config.delay_ms,
            image_width: width,
            image_height: height,
        }
    }

    fn unhealthy_response(&self, hash: u64, width: u32, height: u32) -> AnalysisResponse {
        let issue = &ISSUES[((hash >> 10) as usize) % ISSUES.len()];
        let abnormalities = issue
            .abnormalities
            .iter()
            .map(|template| materialize(template, width, height))
            .collect();

        AnalysisResponse {
            plant_analysis: PlantAnalysis {
                status: HealthStatus::Unhealthy,
                details: issue.details.into(),
                recommendations: Some(issue.recommendations.into()),
                abnormalities,
            },
            confidence_score: 0.78 + ((hash >> 20) % 180) as f64 / 1000.0,
            processing_time_ms: self.config.delay_ms,
            image_width: width,
            image_height: height,
        }
    }
}

fn materialize(template: &AbnormalityTemplate, width: u32, height: u32) -> Abnormality {
    let (fx, fy, fw, fh) = template.frac;
    Abnormality {
        kind: template.kind.to_string(),
        description: template.description.to_string(),
        coordinates: SourceRect {
            x: (fx * width as f64).round(),
            y: (fy * height as f64).round(),
            width: (fw * width as f64).round(),
            height: (fh * height as f64).round(),
        },
        confidence_score_abnormality: template.confidence,
    }
}

#[async_trait]
impl AnalysisProvider for MockAnalysisProvider {
    fn name(&self) -> &str {
        MOCK_PROVIDER_ID
    }

    async fn analyze(&self, upload: &ImageUpload) -> LeafLensResult<AnalysisResponse> {
        tokio::time::sleep(Duration::from_millis(self.config.delay_ms)).await;

        let hash = Self::sample_hash(upload.bytes());
        let healthy = (hash % 1000) as f64 / 1000.0 < self.config.healthy_bias;
        let (width, height) = upload.dimensions();

        let response = if healthy {
            self.healthy_response(width, height)
        } else {
            self.unhealthy_response(hash, width, height)
        };

        tracing::info!(
            file = %upload.file_name(),
            status = %response.plant_analysis.status,
            abnormalities = response.abnormalities().len(),
            "mock analysis complete"
        );
        Ok(response)
    }
}
