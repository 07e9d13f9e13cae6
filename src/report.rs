/// Render an analysis outcome as plain text, following the result card's
/// layout: status, diagnosis, recommendations, confidence, then the
/// abnormality listing in detection order.
use crate::analysis::types::{AnalysisResponse, HealthStatus};

/// Icon category for the diagnosis row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosisIcon {
    Nutrient,
    Light,
    Pest,
    Water,
    Info,
}

/// Ordered substring rules over the lowercased details text, evaluated top to
/// bottom with the first match winning. A lookup table, not a classifier.
const ICON_RULES: &[(&str, DiagnosisIcon)] = &[
    ("nutrient", DiagnosisIcon::Nutrient),
    ("light", DiagnosisIcon::Light),
    ("sun", DiagnosisIcon::Light),
    ("disease", DiagnosisIcon::Pest),
    ("pest", DiagnosisIcon::Pest),
    ("blight", DiagnosisIcon::Pest),
    ("aphids", DiagnosisIcon::Pest),
    ("spot", DiagnosisIcon::Pest),
    ("water", DiagnosisIcon::Water),
    ("wilt", DiagnosisIcon::Water),
];

pub fn diagnosis_icon(details: &str) -> DiagnosisIcon {
    let lower = details.to_lowercase();
    ICON_RULES
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, icon)| *icon)
        .unwrap_or(DiagnosisIcon::Info)
}

/// "healthy" -> "Healthy", matching how the status line is displayed.
fn status_label(status: &HealthStatus) -> String {
    let raw = status.to_string();
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => raw,
    }
}

pub fn render_report(response: &AnalysisResponse) -> String {
    let analysis = &response.plant_analysis;
    let mut lines = vec![
        "Plant Health Analysis".to_string(),
        format!("Status: {}", status_label(&analysis.status)),
        String::new(),
        format!(
            "[{:?}] Diagnosis: {}",
            diagnosis_icon(&analysis.details),
            analysis.details
        ),
    ];

    if !response.is_healthy() {
        if let Some(recommendations) = &analysis.recommendations {
            lines.push(format!("Recommendations: {recommendations}"));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Overall Confidence: {:.1}%",
        response.confidence_score * 100.0
    ));
    lines.push(format!("Processing Time: {}ms", response.processing_time_ms));

    if !analysis.abnormalities.is_empty() {
        lines.push(format!(
            "Detected Abnormalities: {}",
            analysis.abnormalities.len()
        ));
        for ab in &analysis.abnormalities {
            let c = &ab.coordinates;
            lines.push(format!(
                "  - {} ({:.0}%): {} [x:{:.0} y:{:.0} w:{:.0} h:{:.0}]",
                ab.kind,
                ab.confidence_score_abnormality * 100.0,
                ab.description,
                c.x,
                c.y,
                c.width,
                c.height,
            ));
        }
    }

    lines.join("\n")
}
