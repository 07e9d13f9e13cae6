/// Analysis backend reached over HTTP: POSTs the raw image bytes and expects
/// the full diagnosis payload back as JSON.
use async_trait::async_trait;

use crate::analysis::provider::AnalysisProvider;
use crate::analysis::types::{AnalysisResponse, ProviderErrorBody};
use crate::errors::{LeafLensError, LeafLensResult};
use crate::upload::ImageUpload;

pub struct HttpAnalysisProvider {
    id: String,
    api_base: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpAnalysisProvider {
    pub fn new(id: String, api_base: String, api_key: Option<String>) -> Self {
        Self {
            id,
            api_base,
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AnalysisProvider for HttpAnalysisProvider {
    fn name(&self) -> &str {
        &self.id
    }

    async fn analyze(&self, upload: &ImageUpload) -> LeafLensResult<AnalysisResponse> {
        tracing::debug!(
            provider = %self.id,
            url = %self.api_base,
            bytes = upload.bytes().len(),
            "sending analysis request"
        );

        let mut request = self
            .client
            .post(&self.api_base)
            .header(reqwest::header::CONTENT_TYPE, upload.mime_type())
            .body(upload.bytes().to_vec());
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            // The error body carries a human-readable message field; surface
            // it verbatim, with a generic fallback when it is missing.
            let message = response
                .json::<ProviderErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| format!("analysis request failed with status {status}"));
            return Err(LeafLensError::Provider(message));
        }

        let body = response.text().await?;
        let payload: AnalysisResponse = serde_json::from_str(&body)
            .map_err(|e| LeafLensError::MalformedPayload(e.to_string()))?;

        tracing::info!(
            provider = %self.id,
            status = %payload.plant_analysis.status,
            abnormalities = payload.abnormalities().len(),
            "analysis response received"
        );
        Ok(payload)
    }
}
