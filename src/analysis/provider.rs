use async_trait::async_trait;

use crate::analysis::types::AnalysisResponse;
use crate::errors::LeafLensResult;
use crate::upload::ImageUpload;

/// Unified analysis provider trait. The session engine only sees this
/// boundary; new backends implement it and register in config.toml.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Returns the provider's identifier (matches the config.toml key).
    fn name(&self) -> &str;

    /// Submit one image and await the full diagnosis payload.
    async fn analyze(&self, upload: &ImageUpload) -> LeafLensResult<AnalysisResponse>;
}
