/// Validated image upload, the boundary between the picker surface (an
/// external collaborator) and the analysis pipeline. Unsupported formats are
/// rejected here, before any request is made.
use std::path::Path;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::errors::{LeafLensError, LeafLensResult};

/// Image formats accepted for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    file_name: String,
    kind: ImageKind,
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl ImageUpload {
    /// Validate raw bytes as a JPEG or PNG upload and decode the natural
    /// pixel dimensions.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> LeafLensResult<Self> {
        let file_name = file_name.into();

        let format = image::guess_format(&bytes)
            .map_err(|e| LeafLensError::UnsupportedFileType(format!("{file_name}: {e}")))?;
        let kind = match format {
            image::ImageFormat::Jpeg => ImageKind::Jpeg,
            image::ImageFormat::Png => ImageKind::Png,
            other => {
                return Err(LeafLensError::UnsupportedFileType(format!(
                    "{file_name}: {other:?} is not supported, upload a JPG or PNG image"
                )))
            }
        };

        let (width, height) = image::load_from_memory_with_format(&bytes, format)
            .map(|img| (img.width(), img.height()))
            .map_err(|e| LeafLensError::Upload(format!("{file_name}: decode failed: {e}")))?;
        if width == 0 || height == 0 {
            return Err(LeafLensError::Upload(format!(
                "{file_name}: image has zero dimensions"
            )));
        }

        tracing::debug!(file = %file_name, ?kind, width, height, "upload accepted");
        Ok(Self {
            file_name,
            kind,
            bytes,
            width,
            height,
        })
    }

    /// Read and validate an image file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> LeafLensResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Self::from_bytes(file_name, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Natural pixel dimensions of the decoded image.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Base64 `data:` URL of the original bytes, used for the preview pane.
    pub fn preview_data_url(&self) -> String {
        let b64 = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.mime_type(), b64)
    }
}
