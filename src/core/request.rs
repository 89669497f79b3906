use std::path::Path;

use crate::error::EvaluatorError;

/// Uploads are labeled with this type unless another one is declared.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRequest {
    image_bytes: Vec<u8>,
    filename: String,
    mime_type: String,
}

impl PredictionRequest {
    pub fn new(
        image_bytes: Vec<u8>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            image_bytes,
            filename: filename.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Fails with `ImageNotFound` before touching the file when the path is missing.
    pub fn from_path(path: &Path, mime_type: &str) -> Result<Self, EvaluatorError> {
        if !path.exists() {
            return Err(EvaluatorError::ImageNotFound {
                path: path.to_path_buf(),
            });
        }

        let image_bytes = std::fs::read(path).map_err(|err| EvaluatorError::UnexpectedFailure {
            message: format!("failed to read image {}: {err}", path.display()),
        })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Ok(Self::new(image_bytes, filename, mime_type))
    }

    pub fn image_bytes(&self) -> &[u8] {
        &self.image_bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.image_bytes.len() as u64
    }
}
