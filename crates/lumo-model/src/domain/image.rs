use bytes::Bytes;

use crate::error::{ModelError, ModelResult};

/// Content types accepted for uploads. Everything else is rejected with a
/// client error before any runtime or cache interaction.
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// A single raw image upload as received at the service boundary.
///
/// The body is kept as [`Bytes`] so hashing and runtime invocation share
/// one buffer without copying.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-supplied file name, echoed back in per-file results.
    pub filename: String,
    /// Declared MIME type of the body.
    pub content_type: String,
    /// Raw image bytes.
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Bytes,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Check the upload against the service's input constraints.
    ///
    /// Rules:
    /// - the body must be non-empty;
    /// - the declared content type must be one of [`ALLOWED_CONTENT_TYPES`].
    pub fn validate(&self) -> ModelResult<()> {
        if self.bytes.is_empty() {
            return Err(ModelError::EmptyUpload(self.filename.clone()));
        }
        if !ALLOWED_CONTENT_TYPES.contains(&self.content_type.as_str()) {
            return Err(ModelError::UnsupportedContentType {
                filename: self.filename.clone(),
                content_type: self.content_type.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_content_types() {
        for ct in ALLOWED_CONTENT_TYPES {
            let upload = ImageUpload::new("a.img", ct, Bytes::from_static(b"\x89PNG"));
            assert!(upload.validate().is_ok());
        }
    }

    #[test]
    fn rejects_empty_body() {
        let upload = ImageUpload::new("empty.png", "image/png", Bytes::new());
        let err = upload.validate().unwrap_err();
        assert!(matches!(err, ModelError::EmptyUpload(f) if f == "empty.png"));
    }

    #[test]
    fn rejects_unknown_content_type() {
        let upload = ImageUpload::new("doc.pdf", "application/pdf", Bytes::from_static(b"%PDF"));
        let err = upload.validate().unwrap_err();
        assert!(matches!(
            err,
            ModelError::UnsupportedContentType { content_type, .. } if content_type == "application/pdf"
        ));
    }
}
