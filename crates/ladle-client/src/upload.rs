//! Client-side image validation and multipart assembly.
//!
//! Limit violations are reported locally, before any network call.

use bytes::Bytes;

use crate::errors::ClientError;

/// Maximum size of a single uploaded image.
pub const MAX_FILE_BYTES: usize = 8 * 1024 * 1024;
/// Maximum combined size of one upload batch.
pub const MAX_COMBINED_BYTES: usize = 20 * 1024 * 1024;

pub(crate) const FILE_TOO_LARGE_COPY: &str =
    "That image is too large. Images must be 8 MiB or smaller.";
pub(crate) const UNSUPPORTED_MEDIA_TYPE_COPY: &str =
    "That file type isn't supported. Please upload an image.";
pub(crate) const COMBINED_TOO_LARGE_COPY: &str =
    "Those images are too large together. Uploads must total 20 MiB or less.";

/// One image selected for extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFile {
    /// File name sent in the multipart part.
    pub file_name: String,
    /// MIME type; must be an `image/*` type.
    pub content_type: String,
    /// Raw file contents.
    pub bytes: Bytes,
}

impl ImageFile {
    /// Creates an image file description.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Local upload-limit violation with user-facing copy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// A single file exceeds [`MAX_FILE_BYTES`].
    #[error("{} ({file_name})", FILE_TOO_LARGE_COPY)]
    FileTooLarge { file_name: String },
    /// A file is not an image type.
    #[error("{} ({file_name})", UNSUPPORTED_MEDIA_TYPE_COPY)]
    UnsupportedMediaType { file_name: String },
    /// The batch exceeds [`MAX_COMBINED_BYTES`].
    #[error("{}", COMBINED_TOO_LARGE_COPY)]
    CombinedTooLarge,
}

/// Checks every file against the size and MIME limits.
pub fn validate_files(files: &[ImageFile]) -> Result<(), UploadError> {
    let mut combined = 0usize;
    for file in files {
        if !file.content_type.starts_with("image/") {
            return Err(UploadError::UnsupportedMediaType {
                file_name: file.file_name.clone(),
            });
        }
        if file.bytes.len() > MAX_FILE_BYTES {
            return Err(UploadError::FileTooLarge {
                file_name: file.file_name.clone(),
            });
        }
        combined += file.bytes.len();
    }
    if combined > MAX_COMBINED_BYTES {
        return Err(UploadError::CombinedTooLarge);
    }
    Ok(())
}

/// Builds the multipart body with one repeated `files` part per image.
pub(crate) fn multipart_form(files: Vec<ImageFile>) -> Result<reqwest::multipart::Form, ClientError> {
    let mut form = reqwest::multipart::Form::new();
    for file in files {
        let part = reqwest::multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name)
            .mime_str(&file.content_type)
            .map_err(|e| ClientError::validation(format!("invalid MIME type: {e}")))?;
        form = form.part("files", part);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str, mime: &str, len: usize) -> ImageFile {
        ImageFile::new(name, mime, vec![0u8; len])
    }

    #[test]
    fn accepts_images_within_limits() {
        let files = vec![
            image("a.jpg", "image/jpeg", 1024),
            image("b.png", "image/png", 2048),
        ];
        assert_eq!(validate_files(&files), Ok(()));
    }

    #[test]
    fn rejects_single_file_over_eight_mib() {
        let files = vec![image("big.jpg", "image/jpeg", MAX_FILE_BYTES + 1)];
        assert!(matches!(
            validate_files(&files),
            Err(UploadError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn rejects_combined_size_over_twenty_mib() {
        let files = vec![
            image("a.jpg", "image/jpeg", MAX_FILE_BYTES),
            image("b.jpg", "image/jpeg", MAX_FILE_BYTES),
            image("c.jpg", "image/jpeg", MAX_FILE_BYTES),
        ];
        assert_eq!(validate_files(&files), Err(UploadError::CombinedTooLarge));
    }

    #[test]
    fn rejects_non_image_mime_types() {
        let files = vec![image("doc.pdf", "application/pdf", 100)];
        assert!(matches!(
            validate_files(&files),
            Err(UploadError::UnsupportedMediaType { .. })
        ));
    }
}
