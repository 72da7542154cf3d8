//! Upload validation.
//!
//! Uploaded bytes are checked in a fixed order: non-empty, within the size
//! limit for the upload kind, recognised by their magic bytes, allowed for
//! the kind, and consistent with the declared content type. The client's
//! file name is never trusted; the stored extension comes from the sniffed
//! type.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

const MIB: usize = 1024 * 1024;

/// File types recognised by their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Jpeg,
    Png,
    Gif,
    Webp,
    Pdf,
}

impl FileType {
    pub fn mime(&self) -> &'static str {
        match self {
            FileType::Jpeg => "image/jpeg",
            FileType::Png => "image/png",
            FileType::Gif => "image/gif",
            FileType::Webp => "image/webp",
            FileType::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileType::Jpeg => "jpg",
            FileType::Png => "png",
            FileType::Gif => "gif",
            FileType::Webp => "webp",
            FileType::Pdf => "pdf",
        }
    }

    fn matches_mime(&self, declared: &str) -> bool {
        declared == self.mime() || (*self == FileType::Jpeg && declared == "image/jpg")
    }
}

/// Identify a file type from its magic bytes.
pub fn sniff(bytes: &[u8]) -> Option<FileType> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(FileType::Jpeg)
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some(FileType::Png)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(FileType::Gif)
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some(FileType::Webp)
    } else if bytes.starts_with(b"%PDF-") {
        Some(FileType::Pdf)
    } else {
        None
    }
}

/// What an upload endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Photos attached to estimates and chat
    Image,
    /// Licences, insurance certificates and similar
    Document,
}

impl UploadKind {
    pub fn max_bytes(&self) -> usize {
        match self {
            UploadKind::Image => 5 * MIB,
            UploadKind::Document => 10 * MIB,
        }
    }

    pub fn allows(&self, file_type: FileType) -> bool {
        match self {
            UploadKind::Image => file_type != FileType::Pdf,
            UploadKind::Document => true,
        }
    }
}

/// Reasons an upload is refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("No file provided")]
    Empty,

    #[error("File is too large ({size} bytes, maximum is {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("Unsupported or unrecognised file type")]
    UnknownType,

    #[error("File type {0} is not allowed here")]
    NotAllowed(&'static str),

    #[error("Declared content type {declared} does not match file contents ({detected})")]
    ContentTypeMismatch {
        declared: String,
        detected: &'static str,
    },
}

/// An upload that passed every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedUpload {
    pub file_type: FileType,
    pub content_type: &'static str,
    pub extension: &'static str,
    pub size: usize,
}

impl ValidatedUpload {
    /// A fresh object key under `prefix`, e.g. `estimates/<uuid>.jpg`.
    pub fn storage_key(&self, prefix: &str) -> String {
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{}.{}", Uuid::new_v4(), self.extension)
        } else {
            format!("{}/{}.{}", prefix, Uuid::new_v4(), self.extension)
        }
    }
}

/// Validate uploaded bytes for the given kind.
pub fn validate(
    kind: UploadKind,
    bytes: &[u8],
    declared_content_type: Option<&str>,
) -> Result<ValidatedUpload, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }

    let max = kind.max_bytes();
    if bytes.len() > max {
        return Err(UploadError::TooLarge {
            size: bytes.len(),
            max,
        });
    }

    let file_type = sniff(bytes).ok_or(UploadError::UnknownType)?;
    if !kind.allows(file_type) {
        return Err(UploadError::NotAllowed(file_type.mime()));
    }

    if let Some(declared) = declared_content_type {
        let essence = declared
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        // Generic types carry no claim about the contents.
        if !essence.is_empty()
            && essence != "application/octet-stream"
            && !file_type.matches_mime(&essence)
        {
            return Err(UploadError::ContentTypeMismatch {
                declared: essence,
                detected: file_type.mime(),
            });
        }
    }

    Ok(ValidatedUpload {
        file_type,
        content_type: file_type.mime(),
        extension: file_type.extension(),
        size: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 16, b'J', b'F', b'I', b'F'];

    #[test]
    fn test_sniff_known_types() {
        assert_eq!(sniff(PNG), Some(FileType::Png));
        assert_eq!(sniff(JPEG), Some(FileType::Jpeg));
        assert_eq!(sniff(b"GIF89a\x01\x00"), Some(FileType::Gif));
        assert_eq!(sniff(b"RIFF\x24\x00\x00\x00WEBPVP8 "), Some(FileType::Webp));
        assert_eq!(sniff(b"%PDF-1.7\n"), Some(FileType::Pdf));
    }

    #[test]
    fn test_sniff_rejects_lookalikes() {
        assert_eq!(sniff(b"RIFF\x24\x00\x00\x00WAVE"), None);
        assert_eq!(sniff(b"RIFF"), None);
        assert_eq!(sniff(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>"), None);
        assert_eq!(sniff(&[0xFF, 0xD8]), None);
    }

    #[test]
    fn test_valid_image() {
        let upload = validate(UploadKind::Image, PNG, Some("image/png")).unwrap();
        assert_eq!(upload.file_type, FileType::Png);
        assert_eq!(upload.extension, "png");
        assert_eq!(upload.size, PNG.len());
    }

    #[test]
    fn test_empty_upload() {
        assert_eq!(validate(UploadKind::Image, &[], None), Err(UploadError::Empty));
    }

    #[test]
    fn test_size_checked_before_type() {
        let mut big = vec![0u8; UploadKind::Image.max_bytes() + 1];
        big[..3].copy_from_slice(&[0xFF, 0xD8, 0xFF]);

        match validate(UploadKind::Image, &big, None) {
            Err(UploadError::TooLarge { size, max }) => {
                assert_eq!(size, big.len());
                assert_eq!(max, 5 * MIB);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(validate(UploadKind::Document, &big, None).is_ok());
    }

    #[test]
    fn test_pdf_not_allowed_as_image() {
        assert_eq!(
            validate(UploadKind::Image, b"%PDF-1.4", Some("application/pdf")),
            Err(UploadError::NotAllowed("application/pdf"))
        );
        assert!(validate(UploadKind::Document, b"%PDF-1.4", Some("application/pdf")).is_ok());
    }

    #[test]
    fn test_declared_type_mismatch() {
        let err = validate(UploadKind::Image, PNG, Some("image/gif")).unwrap_err();
        assert_eq!(
            err,
            UploadError::ContentTypeMismatch {
                declared: "image/gif".to_string(),
                detected: "image/png",
            }
        );
    }

    #[test]
    fn test_declared_type_tolerances() {
        assert!(validate(UploadKind::Image, JPEG, Some("image/jpg")).is_ok());
        assert!(validate(UploadKind::Image, JPEG, Some("IMAGE/JPEG; charset=binary")).is_ok());
        assert!(validate(UploadKind::Image, JPEG, Some("application/octet-stream")).is_ok());
        assert!(validate(UploadKind::Image, JPEG, None).is_ok());
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(
            validate(UploadKind::Document, b"hello world", Some("text/plain")),
            Err(UploadError::UnknownType)
        );
    }

    #[test]
    fn test_storage_key_uses_sniffed_extension() {
        let upload = validate(UploadKind::Image, JPEG, None).unwrap();

        let key = upload.storage_key("/estimates/");
        assert!(key.starts_with("estimates/"));
        assert!(key.ends_with(".jpg"));
        assert_ne!(key, upload.storage_key("estimates"));

        assert!(!upload.storage_key("").contains('/'));
    }
}
