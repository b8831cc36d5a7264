//! Attachment admission rules: accepted MIME types and per-category size ceilings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One mebibyte in bytes.
pub const MIB: u64 = 1024 * 1024;

/// Media category of an attachment, derived from its declared MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Image,
    Audio,
    Video,
}

/// MIME types accepted per category. Anything outside these sets is rejected.
const IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/heic",
    "image/webp",
    "image/gif",
];
const AUDIO_TYPES: &[&str] = &["audio/mpeg", "audio/wav", "audio/mp4", "audio/webm"];
const VIDEO_TYPES: &[&str] = &["video/mp4", "video/quicktime", "video/webm"];

impl MediaCategory {
    /// Classify a declared MIME type. Returns `None` for anything outside the
    /// accepted sets — unrecognized types are rejected outright rather than
    /// falling back to an unrelated category's ceiling.
    pub fn from_mime(mime: &str) -> Option<Self> {
        if IMAGE_TYPES.contains(&mime) {
            Some(Self::Image)
        } else if AUDIO_TYPES.contains(&mime) {
            Some(Self::Audio)
        } else if VIDEO_TYPES.contains(&mime) {
            Some(Self::Video)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    /// Glyph used for attachment chips in the TUI.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Image => "\u{1F5BC}",
            Self::Audio => "\u{1F3B5}",
            Self::Video => "\u{1F3AC}",
        }
    }
}

/// Per-category size ceilings, in MiB. Immutable once handed to a
/// [`FileValidator`]; values come from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaLimits {
    pub image_max_mib: u64,
    pub audio_max_mib: u64,
    pub video_max_mib: u64,
}

impl Default for MediaLimits {
    fn default() -> Self {
        Self {
            image_max_mib: 10,
            audio_max_mib: 25,
            video_max_mib: 100,
        }
    }
}

impl MediaLimits {
    /// Ceiling in bytes for the given category.
    pub fn ceiling_bytes(&self, category: MediaCategory) -> u64 {
        let mib = match category {
            MediaCategory::Image => self.image_max_mib,
            MediaCategory::Audio => self.audio_max_mib,
            MediaCategory::Video => self.video_max_mib,
        };
        mib * MIB
    }
}

/// Why a candidate file was not admitted. Surfaced directly to the user;
/// never fatal — the file is simply not added.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported file type: {mime}")]
    UnsupportedType { mime: String },

    #[error("{name} is too large ({size} bytes; {category} limit is {limit} bytes)")]
    FileTooLarge {
        name: String,
        category: &'static str,
        size: u64,
        limit: u64,
    },
}

/// Gates file admission by MIME type and size.
#[derive(Debug, Clone)]
pub struct FileValidator {
    limits: MediaLimits,
}

impl FileValidator {
    pub fn new(limits: MediaLimits) -> Self {
        Self { limits }
    }

    /// Check a candidate's declared MIME type and byte size.
    ///
    /// The size boundary is inclusive: a file exactly at its category's
    /// ceiling is accepted.
    pub fn check(&self, name: &str, mime: &str, size: u64) -> Result<MediaCategory, ValidationError> {
        let category = MediaCategory::from_mime(mime).ok_or_else(|| {
            ValidationError::UnsupportedType {
                mime: mime.to_string(),
            }
        })?;

        let limit = self.limits.ceiling_bytes(category);
        if size > limit {
            return Err(ValidationError::FileTooLarge {
                name: name.to_string(),
                category: category.as_str(),
                size,
                limit,
            });
        }

        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> FileValidator {
        FileValidator::new(MediaLimits::default())
    }

    #[test]
    fn test_accepts_known_types() {
        let v = validator();
        assert_eq!(
            v.check("x.png", "image/png", 1024),
            Ok(MediaCategory::Image)
        );
        assert_eq!(
            v.check("x.wav", "audio/wav", 1024),
            Ok(MediaCategory::Audio)
        );
        assert_eq!(
            v.check("x.mov", "video/quicktime", 1024),
            Ok(MediaCategory::Video)
        );
    }

    #[test]
    fn test_rejects_unknown_mime() {
        let v = validator();
        let err = v.check("x.pdf", "application/pdf", 10).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedType {
                mime: "application/pdf".into()
            }
        );
    }

    #[test]
    fn test_unrecognized_type_never_reaches_size_check() {
        // Even a tiny file with an unknown MIME type is an UnsupportedType
        // error, not a size error against some borrowed ceiling.
        let v = validator();
        let err = v.check("x.bin", "application/octet-stream", 1).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedType { .. }));
    }

    #[test]
    fn test_size_boundary_inclusive() {
        let v = validator();
        assert!(v.check("x.png", "image/png", 10 * MIB).is_ok());
        assert!(matches!(
            v.check("x.png", "image/png", 10 * MIB + 1),
            Err(ValidationError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_per_category_ceilings() {
        let v = validator();
        assert!(v.check("x.wav", "audio/wav", 25 * MIB).is_ok());
        assert!(v.check("x.wav", "audio/wav", 30 * MIB).is_err());
        assert!(v.check("x.mp4", "video/mp4", 100 * MIB).is_ok());
        assert!(v.check("x.mp4", "video/mp4", 100 * MIB + 1).is_err());
    }

    #[test]
    fn test_custom_limits() {
        let v = FileValidator::new(MediaLimits {
            image_max_mib: 1,
            ..MediaLimits::default()
        });
        assert!(v.check("x.png", "image/png", MIB).is_ok());
        assert!(v.check("x.png", "image/png", MIB + 1).is_err());
    }
}
