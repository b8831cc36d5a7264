//! Pending-attachment collection for one outgoing message.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::validator::{FileValidator, MediaCategory, ValidationError};

/// A single media item pending inclusion in an outgoing message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Timestamp-based identifier, unique within a session.
    pub id: String,
    pub file_name: String,
    pub mime: String,
    pub category: MediaCategory,
    /// Payload size in bytes.
    pub size: u64,
    /// Inline data-URI preview; populated for images only.
    pub preview: Option<String>,
    /// Raw payload. Shared so store snapshots stay cheap; not serialized.
    #[serde(skip)]
    pub data: Arc<Vec<u8>>,
}

/// A file proposed for attachment, before validation.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub file_name: String,
    pub mime: String,
    pub data: Arc<Vec<u8>>,
}

impl FileCandidate {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            data: Arc::new(data),
        }
    }

    /// Read a candidate from disk, inferring the MIME type from the extension.
    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime = guess_mime(&file_name).to_string();
        Ok(Self {
            file_name,
            mime,
            data: Arc::new(data),
        })
    }
}

/// MIME type inferred from a file name extension. Unknown extensions map to
/// `application/octet-stream`, which the validator rejects.
pub fn guess_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "heic" => "image/heic",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "weba" => "audio/webm",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

/// Ordered collection of validated attachments for a single outgoing message.
///
/// Cheap to clone; clones share the same underlying list so asynchronous
/// preview generation can append from a spawned task. Appends from
/// concurrently decoding images land in completion order.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    validator: FileValidator,
    items: Arc<Mutex<Vec<Attachment>>>,
}

impl AttachmentStore {
    pub fn new(validator: FileValidator) -> Self {
        Self {
            validator,
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Validate and append a candidate file.
    ///
    /// Images are appended only after their preview data-URI has been
    /// generated on a blocking task; other categories append immediately.
    /// Rejections are returned to the caller, never silently dropped.
    pub async fn add(&self, candidate: FileCandidate) -> Result<MediaCategory, ValidationError> {
        let category = self.validator.check(
            &candidate.file_name,
            &candidate.mime,
            candidate.data.len() as u64,
        )?;

        let mut attachment = Attachment {
            id: chrono::Utc::now().timestamp_millis().to_string(),
            file_name: candidate.file_name,
            mime: candidate.mime,
            category,
            size: candidate.data.len() as u64,
            preview: None,
            data: candidate.data,
        };

        if category == MediaCategory::Image {
            let mime = attachment.mime.clone();
            let data = attachment.data.clone();
            // base64 of up to 10 MiB is CPU-bound; keep it off the reactor.
            match tokio::task::spawn_blocking(move || {
                format!("data:{};base64,{}", mime, STANDARD.encode(data.as_slice()))
            })
            .await
            {
                Ok(preview) => attachment.preview = Some(preview),
                // The file already passed validation; keep it, just without
                // an inline preview.
                Err(e) => tracing::warn!("Preview generation task failed: {}", e),
            }
        }

        self.items.lock().unwrap().push(attachment);
        Ok(category)
    }

    /// Append an already-built attachment (e.g. a finalized recording),
    /// re-checking it against the admission rules first.
    pub fn add_attachment(&self, attachment: Attachment) -> Result<(), ValidationError> {
        self.validator
            .check(&attachment.file_name, &attachment.mime, attachment.size)?;
        self.items.lock().unwrap().push(attachment);
        Ok(())
    }

    /// Remove the attachment at `index`. Out-of-bounds indexes are a no-op.
    pub fn remove(&self, index: usize) {
        let mut items = self.items.lock().unwrap();
        if index < items.len() {
            items.remove(index);
        }
    }

    /// Remove the most recently added attachment, if any.
    pub fn remove_last(&self) {
        let len = self.len();
        if len > 0 {
            self.remove(len - 1);
        }
    }

    pub fn clear(&self) {
        self.items.lock().unwrap().clear();
    }

    /// Take all pending attachments, leaving the store empty.
    pub fn drain(&self) -> Vec<Attachment> {
        std::mem::take(&mut *self.items.lock().unwrap())
    }

    pub fn snapshot(&self) -> Vec<Attachment> {
        self.items.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::validator::{MediaLimits, MIB};

    fn store() -> AttachmentStore {
        AttachmentStore::new(FileValidator::new(MediaLimits::default()))
    }

    #[tokio::test]
    async fn test_image_gets_preview() {
        let s = store();
        s.add(FileCandidate::new("scan.png", "image/png", vec![1, 2, 3]))
            .await
            .unwrap();
        let items = s.snapshot();
        assert_eq!(items.len(), 1);
        let preview = items[0].preview.as_deref().unwrap();
        assert!(preview.starts_with("data:image/png;base64,"));
        assert!(preview.len() > "data:image/png;base64,".len());
    }

    #[tokio::test]
    async fn test_audio_has_no_preview() {
        let s = store();
        s.add(FileCandidate::new("note.wav", "audio/wav", vec![0; 64]))
            .await
            .unwrap();
        assert!(s.snapshot()[0].preview.is_none());
    }

    #[tokio::test]
    async fn test_rejected_file_not_admitted() {
        // One admissible PNG, one WAV over the audio ceiling: only the PNG
        // may land in the store.
        let s = store();
        s.add(FileCandidate::new(
            "scan.png",
            "image/png",
            vec![0; 5 * MIB as usize],
        ))
        .await
        .unwrap();

        let err = s
            .add(FileCandidate::new(
                "long.wav",
                "audio/wav",
                vec![0; 30 * MIB as usize],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { .. }));

        let items = s.snapshot();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].file_name, "scan.png");
        assert!(items[0].preview.is_some());
    }

    #[tokio::test]
    async fn test_remove_preserves_order() {
        let s = store();
        for name in ["a.wav", "b.wav", "c.wav"] {
            s.add(FileCandidate::new(name, "audio/wav", vec![0; 8]))
                .await
                .unwrap();
        }
        s.remove(1);
        let names: Vec<String> = s.snapshot().iter().map(|a| a.file_name.clone()).collect();
        assert_eq!(names, ["a.wav", "c.wav"]);
    }

    #[tokio::test]
    async fn test_remove_out_of_bounds_is_noop() {
        let s = store();
        s.add(FileCandidate::new("a.wav", "audio/wav", vec![0; 8]))
            .await
            .unwrap();
        s.remove(5);
        assert_eq!(s.len(), 1);
    }

    #[tokio::test]
    async fn test_drain_empties_store() {
        let s = store();
        s.add(FileCandidate::new("a.wav", "audio/wav", vec![0; 8]))
            .await
            .unwrap();
        let taken = s.drain();
        assert_eq!(taken.len(), 1);
        assert!(s.is_empty());
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime("photo.JPG"), "image/jpeg");
        assert_eq!(guess_mime("clip.mov"), "video/quicktime");
        assert_eq!(guess_mime("notes.txt"), "application/octet-stream");
        assert_eq!(guess_mime("noext"), "application/octet-stream");
    }
}
