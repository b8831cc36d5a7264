//! Message composition: packaging text and pending attachments into one
//! outgoing message on a send trigger.

use crate::media::store::AttachmentStore;
use crate::models::message::OutgoingMessage;

/// External send collaborator. Fire-and-forget; the composer does not care
/// what happens to a delivered message.
pub trait MessageSink {
    fn deliver(&mut self, message: OutgoingMessage);
}

/// Composes text plus the attachment store's contents into one message.
pub struct MessageComposer {
    store: AttachmentStore,
}

impl MessageComposer {
    pub fn new(store: AttachmentStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &AttachmentStore {
        &self.store
    }

    /// Try to send: a no-op returning `None` when the trimmed text is empty
    /// and no attachments are pending. Otherwise every attachment present at
    /// submit time is included atomically, the store is cleared, and the
    /// message is delivered to the sink (a copy is returned for display).
    pub fn try_send(&mut self, text: &str, sink: &mut dyn MessageSink) -> Option<OutgoingMessage> {
        let message = OutgoingMessage {
            text: text.trim().to_string(),
            attachments: self.store.drain(),
        };
        if !message.is_sendable() {
            return None;
        }
        sink.deliver(message.clone());
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::store::FileCandidate;
    use crate::media::validator::{FileValidator, MediaLimits};

    #[derive(Default)]
    struct RecordingSink {
        delivered: Vec<OutgoingMessage>,
    }

    impl MessageSink for RecordingSink {
        fn deliver(&mut self, message: OutgoingMessage) {
            self.delivered.push(message);
        }
    }

    fn composer() -> MessageComposer {
        MessageComposer::new(AttachmentStore::new(FileValidator::new(
            MediaLimits::default(),
        )))
    }

    #[test]
    fn test_blank_text_empty_store_is_noop() {
        let mut c = composer();
        let mut sink = RecordingSink::default();
        assert!(c.try_send("", &mut sink).is_none());
        assert!(c.try_send("   \n\t ", &mut sink).is_none());
        assert!(sink.delivered.is_empty());
    }

    #[test]
    fn test_text_only_send() {
        let mut c = composer();
        let mut sink = RecordingSink::default();
        let sent = c.try_send("  What is the HbA1c target?  ", &mut sink).unwrap();
        assert_eq!(sent.text, "What is the HbA1c target?");
        assert!(sent.attachments.is_empty());
        assert_eq!(sink.delivered.len(), 1);
    }

    #[tokio::test]
    async fn test_attachments_only_send_clears_store() {
        let mut c = composer();
        c.store()
            .add(FileCandidate::new("note.wav", "audio/wav", vec![0; 16]))
            .await
            .unwrap();

        let mut sink = RecordingSink::default();
        let sent = c.try_send("", &mut sink).unwrap();
        assert!(sent.text.is_empty());
        assert_eq!(sent.attachments.len(), 1);
        assert!(c.store().is_empty());
    }

    #[tokio::test]
    async fn test_all_pending_attachments_included_atomically() {
        let mut c = composer();
        for name in ["a.png", "b.wav"] {
            c.store()
                .add(FileCandidate::new(
                    name,
                    crate::media::store::guess_mime(name),
                    vec![0; 16],
                ))
                .await
                .unwrap();
        }

        let mut sink = RecordingSink::default();
        let sent = c.try_send("see attached", &mut sink).unwrap();
        assert_eq!(sent.attachments.len(), 2);
        assert_eq!(sink.delivered[0].attachments.len(), 2);
    }
}
