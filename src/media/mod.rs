//! Attachment handling and voice recording: validation, the pending
//! attachment store, recording sessions, and transfer-progress formatting.

#[cfg(feature = "audio")]
pub mod capture;
pub mod progress;
pub mod recorder;
pub mod store;
pub mod validator;
pub mod wav;
