//! Chat data models

pub mod message;
