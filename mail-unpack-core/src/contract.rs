#![allow(unused)]

//! # contract: the seams of the unpack pipeline
//!
//! This module defines the two collaborators the pipeline talks to and the
//! plain data passed between them:
//! - [`ObjectStore`]: byte-blob `get`/`put` against a bucket and key.
//! - [`EmailParser`]: decomposes raw MIME bytes into a [`ParsedEmail`].
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`; the generated `MockObjectStore`
//!   and `MockEmailParser` are exported under the `test-export-mocks` feature
//!   so integration tests in other crates can use them.
//!
//! ## Adding New Backends
//! - Implement [`ObjectStore`] for the backend and map its failures onto
//!   [`UnpackError::NotFound`] (missing key) or [`UnpackError::Storage`].
//! - The store must not hold any per-job state; one handle serves every run.

use async_trait::async_trait;

use mockall::{automock, predicate::*};

use crate::error::{Result, UnpackError};

/// A file carried by the email, in the order the parser found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name as declared by the message (or a generated fallback).
    pub filename: String,
    /// Content-ID without angle brackets, when the part has one.
    pub content_id: Option<String>,
    /// Decoded attachment payload.
    pub bytes: Vec<u8>,
}

/// Result of decomposing a raw MIME message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEmail {
    /// Plain-text body. Empty when the message carries no text.
    pub text: String,
    /// HTML body. `None` means the message has no HTML alternative at all.
    pub html: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// Byte-blob storage addressed by bucket and key.
///
/// The trait is implemented by real stores and by test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object. Fails with `NotFound` when the key is absent.
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Store an object, overwriting any existing object under the same key.
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;
}

/// Decomposes raw MIME bytes into text, optional HTML and attachments.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait EmailParser: Send + Sync {
    /// Parse a message. Fails with `Parse` on malformed input.
    ///
    /// Implementations must report `html: None` for text-only messages and
    /// never synthesize HTML from the text body.
    async fn parse(&self, raw: &[u8]) -> Result<ParsedEmail>;
}
