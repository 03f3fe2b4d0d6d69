use crate::contract::{Attachment, ParsedEmail};

/// State of one pipeline run: where the email lives, its raw bytes and the
/// parsed content. Created per invocation and dropped when the run ends.
#[derive(Debug, Clone)]
pub struct EmailJob {
    pub bucket: String,
    /// Canonical (decoded) key of the source email.
    pub key: String,
    raw_bytes: Option<Vec<u8>>,
    email: ParsedEmail,
}

impl EmailJob {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            raw_bytes: None,
            email: ParsedEmail::default(),
        }
    }

    /// Record the fetched source object. Returns `false` if bytes were already set.
    pub fn set_raw_bytes(&mut self, bytes: Vec<u8>) -> bool {
        if self.raw_bytes.is_some() {
            return false;
        }
        self.raw_bytes = Some(bytes);
        true
    }

    pub fn raw_bytes(&self) -> Option<&[u8]> {
        self.raw_bytes.as_deref()
    }

    pub fn set_email(&mut self, email: ParsedEmail) {
        self.email = email;
    }

    pub fn text(&self) -> &str {
        &self.email.text
    }

    pub fn html(&self) -> Option<&str> {
        self.email.html.as_deref()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.email.attachments
    }

    /// Key of the plain-text artifact.
    pub fn text_key(&self) -> String {
        format!("{}.txt", self.key)
    }

    /// Key of the HTML artifact.
    pub fn html_key(&self) -> String {
        format!("{}.html", self.key)
    }
}
