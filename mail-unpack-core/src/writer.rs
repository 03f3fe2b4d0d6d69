//! Persists the artifacts of a parsed [`EmailJob`].
//!
//! Every method returns the key it wrote (the write acknowledgement). Writes
//! are plain overwrites of deterministic keys, so a retried run rewrites the
//! same objects. Nothing here retries on failure.

use tracing::info;

use crate::attachment_key::derive_key;
use crate::contract::{Attachment, ObjectStore};
use crate::error::Result;
use crate::job::EmailJob;

pub struct ArtifactWriter<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ObjectStore + ?Sized> ArtifactWriter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Store the text body under `<key>.txt`. Runs even when the text is empty.
    pub async fn write_text(&self, job: &EmailJob) -> Result<String> {
        let key = job.text_key();
        info!(bucket = %job.bucket, key = %key, bytes = job.text().len(), "Saving text body");
        self.store
            .put(&job.bucket, &key, job.text().as_bytes().to_vec())
            .await?;
        Ok(key)
    }

    /// Store the HTML body under `<key>.html`, or do nothing if the email has none.
    pub async fn write_html(&self, job: &EmailJob) -> Result<Option<String>> {
        let Some(html) = job.html() else {
            info!(bucket = %job.bucket, key = %job.key, "No HTML body, skipping");
            return Ok(None);
        };

        let key = job.html_key();
        info!(bucket = %job.bucket, key = %key, bytes = html.len(), "Saving HTML body");
        self.store
            .put(&job.bucket, &key, html.as_bytes().to_vec())
            .await?;
        Ok(Some(key))
    }

    /// Store one attachment under its derived key.
    pub async fn write_attachment(&self, job: &EmailJob, attachment: &Attachment) -> Result<String> {
        let key = derive_key(
            &job.key,
            &attachment.filename,
            attachment.content_id.as_deref(),
        );
        info!(
            bucket = %job.bucket,
            key = %key,
            attachment = %attachment.filename,
            bytes = attachment.bytes.len(),
            "Saving attachment"
        );
        self.store
            .put(&job.bucket, &key, attachment.bytes.clone())
            .await?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{MockObjectStore, ParsedEmail};
    use crate::error::UnpackError;
    use crate::store::MemoryStore;

    fn job(html: Option<&str>) -> EmailJob {
        let mut job = EmailJob::new("mail", "in/raw.eml");
        job.set_email(ParsedEmail {
            text: String::new(),
            html: html.map(String::from),
            attachments: vec![Attachment {
                filename: "x.pdf".into(),
                content_id: Some("c9".into()),
                bytes: b"%PDF".to_vec(),
            }],
        });
        job
    }

    #[tokio::test]
    async fn empty_text_is_still_written() {
        let store = MemoryStore::new();
        let key = ArtifactWriter::new(&store).write_text(&job(None)).await.unwrap();
        assert_eq!(key, "in/raw.eml.txt");
        assert_eq!(store.object("mail", "in/raw.eml.txt").unwrap(), b"");
    }

    #[tokio::test]
    async fn absent_html_is_skipped_but_empty_html_is_written() {
        let store = MemoryStore::new();
        let writer = ArtifactWriter::new(&store);

        assert_eq!(writer.write_html(&job(None)).await.unwrap(), None);
        assert!(store.put_log().is_empty());

        let written = writer.write_html(&job(Some(""))).await.unwrap();
        assert_eq!(written.as_deref(), Some("in/raw.eml.html"));
        assert_eq!(store.object("mail", "in/raw.eml.html").unwrap(), b"");
    }

    #[tokio::test]
    async fn attachment_goes_to_derived_key() {
        let store = MemoryStore::new();
        let job = job(None);
        let key = ArtifactWriter::new(&store)
            .write_attachment(&job, &job.attachments()[0])
            .await
            .unwrap();
        assert_eq!(key, "in/attachments/c9 - x.pdf");
        assert_eq!(store.object("mail", &key).unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn storage_failure_is_returned_once() {
        let mut store = MockObjectStore::new();
        store
            .expect_put()
            .times(1)
            .returning(|bucket, key, _| Err(UnpackError::storage(bucket, key, "disk full")));

        let err = ArtifactWriter::new(&store)
            .write_text(&job(None))
            .await
            .unwrap_err();
        assert!(matches!(err, UnpackError::Storage { .. }));
    }
}
