//! High-level pipeline: decode → fetch → parse → write text → write HTML → write attachments.
//!
//! A run is a small state machine over one [`EmailJob`]. Each stage either
//! succeeds and hands over to the next one, or fails and ends the run with a
//! [`PipelineFailure`] naming the stage. Stages run strictly one after the
//! other; attachments are written one at a time in the order the parser
//! returned them.
//!
//! # Error Handling
//! There is no recovery and no rollback. Artifacts written before the failing
//! stage stay in the store; a retried run rewrites every artifact under the
//! same keys.
//!
//! # Navigation
//! - Main entrypoints: [`Pipeline::run`] (boolean result) and
//!   [`Pipeline::execute`] (full report or failure).

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::contract::{EmailParser, ObjectStore};
use crate::error::UnpackError;
use crate::job::EmailJob;
use crate::key_codec;
use crate::writer::ArtifactWriter;

/// The non-failed states of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    Decoding,
    Fetching,
    Parsing,
    WritingText,
    WritingHtml,
    WritingAttachments,
    Done,
}

impl Stage {
    /// The stage that follows this one for `job`.
    ///
    /// `WritingHtml` is skipped when the email has no HTML body.
    pub fn next(self, job: &EmailJob) -> Stage {
        match self {
            Stage::Decoding => Stage::Fetching,
            Stage::Fetching => Stage::Parsing,
            Stage::Parsing => Stage::WritingText,
            Stage::WritingText if job.html().is_some() => Stage::WritingHtml,
            Stage::WritingText | Stage::WritingHtml => Stage::WritingAttachments,
            Stage::WritingAttachments | Stage::Done => Stage::Done,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Decoding => "decoding",
            Stage::Fetching => "fetching",
            Stage::Parsing => "parsing",
            Stage::WritingText => "writing_text",
            Stage::WritingHtml => "writing_html",
            Stage::WritingAttachments => "writing_attachments",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Terminal failed state: the stage that failed and why.
#[derive(Debug, Error)]
#[error("stage {stage} failed: {error}")]
pub struct PipelineFailure {
    pub stage: Stage,
    #[source]
    pub error: UnpackError,
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct UnpackReport {
    pub bucket: String,
    /// Decoded key of the source email.
    pub key: String,
    /// Stages visited, ending with [`Stage::Done`].
    pub stages: Vec<Stage>,
    /// Keys written, in write order. A key appears twice when an attachment
    /// overwrote an earlier one.
    pub written: Vec<String>,
}

/// Unpacks emails using an injected store and parser.
///
/// The pipeline holds no per-run state, so one instance can serve any number
/// of runs.
pub struct Pipeline<'a, S: ?Sized, P: ?Sized> {
    store: &'a S,
    parser: &'a P,
}

impl<'a, S, P> Pipeline<'a, S, P>
where
    S: ObjectStore + ?Sized,
    P: EmailParser + ?Sized,
{
    pub fn new(store: &'a S, parser: &'a P) -> Self {
        Self { store, parser }
    }

    /// Run the pipeline and report only whether every stage succeeded.
    ///
    /// Failures are logged here; callers use the boolean to decide on redelivery.
    pub async fn run(&self, bucket: &str, raw_key: &str) -> bool {
        match self.execute(bucket, raw_key).await {
            Ok(report) => {
                info!(
                    bucket = %report.bucket,
                    key = %report.key,
                    objects = report.written.len(),
                    "[UNPACK] Email unpacked"
                );
                true
            }
            Err(failure) => {
                error!(
                    bucket,
                    raw_key,
                    stage = %failure.stage,
                    error = %failure.error,
                    "[UNPACK][ERROR] Pipeline failed"
                );
                false
            }
        }
    }

    /// Run the pipeline, returning the report or the failing stage.
    pub async fn execute(
        &self,
        bucket: &str,
        raw_key: &str,
    ) -> Result<UnpackReport, PipelineFailure> {
        let mut stage = Stage::Decoding;
        let mut stages = vec![stage];

        let key = key_codec::decode(raw_key).map_err(|error| PipelineFailure { stage, error })?;
        info!(bucket, raw_key, key = %key, "[UNPACK] Decoded storage key");

        let mut job = EmailJob::new(bucket, key);
        let mut written = Vec::new();
        stage = stage.next(&job);

        while stage != Stage::Done {
            stages.push(stage);
            info!(bucket, key = %job.key, stage = %stage, "[UNPACK] Entering stage");
            self.step(stage, &mut job, &mut written)
                .await
                .map_err(|error| PipelineFailure { stage, error })?;
            stage = stage.next(&job);
        }
        stages.push(Stage::Done);

        Ok(UnpackReport {
            bucket: job.bucket,
            key: job.key,
            stages,
            written,
        })
    }

    async fn step(
        &self,
        stage: Stage,
        job: &mut EmailJob,
        written: &mut Vec<String>,
    ) -> Result<(), UnpackError> {
        let writer = ArtifactWriter::new(self.store);

        match stage {
            Stage::Fetching => {
                let bytes = self.store.get(&job.bucket, &job.key).await?;
                info!(bytes = bytes.len(), "[UNPACK] Loaded raw email");
                job.set_raw_bytes(bytes);
            }
            Stage::Parsing => {
                let email = self
                    .parser
                    .parse(job.raw_bytes().unwrap_or_default())
                    .await?;
                info!(
                    has_html = email.html.is_some(),
                    attachments = email.attachments.len(),
                    "[UNPACK] Parsed email"
                );
                job.set_email(email);
            }
            Stage::WritingText => {
                written.push(writer.write_text(job).await?);
            }
            Stage::WritingHtml => {
                written.extend(writer.write_html(job).await?);
            }
            Stage::WritingAttachments => {
                let mut seen = HashSet::new();
                for attachment in job.attachments() {
                    let key = writer.write_attachment(job, attachment).await?;
                    if !seen.insert(key.clone()) {
                        warn!(
                            key = %key,
                            attachment = %attachment.filename,
                            "[UNPACK] Attachment key already written in this run, earlier attachment overwritten"
                        );
                    }
                    written.push(key);
                }
            }
            Stage::Decoding | Stage::Done => {}
        }
        Ok(())
    }
}
