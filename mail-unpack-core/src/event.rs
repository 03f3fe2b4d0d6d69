//! Storage event notifications.
//!
//! The object store announces new emails with a JSON document of the form
//! `{"Records":[{"s3":{"bucket":{"name":"..."},"object":{"key":"..."}}}]}`.
//! Keys in these documents are escaped (spaces as `+`, the rest
//! percent-encoded) and go through [`crate::key_codec`] inside the pipeline.

use serde::Deserialize;
use tracing::{info, warn};

use crate::contract::{EmailParser, ObjectStore};
use crate::pipeline::Pipeline;

/// One email to unpack, exactly as announced by the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub bucket: String,
    /// Escaped key, not yet decoded.
    pub raw_key: String,
}

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(rename = "Records", default)]
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct Record {
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: BucketEntity,
    object: ObjectEntity,
}

#[derive(Debug, Deserialize)]
struct BucketEntity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ObjectEntity {
    key: String,
}

/// Extract the triggers of an event notification, in record order.
pub fn parse_event(json: &str) -> Result<Vec<Trigger>, serde_json::Error> {
    let notification: Notification = serde_json::from_str(json)?;
    Ok(notification
        .records
        .into_iter()
        .map(|record| Trigger {
            bucket: record.s3.bucket.name,
            raw_key: record.s3.object.key,
        })
        .collect())
}

/// Run the pipeline once per trigger, one after the other.
///
/// Every trigger is attempted even if an earlier one failed. Returns `true`
/// only when there was at least one trigger and all of them succeeded.
pub async fn handle_event<S, P>(pipeline: &Pipeline<'_, S, P>, triggers: &[Trigger]) -> bool
where
    S: ObjectStore + ?Sized,
    P: EmailParser + ?Sized,
{
    if triggers.is_empty() {
        warn!("[EVENT] Event carries no records");
        return false;
    }

    let mut failed = 0;
    for trigger in triggers {
        if !pipeline.run(&trigger.bucket, &trigger.raw_key).await {
            failed += 1;
        }
    }

    info!(records = triggers.len(), failed, "[EVENT] Event handled");
    failed == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_in_order() {
        let json = r#"{
            "Records": [
                {"eventName": "ObjectCreated:Put",
                 "s3": {"bucket": {"name": "mail", "arn": "x"},
                        "object": {"key": "inbox/raw+mail%2B1.eml", "size": 12}}},
                {"s3": {"bucket": {"name": "mail"}, "object": {"key": "inbox/second"}}}
            ]
        }"#;
        let triggers = parse_event(json).unwrap();
        assert_eq!(
            triggers,
            vec![
                Trigger {
                    bucket: "mail".into(),
                    raw_key: "inbox/raw+mail%2B1.eml".into()
                },
                Trigger {
                    bucket: "mail".into(),
                    raw_key: "inbox/second".into()
                },
            ]
        );
    }

    #[test]
    fn missing_records_is_empty() {
        assert!(parse_event("{}").unwrap().is_empty());
    }

    #[test]
    fn record_without_object_is_rejected() {
        assert!(parse_event(r#"{"Records":[{"s3":{"bucket":{"name":"b"}}}]}"#).is_err());
    }
}
