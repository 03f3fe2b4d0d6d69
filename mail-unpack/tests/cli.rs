use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, NamedTempFile, TempDir};

const RAW_EMAIL: &str = "From: alice@example.com\r\n\
To: bob@example.com\r\n\
Subject: Report\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
\r\n\
--outer\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
see attached\r\n\
--outer\r\n\
Content-Type: application/pdf; name=\"report.pdf\"\r\n\
Content-Disposition: attachment; filename=\"report.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
JVBERi0=\r\n\
--outer--\r\n";

/// Creates a store root holding `mail/in box/raw.eml` and a config pointing at it.
fn setup_store() -> (TempDir, NamedTempFile) {
    let root = tempdir().expect("temp store root");
    let email_dir = root.path().join("mail").join("in box");
    fs::create_dir_all(&email_dir).unwrap();
    fs::write(email_dir.join("raw.eml"), RAW_EMAIL).unwrap();

    let config = NamedTempFile::new().expect("Creating temp config file failed");
    fs::write(
        config.path(),
        format!("store:\n  root: {:?}\n", root.path().display().to_string()),
    )
    .expect("Writing temp config failed");
    (root, config)
}

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("mail-unpack").expect("Binary exists");
    cmd.env_remove("MAIL_UNPACK_STORE_ROOT");
    cmd
}

fn assert_unpacked(root: &Path) {
    let dir = root.join("mail").join("in box");
    assert_eq!(
        fs::read_to_string(dir.join("raw.eml.txt")).unwrap(),
        "see attached"
    );
    assert!(!dir.join("raw.eml.html").exists());
    assert_eq!(
        fs::read(dir.join("attachments").join("report.pdf")).unwrap(),
        b"%PDF-"
    );
}

#[test]
fn unpack_command_writes_artifacts() {
    let (root, config) = setup_store();

    cmd()
        .arg("unpack")
        .arg("--config")
        .arg(config.path())
        .arg("--bucket")
        .arg("mail")
        .arg("--key")
        .arg("in+box/raw.eml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Unpack complete"));

    assert_unpacked(root.path());
}

#[test]
fn unpack_command_fails_for_missing_object() {
    let (root, config) = setup_store();

    cmd()
        .arg("unpack")
        .arg("--config")
        .arg(config.path())
        .arg("--bucket")
        .arg("mail")
        .arg("--key")
        .arg("in+box/other.eml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unpack failed"));

    assert!(!root.path().join("mail/in box/other.eml.txt").exists());
}

#[test]
fn event_command_unpacks_records() {
    let (root, config) = setup_store();
    let event = NamedTempFile::new().unwrap();
    fs::write(
        event.path(),
        r#"{"Records":[{"s3":{"bucket":{"name":"mail"},"object":{"key":"in+box/raw.eml"}}}]}"#,
    )
    .unwrap();

    cmd()
        .arg("event")
        .arg("--config")
        .arg(config.path())
        .arg("--file")
        .arg(event.path())
        .assert()
        .success();

    assert_unpacked(root.path());
}

#[test]
fn event_command_rejects_invalid_json() {
    let (_root, config) = setup_store();
    let event = NamedTempFile::new().unwrap();
    fs::write(event.path(), "not json").unwrap();

    cmd()
        .arg("event")
        .arg("--config")
        .arg(config.path())
        .arg("--file")
        .arg(event.path())
        .assert()
        .failure();
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_and_pipeline_error_events() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use mail_unpack::cli::{run, Cli, Commands};

    let (_root, config) = setup_store();
    let cli = Cli {
        command: Commands::Unpack {
            config: config.path().to_path_buf(),
            bucket: "mail".into(),
            key: "in+box/bad%zz.eml".into(),
        },
    };

    assert!(run(cli).await.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
    assert!(
        event_msgs.iter().any(|msg| msg.contains("Pipeline failed")),
        "Expected a pipeline failure event, got: {:?}",
        event_msgs
    );
}
