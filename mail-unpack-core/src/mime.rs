//! MIME decomposition backed by `mail-parser`.

use async_trait::async_trait;
use mail_parser::{Message, MessageParser, MimeHeaders, PartType};
use tracing::debug;

use crate::contract::{Attachment, EmailParser, ParsedEmail};
use crate::error::{Result, UnpackError};

/// [`EmailParser`] implementation on top of `mail_parser::MessageParser`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MailParser;

impl MailParser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailParser for MailParser {
    async fn parse(&self, raw: &[u8]) -> Result<ParsedEmail> {
        parse_message(raw)
    }
}

/// Decompose a raw message into text, HTML and attachments.
pub fn parse_message(raw: &[u8]) -> Result<ParsedEmail> {
    if raw.is_empty() {
        return Err(UnpackError::Parse("message is empty".into()));
    }

    let msg = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| UnpackError::Parse("not a parseable MIME message".into()))?;

    let text = msg
        .body_text(0)
        .map(|s| s.into_owned())
        .unwrap_or_default();
    let html = html_body(&msg);
    let attachments = collect_attachments(&msg);

    debug!(
        text_len = text.len(),
        has_html = html.is_some(),
        attachments = attachments.len(),
        "Parsed MIME message"
    );

    Ok(ParsedEmail {
        text,
        html,
        attachments,
    })
}

/// First genuine `text/html` body part.
///
/// `mail-parser` lists plain-text parts in `html_body` when a message has no
/// HTML alternative, and `body_html` would convert them. Only parts that are
/// HTML on the wire count.
fn html_body(msg: &Message<'_>) -> Option<String> {
    msg.html_body
        .iter()
        .filter_map(|id| msg.parts.get(*id as usize))
        .find_map(|part| match &part.body {
            PartType::Html(html) => Some(html.to_string()),
            _ => None,
        })
}

fn collect_attachments(msg: &Message<'_>) -> Vec<Attachment> {
    msg.attachments()
        .enumerate()
        .map(|(idx, part)| Attachment {
            filename: part
                .attachment_name()
                .map(String::from)
                .unwrap_or_else(|| format!("attachment-{}", idx + 1)),
            content_id: part
                .content_id()
                .map(|cid| cid.trim().trim_start_matches('<').trim_end_matches('>'))
                .filter(|cid| !cid.is_empty())
                .map(String::from),
            bytes: part.contents().to_vec(),
        })
        .collect()
}
