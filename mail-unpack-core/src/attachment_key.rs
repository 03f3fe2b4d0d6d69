//! Storage keys for attachments.
//!
//! Attachments live in an `attachments/` directory next to the source email,
//! so `mail/2024/raw.eml` puts its files under `mail/2024/attachments/`.
//! A content-id prefix keeps same-named inline parts apart. Two attachments
//! with the same file name and no content-id map to the same key and the
//! later write replaces the earlier one.

/// Directory name, relative to the source email, that holds its attachments.
pub const ATTACHMENTS_DIR: &str = "attachments";

/// Derive the key an attachment is stored under.
///
/// ```
/// use mail_unpack_core::attachment_key::derive_key;
///
/// assert_eq!(derive_key("a/b/raw.eml", "x.pdf", None), "a/b/attachments/x.pdf");
/// assert_eq!(derive_key("a/b/raw.eml", "x.pdf", Some("c1")), "a/b/attachments/c1 - x.pdf");
/// ```
pub fn derive_key(source_key: &str, filename: &str, content_id: Option<&str>) -> String {
    let mut segments: Vec<&str> = source_key.split('/').collect();
    segments.pop();
    let base_path = segments.join("/");

    match content_id {
        Some(cid) => format!("{base_path}/{ATTACHMENTS_DIR}/{cid} - {filename}"),
        None => format!("{base_path}/{ATTACHMENTS_DIR}/{filename}"),
    }
}
