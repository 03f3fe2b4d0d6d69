#![doc = "mail-unpack-core: core logic library for mail-unpack."]

//! This crate holds the pipeline that turns a raw MIME email stored in an
//! object store into readable artifacts stored next to it:
//! `<key>.txt`, `<key>.html` and `<dir>/attachments/<name>`.
//!
//! # Usage
//! Build a [`pipeline::Pipeline`] from any [`contract::ObjectStore`] and
//! [`contract::EmailParser`] implementation and call [`pipeline::Pipeline::run`]
//! with the bucket and the escaped key from the storage event.

pub mod attachment_key;
pub mod config;
pub mod contract;
pub mod error;
pub mod event;
pub mod job;
pub mod key_codec;
pub mod mime;
pub mod pipeline;
pub mod store;
pub mod writer;

pub use error::{Result, UnpackError};
