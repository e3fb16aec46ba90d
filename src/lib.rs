// SPDX-License-Identifier: MPL-2.0
//! `gallery_loader` loads the pictures of a back-office application lazily.
//!
//! It fetches placeholders once they scroll into view, retrying with backoff
//! and falling back to a secondary source, preloads the neighbors of the item
//! shown in a gallery, and shrinks images on the client before upload.
//!
//! The crate never installs a `tracing` subscriber; hosts decide where logs go.

#![doc(html_root_url = "https://docs.rs/gallery_loader/0.3.0")]

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod media;

#[cfg(test)]
mod test_utils;
