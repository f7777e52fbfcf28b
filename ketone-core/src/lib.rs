//! Ketone decodes dynamic-keyed JSON documents into typed, ordered containers.
//!
//! Document-oriented realtime databases store collections as JSON objects
//! whose keys are generated identifiers (`"-KzJ8x..."`, `"one"`, `"m1"`)
//! rather than field names. Ketone turns such objects into ordered lists of
//! typed entries while keeping the source key order.
//!
//! Core concepts:
//! - **KeyedEntry**: One `(key, value)` member of a dynamic-keyed object
//! - **OrderedDynamicMap**: A dynamic-keyed object decoded as ordered entries,
//!   with lookup by position and by key
//! - **DynamicRoot**: The same, for a document whose top level is the dynamic object
//! - **Document**: An order-preserving JSON tree that keeps duplicate keys
//!
//! # Example
//!
//! ```
//! use ketone_core::OrderedDynamicMap;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Chat {
//!     title: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct Database {
//!     chats: OrderedDynamicMap<Chat>,
//!     members: OrderedDynamicMap<OrderedDynamicMap<bool>>,
//! }
//!
//! let db: Database = ketone_core::from_str(r#"{
//!     "chats": {"one": {"title": "Historical Tech Pioneers"}},
//!     "members": {"one": {"ghopper": true, "alovelace": true}}
//! }"#).unwrap();
//!
//! assert_eq!(db.chats[0].key, "one");
//! assert_eq!(db.members.get("one").map(|m| m.len()), Some(2));
//! ```
//!
//! # Key order
//!
//! The containers implement `serde::Deserialize` by reading the map stream
//! directly, so with any streaming deserializer (including
//! `serde_json::from_str`) entries follow the source text. The crate's own
//! entry points ([`from_str`], [`from_slice`], [`from_reader`]) additionally
//! report failures as [`Error`] values carrying the key path of the bad value.

mod de;
mod document;
mod entry;
mod error;
mod map;
mod root;
pub mod serde_helpers;

pub use de::{from_document, from_reader, from_slice, from_str, from_value};
pub use document::Document;
pub use entry::KeyedEntry;
pub use error::Error;
pub use map::OrderedDynamicMap;
pub use root::DynamicRoot;
