//! Core domain entities.
//!
//! - [`ShortLink`] - A short code mapped to a target URL for one owner
//!
//! Owners are opaque UUIDs issued by the account system; the core never
//! manages them beyond using them as a foreign key.

pub mod short_link;

pub use short_link::ShortLink;
