//! Adapter implementations for port traits.
//!
//! - `live/` — Real inference endpoint, media library and share target

pub mod live;
