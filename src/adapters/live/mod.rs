//! Live adapters talking to the network, the filesystem and the desktop.

pub mod inference;
pub mod library;
pub mod share;
