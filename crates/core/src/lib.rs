//! Domain logic for the Estrella del Sur admin panel.
//!
//! Everything here is free of network I/O: asset validation, local
//! previews, the staged asset slot state machine, upload configuration,
//! typed entity models and list queries. The HTTP side lives in
//! `estrella-client`.

pub mod assets;
pub mod config;
pub mod entities;
pub mod error;
pub mod notice;
pub mod query;
pub mod types;
