//! HTTP side of the Estrella del Sur admin panel.
//!
//! Provides the object-storage clients (upload and delete), a typed CRUD
//! client for the admin REST resources, and the [`submit::SubmissionCoordinator`]
//! that turns a [`session::FormSession`] full of staged asset changes into
//! uploads, deletes and a single entity write.

pub mod config;
pub mod entity;
pub mod error;
pub mod session;
pub mod storage;
pub mod submit;
mod transport;
