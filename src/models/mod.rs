//! Core data models for the photo gallery.
//!
//! Records map to the `photos` table via `sqlx::FromRow` and serialize with
//! the camelCase field names the gallery front-end reads.

pub mod photo;
