//! # Core Module
//!
//! Data models and external collaborators consumed by the analysis engine.
//!
//! - **Molecular Representation** ([`models`]) - Frames and periodic unit cells
//! - **Atom Selection** ([`selection`]) - A small selection language producing
//!   single-atom lists or explicit atom tuples
//! - **File I/O** ([`io`]) - Streaming trajectory readers
//!
//! Nothing in this module keeps state across frames; accumulation lives in
//! [`crate::engine`].

pub mod io;
pub mod models;
pub mod selection;
