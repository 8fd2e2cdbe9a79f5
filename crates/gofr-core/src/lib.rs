//! # gofr Core Library
//!
//! Streaming analysis of molecular dynamics trajectories, centered on the
//! radial distribution function g(r) and angle distributions.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Frame`, `UnitCell`),
//!   the atom selection language, and trajectory input.
//!
//! - **[`engine`]: The Logic Core.** The fixed-bin `Histogram`, the
//!   configure / accumulate / finalize lifecycle (`AverageCommand`) and the
//!   runner that streams frames through it.
//!
//! - **[`workflows`]: The Public API.** Complete analyses built on the engine,
//!   such as [`workflows::rdf`] and [`workflows::angles`].

pub mod core;
pub mod engine;
pub mod workflows;
