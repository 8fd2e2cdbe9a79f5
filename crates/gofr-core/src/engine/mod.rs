//! # Engine Module
//!
//! Stateful machinery shared by every time-averaged analysis.
//!
//! An analysis implements [`command::AverageCommand`]: it builds its state
//! once, folds every frame into it, and turns it into a report exactly once.
//! [`runner::run`] owns that state for the whole trajectory and drives the
//! lifecycle in order, reporting progress through [`progress::ProgressReporter`].

pub mod command;
pub mod config;
pub mod error;
pub mod histogram;
pub mod progress;
pub mod runner;
