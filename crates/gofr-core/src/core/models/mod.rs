//! Frame and unit cell representations.

pub mod cell;
pub mod frame;
