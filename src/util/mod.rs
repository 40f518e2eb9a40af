//! Small shared helpers.

pub mod size;
