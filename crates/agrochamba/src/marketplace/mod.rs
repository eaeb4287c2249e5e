//! Job marketplace workflows.

pub mod applications;
