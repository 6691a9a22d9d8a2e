//! The daily cycle: read, decide, confirm, write.

pub mod accountant;
pub mod confirm;
pub mod cycle;
pub mod executor;
pub mod machine;
