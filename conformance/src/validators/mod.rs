//! Container and sample validators.
//!
//! Each validator looks at the already scanned container entries and never
//! touches the file system itself.

pub mod containment;
pub mod density;
pub mod header;
pub mod naming;
pub mod senses;
