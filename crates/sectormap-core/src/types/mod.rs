//! Type system utilities and aliases.
//!
//! - [`aliases`]: `Arc<Mutex<T>>` shorthand.

pub mod aliases;

pub use aliases::*;
