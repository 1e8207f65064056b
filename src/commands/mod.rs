//! Thin CLI-facing collaborators: validate arguments, load inputs, delegate
//! to the engines in [`crate::split`] and [`crate::coverage`]/[`crate::bigwig`].

pub mod bigwig;
pub mod split;

pub use bigwig::BigwigCommand;
pub use split::SplitCommand;
