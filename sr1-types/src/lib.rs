//! # sr1-types
//!
//! Value-level building blocks shared by the sr1 containers: key paths,
//! the pure path mutator, frozen snapshots, and the route `View`.
//!
//! Nothing in this crate knows about history, storage, or listeners. The
//! functions in [`mutate`] never modify their input; they return a new tree.

mod key_path;
pub mod mutate;
mod snapshot;
mod view;

pub use key_path::{KeyPath, PathSegment};
pub use snapshot::Snapshot;
pub use view::View;

/// Build a `Vec<PathSegment>` from string and integer literals.
///
/// ```
/// use sr1_types::{path, PathSegment};
///
/// let p = path!["todos", 0, "done"];
/// assert_eq!(p[1], PathSegment::Index(0));
/// assert!(path![].is_empty());
/// ```
#[macro_export]
macro_rules! path {
    () => {
        ::std::vec::Vec::<$crate::PathSegment>::new()
    };
    ($($seg:expr),+ $(,)?) => {
        ::std::vec![$($crate::PathSegment::from($seg)),+]
    };
}
