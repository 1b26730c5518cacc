//! Team content visibility.

mod policy;

pub use policy::{VisibilityPolicy, VisibilityRule};
