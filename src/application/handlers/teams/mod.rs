//! Team visibility handlers.

mod visibility;

pub use visibility::{
    CanViewHandler, CanViewQuery, CountVisibleHandler, CountVisibleQuery, VisibleCount,
};
