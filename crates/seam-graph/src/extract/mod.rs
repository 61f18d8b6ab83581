//! Dependency and binding extraction.
//!
//! Scripts are parsed with oxc and analyzed once: imports, exports, the
//! module syntax to strip, and the [`ScopeTable`](crate::ScopeTable) of
//! top-level bindings. Stylesheets are scanned for `@import` and `url()`.

mod script;
mod style;

pub use script::extract_script;
pub use style::extract_style;
