//! Template matching and callback dispatch for INSTEON messages.
//!
//! A [`Template`] is a partially specified message; unset fields are
//! wildcards. A [`CallbackRegistry`] holds ordered `(template, handler)`
//! pairs and fires every handler whose template matches an incoming message,
//! in registration order.

pub mod callbacks;
pub mod template;

pub use callbacks::CallbackRegistry;
pub use template::{matches, FlagsTemplate, Template, UserDataTemplate};
