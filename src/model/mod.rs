//! Binding model: keys and resolved binding recipes.

pub mod binding;
pub mod key;

pub use binding::{Binding, BindingKind, ConstantValue, Dependency, Scoping};
pub use key::{BindingKey, TypeRef};
