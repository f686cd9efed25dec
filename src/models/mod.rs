//! Record model helpers
//!
//! Records are held as `DynamicObject`. This module converts them to and from
//! the typed `k8s-openapi` views the resolver works with, and answers the
//! identity and ownership questions every relationship starts from.
//!
//! Structure:
//! - `convert.rs` - record <-> typed conversion
//! - `ownership.rs` - controller references and object identity

mod convert;
mod ownership;

pub use convert::{kind_of, to_dynamic, to_typed};
pub use ownership::{ObjectIdentity, controller_of, is_controlled_by};
