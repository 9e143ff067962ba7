//! Scale target resolution.
//!
//! Turns a `scaleTargetRef` into a [`ScaleHandle`](crate::scale::ScaleHandle)
//! by looking up every scale-capable mapping discovery reported for the
//! reference's group/kind and trying them in order. Discovery results live in
//! a [`MappingCache`] that is rebuilt wholesale on its own timer; resolution
//! only ever reads the current snapshot.

mod cache;
mod core;
mod mapping;


pub use self::cache::{MappingCache, MappingSnapshot, ResourceDiscovery};
pub use self::core::ScaleResolver;
pub use self::mapping::{parse_group_version, GroupKind, ScaleMapping};
