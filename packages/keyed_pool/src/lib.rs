#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! This package provides [`PoolRegistry`], an object pool that is filled once at startup from a
//! list of [`PoolSpec`] entries and then serves reusable instances by category key.
//!
//! Each key owns a FIFO queue of parked objects. Checking out an object removes it from the
//! queue and marks it active; checking it back in parks it, marks it inactive and appends it
//! to the back of the queue. Objects are never created or destroyed after the registry is built.
//!
//! # Features
//!
//! - **Pre-allocated**: every instance is created up front by an [`InstanceFactory`].
//! - **Keyed**: any hashable, cloneable type can act as the pool key.
//! - **Checked**: exhaustion, unknown keys, key mismatches and foreign objects are reported
//!   as [`Error`] values instead of being silently ignored.
//! - **Engine-agnostic**: visual side effects of parking and activating objects are delegated
//!   to a [`PlacementSink`].
//! - **Thread-safe and single-threaded variants**: [`SharedPoolRegistry`] for multi-threaded
//!   use, [`PoolRegistry`] for single-threaded use.
//! - **Declarative configuration**: specs can be loaded from TOML via [`PoolManifest`].
//!
//! # Example
//!
//! ```rust
//! use keyed_pool::{PoolRegistry, PoolSpec};
//!
//! #[derive(Clone, Debug, Eq, Hash, PartialEq)]
//! enum Kind {
//!     Bullet,
//!     Spark,
//! }
//!
//! let specs = [
//!     PoolSpec::new(Kind::Bullet, "bullet", 2),
//!     PoolSpec::new(Kind::Spark, "spark", 8),
//! ];
//!
//! // The factory turns a template into a fresh instance.
//! let mut registry = PoolRegistry::new(specs, |template: &&str| template.to_string())?;
//!
//! let bullet = registry.checkout(&Kind::Bullet)?;
//! assert!(bullet.is_active());
//! assert_eq!(registry.parked(&Kind::Bullet), Some(1));
//!
//! registry.check_in(bullet, &Kind::Bullet)?;
//! assert_eq!(registry.parked(&Kind::Bullet), Some(2));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! For use from multiple threads:
//!
//! ```rust
//! use std::thread;
//!
//! use keyed_pool::{PoolSpec, SharedPoolRegistry};
//!
//! let registry = SharedPoolRegistry::new([PoolSpec::new("enemy", (), 4)], |_: &()| 0_u32)?;
//!
//! let worker = thread::spawn({
//!     let registry = registry.clone();
//!     move || {
//!         let enemy = registry.checkout(&"enemy").unwrap();
//!         registry.check_in(enemy, &"enemy").unwrap();
//!     }
//! });
//!
//! worker.join().unwrap();
//! assert_eq!(registry.parked(&"enemy"), Some(4));
//! # Ok::<(), keyed_pool::Error>(())
//! ```

mod builder;
mod drop_policy;
mod error;
mod factory;
mod key_queue;
mod manifest;
mod metrics;
mod placement;
mod pool_spec;
mod pooled;
mod registry;
mod shared_registry;

pub use builder::*;
pub use drop_policy::*;
pub use error::*;
pub use factory::*;
pub(crate) use key_queue::*;
pub use manifest::*;
pub use placement::*;
pub use pool_spec::*;
pub use pooled::*;
pub use registry::*;
pub use shared_registry::*;
