use std::fmt::Debug;
use std::hash::Hash;

use crate::{
    DropPolicy, InstanceFactory, NoPlacement, PlacementSink, PoolRegistry, PoolSpec, Result,
    SharedPoolRegistry,
};

/// Builder for creating an instance of [`PoolRegistry`] or [`SharedPoolRegistry`].
///
/// This builder allows configuration of registry behavior before the pools are filled.
///
/// # Examples
///
/// ```
/// use keyed_pool::{DropPolicy, PoolRegistry, PoolSpec};
///
/// // Default registry.
/// let registry = PoolRegistry::builder().build([PoolSpec::new(1, (), 4)], |_: &()| "shell")?;
///
/// // With custom drop policy.
/// let registry = PoolRegistry::builder()
///     .drop_policy(DropPolicy::MustNotAbandonCheckedOut)
///     .build([PoolSpec::new(1, (), 4)], |_: &()| "shell")?;
/// # Ok::<(), keyed_pool::Error>(())
/// ```
#[derive(Debug)]
#[must_use]
pub struct PoolRegistryBuilder<P = NoPlacement> {
    placement: P,
    drop_policy: DropPolicy,
}

impl PoolRegistryBuilder {
    pub(crate) fn new() -> Self {
        Self {
            placement: NoPlacement,
            drop_policy: DropPolicy::default(),
        }
    }
}

impl<P> PoolRegistryBuilder<P> {
    /// Sets the [placement sink][PlacementSink] that receives park and activate requests for
    /// the objects of the registry.
    ///
    /// # Examples
    ///
    /// ```
    /// use keyed_pool::{PlacementSink, PoolRegistry, PoolSpec};
    ///
    /// #[derive(Debug)]
    /// struct ResetPosition;
    ///
    /// impl PlacementSink<(i32, i32)> for ResetPosition {
    ///     fn park(&self, position: &mut (i32, i32)) {
    ///         *position = (0, 0);
    ///     }
    /// }
    ///
    /// let mut registry = PoolRegistry::builder()
    ///     .placement(ResetPosition)
    ///     .build([PoolSpec::new("drone", (), 1)], |_: &()| (5, 5))?;
    ///
    /// let mut drone = registry.checkout(&"drone")?;
    /// assert_eq!(*drone, (0, 0));
    ///
    /// *drone = (12, -3);
    /// registry.check_in(drone, &"drone")?;
    ///
    /// assert_eq!(*registry.checkout(&"drone")?, (0, 0));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn placement<P2>(self, placement: P2) -> PoolRegistryBuilder<P2> {
        PoolRegistryBuilder {
            placement,
            drop_policy: self.drop_policy,
        }
    }

    /// Sets the [drop policy][DropPolicy] for the registry. This governs how to treat objects
    /// that are still checked out when the registry is dropped.
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds a single-threaded registry, creating every object declared by `specs` with
    /// `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`][crate::Error::Configuration] if two specs share a key.
    /// In that case the factory is never called.
    pub fn build<K, R, T, F>(
        self,
        specs: impl IntoIterator<Item = PoolSpec<K, R>>,
        mut factory: F,
    ) -> Result<PoolRegistry<K, T, P>>
    where
        K: Eq + Hash + Clone + Debug,
        F: InstanceFactory<R, T>,
        P: PlacementSink<T>,
    {
        PoolRegistry::new_inner(specs, &mut factory, self.placement, self.drop_policy)
    }

    /// Builds a thread-safe registry, creating every object declared by `specs` with
    /// `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`][crate::Error::Configuration] if two specs share a key.
    /// In that case the factory is never called.
    pub fn build_shared<K, R, T, F>(
        self,
        specs: impl IntoIterator<Item = PoolSpec<K, R>>,
        factory: F,
    ) -> Result<SharedPoolRegistry<K, T, P>>
    where
        K: Eq + Hash + Clone + Debug,
        F: InstanceFactory<R, T>,
        P: PlacementSink<T>,
    {
        self.build(specs, factory).map(SharedPoolRegistry::from)
    }
}
