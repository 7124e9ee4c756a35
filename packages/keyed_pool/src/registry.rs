use std::fmt::{self, Debug};
use std::hash::Hash;

use foldhash::HashMap;

use crate::{
    CheckInResult, DropPolicy, InstanceFactory, KeyQueue, NoPlacement, PlacementSink,
    PoolRegistryBuilder, PoolSpec, PooledObject, RegistryId, Result, check_in_to, checkout_from,
    prefill,
};

/// A single-threaded registry of pre-populated object pools, one pool per key.
///
/// The registry is filled once when it is built: for every [`PoolSpec`], `count` instances are
/// created by an [`InstanceFactory`], parked and queued under the spec's key. From then on,
/// objects move between their pool and callers but are never created or destroyed.
///
/// * [`checkout()`][Self::checkout] removes the object at the front of a key's queue, marks it
///   active and moves it to the caller.
/// * [`check_in()`][Self::check_in] parks an object, marks it inactive and appends it to the back
///   of its key's queue, so objects are reused in the order they were returned.
///
/// Parking and activating may have side effects in the host environment (hiding an object,
/// moving it to a holding area). These are delegated to the [`PlacementSink`] the registry was
/// built with.
///
/// # Example
///
/// ```rust
/// use keyed_pool::{Error, PoolRegistry, PoolSpec};
///
/// let mut registry = PoolRegistry::new(
///     [PoolSpec::new("a", (), 2), PoolSpec::new("b", (), 0)],
///     |_: &()| String::new(),
/// )?;
///
/// let first = registry.checkout(&"a")?;
/// let second = registry.checkout(&"a")?;
/// assert_ne!(first.id(), second.id());
///
/// assert!(matches!(registry.checkout(&"a"), Err(Error::PoolExhausted { .. })));
/// assert!(matches!(registry.checkout(&"b"), Err(Error::PoolExhausted { .. })));
/// assert!(matches!(registry.checkout(&"c"), Err(Error::UnknownKey { .. })));
/// # Ok::<(), Error>(())
/// ```
///
/// # Thread safety
///
/// This type is thread-mobile ([`Send`]) if its keys, instances and placement sink are, but its
/// operations require exclusive access. For concurrent use, convert it into a
/// [`SharedPoolRegistry`][crate::SharedPoolRegistry].
pub struct PoolRegistry<K, T, P = NoPlacement> {
    id: RegistryId,
    queues: HashMap<K, KeyQueue<K, T>>,
    placement: P,
}

impl<K, T> PoolRegistry<K, T>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Builds a registry with default configuration, creating every object declared by `specs`
    /// with `factory`.
    ///
    /// For custom configuration, use [`PoolRegistry::builder()`][PoolRegistry::builder].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`][crate::Error::Configuration] if two specs share a key.
    /// In that case the factory is never called and no registry is created.
    pub fn new<R, F>(specs: impl IntoIterator<Item = PoolSpec<K, R>>, factory: F) -> Result<Self>
    where
        F: InstanceFactory<R, T>,
    {
        PoolRegistryBuilder::new().build(specs, factory)
    }
}

impl PoolRegistry<(), ()> {
    /// Creates a builder for configuring and constructing a [`PoolRegistry`] or a
    /// [`SharedPoolRegistry`][crate::SharedPoolRegistry].
    ///
    /// # Example
    ///
    /// ```rust
    /// use keyed_pool::{DropPolicy, PoolRegistry, PoolSpec};
    ///
    /// let registry = PoolRegistry::builder()
    ///     .drop_policy(DropPolicy::MustNotAbandonCheckedOut)
    ///     .build([PoolSpec::new('x', (), 1)], |_: &()| 0_u64)?;
    /// # Ok::<(), keyed_pool::Error>(())
    /// ```
    pub fn builder() -> PoolRegistryBuilder {
        PoolRegistryBuilder::new()
    }
}

impl<K, T, P> PoolRegistry<K, T, P>
where
    K: Eq + Hash + Clone + Debug,
    P: PlacementSink<T>,
{
    /// Creates a new registry with the specified configuration.
    ///
    /// This method is used internally by the builder to construct the actual registry.
    pub(crate) fn new_inner<R, F>(
        specs: impl IntoIterator<Item = PoolSpec<K, R>>,
        factory: &mut F,
        placement: P,
        drop_policy: DropPolicy,
    ) -> Result<Self>
    where
        F: InstanceFactory<R, T>,
    {
        let id = RegistryId::next();
        let queues = prefill(specs, factory, &placement, id, drop_policy)?;

        Ok(Self {
            id,
            queues,
            placement,
        })
    }

    /// Removes the object at the front of the pool for `key`, marks it active and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownKey`][crate::Error::UnknownKey] if no pool was registered for
    /// `key` and [`Error::PoolExhausted`][crate::Error::PoolExhausted] if the pool has no parked
    /// objects left. The registry is unaffected by either failure.
    ///
    /// # Example
    ///
    /// ```rust
    /// use keyed_pool::{PoolRegistry, PoolSpec};
    ///
    /// let mut registry = PoolRegistry::new([PoolSpec::new(1_u8, (), 1)], |_: &()| 'x')?;
    ///
    /// let object = registry.checkout(&1)?;
    /// assert!(object.is_active());
    /// assert_eq!(registry.parked(&1), Some(0));
    /// assert_eq!(registry.checked_out(&1), Some(1));
    /// # Ok::<(), keyed_pool::Error>(())
    /// ```
    pub fn checkout(&mut self, key: &K) -> Result<PooledObject<K, T>> {
        checkout_from(self.queues.get_mut(key), key, &self.placement)
    }

    /// Parks `object`, marks it inactive and appends it to the back of the pool for `key`.
    ///
    /// # Errors
    ///
    /// The check-in is rejected if no pool was registered for `key`, if `object` was created by
    /// a different registry or if `object` was created for a key other than `key`. The returned
    /// [`CheckInError`][crate::CheckInError] hands the object back to the caller.
    ///
    /// # Example
    ///
    /// ```rust
    /// use keyed_pool::{Error, PoolRegistry, PoolSpec};
    ///
    /// let mut registry = PoolRegistry::new(
    ///     [PoolSpec::new("red", (), 1), PoolSpec::new("blue", (), 1)],
    ///     |_: &()| 0_i32,
    /// )?;
    ///
    /// let red = registry.checkout(&"red")?;
    ///
    /// // Checking in under the wrong key is rejected and the object is handed back.
    /// let rejected = registry.check_in(red, &"blue").unwrap_err();
    /// assert!(matches!(rejected.error(), Error::KeyMismatch { .. }));
    ///
    /// registry.check_in(rejected.into_object(), &"red")?;
    /// assert_eq!(registry.parked(&"red"), Some(1));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn check_in(
        &mut self,
        object: PooledObject<K, T>,
        key: &K,
    ) -> CheckInResult<K, T> {
        check_in_to(
            self.queues.get_mut(key),
            self.id,
            object,
            key,
            &self.placement,
        )
    }
}

impl<K, T, P> PoolRegistry<K, T, P>
where
    K: Eq + Hash,
{
    /// Whether a pool is registered for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.queues.contains_key(key)
    }

    /// The number of objects currently parked in the pool for `key`, or `None` if no pool is
    /// registered for `key`.
    #[must_use]
    pub fn parked(&self, key: &K) -> Option<usize> {
        self.queues.get(key).map(KeyQueue::parked)
    }

    /// The number of objects that were created for the pool for `key`, or `None` if no pool is
    /// registered for `key`.
    #[must_use]
    pub fn capacity(&self, key: &K) -> Option<usize> {
        self.queues.get(key).map(KeyQueue::capacity)
    }

    /// The number of objects from the pool for `key` that are currently checked out, or `None`
    /// if no pool is registered for `key`.
    #[must_use]
    pub fn checked_out(&self, key: &K) -> Option<usize> {
        self.queues.get(key).map(KeyQueue::checked_out)
    }

    /// The number of objects parked across all pools.
    #[must_use]
    pub fn total_parked(&self) -> usize {
        self.queues.values().map(KeyQueue::parked).sum()
    }

    /// The number of objects checked out across all pools.
    #[must_use]
    pub fn total_checked_out(&self) -> usize {
        self.queues.values().map(KeyQueue::checked_out).sum()
    }
}

impl<K, T, P> PoolRegistry<K, T, P> {
    /// The keys of all registered pools, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.queues.keys()
    }

    /// The number of registered pools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// Whether the registry has no pools at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// The placement sink the registry was built with.
    #[must_use]
    pub fn placement(&self) -> &P {
        &self.placement
    }

    pub(crate) fn into_parts(self) -> (RegistryId, HashMap<K, KeyQueue<K, T>>, P) {
        (self.id, self.queues, self.placement)
    }
}

// Debug implementations have no API contract to test.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl<K: Debug, T, P: Debug> Debug for PoolRegistry<K, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolRegistry")
            .field("keys", &self.queues.keys().collect::<Vec<_>>())
            .field("placement", &self.placement)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;

    use mockall::Sequence;
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::{Error, MockPlacementSink};

    assert_impl_all!(PoolRegistry<u32, String>: Send, Sync);
    assert_not_impl_any!(PoolRegistry<u32, Cell<u32>>: Sync);

    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    enum Kind {
        A,
        B,
        C,
    }

    fn registry_ab() -> PoolRegistry<Kind, u32> {
        PoolRegistry::new(
            [PoolSpec::new(Kind::A, 100, 2), PoolSpec::new(Kind::B, 200, 0)],
            |template: &u32| *template,
        )
        .unwrap()
    }

    #[test]
    fn build_creates_one_parked_queue_per_key() {
        let registry = registry_ab();

        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert!(registry.contains_key(&Kind::A));
        assert!(registry.contains_key(&Kind::B));
        assert!(!registry.contains_key(&Kind::C));

        assert_eq!(registry.parked(&Kind::A), Some(2));
        assert_eq!(registry.parked(&Kind::B), Some(0));
        assert_eq!(registry.capacity(&Kind::A), Some(2));
        assert_eq!(registry.checked_out(&Kind::A), Some(0));
        assert_eq!(registry.parked(&Kind::C), None);
        assert_eq!(registry.total_parked(), 2);
        assert_eq!(registry.total_checked_out(), 0);
    }

    #[test]
    fn build_with_no_specs_is_empty() {
        let registry = PoolRegistry::<Kind, u32>::new(Vec::<PoolSpec<Kind, ()>>::new(), |_: &()| 0)
            .unwrap();

        assert!(registry.is_empty());
        assert_eq!(registry.keys().count(), 0);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let result = PoolRegistry::new(
            [PoolSpec::new(Kind::A, (), 1), PoolSpec::new(Kind::A, (), 5)],
            |_: &()| 0_u32,
        );

        let Err(Error::Configuration { key, problem }) = result else {
            panic!("expected a configuration error");
        };

        assert_eq!(key, "A");
        assert_eq!(problem, "duplicate pool key");
    }

    #[test]
    fn checkout_exhausts_after_count() {
        let mut registry = registry_ab();

        let first = registry.checkout(&Kind::A).unwrap();
        let second = registry.checkout(&Kind::A).unwrap();

        assert_ne!(first.id(), second.id());
        assert!(first.is_active());
        assert!(second.is_active());
        assert_eq!(*first, 100);

        assert!(matches!(
            registry.checkout(&Kind::A),
            Err(Error::PoolExhausted { .. })
        ));
        assert!(matches!(
            registry.checkout(&Kind::B),
            Err(Error::PoolExhausted { .. })
        ));
        assert!(matches!(
            registry.checkout(&Kind::C),
            Err(Error::UnknownKey { .. })
        ));

        assert_eq!(registry.total_checked_out(), 2);
    }

    #[test]
    fn check_in_restores_and_reuses_object() {
        let mut registry = registry_ab();

        let object = registry.checkout(&Kind::A).unwrap();
        let id = object.id();
        assert_eq!(registry.parked(&Kind::A), Some(1));

        registry.check_in(object, &Kind::A).unwrap();
        assert_eq!(registry.parked(&Kind::A), Some(2));

        // The returned object went to the back, so the other one comes out first.
        let other = registry.checkout(&Kind::A).unwrap();
        assert_ne!(other.id(), id);

        let again = registry.checkout(&Kind::A).unwrap();
        assert_eq!(again.id(), id);
        assert!(again.is_active());
    }

    #[test]
    fn check_ins_are_reused_in_return_order() {
        let mut registry = PoolRegistry::new([PoolSpec::new('q', (), 3)], |_: &()| ()).unwrap();

        let a = registry.checkout(&'q').unwrap();
        let b = registry.checkout(&'q').unwrap();
        let c = registry.checkout(&'q').unwrap();
        let returned = [c.id(), a.id(), b.id()];

        registry.check_in(c, &'q').unwrap();
        registry.check_in(a, &'q').unwrap();
        registry.check_in(b, &'q').unwrap();

        let reused = (0..3)
            .map(|_| registry.checkout(&'q').unwrap().id())
            .collect::<Vec<_>>();
        assert_eq!(reused, returned);
    }

    #[test]
    fn check_in_rejects_unknown_key() {
        let mut registry = registry_ab();
        let object = registry.checkout(&Kind::A).unwrap();

        let rejected = registry.check_in(object, &Kind::C).unwrap_err();

        assert!(matches!(rejected.error(), Error::UnknownKey { .. }));
        assert!(rejected.object().is_active());
        assert_eq!(registry.parked(&Kind::A), Some(1));
    }

    #[test]
    fn check_in_rejects_key_mismatch() {
        let mut registry = registry_ab();
        let object = registry.checkout(&Kind::A).unwrap();

        let rejected = registry.check_in(object, &Kind::B).unwrap_err();

        let Error::KeyMismatch { expected, actual } = rejected.error() else {
            panic!("expected a key mismatch");
        };
        assert_eq!(expected, "B");
        assert_eq!(actual, "A");
        assert_eq!(registry.parked(&Kind::B), Some(0));

        // The registry remains usable and the object can still go home.
        registry.check_in(rejected.into_object(), &Kind::A).unwrap();
        assert_eq!(registry.parked(&Kind::A), Some(2));
    }

    #[test]
    fn check_in_rejects_foreign_object() {
        let mut ours = registry_ab();
        let mut theirs = registry_ab();

        let object = theirs.checkout(&Kind::A).unwrap();
        let rejected = ours.check_in(object, &Kind::A).unwrap_err();

        assert!(matches!(rejected.error(), Error::ForeignObject { .. }));
        assert_eq!(ours.parked(&Kind::A), Some(2));

        theirs.check_in(rejected.into_object(), &Kind::A).unwrap();
    }

    #[test]
    fn placement_sink_sees_every_transition() {
        let mut placement = MockPlacementSink::<u32>::new();
        let mut seq = Sequence::new();

        placement
            .expect_park()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        placement
            .expect_activate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|instance| *instance += 1);
        placement
            .expect_park()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|instance| *instance = 0);

        let mut registry = PoolRegistry::builder()
            .placement(placement)
            .build([PoolSpec::new(Kind::A, 7, 1)], |template: &u32| *template)
            .unwrap();

        let object = registry.checkout(&Kind::A).unwrap();
        assert_eq!(*object, 8);

        registry.check_in(object, &Kind::A).unwrap();
    }

    #[test]
    fn failed_operations_do_not_touch_placement() {
        let mut placement = MockPlacementSink::<u32>::new();
        placement.expect_park().times(1).return_const(());
        placement.expect_activate().times(1).return_const(());

        let mut registry = PoolRegistry::builder()
            .placement(placement)
            .build(
                [PoolSpec::new(Kind::A, 0, 1), PoolSpec::new(Kind::B, 0, 0)],
                |template: &u32| *template,
            )
            .unwrap();

        let object = registry.checkout(&Kind::A).unwrap();
        registry.checkout(&Kind::A).unwrap_err();
        registry.checkout(&Kind::C).unwrap_err();
        _ = registry.check_in(object, &Kind::B).unwrap_err().into_object();
    }

    #[test]
    #[should_panic(expected = "forbidden by DropPolicy::MustNotAbandonCheckedOut")]
    fn strict_drop_policy_detects_abandoned_objects() {
        let mut registry = PoolRegistry::builder()
            .drop_policy(DropPolicy::MustNotAbandonCheckedOut)
            .build([PoolSpec::new(Kind::A, (), 2)], |_: &()| 0_u8)
            .unwrap();

        let object = registry.checkout(&Kind::A).unwrap();
        drop(registry);
        drop(object);
    }

    #[test]
    fn strict_drop_policy_accepts_returned_objects() {
        let mut registry = PoolRegistry::builder()
            .drop_policy(DropPolicy::MustNotAbandonCheckedOut)
            .build([PoolSpec::new(Kind::A, (), 2)], |_: &()| 0_u8)
            .unwrap();

        let object = registry.checkout(&Kind::A).unwrap();
        registry.check_in(object, &Kind::A).unwrap();
        drop(registry);
    }
}
