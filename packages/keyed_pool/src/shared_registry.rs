use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::Arc;

use foldhash::HashMap;
use parking_lot::Mutex;

use crate::{
    CheckInResult, InstanceFactory, KeyQueue, NoPlacement, PlacementSink, PoolRegistry,
    PoolRegistryBuilder, PoolSpec, PooledObject, RegistryId, Result, check_in_to, checkout_from,
};

/// A thread-safe registry of pre-populated object pools, one pool per key.
///
/// This type has the same semantics as [`PoolRegistry`] but its operations take `&self` and it
/// acts as a cloneable handle to a shared registry instance. The registry and its parked objects
/// are dropped when the last handle is dropped.
///
/// The set of keys is fixed when the registry is built, so looking up a key takes no lock. Each
/// pool has its own lock, held only for the duration of a single checkout or check-in, so
/// operations on different keys never wait for each other. The [`PlacementSink`] is called while
/// the lock of the affected pool is held.
///
/// # Example
///
/// ```rust
/// use std::thread;
///
/// use keyed_pool::{PoolSpec, SharedPoolRegistry};
///
/// let registry = SharedPoolRegistry::new(
///     [PoolSpec::new("rock", (), 8), PoolSpec::new("paper", (), 8)],
///     |_: &()| Vec::<u8>::new(),
/// )?;
///
/// let workers = ["rock", "paper"].map(|key| {
///     let registry = registry.clone();
///
///     thread::spawn(move || {
///         for _ in 0..100 {
///             let mut object = registry.checkout(&key).unwrap();
///             object.push(1);
///             registry.check_in(object, &key).unwrap();
///         }
///     })
/// });
///
/// for worker in workers {
///     worker.join().unwrap();
/// }
///
/// assert_eq!(registry.total_parked(), 16);
/// # Ok::<(), keyed_pool::Error>(())
/// ```
pub struct SharedPoolRegistry<K, T, P = NoPlacement> {
    inner: Arc<Inner<K, T, P>>,
}

struct Inner<K, T, P> {
    id: RegistryId,
    queues: HashMap<K, Mutex<KeyQueue<K, T>>>,
    placement: P,
}

impl<K, T> SharedPoolRegistry<K, T>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Builds a registry with default configuration, creating every object declared by `specs`
    /// with `factory`.
    ///
    /// For custom configuration, use [`PoolRegistry::builder()`] and finish with
    /// [`build_shared()`][PoolRegistryBuilder::build_shared].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`][crate::Error::Configuration] if two specs share a key.
    /// In that case the factory is never called and no registry is created.
    pub fn new<R, F>(specs: impl IntoIterator<Item = PoolSpec<K, R>>, factory: F) -> Result<Self>
    where
        F: InstanceFactory<R, T>,
    {
        PoolRegistryBuilder::new().build_shared(specs, factory)
    }
}

impl<K, T, P> From<PoolRegistry<K, T, P>> for SharedPoolRegistry<K, T, P>
where
    K: Eq + Hash,
{
    /// Converts a single-threaded registry into a shared one.
    ///
    /// Objects that are checked out from the single-threaded registry at the time of conversion
    /// can be checked in to the shared registry.
    ///
    /// # Example
    ///
    /// ```rust
    /// use keyed_pool::{PoolRegistry, PoolSpec, SharedPoolRegistry};
    ///
    /// let mut registry = PoolRegistry::new([PoolSpec::new(0, (), 2)], |_: &()| 'o')?;
    /// let object = registry.checkout(&0)?;
    ///
    /// let shared = SharedPoolRegistry::from(registry);
    /// shared.check_in(object, &0)?;
    ///
    /// assert_eq!(shared.parked(&0), Some(2));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn from(registry: PoolRegistry<K, T, P>) -> Self {
        let (id, queues, placement) = registry.into_parts();

        let queues = queues
            .into_iter()
            .map(|(key, queue)| (key, Mutex::new(queue)))
            .collect();

        Self {
            inner: Arc::new(Inner {
                id,
                queues,
                placement,
            }),
        }
    }
}

impl<K, T, P> SharedPoolRegistry<K, T, P>
where
    K: Eq + Hash + Debug,
    P: PlacementSink<T>,
{
    /// Removes the object at the front of the pool for `key`, marks it active and returns it.
    ///
    /// This operation may block if another thread is currently accessing the same pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownKey`][crate::Error::UnknownKey] if no pool was registered for
    /// `key` and [`Error::PoolExhausted`][crate::Error::PoolExhausted] if the pool has no parked
    /// objects left. The registry is unaffected by either failure.
    pub fn checkout(&self, key: &K) -> Result<PooledObject<K, T>> {
        let mut queue = self.inner.queues.get(key).map(|queue| queue.lock());

        checkout_from(queue.as_deref_mut(), key, &self.inner.placement)
    }

    /// Parks `object`, marks it inactive and appends it to the back of the pool for `key`.
    ///
    /// This operation may block if another thread is currently accessing the same pool.
    ///
    /// # Errors
    ///
    /// The check-in is rejected if no pool was registered for `key`, if `object` was created by
    /// a different registry or if `object` was created for a key other than `key`. The returned
    /// [`CheckInError`][crate::CheckInError] hands the object back to the caller.
    pub fn check_in(
        &self,
        object: PooledObject<K, T>,
        key: &K,
    ) -> CheckInResult<K, T> {
        let mut queue = self.inner.queues.get(key).map(|queue| queue.lock());

        check_in_to(
            queue.as_deref_mut(),
            self.inner.id,
            object,
            key,
            &self.inner.placement,
        )
    }
}

impl<K, T, P> SharedPoolRegistry<K, T, P>
where
    K: Eq + Hash,
{
    /// Whether a pool is registered for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.queues.contains_key(key)
    }

    /// The number of objects currently parked in the pool for `key`, or `None` if no pool is
    /// registered for `key`.
    ///
    /// The value may be outdated as soon as it is returned if other threads use the registry.
    #[must_use]
    pub fn parked(&self, key: &K) -> Option<usize> {
        self.inner.queues.get(key).map(|queue| queue.lock().parked())
    }

    /// The number of objects that were created for the pool for `key`, or `None` if no pool is
    /// registered for `key`.
    #[must_use]
    pub fn capacity(&self, key: &K) -> Option<usize> {
        self.inner
            .queues
            .get(key)
            .map(|queue| queue.lock().capacity())
    }

    /// The number of objects from the pool for `key` that are currently checked out, or `None`
    /// if no pool is registered for `key`.
    ///
    /// The value may be outdated as soon as it is returned if other threads use the registry.
    #[must_use]
    pub fn checked_out(&self, key: &K) -> Option<usize> {
        self.inner
            .queues
            .get(key)
            .map(|queue| queue.lock().checked_out())
    }

    /// The number of objects parked across all pools.
    ///
    /// Pools are locked one at a time, so the sum is not a consistent snapshot if other threads
    /// use the registry concurrently.
    #[must_use]
    pub fn total_parked(&self) -> usize {
        self.inner
            .queues
            .values()
            .map(|queue| queue.lock().parked())
            .sum()
    }

    /// The number of objects checked out across all pools.
    ///
    /// Pools are locked one at a time, so the sum is not a consistent snapshot if other threads
    /// use the registry concurrently.
    #[must_use]
    pub fn total_checked_out(&self) -> usize {
        self.inner
            .queues
            .values()
            .map(|queue| queue.lock().checked_out())
            .sum()
    }
}

impl<K, T, P> SharedPoolRegistry<K, T, P> {
    /// The keys of all registered pools, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.queues.keys()
    }

    /// The number of registered pools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.queues.len()
    }

    /// Whether the registry has no pools at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.queues.is_empty()
    }

    /// The placement sink the registry was built with.
    #[must_use]
    pub fn placement(&self) -> &P {
        &self.inner.placement
    }
}

impl<K, T, P> Clone for SharedPoolRegistry<K, T, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// Debug implementations have no API contract to test.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl<K: Debug, T, P: Debug> Debug for SharedPoolRegistry<K, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedPoolRegistry")
            .field("keys", &self.inner.queues.keys().collect::<Vec<_>>())
            .field("placement", &self.inner.placement)
            .finish_non_exhaustive()
    }
}
