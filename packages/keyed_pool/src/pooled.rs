use std::fmt::{self, Debug};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one object within the registry that created it.
///
/// Identifiers are assigned in build order, starting from zero, and never change.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectId(u64);

impl ObjectId {
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The numeric value of the identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies a registry instance, so objects can be matched to the registry that created them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct RegistryId(u64);

impl RegistryId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);

        // Relaxed is enough: we only need uniqueness, not ordering with other memory.
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// One instance owned by a pool, together with its pool bookkeeping.
///
/// While parked, the object is owned by its pool. Checking it out moves ownership to the caller,
/// checking it in moves ownership back. The type is deliberately not [`Clone`], so an object
/// cannot be reachable from a pool and from a caller at the same time.
///
/// The instance itself is reachable via [`instance()`][Self::instance] and
/// [`instance_mut()`][Self::instance_mut], or by dereferencing.
///
/// # Examples
///
/// ```
/// use keyed_pool::{PoolRegistry, PoolSpec};
///
/// let mut registry = PoolRegistry::new([PoolSpec::new('a', (), 1)], |_: &()| 10_u32)?;
///
/// let mut object = registry.checkout(&'a')?;
/// assert_eq!(*object.key(), 'a');
/// assert!(object.is_active());
///
/// *object += 1;
/// assert_eq!(*object.instance(), 11);
/// # Ok::<(), keyed_pool::Error>(())
/// ```
pub struct PooledObject<K, T> {
    key: K,
    id: ObjectId,
    registry: RegistryId,
    active: bool,
    instance: T,
}

impl<K, T> PooledObject<K, T> {
    /// Creates a parked object.
    pub(crate) fn new(key: K, id: ObjectId, registry: RegistryId, instance: T) -> Self {
        Self {
            key,
            id,
            registry,
            active: false,
            instance,
        }
    }

    /// The key of the pool this object was created for.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The identifier of this object within its registry.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Whether the object is currently checked out.
    ///
    /// Objects in a pool are never active. Objects returned by a checkout are always active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// A shared reference to the pooled instance.
    #[must_use]
    pub fn instance(&self) -> &T {
        &self.instance
    }

    /// An exclusive reference to the pooled instance.
    #[must_use]
    pub fn instance_mut(&mut self) -> &mut T {
        &mut self.instance
    }

    pub(crate) fn registry(&self) -> RegistryId {
        self.registry
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl<K, T> Deref for PooledObject<K, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.instance
    }
}

impl<K, T> DerefMut for PooledObject<K, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.instance
    }
}

// Debug implementations have no API contract to test.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl<K: Debug, T> Debug for PooledObject<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledObject")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(PooledObject<u32, String>: Send, Sync);
    assert_not_impl_any!(PooledObject<u32, String>: Clone);

    #[test]
    fn new_objects_are_parked() {
        let object = PooledObject::new("rock", ObjectId::new(3), RegistryId::next(), 1.5_f32);

        assert!(!object.is_active());
        assert_eq!(*object.key(), "rock");
        assert_eq!(object.id().get(), 3);
        assert_eq!(object.id().to_string(), "#3");
    }

    #[test]
    fn instance_is_reachable_by_deref() {
        let mut object =
            PooledObject::new(1_u8, ObjectId::new(0), RegistryId::next(), vec![1, 2, 3]);

        object.push(4);
        object.instance_mut().push(5);

        assert_eq!(object.len(), 5);
        assert_eq!(object.instance(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn registry_ids_are_unique() {
        assert_ne!(RegistryId::next(), RegistryId::next());
    }
}
