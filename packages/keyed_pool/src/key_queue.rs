//! Per-key queue of parked objects and the operations shared by both registry flavors.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;
use std::thread;

use foldhash::{HashMap, HashMapExt, HashSet, HashSetExt};
use tracing::{debug, trace, warn};

use crate::metrics::{
    CHECK_INS, CHECK_INS_REJECTED, CHECKOUTS, CHECKOUTS_EXHAUSTED, PREFILLED_OBJECTS,
};
use crate::{
    CheckInError, CheckInResult, DropPolicy, Error, InstanceFactory, ObjectId, PlacementSink,
    PoolSpec, PooledObject, RegistryId, Result,
};

/// The parked objects of one pool key, in the order they will be handed out.
///
/// Every object in the queue is inactive. This is guaranteed by [`park()`][Self::park] being the
/// only way objects enter the queue.
pub(crate) struct KeyQueue<K, T> {
    parked: VecDeque<PooledObject<K, T>>,

    /// The number of objects created for this key. Parked plus checked out objects always add
    /// up to this number, as objects are never created or destroyed after build.
    capacity: usize,

    /// The key in its `Debug` rendering, for the drop policy panic message.
    label: String,

    drop_policy: DropPolicy,
}

impl<K, T> KeyQueue<K, T> {
    pub(crate) fn new(label: String, capacity: usize, drop_policy: DropPolicy) -> Self {
        Self {
            parked: VecDeque::with_capacity(capacity),
            capacity,
            label,
            drop_policy,
        }
    }

    pub(crate) fn parked(&self) -> usize {
        self.parked.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn checked_out(&self) -> usize {
        self.capacity
            .checked_sub(self.parked.len())
            .expect("a pool never holds more parked objects than were created for it")
    }

    /// Parks the object and appends it to the back of the queue.
    pub(crate) fn park(
        &mut self,
        mut object: PooledObject<K, T>,
        placement: &impl PlacementSink<T>,
    ) {
        placement.park(object.instance_mut());
        object.set_active(false);
        self.parked.push_back(object);
    }

    /// Removes the object at the front of the queue and activates it.
    pub(crate) fn take(
        &mut self,
        placement: &impl PlacementSink<T>,
    ) -> Option<PooledObject<K, T>> {
        let mut object = self.parked.pop_front()?;

        debug_assert!(
            !object.is_active(),
            "objects are marked inactive when parked, so a parked object cannot be active"
        );

        object.set_active(true);
        placement.activate(object.instance_mut());
        Some(object)
    }
}

impl<K, T> Drop for KeyQueue<K, T> {
    fn drop(&mut self) {
        // If we are already panicking, we do not want to panic again because that will
        // simply obscure whatever the original panic was, leading to debug difficulties.
        if !thread::panicking() && self.drop_policy == DropPolicy::MustNotAbandonCheckedOut {
            let checked_out = self.checked_out();

            assert!(
                checked_out == 0,
                "dropped the pool for key {} with {checked_out} objects still checked out - this is forbidden by DropPolicy::MustNotAbandonCheckedOut",
                self.label
            );
        }
    }
}

/// Validates the specs and creates every object they declare, parking each one in the queue of
/// its key.
///
/// Validation happens before the factory is called for the first time, so a rejected
/// configuration creates no instances at all.
pub(crate) fn prefill<K, R, T, F, P>(
    specs: impl IntoIterator<Item = PoolSpec<K, R>>,
    factory: &mut F,
    placement: &P,
    registry: RegistryId,
    drop_policy: DropPolicy,
) -> Result<HashMap<K, KeyQueue<K, T>>>
where
    K: Eq + Hash + Clone + Debug,
    F: InstanceFactory<R, T>,
    P: PlacementSink<T>,
{
    let specs = specs.into_iter().collect::<Vec<_>>();

    let mut seen = HashSet::with_capacity(specs.len());
    for spec in &specs {
        if !seen.insert(spec.key()) {
            warn!(key = ?spec.key(), "rejected pool configuration with duplicate key");
            return Err(Error::configuration(spec.key(), "duplicate pool key"));
        }
    }

    let mut queues = HashMap::with_capacity(specs.len());
    let mut ids = (0_u64..).map(ObjectId::new);

    for spec in specs {
        let (key, template, count) = spec.into_parts();
        let mut queue = KeyQueue::new(format!("{key:?}"), count, drop_policy);

        for _ in 0..count {
            let id = ids
                .next()
                .expect("object identifiers are 64-bit and cannot run out in practice");
            let instance = factory.instantiate(&template);
            queue.park(PooledObject::new(key.clone(), id, registry, instance), placement);
        }

        debug!(key = ?key, count, "prefilled pool");
        PREFILLED_OBJECTS.with(|e| e.observe(count));

        queues.insert(key, queue);
    }

    Ok(queues)
}

/// Checks out the front object of `queue`, which is the queue registered for `key` if any.
pub(crate) fn checkout_from<K, T>(
    queue: Option<&mut KeyQueue<K, T>>,
    key: &K,
    placement: &impl PlacementSink<T>,
) -> Result<PooledObject<K, T>>
where
    K: Debug,
{
    let Some(queue) = queue else {
        warn!(key = ?key, "checkout requested for unknown pool key");
        return Err(Error::unknown_key(key));
    };

    let Some(object) = queue.take(placement) else {
        debug!(key = ?key, capacity = queue.capacity(), "pool exhausted");
        CHECKOUTS_EXHAUSTED.with(|e| e.observe_once());
        return Err(Error::pool_exhausted(key));
    };

    trace!(key = ?key, id = object.id().get(), parked = queue.parked(), "checked out object");
    CHECKOUTS.with(|e| e.observe_once());

    Ok(object)
}

/// Checks `object` in to `queue`, which is the queue registered for `key` if any, after
/// verifying that the object belongs there.
pub(crate) fn check_in_to<K, T>(
    queue: Option<&mut KeyQueue<K, T>>,
    registry: RegistryId,
    object: PooledObject<K, T>,
    key: &K,
    placement: &impl PlacementSink<T>,
) -> CheckInResult<K, T>
where
    K: Eq + Debug,
{
    let rejection = match queue {
        None => Error::unknown_key(key),
        Some(_) if object.registry() != registry => Error::ForeignObject {
            key: format!("{:?}", object.key()),
        },
        Some(_) if object.key() != key => Error::KeyMismatch {
            expected: format!("{key:?}"),
            actual: format!("{:?}", object.key()),
        },
        Some(queue) => {
            trace!(key = ?key, id = object.id().get(), "checked in object");
            queue.park(object, placement);
            CHECK_INS.with(|e| e.observe_once());
            return Ok(());
        }
    };

    warn!(key = ?key, id = object.id().get(), error = %rejection, "rejected check-in");
    CHECK_INS_REJECTED.with(|e| e.observe_once());

    Err(CheckInError::new(object, rejection))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::NoPlacement;

    fn queue_of(count: u64) -> KeyQueue<char, u64> {
        let registry = RegistryId::next();
        let capacity = usize::try_from(count).unwrap();
        let mut queue = KeyQueue::new("'k'".to_string(), capacity, DropPolicy::default());

        for id in 0..count {
            queue.park(
                PooledObject::new('k', ObjectId::new(id), registry, id),
                &NoPlacement,
            );
        }

        queue
    }

    #[test]
    fn take_is_fifo_and_activates() {
        let mut queue = queue_of(2);

        let first = queue.take(&NoPlacement).unwrap();
        let second = queue.take(&NoPlacement).unwrap();

        assert_eq!(first.id().get(), 0);
        assert_eq!(second.id().get(), 1);
        assert!(first.is_active());
        assert!(second.is_active());
        assert!(queue.take(&NoPlacement).is_none());
        assert_eq!(queue.checked_out(), 2);
    }

    #[test]
    fn park_deactivates_and_appends() {
        let mut queue = queue_of(3);

        let first = queue.take(&NoPlacement).unwrap();
        queue.park(first, &NoPlacement);

        assert_eq!(queue.parked(), 3);
        assert_eq!(queue.checked_out(), 0);

        let order = (0..3)
            .map(|_| queue.take(&NoPlacement).unwrap().id().get())
            .collect::<Vec<_>>();
        assert_eq!(order, [1, 2, 0]);
    }

    #[test]
    #[should_panic(expected = "2 objects still checked out")]
    fn strict_drop_policy_panics_with_checked_out_objects() {
        let mut queue = queue_of(2);
        queue.drop_policy = DropPolicy::MustNotAbandonCheckedOut;

        let first = queue.take(&NoPlacement).unwrap();
        let second = queue.take(&NoPlacement).unwrap();
        assert_eq!(queue.checked_out(), 2);

        // The objects outlive the queue, so they are still checked out when it is dropped.
        drop(queue);
        drop((first, second));
    }

    #[test]
    fn strict_drop_policy_accepts_fully_parked_queue() {
        let mut queue = queue_of(1);
        queue.drop_policy = DropPolicy::MustNotAbandonCheckedOut;

        let object = queue.take(&NoPlacement).unwrap();
        queue.park(object, &NoPlacement);

        drop(queue);
    }

    #[test]
    fn prefill_rejects_duplicates_before_instantiating() {
        let mut created = 0;
        let mut factory = |_: &()| {
            created += 1;
        };

        let result = prefill(
            [PoolSpec::new(1, (), 2), PoolSpec::new(2, (), 1), PoolSpec::new(1, (), 3)],
            &mut factory,
            &NoPlacement,
            RegistryId::next(),
            DropPolicy::default(),
        );

        assert!(matches!(result, Err(Error::Configuration { ref key, .. }) if key == "1"));
        assert_eq!(created, 0);
    }

    #[test]
    fn prefill_assigns_ids_in_build_order() {
        let mut queues = prefill(
            [PoolSpec::new('a', 10, 2), PoolSpec::new('b', 20, 1)],
            &mut |template: &i32| *template,
            &NoPlacement,
            RegistryId::next(),
            DropPolicy::default(),
        )
        .unwrap();

        let b = queues.get_mut(&'b').unwrap().take(&NoPlacement).unwrap();
        assert_eq!(b.id().get(), 2);
        assert_eq!(*b, 20);

        let a = queues.get_mut(&'a').unwrap().take(&NoPlacement).unwrap();
        assert_eq!(a.id().get(), 0);
        assert_eq!(*a, 10);
    }
}
