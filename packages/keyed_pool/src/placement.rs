/// Receives the placement side effects of pool operations.
///
/// The registry decides when an instance becomes parked or active; the sink decides what
/// that means for the host environment, for example hiding the instance and moving it to the
/// pool's holding area when it is parked.
///
/// The registry calls [`park()`][Self::park] for every instance when the registry is built
/// and whenever an instance is checked in. It calls [`activate()`][Self::activate] whenever an
/// instance is checked out.
///
/// Methods take `&self` because a [`SharedPoolRegistry`][crate::SharedPoolRegistry] may call
/// them from several threads at once. Sinks that need mutable state use interior mutability.
#[cfg_attr(test, mockall::automock)]
pub trait PlacementSink<T> {
    /// Parks `instance`: resets its placement to the pool's neutral origin and makes it
    /// unavailable to the host until it is checked out again.
    fn park(&self, instance: &mut T);

    /// Makes a freshly checked out `instance` available to the host.
    ///
    /// The default implementation does nothing.
    fn activate(&self, instance: &mut T) {
        _ = instance;
    }
}

/// A [`PlacementSink`] that has no side effects.
///
/// This is the sink used by registries that are not configured with one, for pooled types
/// whose parked and active states need no host-side bookkeeping.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[allow(
    clippy::exhaustive_structs,
    reason = "unit marker type that callers need to construct"
)]
pub struct NoPlacement;

impl<T> PlacementSink<T> for NoPlacement {
    fn park(&self, _instance: &mut T) {}
}
