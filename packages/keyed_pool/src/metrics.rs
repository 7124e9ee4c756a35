//! Metrics for pool registries.
//!
//! The events are per-thread instances, as required by `nm`, and are shared by all registries.

use nm::{Event, Magnitude};

/// Histogram buckets for the number of objects created for one pool key at build time.
const PREFILLED_OBJECTS_BUCKETS: &[Magnitude] = &[0, 1, 4, 16, 64, 256, 1024, 4096];

thread_local! {
    /// Objects handed out by a successful checkout.
    pub(crate) static CHECKOUTS: Event = Event::builder()
        .name("keyed_pool_checkouts")
        .build();

    /// Checkouts that failed because the pool for the key had no parked objects left.
    pub(crate) static CHECKOUTS_EXHAUSTED: Event = Event::builder()
        .name("keyed_pool_checkouts_exhausted")
        .build();

    /// Objects returned to their pool by a successful check-in.
    pub(crate) static CHECK_INS: Event = Event::builder()
        .name("keyed_pool_check_ins")
        .build();

    /// Check-ins rejected due to an unknown key, a key mismatch or a foreign object.
    pub(crate) static CHECK_INS_REJECTED: Event = Event::builder()
        .name("keyed_pool_check_ins_rejected")
        .build();

    /// The number of objects created for one pool key when a registry is built.
    pub(crate) static PREFILLED_OBJECTS: Event = Event::builder()
        .name("keyed_pool_prefilled_objects")
        .histogram(PREFILLED_OBJECTS_BUCKETS)
        .build();
}
