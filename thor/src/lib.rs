//! THOR: a delay-tolerant, opportunistic mesh-routing engine.
//!
//! THOR moves user payloads toward an internet sink by hopping across
//! transient radio encounters. The crate is the pure decision core: it
//! discovers nothing and transmits nothing by itself. A host (the radio
//! layer) feeds received frames into an [`engine::Engine`], transmits the
//! bytes the engine hands back, reports beacon receptions through
//! [`engine::Engine::neighbour_store`], and drives expiry and queue
//! flushing on its own cadence.
//!
//! Hop selection is the Internet Gravity policy in [`gravity`]: direct
//! gateways beat indirect ones, indirect ones beat unexplored peers, and
//! peers already routed through are a last resort, with link quality
//! nudging each class.

pub mod concepts;
pub mod engine;
pub mod feedback;
pub mod framework;
pub mod gravity;
