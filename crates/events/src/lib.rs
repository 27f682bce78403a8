//! Domain events, their JSON envelope and the pub/sub bus abstraction.
//!
//! Domain crates define typed event enums implementing [`Event`]; the
//! unit-of-work layer wraps them into [`EventEnvelope`]s after commit and
//! hands them to an [`EventBus`].

pub mod bus;
pub mod catalog;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod publish;
pub mod tenant;

pub use bus::{EventBus, Subscription};
pub use envelope::{EventEnvelope, Metadata};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use publish::publish_best_effort;
pub use tenant::TenantScoped;
