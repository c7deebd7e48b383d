pub mod acknowledged;
pub mod dedup;
pub mod poller;
pub mod recipient;
pub mod registry;

pub use acknowledged::{AcknowledgedStore, InMemoryAcknowledgedStore};
pub use dedup::{acknowledge, acknowledge_all, diff};
pub use poller::{AppointmentFeed, NotificationPoller, PollerHandle, MIN_POLL_INTERVAL};
pub use recipient::{canonical_recipient, normalize_recipient};
pub use registry::PollerRegistry;
