pub mod booking;
pub mod consistency;
pub mod lifecycle;
pub mod store;
pub mod supabase_store;
pub mod validation;

pub use booking::AppointmentBookingService;
pub use consistency::DirectoryConsistencyService;
pub use lifecycle::AppointmentLifecycleService;
pub use store::{AppointmentStore, InMemoryAppointmentStore};
pub use supabase_store::SupabaseAppointmentStore;
