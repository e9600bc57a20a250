// Stores layer - Data access and repository pattern
pub mod credential_store;
pub mod health_record_store;
pub mod state_store;
pub mod threshold_store;

pub use credential_store::{CredentialStore, NewUser};
pub use health_record_store::HealthRecordStore;
pub use state_store::{DEFAULT_STATE_TTL, DatabaseStateStore, InMemoryStateStore, StateStore};
pub use threshold_store::ThresholdStore;
