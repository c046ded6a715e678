//! Tenant entities and the rules shared by the storage layer, the admin API
//! and the seeding command.

pub mod host;
pub mod types;
pub mod validation;

pub use host::split_domain_port;
pub use types::{Domain, Poll, PollOption};
pub use validation::{ValidationError, ValidationErrors};
