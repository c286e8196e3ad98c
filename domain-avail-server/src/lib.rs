//! HTTP front-end for the domain-avail lookup engine.
//!
//! Routes map one-to-one onto [`domain_avail_lib::DomainChecker`]
//! operations; this crate only adds request parsing, the outer request
//! timeout, JSON error bodies and the usage-event route.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
