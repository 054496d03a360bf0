//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Routing: Route resolution and permission checks
//! - Services: Group management
//! - Messaging: Dispatching resolved routes to skill workers
//! - Errors: Domain-specific errors

pub mod context;
pub mod errors;
pub mod messaging;
pub mod routing;
pub mod services;

pub use context::AppContext;
