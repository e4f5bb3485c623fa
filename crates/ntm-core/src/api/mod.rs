//! Public API layer (Facade) for ntm-core.
//!
//! [`RoutingCore`] owns the scorer, the effectiveness integrator and its
//! outcome store, and exposes typed query/action methods. Consumers (the CLI,
//! dispatch loops) should use this instead of wiring the pieces themselves.
//!
//! ```ignore
//! use ntm_core::api::{RouteFilter, RoutingCoreBuilder};
//!
//! let core = RoutingCoreBuilder::new().build()?;
//! let route = core.route("proj", "fix the login bug", &RouteFilter::default())?;
//! ```

mod actions;
mod builder;
mod core;
mod queries;
pub mod types;

pub use builder::RoutingCoreBuilder;
pub use core::RoutingCore;
pub use types::{ApiError, EffectivenessReport, RouteFilter, RouteResult};
