//! Bus construction, dispatch, and failure reporting.
//!
//! ## Contents
//! - [`EventBus`] — one independent dispatch domain
//! - [`BusBuilder`] — configuration surface and construction
//! - [`ExceptionHandler`] / [`DispatchErrorMessage`] — listener-failure
//!   side channel

mod builder;
#[allow(clippy::module_inception)]
mod bus;
mod handler;

pub use builder::BusBuilder;
pub use bus::EventBus;
pub use handler::{DispatchErrorMessage, ExceptionHandler};
