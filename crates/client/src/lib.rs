//! Synchronisation and command-dispatch core for a capacity-tracking device.
//!
//! Two independent clients sit on top of one transport seam:
//!
//! * [`ConfigControlClient`] loads, saves and mutates the device's JSON
//!   configuration, reporting failures to an injected [`ErrorSurface`].
//! * [`CapacityMonitorClient`] polls `/capacity` forever and renders only
//!   what changed.
//!
//! Neither client knows how it is displayed; front-ends implement
//! [`ConfigView`] and [`CapacityView`].

pub mod config_control;
pub mod envelope;
pub mod error;
pub mod error_channel;
pub mod monitor;
pub mod transport;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use config_control::ConfigControlClient;
pub use envelope::{CapacityReport, Command, CommandRequest, Envelope};
pub use error::{ClientError, FailureKind, Result};
pub use error_channel::{ErrorChannel, ErrorSurface};
pub use monitor::{CapacityMonitorClient, CapacitySnapshot, PollOutcome};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, Transport};
pub use view::{CapacityView, ConfigView, DocumentBuffer};
