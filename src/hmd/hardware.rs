//! Physical device discovery.
//!
//! Hardware backends are platform SDK integrations registered per build, in
//! the manner of per-platform VR service backends. This build ships none, so
//! detection always reports [`HmdError::NoDeviceFound`] and the session
//! factory falls through to the simulated reference device.

use super::{HmdError, HmdSession};

/// Probes for a connected physical HMD. Returns the first device that
/// answers, or `NoDeviceFound` when no hardware backend is available.
pub fn detect() -> Result<Box<dyn HmdSession>, HmdError> {
    log::debug!("probing for physical HMD backends: none compiled into this build");
    Err(HmdError::NoDeviceFound)
}
