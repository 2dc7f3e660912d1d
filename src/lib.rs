//! In-display fingerprint overlay service: reports where the sensor sits on
//! the panel, forwards press/overlay state to the kernel driver, and relays
//! vendor acquisition events and `fod_ui` changes.

pub mod callback;
pub mod discovery;
pub mod geometry;
pub mod properties;
pub mod service;
pub mod sysfs;
pub mod vendor;
pub mod watcher;

pub use callback::{CallbackError, InscreenCallback};
pub use geometry::OverlayGeometry;
pub use service::{SensorOverlayService, ServiceError};
pub use vendor::{VendorError, VendorFingerprint, VendorLookup};
