//! Resource managers
//!
//! Thin, typed wrappers over REST collections. Every manager holds only an
//! `Arc<dyn RequestGateway>`, so none of them know about sessions, sockets or
//! the client lifecycle.
//!
//! ```text
//! managers/
//! ├── base.rs      # Collection helper, id validation, list parsing
//! ├── devices.rs   # manager/devices/device
//! ├── zones.rs     # manager/zones/zone
//! ├── flows.rs     # manager/flow/flow
//! ├── apps.rs      # manager/apps
//! └── system.rs    # manager/geolocation + manager/i18n options
//! ```

mod base;

pub mod apps;
pub mod devices;
pub mod flows;
pub mod system;
pub mod zones;

#[cfg(test)]
pub(crate) mod testing;

pub use apps::AppManager;
pub use devices::DeviceManager;
pub use flows::FlowManager;
pub use system::SystemManager;
pub use zones::ZoneManager;
