//! Typed views of hub resources
//!
//! Each model carries the fields the managers filter on. Everything else the
//! hub sends is kept verbatim in `extra`, so a round trip through a model does
//! not lose data.

pub mod app;
pub mod device;
pub mod flow;
pub mod system;
pub mod zone;

pub use app::App;
pub use device::{Device, DeviceCapability};
pub use flow::Flow;
pub use system::SystemConfig;
pub use zone::Zone;

pub(crate) fn default_true() -> bool {
    true
}
