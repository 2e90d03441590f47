//! Hardware abstraction traits
//!
//! These traits define the interface between the sync engine and
//! hardware-specific implementations. All methods are `async`; on the
//! device they suspend only the single engine task.

pub mod flash;
pub mod panel;
pub mod system;
pub mod transport;
pub mod wireless;

pub use flash::SectorFlash;
pub use panel::{PanelError, SignPanel};
pub use system::{Delay, FatalReason, SystemControl};
pub use transport::{SyncTransport, TransportEvent};
pub use wireless::{JoinFailure, WirelessStation};
