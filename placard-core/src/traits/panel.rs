//! Sign panel trait
//!
//! The pixel-level refresh protocol is a HAL concern; the engine only
//! needs power-up, full-frame render, and power-down.

/// Errors from panel operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelError {
    /// Panel stayed busy past the refresh timeout
    BusyTimeout,
    /// Bus transfer failed
    Bus,
    /// Frame data was not the panel's exact frame size
    BadFrame,
}

/// Trait for one e-paper sign panel
pub trait SignPanel {
    /// Screen identifier (1-based, matches the server's image paths)
    fn screen_id(&self) -> u8;

    /// Power up and initialize the panel controller
    async fn initialize(&mut self) -> Result<(), PanelError>;

    /// Write a full frame and trigger a refresh
    ///
    /// `image` must be exactly the panel's frame size.
    async fn render(&mut self, image: &[u8]) -> Result<(), PanelError>;

    /// Power the panel down between refreshes
    async fn power_down(&mut self) -> Result<(), PanelError>;
}
