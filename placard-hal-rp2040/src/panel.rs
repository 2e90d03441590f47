//! 13.3" 960x680 e-paper panel driver
//!
//! SSD-style controller, 1 bit per pixel, full refresh only. Several
//! panels share one SPI bus; each holds its own control pins and takes
//! the bus for the duration of a transfer. Panels are powered only
//! while refreshing.

use core::cell::RefCell;

use defmt::{info, warn};
use embassy_rp::gpio::{Input, Output};
use embassy_rp::spi::{Blocking, Instance, Spi};
use embassy_time::Timer;
use placard_core::traits::{PanelError, SignPanel};
use placard_core::IMAGE_BYTES;

/// Busy-pin poll interval
const BUSY_POLL_MS: u64 = 30;

/// Busy-pin polls before giving up on a refresh
const BUSY_POLL_LIMIT: u32 = 1000;

/// Panel controller commands
#[allow(dead_code)]
mod cmd {
    pub const SOFT_RESET: u8 = 0x12;
    pub const DRIVER_OUTPUT: u8 = 0x01;
    pub const DATA_ENTRY_MODE: u8 = 0x11;
    pub const RAM_X_RANGE: u8 = 0x44;
    pub const RAM_Y_RANGE: u8 = 0x45;
    pub const BORDER_WAVEFORM: u8 = 0x3C;
    pub const TEMP_SENSOR: u8 = 0x18;
    pub const RAM_X_COUNTER: u8 = 0x4E;
    pub const RAM_Y_COUNTER: u8 = 0x4F;
    pub const WRITE_RAM: u8 = 0x24;
    pub const UPDATE_CONTROL: u8 = 0x22;
    pub const ACTIVATE_UPDATE: u8 = 0x20;
    /// Undocumented init command the panel vendor requires
    pub const VENDOR_INIT: u8 = 0x0C;
}

/// One e-paper panel on the shared SPI bus
pub struct EpaperPanel<'d, T: Instance> {
    spi: &'d RefCell<Spi<'d, T, Blocking>>,
    id: u8,
    power: Output<'d>,
    cs: Output<'d>,
    dc: Output<'d>,
    reset: Output<'d>,
    busy: Input<'d>,
}

impl<'d, T: Instance> EpaperPanel<'d, T> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        spi: &'d RefCell<Spi<'d, T, Blocking>>,
        id: u8,
        power: Output<'d>,
        cs: Output<'d>,
        dc: Output<'d>,
        reset: Output<'d>,
        busy: Input<'d>,
    ) -> Self {
        Self {
            spi,
            id,
            power,
            cs,
            dc,
            reset,
            busy,
        }
    }

    fn command(&mut self, command: u8) -> Result<(), PanelError> {
        self.cs.set_low();
        self.dc.set_low();
        let result = self.spi.borrow_mut().blocking_write(&[command]);
        self.cs.set_high();
        result.map_err(|_| PanelError::Bus)
    }

    fn data(&mut self, data: &[u8]) -> Result<(), PanelError> {
        self.cs.set_low();
        self.dc.set_high();
        let result = self.spi.borrow_mut().blocking_write(data);
        self.cs.set_high();
        result.map_err(|_| PanelError::Bus)
    }

    fn command_data(&mut self, command: u8, data: &[u8]) -> Result<(), PanelError> {
        self.command(command)?;
        self.data(data)
    }

    async fn wait_until_idle(&mut self) -> Result<(), PanelError> {
        for _ in 0..BUSY_POLL_LIMIT {
            if self.busy.is_low() {
                return Ok(());
            }
            Timer::after_millis(BUSY_POLL_MS).await;
        }
        warn!("[{}] busy pin never went idle", self.id);
        Err(PanelError::BusyTimeout)
    }

    async fn hardware_reset(&mut self) -> Result<(), PanelError> {
        self.reset.set_high();
        Timer::after_millis(20).await;
        self.reset.set_low();
        Timer::after_millis(2).await;
        self.reset.set_high();
        self.wait_until_idle().await
    }

    async fn software_reset(&mut self) -> Result<(), PanelError> {
        self.command(cmd::SOFT_RESET)?;
        self.wait_until_idle().await
    }

    async fn trigger_refresh(&mut self) -> Result<(), PanelError> {
        self.command_data(cmd::UPDATE_CONTROL, &[0xF7])?;
        self.command(cmd::ACTIVATE_UPDATE)?;
        self.wait_until_idle().await
    }
}

impl<T: Instance> SignPanel for EpaperPanel<'_, T> {
    fn screen_id(&self) -> u8 {
        self.id
    }

    async fn initialize(&mut self) -> Result<(), PanelError> {
        info!("[{}] initializing panel", self.id);
        self.power.set_high();

        self.hardware_reset().await?;
        self.software_reset().await?;

        self.command_data(cmd::VENDOR_INIT, &[0xAE, 0xC7, 0xC3, 0xC0, 0x80])?;
        self.command_data(cmd::DRIVER_OUTPUT, &[0xA7, 0x02, 0x00])?;
        self.command_data(cmd::DATA_ENTRY_MODE, &[0x03])?;
        // RAM window: X 0..0x3BF, Y 0..0x2A7 (960x680)
        self.command_data(cmd::RAM_X_RANGE, &[0x00, 0x00, 0xBF, 0x03])?;
        self.command_data(cmd::RAM_Y_RANGE, &[0x00, 0x00, 0xA7, 0x02])?;
        self.command_data(cmd::BORDER_WAVEFORM, &[0x05])?;
        // Internal temperature sensor
        self.command_data(cmd::TEMP_SENSOR, &[0x80])?;
        self.command_data(cmd::RAM_X_COUNTER, &[0x00, 0x00])?;
        self.command_data(cmd::RAM_Y_COUNTER, &[0x00, 0x00])?;
        Ok(())
    }

    async fn render(&mut self, image: &[u8]) -> Result<(), PanelError> {
        if image.len() != IMAGE_BYTES {
            return Err(PanelError::BadFrame);
        }
        info!("[{}] writing frame", self.id);
        self.command(cmd::WRITE_RAM)?;
        self.data(image)?;
        self.trigger_refresh().await
    }

    async fn power_down(&mut self) -> Result<(), PanelError> {
        info!("[{}] powering panel down", self.id);
        self.reset.set_low();
        self.dc.set_low();
        self.power.set_low();
        Ok(())
    }
}
