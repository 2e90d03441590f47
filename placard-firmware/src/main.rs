//! Placard - Network-Synchronized E-Paper Signage Firmware
//!
//! Main firmware binary for the Raspberry Pi Pico W sign controller.
//! Brings up the cyw43 radio and network stack, wires the three
//! e-paper panels onto the shared SPI bus, and hands everything to the
//! synchronization engine, which runs for the life of the device.

#![no_std]
#![no_main]

use core::cell::RefCell;
use core::fmt::Write as _;

use cyw43_pio::{PioSpi, DEFAULT_CLOCK_DIVIDER};
use defmt::*;
use embassy_executor::Spawner;
use embassy_net::StackResources;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::{DMA_CH0, PIO0, SPI0};
use embassy_rp::pio::{InterruptHandler as PioInterruptHandler, Pio};
use embassy_rp::spi::{Blocking, Config as SpiConfig, Spi};
use embassy_rp::watchdog::Watchdog;
use heapless::{String, Vec};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use placard_core::engine::SyncEngine;
use placard_core::net::{AssociationManager, AssociationPolicy, KnownNetwork};
use placard_core::state::StateStore;
use placard_core::sync::{ImageBuffer, ImageSyncClient};
use placard_core::traits::SystemControl;
use placard_core::IMAGE_BYTES;

use placard_hal_rp2040::flash::RecordSector;
use placard_hal_rp2040::panel::EpaperPanel;
use placard_hal_rp2040::system::{EmbassyDelay, WatchdogReset};
use placard_hal_rp2040::transport::HttpTransport;
use placard_hal_rp2040::wireless::PicoWStation;

mod logger;
mod networks;

use networks::{known_networks, MAX_KNOWN_NETWORKS, SERVER_HOST, SERVER_PORT};

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
});

// Static cells for state the radio and engine borrow forever
static CYW43_STATE: StaticCell<cyw43::State> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
static SPI_BUS: StaticCell<RefCell<Spi<'static, SPI0, Blocking>>> = StaticCell::new();
static IMAGE: StaticCell<[u8; IMAGE_BYTES]> = StaticCell::new();
static TCP_RX: StaticCell<[u8; 4096]> = StaticCell::new();
static TCP_TX: StaticCell<[u8; 512]> = StaticCell::new();
static NETWORKS: StaticCell<Vec<KnownNetwork, MAX_KNOWN_NETWORKS>> = StaticCell::new();

#[embassy_executor::task]
async fn cyw43_task(
    runner: cyw43::Runner<'static, Output<'static>, PioSpi<'static, PIO0, 0, DMA_CH0>>,
) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Placard firmware starting...");
    logger::init();

    let p = embassy_rp::init(Default::default());

    // Saved-state sector; the flash unique id doubles as the device
    // identity reported to the image server
    let mut record_sector = RecordSector::new(p.FLASH);
    let unique_id = record_sector.unique_id();
    let mut device_id: String<16> = String::new();
    for byte in unique_id {
        // 16 hex chars always fit
        let _ = write!(device_id, "{:02x}", byte);
    }
    info!("device id {}", device_id.as_str());

    // Radio firmware blobs, flashed separately so firmware iteration
    // stays fast:
    //   probe-rs download 43439A0.bin --binary-format bin --chip RP2040 --base-address 0x10100000
    //   probe-rs download 43439A0_clm.bin --binary-format bin --chip RP2040 --base-address 0x10140000
    let fw = unsafe { core::slice::from_raw_parts(0x10100000 as *const u8, 230321) };
    let clm = unsafe { core::slice::from_raw_parts(0x10140000 as *const u8, 4752) };

    // cyw43 radio over PIO SPI
    let pwr = Output::new(p.PIN_23, Level::Low);
    let cs = Output::new(p.PIN_25, Level::High);
    let mut pio = Pio::new(p.PIO0, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        p.PIN_24,
        p.PIN_29,
        p.DMA_CH0,
    );

    let state = CYW43_STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, fw).await;
    spawner.spawn(cyw43_task(runner)).unwrap();

    control.init(clm).await;
    control
        .set_power_management(cyw43::PowerManagementMode::PowerSave)
        .await;

    // DHCP network stack; the flash unique id seeds TCP sequence numbers
    let seed = u64::from_le_bytes(unique_id);
    let (stack, net_runner) = embassy_net::new(
        net_device,
        embassy_net::Config::dhcpv4(Default::default()),
        NET_RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.spawn(net_task(net_runner)).unwrap();

    // Panel SPI bus, shared by all three panels
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = 8_000_000;
    let panel_spi = Spi::new_blocking(p.SPI0, p.PIN_2, p.PIN_3, p.PIN_4, spi_config);
    let spi_bus = &*SPI_BUS.init(RefCell::new(panel_spi));

    let panels = [
        EpaperPanel::new(
            spi_bus,
            1,
            Output::new(p.PIN_9, Level::Low),
            Output::new(p.PIN_5, Level::High),
            Output::new(p.PIN_6, Level::Low),
            Output::new(p.PIN_7, Level::Low),
            Input::new(p.PIN_8, Pull::None),
        ),
        EpaperPanel::new(
            spi_bus,
            2,
            Output::new(p.PIN_14, Level::Low),
            Output::new(p.PIN_10, Level::High),
            Output::new(p.PIN_11, Level::Low),
            Output::new(p.PIN_12, Level::Low),
            Input::new(p.PIN_13, Pull::None),
        ),
        EpaperPanel::new(
            spi_bus,
            3,
            Output::new(p.PIN_26, Level::Low),
            Output::new(p.PIN_19, Level::High),
            Output::new(p.PIN_20, Level::Low),
            Output::new(p.PIN_21, Level::Low),
            Input::new(p.PIN_22, Pull::None),
        ),
    ];

    // Fetch pipeline
    let transport = HttpTransport::new(
        stack,
        &mut TCP_RX.init([0; 4096])[..],
        &mut TCP_TX.init([0; 512])[..],
        SERVER_HOST,
        SERVER_PORT,
    );
    let client = ImageSyncClient::new(transport, device_id);
    let buffer = ImageBuffer::new(&mut IMAGE.init([0; IMAGE_BYTES])[..]);

    let networks = &*NETWORKS.init(known_networks());
    let association = AssociationManager::new(networks, AssociationPolicy::default());
    let wireless = PicoWStation::new(control, stack);

    let store = StateStore::new(record_sector);
    let mut system = WatchdogReset::new(Watchdog::new(p.WATCHDOG));

    let mut engine = SyncEngine::new(
        wireless,
        client,
        panels,
        store,
        EmbassyDelay,
        association,
        buffer,
    );

    if engine.prepare().await.is_err() {
        error!("saved state could not be initialized");
        system
            .fatal_reset(placard_core::traits::FatalReason::StoreFailed)
            .await;
    }

    info!("entering synchronization loop");
    engine.run(&mut system).await;
}
