//! Synchronization engine
//!
//! The top-level forever loop: ensure association, fetch each screen in
//! order, render what changed, persist one new saved-state generation
//! when anything changed, sleep, repeat. There is no terminal state;
//! the only exits are a fatal reset or power loss.

use log::{info, warn};

use crate::net::AssociationManager;
use crate::state::{SavedState, StateStore, StoreError};
use crate::sync::{FetchOutcome, ImageBuffer, ImageSyncClient};
use crate::tag::CacheTag;
use crate::traits::{
    Delay, FatalReason, PanelError, SectorFlash, SignPanel, SyncTransport, SystemControl,
    WirelessStation,
};
use crate::{CYCLE_GAP_MS, SCREEN_COUNT};

/// How one cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleEnd {
    /// Cycle completed; sleep and run the next one
    Completed,
    /// Unrecoverable within this boot; the device must reset
    Fatal(FatalReason),
}

/// The synchronization engine
///
/// Owns every collaborator for the life of the device. Screens are
/// processed strictly sequentially, so exactly one fetch is ever in
/// flight and the shared image buffer has a single writer.
pub struct SyncEngine<'b, W, T, P, F, D>
where
    W: WirelessStation,
    T: SyncTransport,
    P: SignPanel,
    F: SectorFlash,
    D: Delay,
{
    wireless: W,
    client: ImageSyncClient<T>,
    panels: [P; SCREEN_COUNT],
    store: StateStore<F>,
    delay: D,
    association: AssociationManager<'b>,
    buffer: ImageBuffer<'b>,
    state: SavedState,
    /// Working copies of each screen's current tag for this boot
    tags: [CacheTag; SCREEN_COUNT],
}

impl<'b, W, T, P, F, D> SyncEngine<'b, W, T, P, F, D>
where
    W: WirelessStation,
    T: SyncTransport,
    P: SignPanel,
    F: SectorFlash,
    D: Delay,
{
    pub fn new(
        wireless: W,
        client: ImageSyncClient<T>,
        panels: [P; SCREEN_COUNT],
        store: StateStore<F>,
        delay: D,
        association: AssociationManager<'b>,
        buffer: ImageBuffer<'b>,
    ) -> Self {
        Self {
            wireless,
            client,
            panels,
            store,
            delay,
            association,
            buffer,
            state: SavedState::default(),
            tags: core::array::from_fn(|_| CacheTag::empty()),
        }
    }

    /// Boot-time saved-state policy
    ///
    /// An invalid or wrong-version record is replaced by a freshly
    /// persisted default before any fetch; there is no migration path
    /// between versions.
    pub async fn prepare(&mut self) -> Result<(), StoreError> {
        let loaded = self.store.load();

        self.state = if !loaded.is_valid() {
            warn!("saved state invalid, reinitializing");
            let fresh = SavedState::default();
            self.store.save(&fresh).await?;
            fresh
        } else if !loaded.is_current_version() {
            warn!(
                "saved state has version {} (current {}), reinitializing",
                loaded.version,
                crate::state::record::STATE_VERSION
            );
            let fresh = SavedState::default();
            self.store.save(&fresh).await?;
            fresh
        } else {
            loaded
        };

        info!(
            "saved state version={} write_count={}",
            self.state.version, self.state.write_count
        );
        self.tags = self.state.tags.clone();
        Ok(())
    }

    /// Run one synchronization cycle
    pub async fn run_cycle(&mut self) -> CycleEnd {
        self.association
            .ensure_associated(&mut self.wireless, &mut self.delay)
            .await;

        let mut any_dirty = false;

        for index in 0..SCREEN_COUNT {
            let screen_id = self.panels[index].screen_id();
            let outcome = self
                .client
                .fetch(
                    screen_id,
                    &mut self.tags[index],
                    self.state.write_count,
                    &mut self.buffer,
                )
                .await;

            match outcome {
                FetchOutcome::NewImage => {
                    info!("new image for screen {}", screen_id);
                    if let Err(e) = self.render_screen(index).await {
                        warn!("screen {} render failed: {:?}", screen_id, e);
                        return CycleEnd::Fatal(FatalReason::RenderFailed);
                    }
                    any_dirty = true;
                }
                FetchOutcome::Unchanged => {
                    info!("no change for screen {}", screen_id);
                }
                FetchOutcome::Error => {
                    // A partially failed fetch may have left the shared
                    // buffer corrupted; the next boot retries the whole
                    // cycle fresh.
                    warn!("refreshing screen {} failed", screen_id);
                    return CycleEnd::Fatal(FatalReason::FetchFailed);
                }
            }
        }

        if any_dirty {
            info!("one or more screens updated, saving state");
            let next = self.state.next_generation(self.tags.clone());
            if self.store.save(&next).await.is_err() {
                return CycleEnd::Fatal(FatalReason::StoreFailed);
            }
            self.state = next;
        }

        CycleEnd::Completed
    }

    async fn render_screen(&mut self, index: usize) -> Result<(), PanelError> {
        let panel = &mut self.panels[index];
        let image = self.buffer.filled().unwrap_or(&[]);
        panel.initialize().await?;
        panel.render(image).await?;
        panel.power_down().await
    }

    /// Run cycles forever
    ///
    /// A fatal cycle hands control to the reset primitive, which never
    /// returns on hardware.
    pub async fn run<S: SystemControl>(&mut self, system: &mut S) {
        loop {
            match self.run_cycle().await {
                CycleEnd::Completed => {
                    info!("cycle complete, sleeping {} ms", CYCLE_GAP_MS);
                    self.delay.sleep_ms(CYCLE_GAP_MS).await;
                }
                CycleEnd::Fatal(reason) => {
                    system.fatal_reset(reason).await;
                    // Unreachable on hardware; in tests the loop ends here
                    return;
                }
            }
        }
    }
}
