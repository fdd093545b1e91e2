//! Tile application loop
//!
//! Ties the pieces together: join the network, download every view into a
//! safe region, then rotate the views and refresh them on schedule. The
//! firmware only has to build a [`Tile`] and call [`Tile::step`] forever.

use windy_hal::{Clock, ScanoutController, SerialPort};

use crate::buffers::{BufferSwapCoordinator, ViewTable};
use crate::config::{TileConfig, MAX_VIEWS};
use crate::download::{DownloadRequest, StreamingDownloader};
use crate::engine::CommandEngine;
use crate::join::{Credentials, JoinSequencer};
use crate::schedule::{RefreshSchedule, ScheduleAction};
use crate::session::Session;

/// Longest sleep between schedule polls
pub const IDLE_SLICE_MS: u32 = 100;

/// The running tile
pub struct Tile<'a, P, C, S, const N: usize> {
    session: Session<P, C>,
    buffers: BufferSwapCoordinator<'a, S, N>,
    views: ViewTable<MAX_VIEWS>,
    schedule: RefreshSchedule,
    config: &'a TileConfig,
}

impl<'a, P, C, S, const N: usize> Tile<'a, P, C, S, N>
where
    P: SerialPort,
    C: Clock,
    S: ScanoutController,
{
    pub fn new(
        session: Session<P, C>,
        buffers: BufferSwapCoordinator<'a, S, N>,
        config: &'a TileConfig,
    ) -> Self {
        let schedule = RefreshSchedule::new(&config.timing, config.views.len(), session.now_ms());
        Self {
            session,
            buffers,
            views: ViewTable::new(),
            schedule,
            config,
        }
    }

    pub fn buffers(&self) -> &BufferSwapCoordinator<'a, S, N> {
        &self.buffers
    }

    pub fn views(&self) -> &ViewTable<MAX_VIEWS> {
        &self.views
    }

    pub fn session(&mut self) -> &mut Session<P, C> {
        &mut self.session
    }

    /// Run whatever the schedule says is due, or sleep a little
    pub fn step(&mut self) -> ScheduleAction {
        let now = self.session.now_ms();
        let action = self.schedule.poll(now);
        match action {
            ScheduleAction::Refresh => {
                let ok = self.refresh();
                let now = self.session.now_ms();
                self.schedule.refresh_finished(now, ok);
            }
            ScheduleAction::ShowView(view) => {
                if let Err(e) = self.views.present(view, &mut self.buffers) {
                    debug!("view {} not shown: {}", view, e);
                }
            }
            ScheduleAction::Wait => {
                let idle = self.schedule.until_next(now).min(IDLE_SLICE_MS as u64) as u32;
                self.session.delay_ms(idle.max(1));
            }
        }
        action
    }

    /// Join and download every view
    ///
    /// Returns `true` only if every view was refreshed. Views that fail keep
    /// their previous image, if any.
    pub fn refresh(&mut self) -> bool {
        let config = self.config;
        let mut engine = CommandEngine::new(&mut self.session);

        let credentials = Credentials {
            ssid: config.wifi.ssid.as_str(),
            passphrase: config.wifi.passphrase.as_str(),
        };
        if JoinSequencer::new(credentials).run(&mut engine).is_err() {
            return false;
        }

        let mut all_ok = true;
        for view in 0..config.views.len() {
            all_ok &= download_view(&mut engine, &mut self.buffers, &mut self.views, config, view);
        }

        // Rotation restarts from the first view
        if let Err(e) = self.views.present(0, &mut self.buffers) {
            debug!("first view not shown: {}", e);
        }
        all_ok
    }
}

/// Download one view into a region that is neither on screen nor holding
/// another view, and show it on success
fn download_view<P, C, S, const N: usize>(
    engine: &mut CommandEngine<'_, P, C>,
    buffers: &mut BufferSwapCoordinator<'_, S, N>,
    views: &mut ViewTable<MAX_VIEWS>,
    config: &TileConfig,
    view: usize,
) -> bool
where
    P: SerialPort,
    C: Clock,
    S: ScanoutController,
{
    let Some(entry) = config.views.get(view) else {
        return false;
    };
    let target = views
        .download_target(view, buffers.front_region(), N)
        .or_else(|| {
            // Only the view's own region is left and it is on screen
            views.present_other(view, buffers).ok()?;
            views.download_target(view, buffers.front_region(), N)
        });
    let Some(target) = target else {
        warn!("view {}: no free region", entry.name.as_str());
        return false;
    };
    // Overwriting the view's own image makes it unpresentable until done
    if views.region(view) == Some(target) {
        views.invalidate(view);
    }
    let Ok(destination) = buffers.write_target(target) else {
        return false;
    };

    let request = DownloadRequest::new(
        config.server.host.as_str(),
        config.server.port,
        entry.path.as_str(),
        destination,
    )
    .with_expected_len(config.panel.frame_bytes());

    let result = StreamingDownloader::new(engine)
        .with_stream_budget(config.timing.download_deadline_ms())
        .download(request);

    match result {
        Ok(_) => {
            info!("view {} ready in region {}", entry.name.as_str(), target);
            views.commit(view, target).is_ok() && views.present(view, buffers).is_ok()
        }
        Err(e) => {
            warn!("view {} failed: {}", entry.name.as_str(), e);
            false
        }
    }
}
