// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Gesture handling for interactive viewers.  A window layer maps its
//! own mouse and keyboard events onto these calls; the Navigator turns
//! them into rasterizer setter calls.  Nothing here knows about
//! windows, so a viewer can use it with any toolkit.
//!
//! Every gesture that moves the view reads and writes it in one
//! `Rasterizer::update_view` call, so a `set_view` from another thread
//! is never overwritten with a stale center.

use std::time::Instant;

use errors::Result;
use planes::View;
use raster::Rasterizer;

/// Factor applied to the zoom by one step of the wheel towards the set.
pub const ZOOM_IN: f64 = 1.1;
/// Factor applied to the zoom by one step of the wheel away from it.
pub const ZOOM_OUT: f64 = 0.9;
/// How much one key press changes the iteration cap.
pub const ITERATION_STEP: usize = 50;
/// The iteration cap restored by `reset`.
pub const RESET_ITERATIONS: usize = 250;
/// Zoom growth per second when auto-zoom starts.
pub const AUTOZOOM_FACTOR: f64 = 1.05;
/// How much one wheel step changes the auto-zoom growth.
pub const AUTOZOOM_FACTOR_STEP: f64 = 0.1;

#[derive(Copy, Clone, Debug)]
struct Drag {
    start_x: f64,
    start_y: f64,
    center_x: f64,
    center_y: f64,
}

#[derive(Copy, Clone, Debug)]
struct AutoZoom {
    started: Instant,
    start_zoom: f64,
}

/// Pan, zoom, and auto-zoom state for one viewer.
#[derive(Clone, Debug)]
pub struct Navigator {
    drag: Option<Drag>,
    autozoom: Option<AutoZoom>,
    factor: f64,
}

impl Default for Navigator {
    fn default() -> Self {
        Navigator {
            drag: None,
            autozoom: None,
            factor: AUTOZOOM_FACTOR,
        }
    }
}

impl Navigator {
    /// A navigator with no drag in progress and auto-zoom off.
    pub fn new() -> Self {
        Navigator::default()
    }

    /// Whether auto-zoom is running.
    pub fn autozoom(&self) -> bool {
        self.autozoom.is_some()
    }

    /// Zoom growth per second while auto-zoom runs.
    pub fn autozoom_factor(&self) -> f64 {
        self.factor
    }

    /// Whether a drag is in progress.
    pub fn dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Start a drag at a screen position.
    pub fn begin_drag(&mut self, raster: &Rasterizer, x: f64, y: f64) {
        let view = raster.view();
        self.drag = Some(Drag {
            start_x: x,
            start_y: y,
            center_x: view.center_x,
            center_y: view.center_y,
        });
    }

    /// Move the view so the point grabbed at `begin_drag` follows the
    /// pointer to `(x, y)`.  Does nothing when no drag is in progress.
    pub fn drag_to(&self, raster: &Rasterizer, x: f64, y: f64) -> Result<()> {
        if let Some(drag) = self.drag {
            raster.update_view(|view, mapper| View {
                center_x: drag.center_x + (drag.start_x - x) * mapper.x_step,
                center_y: drag.center_y + (drag.start_y - y) * mapper.x_step,
                ..*view
            })?;
        }
        Ok(())
    }

    /// Finish the current drag.
    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// One wheel step towards the set.  While auto-zoom runs this
    /// speeds it up instead.
    pub fn zoom_in(&mut self, raster: &Rasterizer, now: Instant) -> Result<()> {
        if self.autozoom.is_some() {
            self.factor += AUTOZOOM_FACTOR_STEP;
            self.restart_autozoom(raster, now);
            debug!("auto-zoom factor -> {}", self.factor);
            return Ok(());
        }
        zoom_by(raster, ZOOM_IN)
    }

    /// One wheel step away from the set.  While auto-zoom runs this
    /// slows it down, as long as the factor stays above one step.
    pub fn zoom_out(&mut self, raster: &Rasterizer, now: Instant) -> Result<()> {
        if self.autozoom.is_some() {
            if self.factor > AUTOZOOM_FACTOR_STEP {
                self.factor -= AUTOZOOM_FACTOR_STEP;
                self.restart_autozoom(raster, now);
                debug!("auto-zoom factor -> {}", self.factor);
            }
            return Ok(());
        }
        zoom_by(raster, ZOOM_OUT)
    }

    /// Raise the iteration cap by one step.
    pub fn more_iterations(&self, raster: &Rasterizer) -> Result<()> {
        let iter_max = raster.iter_max().saturating_add(ITERATION_STEP);
        debug!("iter_max -> {}", iter_max);
        raster.set_iter_max(iter_max)
    }

    /// Lower the iteration cap by one step, unless that would take it
    /// to a step or below.
    pub fn fewer_iterations(&self, raster: &Rasterizer) -> Result<()> {
        let iter_max = raster.iter_max();
        if iter_max > ITERATION_STEP {
            debug!("iter_max -> {}", iter_max - ITERATION_STEP);
            raster.set_iter_max(iter_max - ITERATION_STEP)?;
        }
        Ok(())
    }

    /// Switch to the next color mode.
    pub fn cycle_color(&self, raster: &Rasterizer) -> Result<()> {
        raster.set_color_mode(raster.color_mode().next())
    }

    /// Back to the default view and iteration cap, with auto-zoom off.
    pub fn reset(&mut self, raster: &Rasterizer) -> Result<()> {
        let home = View::default();
        raster.set_view(home.center_x, home.center_y, home.zoom)?;
        raster.set_iter_max(RESET_ITERATIONS)?;
        self.autozoom = None;
        self.factor = AUTOZOOM_FACTOR;
        info!("view reset");
        Ok(())
    }

    /// Turn auto-zoom on or off.  It grows from the current zoom.
    pub fn toggle_autozoom(&mut self, raster: &Rasterizer, now: Instant) {
        if self.autozoom.take().is_none() {
            self.restart_autozoom(raster, now);
        }
        info!("auto-zoom {}", if self.autozoom() { "on" } else { "off" });
    }

    fn restart_autozoom(&mut self, raster: &Rasterizer, now: Instant) {
        self.autozoom = Some(AutoZoom {
            started: now,
            start_zoom: raster.zoom(),
        });
    }

    /// Advance auto-zoom to `now`: the zoom becomes the starting zoom
    /// times the factor raised to the seconds elapsed.  Returns whether
    /// the view changed.
    pub fn tick(&self, raster: &Rasterizer, now: Instant) -> Result<bool> {
        match self.autozoom {
            None => Ok(false),
            Some(auto) => {
                let seconds = now.saturating_duration_since(auto.started).as_secs_f64();
                let zoom = auto.start_zoom * self.factor.powf(seconds);
                raster.update_view(|view, _| View { zoom, ..*view })?;
                Ok(true)
            }
        }
    }
}

fn zoom_by(raster: &Rasterizer, factor: f64) -> Result<()> {
    raster
        .update_view(|view, _| View {
            zoom: view.zoom * factor,
            ..*view
        })
        .map(|_| ())
}
