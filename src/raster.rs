// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The Rasterizer owns the current view, the render parameters, and
//! the pixel buffer, all behind a single lock.  Every setter marks the
//! buffer dirty; `compute()` re-renders only when it is.
//!
//! A render pass splits the image into one contiguous band of columns
//! per worker.  Every row of the buffer is cut at the band borders, so
//! each worker ends up holding its own `&mut` slice of every row and
//! writes its pixels straight into the shared buffer.  The workers
//! run inside a crossbeam scope, which doubles as the barrier: the
//! pass is over when the scope returns.
//!
//! The buffer is shared with the frames handed out by `compute()`.  A
//! frame never holds the lock; it keeps its own reference to the
//! pixels it was given, and the next render writes into a copy if any
//! frame is still looking at the old ones.

use std::fmt;
use std::mem;
use std::ops::{Deref, Range};
use std::panic;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crossbeam;
use image::{self, ImageBuffer};
use itertools::iproduct;

use colors::{colorize, ColorMode, Rgb, BYTES_PER_PIXEL};
use errors::{RasterError, Result};
use escape::evaluate;
use planes::{validate_size, Pixel, PlaneMapper, View};

/// Number of workers used when none is given.
pub const DEFAULT_WORKERS: usize = 4;

/// Everything about a render that is not the view.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RasterConfig {
    /// Image width in pixels, at least 2.
    pub width: usize,
    /// Image height in pixels, at least 2.
    pub height: usize,
    /// The iteration cap standing in for infinity.
    pub iter_max: usize,
    /// How escape times become colors.
    pub color_mode: ColorMode,
    /// How many workers split the columns of the image.
    pub worker_count: usize,
}

impl Default for RasterConfig {
    fn default() -> Self {
        RasterConfig {
            width: 800,
            height: 600,
            iter_max: 250,
            color_mode: ColorMode::Grayscale,
            worker_count: DEFAULT_WORKERS,
        }
    }
}

impl RasterConfig {
    /// Rejects configurations the rasterizer cannot render.
    pub fn validate(&self) -> Result<()> {
        validate_size(self.width, self.height)?;
        validate_iter_max(self.iter_max)?;
        validate_worker_count(self.worker_count)
    }
}

fn validate_iter_max(iter_max: usize) -> Result<()> {
    if iter_max == 0 {
        return Err(RasterError::config("iteration cap must be at least 1"));
    }
    Ok(())
}

fn validate_worker_count(workers: usize) -> Result<()> {
    if workers == 0 {
        return Err(RasterError::config("worker count must be at least 1"));
    }
    Ok(())
}

/// Counters describing how much work the rasterizer has done.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Completed render passes.
    pub passes: u64,
    /// Pixels evaluated across all passes.
    pub pixels: u64,
}

/// A snapshot of the parameters, formatted for a status readout.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Status {
    /// The iteration cap.
    pub iter_max: usize,
    /// Center of the view.
    pub center_x: f64,
    /// Center of the view.
    pub center_y: f64,
    /// Width of the visible region on the complex plane.
    pub plane_width: f64,
    /// Height of the visible region on the complex plane.
    pub plane_height: f64,
    /// Current zoom.
    pub zoom: f64,
    /// Current color mode.
    pub color_mode: ColorMode,
    /// Current worker count.
    pub worker_count: usize,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Iterations: {}", self.iter_max)?;
        writeln!(f, "Pos center: {}, {}", self.center_x, self.center_y)?;
        writeln!(f, "Width: {}", self.plane_width)?;
        writeln!(f, "Height: {}", self.plane_height)?;
        writeln!(f, "Zoom: {}", self.zoom)?;
        writeln!(f, "Color: {}", self.color_mode)?;
        write!(f, "Threads: {}", self.worker_count)
    }
}

/// Splits the columns `0..width` into `workers` contiguous bands.
/// Worker `n` gets `n * width / workers .. (n + 1) * width / workers`.
/// The bands are not all the same size, and when there are more
/// workers than columns some of them are empty, but together they
/// cover every column exactly once.
pub fn column_bands(width: usize, workers: usize) -> Vec<Range<usize>> {
    (0..workers)
        .map(|n| (n * width / workers)..((n + 1) * width / workers))
        .collect()
}

/// Cuts every row of `pixels` at the band borders and hands each band
/// its slice of every row.  `strips[n][y]` is row `y` of band `n`.
fn split_columns<'a>(
    pixels: &'a mut [u8],
    width: usize,
    bands: &[Range<usize>],
) -> Vec<Vec<&'a mut [u8]>> {
    let mut strips: Vec<Vec<&'a mut [u8]>> = bands.iter().map(|_| Vec::new()).collect();
    for row in pixels.chunks_mut(width * BYTES_PER_PIXEL) {
        let mut rest = row;
        for (strip, band) in strips.iter_mut().zip(bands) {
            let (head, tail) = mem::take(&mut rest).split_at_mut(band.len() * BYTES_PER_PIXEL);
            strip.push(head);
            rest = tail;
        }
    }
    strips
}

/// Renders one band of columns into the row slices that belong to it.
fn render_band(
    band: Range<usize>,
    mut rows: Vec<&mut [u8]>,
    mapper: &PlaneMapper,
    iter_max: usize,
    mode: ColorMode,
) {
    trace!("worker rendering columns {:?}", band);
    let height = rows.len();
    for ((offset, ix), iy) in iproduct!(band.enumerate(), 0..height) {
        let point = mapper.pixel_to_point(&Pixel(ix, iy));
        let Rgb(color) = colorize(evaluate(point, iter_max), iter_max, mode);
        let at = offset * BYTES_PER_PIXEL;
        rows[iy][at..at + BYTES_PER_PIXEL].copy_from_slice(&color);
    }
}

/// Allocates a zeroed buffer for an image, reporting failure instead
/// of aborting.
fn allocate(width: usize, height: usize) -> Result<Vec<u8>> {
    let bytes = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
        .ok_or(RasterError::Allocation {
            bytes: ::std::usize::MAX,
        })?;
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(bytes)
        .map_err(|_| RasterError::Allocation { bytes })?;
    pixels.resize(bytes, 0);
    Ok(pixels)
}

struct Store {
    view: View,
    config: RasterConfig,
    dirty: bool,
    generation: u64,
    stats: RenderStats,
    pixels: Arc<Vec<u8>>,
}

impl Store {
    fn mapper(&self) -> PlaneMapper {
        PlaneMapper::from_valid(&self.view, self.config.width, self.config.height)
    }

    fn render(&mut self) {
        let started = Instant::now();
        let config = self.config;
        let mapper = self.mapper();
        if mapper.exceeds_precision() {
            warn!(
                "zoom {} is beyond f64 precision; neighbouring pixels will repeat",
                self.view.zoom
            );
        }

        let bands = column_bands(config.width, config.worker_count);
        {
            if Arc::strong_count(&self.pixels) > 1 {
                trace!("a frame is still held; rendering into a fresh copy");
            }
            let pixels = Arc::make_mut(&mut self.pixels);
            let strips = split_columns(pixels, config.width, &bands);
            let mapper = &mapper;
            let joined = crossbeam::scope(|spawner| {
                for (band, rows) in bands.iter().cloned().zip(strips) {
                    spawner.spawn(move |_| {
                        render_band(band, rows, mapper, config.iter_max, config.color_mode)
                    });
                }
            });
            if let Err(cause) = joined {
                panic::resume_unwind(cause);
            }
        }

        self.dirty = false;
        self.generation += 1;
        self.stats.passes += 1;
        self.stats.pixels += (config.width * config.height) as u64;
        debug!(
            "rendered {}x{} at {}, {} zoom {} ({} iterations, {} workers) in {:?}",
            config.width,
            config.height,
            self.view.center_x,
            self.view.center_y,
            self.view.zoom,
            config.iter_max,
            config.worker_count,
            started.elapsed()
        );
    }
}

/// The parallel Mandelbrot rasterizer.  It can be shared between
/// threads; all methods take `&self` and serialize on one lock.
pub struct Rasterizer {
    store: Mutex<Store>,
}

impl Rasterizer {
    /// A rasterizer over the default view (center -0.75, 0; unit 1;
    /// zoom 1) with four workers and grayscale output.
    pub fn new(iter_max: usize, width: usize, height: usize) -> Result<Self> {
        Rasterizer::with_view(iter_max, width, height, View::default(), DEFAULT_WORKERS)
    }

    /// A rasterizer with every parameter given explicitly.
    pub fn with_view(
        iter_max: usize,
        width: usize,
        height: usize,
        view: View,
        worker_count: usize,
    ) -> Result<Self> {
        Rasterizer::from_config(
            view,
            RasterConfig {
                width,
                height,
                iter_max,
                worker_count,
                ..RasterConfig::default()
            },
        )
    }

    /// A rasterizer from a view and a complete configuration.
    pub fn from_config(view: View, config: RasterConfig) -> Result<Self> {
        view.validate()?;
        config.validate()?;
        let pixels = Arc::new(allocate(config.width, config.height)?);
        Ok(Rasterizer {
            store: Mutex::new(Store {
                view,
                config,
                dirty: true,
                generation: 0,
                stats: RenderStats::default(),
                pixels,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<Store> {
        self.store
            .lock()
            .unwrap_or_else(|poisoned: PoisonError<MutexGuard<Store>>| {
                warn!("rasterizer lock was poisoned; the next frame will be re-rendered");
                let mut store = poisoned.into_inner();
                store.dirty = true;
                store
            })
    }

    /// Resizes the image.  The old pixels are discarded.  If the new
    /// buffer cannot be allocated, the old size and buffer are kept.
    pub fn set_size(&self, width: usize, height: usize) -> Result<()> {
        validate_size(width, height)?;
        let mut store = self.lock();
        store.pixels = Arc::new(allocate(width, height)?);
        store.config.width = width;
        store.config.height = height;
        store.dirty = true;
        Ok(())
    }

    /// Moves and zooms the view.  The unit is left alone.
    pub fn set_view(&self, center_x: f64, center_y: f64, zoom: f64) -> Result<()> {
        self.update_view(|view, _| View {
            center_x,
            center_y,
            zoom,
            ..*view
        })
        .map(|_| ())
    }

    /// Replaces the view with one derived from the current view and its
    /// mapping onto the current image, all under one hold of the lock,
    /// so no other setter can slip in between the read and the write.
    /// The unit is left alone whatever `change` returns.  Returns the
    /// view now in place.
    ///
    /// `change` runs with the lock held and must not call back into the
    /// rasterizer.
    pub fn update_view<F>(&self, change: F) -> Result<View>
    where
        F: FnOnce(&View, &PlaneMapper) -> View,
    {
        let mut store = self.lock();
        let view = View {
            unit: store.view.unit,
            ..change(&store.view, &store.mapper())
        };
        view.validate()?;
        store.view = view;
        store.dirty = true;
        Ok(view)
    }

    /// Changes the iteration cap.
    pub fn set_iter_max(&self, iter_max: usize) -> Result<()> {
        validate_iter_max(iter_max)?;
        let mut store = self.lock();
        store.config.iter_max = iter_max;
        store.dirty = true;
        Ok(())
    }

    /// Changes the color mode.
    pub fn set_color_mode(&self, mode: ColorMode) -> Result<()> {
        let mut store = self.lock();
        store.config.color_mode = mode;
        store.dirty = true;
        Ok(())
    }

    /// Changes the color mode by number: 0 grayscale, 1 inverted,
    /// 2 rgb.
    pub fn set_color_mode_index(&self, index: usize) -> Result<()> {
        self.set_color_mode(ColorMode::from_index(index)?)
    }

    /// Changes how many workers the next render uses.  The pixels
    /// already rendered stay valid, so this does not mark them dirty.
    pub fn set_worker_count(&self, worker_count: usize) -> Result<()> {
        validate_worker_count(worker_count)?;
        self.lock().config.worker_count = worker_count;
        Ok(())
    }

    /// Returns the image for the current parameters, rendering it
    /// first if anything changed since the last render.
    ///
    /// The lock is released before this returns.  The frame keeps the
    /// pixels it was given even after later setters and renders; ask
    /// `generation()` to find out whether it is still current.
    pub fn compute(&self) -> Frame {
        let mut store = self.lock();
        if store.dirty {
            store.render();
        }
        Frame {
            pixels: Arc::clone(&store.pixels),
            width: store.config.width,
            height: store.config.height,
            generation: store.generation,
        }
    }

    /// The current view.
    pub fn view(&self) -> View {
        self.lock().view
    }

    /// The current configuration.
    pub fn config(&self) -> RasterConfig {
        self.lock().config
    }

    /// The iteration cap.
    pub fn iter_max(&self) -> usize {
        self.lock().config.iter_max
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.lock().config.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.lock().config.height
    }

    /// Real part of the view center.
    pub fn center_x(&self) -> f64 {
        self.lock().view.center_x
    }

    /// Imaginary part of the view center.
    pub fn center_y(&self) -> f64 {
        self.lock().view.center_y
    }

    /// The zoom factor.
    pub fn zoom(&self) -> f64 {
        self.lock().view.zoom
    }

    /// The unit the zoom applies to.
    pub fn unit(&self) -> f64 {
        self.lock().view.unit
    }

    /// The color mode.
    pub fn color_mode(&self) -> ColorMode {
        self.lock().config.color_mode
    }

    /// The worker count.
    pub fn worker_count(&self) -> usize {
        self.lock().config.worker_count
    }

    /// The distance on the complex plane between two horizontally
    /// adjacent pixels under the current parameters.  Multiply a
    /// screen distance by this to get a plane distance.
    pub fn pixel_scale(&self) -> f64 {
        self.lock().mapper().x_step
    }

    /// How many renders have completed.  A frame from an older
    /// generation is stale.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Whether the next `compute()` will render.
    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    /// Work done so far.
    pub fn stats(&self) -> RenderStats {
        self.lock().stats
    }

    /// The parameters, ready for display.
    pub fn status(&self) -> Status {
        let store = self.lock();
        let mapper = store.mapper();
        Status {
            iter_max: store.config.iter_max,
            center_x: store.view.center_x,
            center_y: store.view.center_y,
            plane_width: mapper.x_step * store.config.width as f64,
            plane_height: mapper.y_step * store.config.height as f64,
            zoom: store.view.zoom,
            color_mode: store.config.color_mode,
            worker_count: store.config.worker_count,
        }
    }
}

/// A rendered image.  It owns a reference to the pixels of one render,
/// together with the size they were rendered at, and they do not change
/// for as long as the frame lives.
#[derive(Clone, Debug)]
pub struct Frame {
    pixels: Arc<Vec<u8>>,
    width: usize,
    height: usize,
    generation: u64,
}

impl Frame {
    /// The pixels, three bytes (R, G, B) per pixel, row by row.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Width of this frame in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of this frame in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The render this frame came from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The color of a single pixel, if it is inside the frame.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let at = (y * self.width() + x) * BYTES_PER_PIXEL;
        let p = &self.pixels[at..at + BYTES_PER_PIXEL];
        Some(Rgb([p[0], p[1], p[2]]))
    }

    /// The frame as an `image` buffer borrowing these pixels.  None
    /// only if a dimension does not fit in a `u32`.
    pub fn to_image(&self) -> Option<ImageBuffer<image::Rgb<u8>, &[u8]>> {
        if self.width() > ::std::u32::MAX as usize || self.height() > ::std::u32::MAX as usize {
            return None;
        }
        ImageBuffer::from_raw(self.width() as u32, self.height() as u32, self.as_bytes())
    }
}

impl Deref for Frame {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}
