#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot set rasterizer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane
//! for which repeatedly squaring `z` and adding `c`, starting from
//! zero, never runs off to infinity.  Points outside the set do run
//! off, some quickly and some slowly, and the number of steps it takes
//! them to get far enough away to be sure (the "escape time") is what
//! gives pictures of the set their color.
//!
//! The `Rasterizer` keeps a view of the plane, an iteration cap, and a
//! color mode, and renders them into an RGB buffer using a fixed number
//! of worker threads, each taking its own band of columns.  Renders are
//! cached: asking for a frame when nothing has changed returns the last
//! one without doing any work.
//!
//! ```
//! use mandelbrot::{ColorMode, Rasterizer};
//!
//! let raster = Rasterizer::new(250, 80, 60).unwrap();
//! raster.set_color_mode(ColorMode::Rgb).unwrap();
//! let frame = raster.compute();
//! assert_eq!(frame.as_bytes().len(), 80 * 60 * 3);
//! ```

extern crate crossbeam;
#[macro_use]
extern crate failure;
extern crate image;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;

pub mod colors;
pub mod errors;
pub mod escape;
pub mod navigate;
pub mod planes;
pub mod raster;

pub use colors::{colorize, ColorMode, Rgb};
pub use errors::{RasterError, Result};
pub use escape::{evaluate, Escape};
pub use navigate::Navigator;
pub use planes::{Pixel, PlaneMapper, View};
pub use raster::{column_bands, Frame, RasterConfig, Rasterizer, RenderStats, Status};
