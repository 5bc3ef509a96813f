// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Headless driver: configures a rasterizer from the command line,
//! renders one or more frames, and prints the status readout for each.
//! With `--frames` above one the view auto-zooms, one simulated second
//! per frame.

extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate mandelbrot;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use mandelbrot::raster::DEFAULT_WORKERS;
use mandelbrot::{ColorMode, Navigator, RasterConfig, Rasterizer, View};
use num::Complex;
use std::cmp;
use std::str::FromStr;
use std::time::{Duration, Instant};

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const SIZE: &str = "size";
const CENTER: &str = "center";
const ZOOM: &str = "zoom";
const ITERATIONS: &str = "iterations";
const THREADS: &str = "threads";
const COLOR: &str = "color";
const FRAMES: &str = "frames";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = cmp::max(num_cpus::get(), DEFAULT_WORKERS);

    App::new("mandel")
        .version("0.1.0")
        .about("Mandelbrot set rasterizer")
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800x600")
                .validator(|s| validate_pair::<usize>(&s, 'x', "Could not parse image size"))
                .help("Size of the image in pixels"),
        )
        .arg(
            Arg::with_name(CENTER)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.75,0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse center point"))
                .help("Point of the complex plane at the center of the image"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .default_value("1")
                .validator(|s| {
                    validate_range(
                        &s,
                        ::std::f64::MIN_POSITIVE,
                        ::std::f64::MAX,
                        "Could not parse zoom",
                        "Zoom must be positive",
                    )
                })
                .help("Magnification of the view"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("250")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Iterations before a point counts as inside the set"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("4")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in the rasterizer"),
        )
        .arg(
            Arg::with_name(COLOR)
                .long(COLOR)
                .takes_value(true)
                .possible_values(&["grayscale", "inverted", "rgb"])
                .default_value("grayscale")
                .help("How escape times are colored"),
        )
        .arg(
            Arg::with_name(FRAMES)
                .long(FRAMES)
                .short("f")
                .takes_value(true)
                .default_value("1")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        10_000,
                        "Could not parse frame count",
                        "Frame count must be between 1 and 10000",
                    )
                })
                .help("Frames to render; more than one turns on auto-zoom"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, String> {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| format!("Could not parse {}", name))
}

fn run(matches: &ArgMatches) -> Result<(), String> {
    let (width, height) = matches
        .value_of(SIZE)
        .and_then(|s| parse_pair::<usize>(s, 'x'))
        .ok_or("Could not parse image size")?;
    let center = matches
        .value_of(CENTER)
        .and_then(parse_complex)
        .ok_or("Could not parse center point")?;
    let zoom: f64 = value(matches, ZOOM)?;
    let color_mode: ColorMode = value(matches, COLOR)?;
    let frames: u64 = value(matches, FRAMES)?;

    let view = View {
        center_x: center.re,
        center_y: center.im,
        zoom,
        ..View::default()
    };
    let config = RasterConfig {
        width,
        height,
        iter_max: value(matches, ITERATIONS)?,
        color_mode,
        worker_count: value(matches, THREADS)?,
    };
    let raster = Rasterizer::from_config(view, config).map_err(|e| e.to_string())?;

    let mut navigator = Navigator::new();
    let start = Instant::now();
    if frames > 1 {
        navigator.toggle_autozoom(&raster, start);
    }

    for n in 0..frames {
        navigator
            .tick(&raster, start + Duration::from_secs(n))
            .map_err(|e| e.to_string())?;

        let began = Instant::now();
        let (generation, width, height) = {
            let frame = raster.compute();
            (frame.generation(), frame.width(), frame.height())
        };
        let elapsed = began.elapsed();

        println!("---");
        println!("{}", raster.status());
        println!("Auto zoom: {}", navigator.autozoom());
        println!("Auto zoom fac: {}", navigator.autozoom_factor());
        println!(
            "Frame {}: {}x{} in {:.3} ms",
            generation,
            width,
            height,
            elapsed.as_secs_f64() * 1000.0
        );
    }

    info!("rendered {} frames", raster.stats().passes);
    Ok(())
}

fn main() {
    env_logger::init();
    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
