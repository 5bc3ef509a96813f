extern crate mandelbrot;
extern crate rand;

use mandelbrot::{ColorMode, Rasterizer, Rgb, View};
use rand::Rng;
use std::sync::Arc;
use std::thread;

/// Renders an image one pixel at a time, straight from the formulas,
/// with none of the rasterizer's machinery.
fn reference(iter_max: usize, width: usize, height: usize, view: View, mode: ColorMode) -> Vec<u8> {
    let x_unit = view.unit / view.zoom;
    let y_unit = (height as f64) / (width as f64) * x_unit;
    let x_min = view.center_x - x_unit;
    let y_min = view.center_y - y_unit;
    let x_step = 2.0 * x_unit / ((width - 1) as f64);
    let y_step = 2.0 * y_unit / ((height - 1) as f64);

    let mut out = vec![0u8; width * height * 3];
    for ix in 0..width {
        for iy in 0..height {
            let c_re = x_min + ((ix + 1) as f64) * x_step;
            let c_im = y_min + ((iy + 1) as f64) * y_step;

            let mut value = iter_max;
            let (mut z_re, mut z_im) = (0.0_f64, 0.0_f64);
            for i in 0..iter_max {
                let buf = z_re;
                z_re = z_re * z_re - z_im * z_im + c_re;
                z_im = 2.0 * buf * z_im + c_im;
                if z_re * z_re + z_im * z_im > 4.0 {
                    value = i;
                    break;
                }
            }

            let t = value as f64 / iter_max as f64;
            let color = match mode {
                ColorMode::Grayscale => {
                    let v = 255 - (t * 255.0).round() as u8;
                    [v, v, v]
                }
                ColorMode::InvertedGrayscale => {
                    let v = (t * 255.0).round() as u8;
                    [v, v, v]
                }
                ColorMode::Rgb => {
                    let packed = (t * 16_777_216.0).floor() as u32;
                    [packed as u8, (packed >> 8) as u8, (packed >> 16) as u8]
                }
            };
            let at = ix * 3 + iy * 3 * width;
            out[at..at + 3].copy_from_slice(&color);
        }
    }
    out
}

#[test]
fn four_by_four_matches_the_formulas() {
    let expected = reference(50, 4, 4, View::default(), ColorMode::Grayscale);
    for workers in &[1, 4] {
        let raster = Rasterizer::with_view(50, 4, 4, View::default(), *workers).unwrap();
        assert_eq!(raster.compute().as_bytes(), &expected[..], "workers = {}", workers);
    }
}

#[test]
fn four_by_four_has_the_cardioid_in_it() {
    // Pixel (1, 1) samples c = (-5/12, 1/3), inside the main cardioid.
    let raster = Rasterizer::with_view(50, 4, 4, View::default(), 2).unwrap();
    assert_eq!(raster.compute().pixel(1, 1), Some(Rgb([0, 0, 0])));
    raster.set_color_mode(ColorMode::InvertedGrayscale).unwrap();
    assert_eq!(raster.compute().pixel(1, 1), Some(Rgb([255, 255, 255])));
}

#[test]
fn every_color_mode_matches_the_formulas() {
    let view = View::new(-0.5, 0.25, 3.0, 1.0);
    for mode in &ColorMode::ALL {
        let raster = Rasterizer::with_view(120, 31, 17, view, 3).unwrap();
        raster.set_color_mode(*mode).unwrap();
        let expected = reference(120, 31, 17, view, *mode);
        assert_eq!(raster.compute().as_bytes(), &expected[..], "mode = {}", mode);
    }
}

#[test]
fn random_shapes_and_worker_counts_match_the_formulas() {
    let mut rng = rand::thread_rng();
    for _ in 0..25 {
        let width = rng.gen_range(2, 48);
        let height = rng.gen_range(2, 48);
        let workers = rng.gen_range(1, 64);
        let iter_max = rng.gen_range(1, 300);
        let view = View::new(
            rng.gen_range(-2.0, 1.0),
            rng.gen_range(-1.2, 1.2),
            rng.gen_range(0.5, 200.0),
            1.0,
        );
        let mode = ColorMode::ALL[rng.gen_range(0, 3)];

        let raster = Rasterizer::with_view(iter_max, width, height, view, workers).unwrap();
        raster.set_color_mode(mode).unwrap();
        let expected = reference(iter_max, width, height, view, mode);
        assert_eq!(
            raster.compute().as_bytes(),
            &expected[..],
            "{}x{} with {} workers, {} iterations, {:?}, {}",
            width,
            height,
            workers,
            iter_max,
            view,
            mode
        );
    }
}

#[test]
fn resized_frames_match_the_formulas() {
    let raster = Rasterizer::new(80, 10, 10).unwrap();
    raster.compute();
    raster.set_size(23, 9).unwrap();
    let frame = raster.compute();
    assert_eq!((frame.width(), frame.height()), (23, 9));
    assert_eq!(
        frame.as_bytes(),
        &reference(80, 23, 9, View::default(), ColorMode::Grayscale)[..]
    );
}

#[test]
fn display_and_input_threads_can_share_a_rasterizer() {
    let raster = Arc::new(Rasterizer::with_view(60, 24, 18, View::default(), 3).unwrap());

    let input = {
        let raster = Arc::clone(&raster);
        thread::spawn(move || {
            for step in 0..30 {
                let zoom = 1.0 + step as f64 * 0.1;
                raster.set_view(-0.75 + step as f64 * 0.01, 0.0, zoom).unwrap();
                if step % 7 == 0 {
                    raster.set_worker_count(1 + step % 5).unwrap();
                }
            }
        })
    };

    let display = {
        let raster = Arc::clone(&raster);
        thread::spawn(move || {
            let mut last = 0;
            for _ in 0..30 {
                let frame = raster.compute();
                assert_eq!(frame.as_bytes().len(), 24 * 18 * 3);
                assert!(frame.generation() >= last);
                last = frame.generation();
            }
        })
    };

    input.join().unwrap();
    display.join().unwrap();

    let view = raster.view();
    assert_eq!(view, View::new(-0.75 + 29.0 * 0.01, 0.0, 1.0 + 29.0 * 0.1, 1.0));
    assert_eq!(
        raster.compute().as_bytes(),
        &reference(60, 24, 18, view, ColorMode::Grayscale)[..]
    );
}
