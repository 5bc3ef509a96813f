// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time test.  Take a point `c` on the complex plane,
//! start with `z = 0` and repeatedly replace `z` with `z * z + c`.
//! Points outside the Mandelbrot set eventually run off to infinity;
//! once `|z|` exceeds 2 they are guaranteed to, so that is where we
//! stop counting.

use num::Complex;

/// Squared escape radius.  The comparison against it is strict: a
/// point sitting exactly on the circle has not escaped yet.
pub const ESCAPE_RADIUS_SQR: f64 = 4.0;

/// The outcome of iterating a single point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Escape {
    /// Whether the orbit left the escape radius within the cap.
    pub escaped: bool,
    /// The iteration at which it left, or the cap if it never did.
    pub iterations: usize,
}

impl Escape {
    /// An orbit that left the escape radius during iteration `i`.
    pub fn after(i: usize) -> Self {
        Escape {
            escaped: true,
            iterations: i,
        }
    }

    /// An orbit that stayed bounded for all `limit` iterations.
    pub fn bounded(limit: usize) -> Self {
        Escape {
            escaped: false,
            iterations: limit,
        }
    }
}

/// Iterates `c` at most `limit` times and reports when it escaped.
///
/// Iteration `i` (counting from zero) computes `z_{i+1}` and tests it,
/// so a point that is already far from the set reports 0.  With the
/// strict comparison, `c = 2` lands exactly on the radius at the first
/// step and escapes during iteration 1.
pub fn evaluate(c: Complex<f64>, limit: usize) -> Escape {
    let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
    for i in 0..limit {
        // re = re² - im², im = 2·re·im; num::Complex multiplies in
        // exactly that order.
        z = z * z + c;
        if z.norm_sqr() > ESCAPE_RADIUS_SQR {
            return Escape::after(i);
        }
    }
    Escape::bounded(limit)
}
