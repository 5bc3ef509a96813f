// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns escape times into colors.

use std::fmt;
use std::str::FromStr;

use errors::RasterError;
use escape::Escape;

/// Bytes per pixel in the output buffer.
pub const BYTES_PER_PIXEL: usize = 3;

/// One output pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

/// How escape times are turned into colors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorMode {
    /// Fast escapes are white, the set itself is black.
    Grayscale,
    /// Fast escapes are black, the set itself is white.
    InvertedGrayscale,
    /// The escape fraction spread over all 24 bits of the pixel.
    Rgb,
}

impl Default for ColorMode {
    fn default() -> Self {
        ColorMode::Grayscale
    }
}

impl ColorMode {
    /// Every mode, in the order `next` cycles through them.
    pub const ALL: [ColorMode; 3] = [
        ColorMode::Grayscale,
        ColorMode::InvertedGrayscale,
        ColorMode::Rgb,
    ];

    /// Look a mode up by its position in `ALL`.
    pub fn from_index(index: usize) -> Result<Self, RasterError> {
        ColorMode::ALL.get(index).cloned().ok_or_else(|| {
            RasterError::config(format!(
                "color mode must be between 0 and {}, got {}",
                ColorMode::ALL.len() - 1,
                index
            ))
        })
    }

    /// The position of this mode in `ALL`.
    pub fn index(self) -> usize {
        match self {
            ColorMode::Grayscale => 0,
            ColorMode::InvertedGrayscale => 1,
            ColorMode::Rgb => 2,
        }
    }

    /// The mode after this one, wrapping around.
    pub fn next(self) -> Self {
        ColorMode::ALL[(self.index() + 1) % ColorMode::ALL.len()]
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            ColorMode::Grayscale => "grayscale",
            ColorMode::InvertedGrayscale => "inverted",
            ColorMode::Rgb => "rgb",
        };
        f.write_str(name)
    }
}

impl FromStr for ColorMode {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grayscale" | "greyscale" | "0" => Ok(ColorMode::Grayscale),
            "inverted" | "1" => Ok(ColorMode::InvertedGrayscale),
            "rgb" | "color" | "2" => Ok(ColorMode::Rgb),
            _ => Err(RasterError::config(format!("unknown color mode '{}'", s))),
        }
    }
}

/// Colors one escape result.  `limit` is the iteration cap the result
/// was computed with; points that never escaped sit at the far end of
/// the scale.
///
/// In `Rgb` mode the fraction is scaled to 24 bits and each channel
/// keeps only its own byte, so the colors wrap around in bands.  That
/// banding is what the mode looks like and is kept exactly.
pub fn colorize(escape: Escape, limit: usize, mode: ColorMode) -> Rgb {
    let t = escape.iterations as f64 / limit as f64;
    match mode {
        ColorMode::Grayscale => {
            let v = 255 - (t * 255.0).round() as u8;
            Rgb([v, v, v])
        }
        ColorMode::InvertedGrayscale => {
            let v = (t * 255.0).round() as u8;
            Rgb([v, v, v])
        }
        ColorMode::Rgb => {
            let packed = (t * 16_777_216.0).floor() as u32;
            Rgb([
                (packed & 0xFF) as u8,
                ((packed >> 8) & 0xFF) as u8,
                ((packed >> 16) & 0xFF) as u8,
            ])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grayscale_runs_white_to_black() {
        assert_eq!(colorize(Escape::after(0), 100, ColorMode::Grayscale), Rgb([255; 3]));
        assert_eq!(colorize(Escape::bounded(100), 100, ColorMode::Grayscale), Rgb([0; 3]));
        assert_eq!(colorize(Escape::after(50), 100, ColorMode::Grayscale), Rgb([127; 3]));
    }

    #[test]
    fn inverted_is_the_complement() {
        for limit in 1..60 {
            for i in 0..limit + 1 {
                let e = if i == limit { Escape::bounded(limit) } else { Escape::after(i) };
                let Rgb(g) = colorize(e, limit, ColorMode::Grayscale);
                let Rgb(n) = colorize(e, limit, ColorMode::InvertedGrayscale);
                assert_eq!(g[0] as u16 + n[0] as u16, 255);
            }
        }
    }

    #[test]
    fn grayscale_rounds() {
        // 1/3 * 255 = 85.0, 2/3 * 255 = 170.0, 1/7 * 255 = 36.43
        assert_eq!(colorize(Escape::after(1), 3, ColorMode::InvertedGrayscale), Rgb([85; 3]));
        assert_eq!(colorize(Escape::after(2), 3, ColorMode::InvertedGrayscale), Rgb([170; 3]));
        assert_eq!(colorize(Escape::after(1), 7, ColorMode::InvertedGrayscale), Rgb([36; 3]));
        // 3/4 * 255 = 191.25, 1/2 * 255 = 127.5 rounds away from zero
        assert_eq!(colorize(Escape::after(3), 4, ColorMode::InvertedGrayscale), Rgb([191; 3]));
        assert_eq!(colorize(Escape::after(1), 2, ColorMode::InvertedGrayscale), Rgb([128; 3]));
    }

    #[test]
    fn rgb_starts_black() {
        assert_eq!(colorize(Escape::after(0), 250, ColorMode::Rgb), Rgb([0, 0, 0]));
    }

    #[test]
    fn rgb_interior_wraps_to_black() {
        assert_eq!(colorize(Escape::bounded(250), 250, ColorMode::Rgb), Rgb([0, 0, 0]));
    }

    #[test]
    fn rgb_masks_each_channel() {
        // 1/2 * 2^24 = 0x800000
        assert_eq!(colorize(Escape::after(1), 2, ColorMode::Rgb), Rgb([0x00, 0x00, 0x80]));
        // 1/4 * 2^24 = 0x400000, 3/4 * 2^24 = 0xC00000
        assert_eq!(colorize(Escape::after(3), 4, ColorMode::Rgb), Rgb([0x00, 0x00, 0xC0]));
        // 1/3 * 2^24 = 5592405.33 = 0x555555
        assert_eq!(colorize(Escape::after(1), 3, ColorMode::Rgb), Rgb([0x55, 0x55, 0x55]));
    }

    #[test]
    fn modes_cycle_in_order() {
        assert_eq!(ColorMode::Grayscale.next(), ColorMode::InvertedGrayscale);
        assert_eq!(ColorMode::InvertedGrayscale.next(), ColorMode::Rgb);
        assert_eq!(ColorMode::Rgb.next(), ColorMode::Grayscale);
    }

    #[test]
    fn modes_by_index_and_name() {
        for (i, mode) in ColorMode::ALL.iter().enumerate() {
            assert_eq!(ColorMode::from_index(i).unwrap(), *mode);
            assert_eq!(mode.index(), i);
            assert_eq!(mode.to_string().parse::<ColorMode>().unwrap(), *mode);
        }
        match ColorMode::from_index(3) {
            Err(RasterError::Config { .. }) => (),
            other => panic!("expected a configuration error, got {:?}", other),
        }
        match "sepia".parse::<ColorMode>() {
            Err(RasterError::Config { .. }) => (),
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }
}
