// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The two ways a rasterizer can refuse a request.  Neither of them
//! ever leaves the store half-updated: when a setter fails, the
//! previous parameters and the previous buffer are kept.

use std::result;

/// Errors reported by the rasterizer and its setters.
#[derive(Debug, Fail, Clone, PartialEq)]
pub enum RasterError {
    /// A parameter was out of range: a dimension below 2, a zero
    /// iteration cap or worker count, a non-positive zoom, or an
    /// unknown color mode.
    #[fail(display = "invalid configuration: {}", reason)]
    Config {
        /// What was wrong with the request.
        reason: String,
    },

    /// The pixel buffer for a new image size could not be allocated.
    #[fail(display = "could not allocate {} bytes for the pixel buffer", bytes)]
    Allocation {
        /// The size of the buffer we tried to allocate.  Saturates at
        /// `usize::MAX` when the byte count itself overflowed.
        bytes: usize,
    },
}

impl RasterError {
    pub(crate) fn config<S: Into<String>>(reason: S) -> Self {
        RasterError::Config {
            reason: reason.into(),
        }
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = result::Result<T, RasterError>;
