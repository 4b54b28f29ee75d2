//! X2D frame synchronization.
//!
//! A transmission is a preamble (a run of zeros, a run of ones and a single 0)
//! followed by one or more repeats of the same frame. Each frame is bit-stuffed
//! so that it can never contain [END_OF_FRAME], which terminates it, and repeats
//! are separated by a fixed gap of [TRAILING_LENGTH] bits.
//!
//! Frame bytes are sent least significant bit first.
mod encoder;
mod stuffing;
mod synchronizer;

pub use encoder::*;
pub use stuffing::*;
pub use synchronizer::*;

use crate::stream::Bit;

/// Shortest zero run accepted as the start of a preamble.
pub const MIN_LEADING_ZEROS: usize = 7;
/// Shortest ones run accepted after the preamble zeros.
pub const MIN_LEADING_ONES: usize = 6;
/// Ones allowed in a row inside a frame before a 0 is stuffed.
pub const MAX_SUCCESSIVE_ONES: usize = 5;
/// Marker terminating every frame.
pub const END_OF_FRAME: [Bit; 9] = [1, 1, 1, 1, 1, 1, 1, 1, 0];
/// Gap between repeats of a frame within one burst.
pub const TRAILING_LENGTH: usize = 7;
/// Default bound on the stuffed length of a frame.
pub const MAX_FRAME_BITS: usize = 256;
/// Default gap emitted by the encoder after every frame.
pub const SEPARATOR: [Bit; TRAILING_LENGTH] = [1, 1, 1, 1, 1, 1, 0];
