use serde::{Deserialize, Serialize};
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::bits::{unpack, BitOrder};
use crate::stream::{Advance, Bit, Processor, Status};
use crate::Result;

use super::{stuff, END_OF_FRAME, MIN_LEADING_ONES, SEPARATOR};

fn default_preamble_zeros() -> usize {
    9
}

fn default_preamble_ones() -> usize {
    MIN_LEADING_ONES
}

fn default_separator() -> Vec<Bit> {
    SEPARATOR.to_vec()
}

/// Shape of the bits a [FrameEncoder] puts around frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct EncoderOpts {
    /// Zeros starting the preamble.
    #[builder(default = default_preamble_zeros())]
    #[serde(default = "default_preamble_zeros")]
    pub preamble_zeros: usize,
    /// Ones following the preamble zeros.
    #[builder(default = default_preamble_ones())]
    #[serde(default = "default_preamble_ones")]
    pub preamble_ones: usize,
    /// Bits appended after the end of frame marker of every frame.
    #[builder(default = default_separator())]
    #[serde(default = "default_separator")]
    pub separator: Vec<Bit>,
}

impl Default for EncoderOpts {
    fn default() -> Self {
        EncoderOpts::builder().build()
    }
}

/// FrameEncoder turns frames into the stuffed bit stream of a single burst.
///
/// The preamble is emitted before the first frame only, until [Processor::reset].
#[derive(Debug, Clone, Default)]
pub struct FrameEncoder {
    opts: EncoderOpts,
    preamble_sent: bool,
}

impl FrameEncoder {
    pub fn new(opts: EncoderOpts) -> Self {
        FrameEncoder {
            opts,
            preamble_sent: false,
        }
    }

    fn preamble(&self) -> Vec<Bit> {
        let mut bits = vec![0; self.opts.preamble_zeros];
        bits.extend(std::iter::repeat(1).take(self.opts.preamble_ones));
        bits.push(0);
        bits
    }

    /// Encode one frame, preceded by the preamble if this is the first.
    pub fn encode(&mut self, frame: &[u8]) -> Vec<Bit> {
        let mut bits = Vec::new();
        if !self.preamble_sent {
            bits.extend(self.preamble());
            self.preamble_sent = true;
        }
        bits.extend(stuff(&unpack(frame, BitOrder::LsbFirst)));
        bits.extend(END_OF_FRAME);
        bits.extend_from_slice(&self.opts.separator);
        debug!(bytes = frame.len(), bits = bits.len(), "encoded frame");
        bits
    }
}

impl Processor for FrameEncoder {
    type Input = Vec<u8>;
    type Output = Bit;

    fn advance(&mut self, chunk: &[Vec<u8>]) -> Result<Advance<Bit>> {
        let mut output = Vec::new();
        for frame in chunk {
            output.extend(self.encode(frame));
        }
        Ok(Advance {
            consumed: chunk.len(),
            output,
            status: Status::Continue,
        })
    }

    fn reset(&mut self) {
        self.preamble_sent = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::Synchronizer;

    #[test]
    fn test_preamble_once() {
        let mut encoder = FrameEncoder::default();
        let first = encoder.encode(&[0x00]);
        assert_eq!(first[..16], [0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 0]);
        assert_eq!(first.len(), 16 + 8 + 9 + 7);

        let second = encoder.encode(&[0x00]);
        assert_eq!(second.len(), 8 + 9 + 7, "no preamble on repeats");
    }

    #[test]
    fn test_synchronizer_recovers_frames() {
        let frames = vec![vec![0xff, 0xfe, 0x7f], vec![0x98, 0x48, 0x05]];
        let opts = EncoderOpts::builder().preamble_zeros(12).build();
        let mut encoder = FrameEncoder::new(opts);
        let bits = encoder.advance(&frames).expect("encode failed").output;

        let mut sync = Synchronizer::new();
        let zult = sync.advance(&bits).expect("sync failed");
        assert_eq!(zult.output, frames);
    }

    #[test]
    fn test_opts_from_json() {
        let opts: EncoderOpts =
            serde_json::from_str(r#"{"preamble_zeros": 10}"#).expect("failed to parse opts");
        assert_eq!(opts.preamble_zeros, 10);
        assert_eq!(opts.preamble_ones, 6);
        assert_eq!(opts.separator, SEPARATOR);
    }
}
