//! Adapter for pulse-width debug logs, such as those printed by RFLink gateways.
//!
//! Each entry is the duration of one constant-level pulse in microseconds. Levels
//! alternate, a short pulse is one line symbol and a long pulse two.
use serde::{Deserialize, Serialize};
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::stream::{Advance, Bit, Processor, Status};
use crate::Result;

/// Exclusive duration bounds, in microseconds, of the recognized pulses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct PulseBands {
    #[builder(default = (80, 130))]
    pub short: (u32, u32),
    #[builder(default = (290, 340))]
    pub long: (u32, u32),
}

impl Default for PulseBands {
    fn default() -> Self {
        PulseBands::builder().build()
    }
}

fn within(band: (u32, u32), width: u32) -> bool {
    band.0 < width && width < band.1
}

/// Translates pulse widths into line symbols.
///
/// Pulses outside both bands are skipped without toggling the level.
#[derive(Debug, Clone, Default)]
pub struct PulseWidthDecoder {
    bands: PulseBands,
    level: Bit,
    /// Pulses skipped so far.
    pub ignored: usize,
}

impl PulseWidthDecoder {
    pub fn new(bands: PulseBands) -> Self {
        PulseWidthDecoder {
            bands,
            ..Default::default()
        }
    }
}

impl Processor for PulseWidthDecoder {
    type Input = u32;
    type Output = Bit;

    fn advance(&mut self, chunk: &[u32]) -> Result<Advance<Bit>> {
        let mut output = Vec::with_capacity(chunk.len() * 2);
        for width in chunk {
            let symbols = if within(self.bands.long, *width) {
                2
            } else if within(self.bands.short, *width) {
                1
            } else {
                debug!(width, "ignored pulse");
                self.ignored += 1;
                continue;
            };
            output.extend(std::iter::repeat(self.level).take(symbols));
            self.level ^= 1;
        }
        Ok(Advance {
            consumed: chunk.len(),
            output,
            status: Status::Continue,
        })
    }

    fn reset(&mut self) {
        self.level = 0;
    }
}
