//! On-Off-Keying sample runs to bits and back.
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

use crate::buffer::Buffer;
use crate::stream::{binary, Advance, Bit, Policy, Processor, Status};
use crate::{Error, Result};

fn default_tolerance() -> f64 {
    0.25
}

/// Sampling parameters shared by [OokDecoder] and [OokEncoder].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct OokConfig {
    /// Samples per second of the capture.
    pub sample_rate: f64,
    /// Symbols per second on the air.
    pub symbol_rate: f64,
    /// Accepted deviation from the nominal run length, as a fraction of it.
    #[builder(default = default_tolerance())]
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl OokConfig {
    /// Nominal number of samples per symbol.
    pub fn threshold(&self) -> f64 {
        self.sample_rate / self.symbol_rate
    }

    /// # Errors
    /// [Error::Config] for non-positive rates or a tolerance outside `[0, 1)`.
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate > 0.0 && self.symbol_rate > 0.0) {
            return Err(Error::Config(format!(
                "sample rate {} and symbol rate {} must be positive",
                self.sample_rate, self.symbol_rate
            )));
        }
        if !(0.0..1.0).contains(&self.tolerance) {
            return Err(Error::Config(format!(
                "tolerance {} must be in [0, 1)",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Classifies runs of constant level into one or two symbols.
#[derive(Debug, Clone)]
pub struct OokDecoder {
    threshold: f64,
    tolerance: f64,
    policy: Policy,
    buffer: Buffer<Bit>,
}

impl OokDecoder {
    /// # Errors
    /// If `config` does not validate.
    pub fn new(config: &OokConfig) -> Result<Self> {
        config.validate()?;
        let threshold = config.threshold();
        Ok(OokDecoder {
            threshold,
            tolerance: threshold * config.tolerance,
            policy: Policy::default(),
            buffer: Buffer::default(),
        })
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Number of symbols a run of `count` samples stands for, if any.
    fn classify(&self, count: usize) -> Option<usize> {
        let count = count as f64;
        (1..=2).find(|i| {
            let i = *i as f64;
            (self.threshold - self.tolerance) * i < count
                && count < (self.threshold + self.tolerance) * i
        })
    }
}

impl Processor for OokDecoder {
    type Input = Bit;
    type Output = Bit;

    fn advance(&mut self, chunk: &[Bit]) -> Result<Advance<Bit>> {
        let start = self.buffer.offset();
        let levels: Vec<Bit> = chunk.iter().map(|s| u8::from(*s != 0)).collect();
        self.buffer.extend(&levels);

        let mut output = Vec::new();
        let mut status = Status::Continue;
        while let Some((level, count)) = self.buffer.leading_run() {
            match self.classify(count) {
                Some(n) => {
                    trace!(level, count, symbols = n, "pulse");
                    output.extend(std::iter::repeat(level).take(n));
                }
                None => {
                    let offset = self.buffer.offset();
                    self.policy.check(Error::InvalidPulse { offset, count })?;
                    debug!(offset, count, "dropping invalid pulse");
                    status = Status::Reset;
                }
            }
            self.buffer.consume(count);
        }

        Ok(Advance {
            consumed: self.buffer.offset() - start,
            output,
            status,
        })
    }

    /// Only the run still touching the end of the input is ever retained. It is
    /// raw signal rather than decoding state and survives the reset, so symbol
    /// timing is unaffected.
    fn reset(&mut self) {}
}

/// Expands each bit into a whole number of samples.
#[derive(Debug, Clone)]
pub struct OokEncoder {
    samples_per_symbol: usize,
    policy: Policy,
    offset: usize,
}

impl OokEncoder {
    /// # Errors
    /// If `config` does not validate or yields less than one sample per symbol.
    pub fn new(config: &OokConfig) -> Result<Self> {
        config.validate()?;
        let samples_per_symbol = config.threshold().round() as usize;
        if samples_per_symbol == 0 {
            return Err(Error::Config(format!(
                "symbol rate {} exceeds sample rate {}",
                config.symbol_rate, config.sample_rate
            )));
        }
        Ok(OokEncoder {
            samples_per_symbol,
            policy: Policy::default(),
            offset: 0,
        })
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }
}

impl Processor for OokEncoder {
    type Input = Bit;
    type Output = Bit;

    fn advance(&mut self, chunk: &[Bit]) -> Result<Advance<Bit>> {
        let (bits, status) = binary(chunk, self.offset, self.policy)?;
        self.offset += chunk.len();

        let mut output = Vec::with_capacity(bits.len() * self.samples_per_symbol);
        for bit in bits {
            output.extend(std::iter::repeat(bit).take(self.samples_per_symbol));
        }
        Ok(Advance {
            consumed: chunk.len(),
            output,
            status,
        })
    }

    fn reset(&mut self) {}
}
