use crate::stream::{binary, Advance, Bit, Policy, Processor};
use crate::Result;

use super::Pairs;

fn symbols(bit: Bit) -> [Bit; 2] {
    if bit == 0 {
        [0, 1]
    } else {
        [1, 0]
    }
}

/// Manchester decoder: (0,1) is 0, (1,0) is 1.
#[derive(Debug, Clone, Default)]
pub struct ManchesterDecoder {
    policy: Policy,
    pairs: Pairs,
}

impl ManchesterDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Skip the first `len` symbols of the stream, such as the prefix emitted by
    /// [ManchesterEncoder::with_prefix]. A reset does not skip them again.
    pub fn with_prefix(mut self, len: usize) -> Self {
        self.pairs = Pairs::with_skip(len);
        self
    }
}

impl Processor for ManchesterDecoder {
    type Input = Bit;
    type Output = Bit;

    fn advance(&mut self, chunk: &[Bit]) -> Result<Advance<Bit>> {
        let start = self.pairs.offset();
        self.pairs.extend(chunk);

        let (output, status) = self.pairs.decode(self.policy, |pair| match pair {
            [0, 1] => Some(0),
            [1, 0] => Some(1),
            _ => None,
        })?;

        Ok(Advance {
            consumed: self.pairs.offset() - start,
            output,
            status,
        })
    }

    fn reset(&mut self) {
        self.pairs.reset();
    }
}

/// Manchester encoder, optionally emitting a fixed prefix before the first pair.
#[derive(Debug, Clone, Default)]
pub struct ManchesterEncoder {
    policy: Policy,
    prefix: Vec<Bit>,
    prefix_sent: bool,
    offset: usize,
}

impl ManchesterEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_prefix(mut self, prefix: &[Bit]) -> Self {
        self.prefix = prefix.to_vec();
        self
    }
}

impl Processor for ManchesterEncoder {
    type Input = Bit;
    type Output = Bit;

    fn advance(&mut self, chunk: &[Bit]) -> Result<Advance<Bit>> {
        let (bits, status) = binary(chunk, self.offset, self.policy)?;
        self.offset += chunk.len();

        let mut output = Vec::with_capacity(self.prefix.len() + bits.len() * 2);
        if !self.prefix_sent {
            output.extend_from_slice(&self.prefix);
            self.prefix_sent = true;
        }
        for bit in bits {
            output.extend(symbols(bit));
        }
        Ok(Advance {
            consumed: chunk.len(),
            output,
            status,
        })
    }

    fn reset(&mut self) {
        self.prefix_sent = false;
    }
}
