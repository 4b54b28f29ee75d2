use crate::stream::{binary, Advance, Bit, Policy, Processor};
use crate::Result;

use super::Pairs;

/// Biphase-Mark decoder. Equal symbols in a pair are a 0, differing symbols a 1.
#[derive(Debug, Clone, Default)]
pub struct BiphaseMarkDecoder {
    policy: Policy,
    pairs: Pairs,
}

impl BiphaseMarkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }
}

impl Processor for BiphaseMarkDecoder {
    type Input = Bit;
    type Output = Bit;

    fn advance(&mut self, chunk: &[Bit]) -> Result<Advance<Bit>> {
        let start = self.pairs.offset();
        self.pairs.extend(chunk);

        let (output, status) = self.pairs.decode(self.policy, |pair| match pair {
            [0, 0] | [1, 1] => Some(0),
            [0, 1] | [1, 0] => Some(1),
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

/// Biphase-Mark encoder.
///
/// Every pair starts with a transition from the last emitted symbol; a 1 adds a
/// second transition mid-pair. The last symbol is carried across calls.
#[derive(Debug, Clone)]
pub struct BiphaseMarkEncoder {
    policy: Policy,
    last: Bit,
    offset: usize,
}

impl Default for BiphaseMarkEncoder {
    fn default() -> Self {
        BiphaseMarkEncoder {
            policy: Policy::default(),
            last: 1,
            offset: 0,
        }
    }
}

impl BiphaseMarkEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }
}

impl Processor for BiphaseMarkEncoder {
    type Input = Bit;
    type Output = Bit;

    fn advance(&mut self, chunk: &[Bit]) -> Result<Advance<Bit>> {
        let (bits, status) = binary(chunk, self.offset, self.policy)?;
        self.offset += chunk.len();

        let mut output = Vec::with_capacity(bits.len() * 2);
        for bit in bits {
            let first = 1 - self.last;
            let second = if bit == 0 { first } else { 1 - first };
            output.push(first);
            output.push(second);
            self.last = second;
        }
        Ok(Advance {
            consumed: chunk.len(),
            output,
            status,
        })
    }

    fn reset(&mut self) {
        self.last = 1;
    }
}
