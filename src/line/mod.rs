//! Two-symbol line codes carrying one bit per symbol pair.
mod biphase;
mod manchester;

pub use biphase::*;
pub use manchester::*;

use serde::{Deserialize, Serialize};

use crate::buffer::Buffer;
use crate::stream::{Bit, Policy, Status};
use crate::{Error, Result};

/// Line code selection for the [crate::pipeline] builders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCode {
    Manchester,
    #[default]
    BiphaseMark,
}

/// Symbol remainder of a pair decoder, kept aligned to pair boundaries.
#[derive(Debug, Clone, Default)]
struct Pairs {
    buffer: Buffer<Bit>,
    // Symbols still to drop before the next pair starts.
    skip: usize,
}

impl Pairs {
    fn with_skip(skip: usize) -> Self {
        Pairs {
            skip,
            ..Default::default()
        }
    }

    /// Stream position of the first retained symbol.
    fn offset(&self) -> usize {
        self.buffer.offset()
    }

    fn extend(&mut self, chunk: &[Bit]) {
        self.buffer.extend(chunk);
        let n = self.skip.min(self.buffer.len());
        self.buffer.consume(n);
        self.skip -= n;
    }

    /// Drop the remainder but not the pair phase. A dropped odd symbol opened a
    /// pair, so its partner is skipped when it arrives.
    fn reset(&mut self) {
        self.skip += self.buffer.len() % 2;
        self.buffer.clear();
    }

    /// Decode every whole symbol pair with `classify`.
    ///
    /// Pairs `classify` rejects are [Error::InvalidSymbol]s handled per `policy`;
    /// under [Policy::Tolerant] the pair is dropped and [Status::Reset] reported.
    fn decode<F>(&mut self, policy: Policy, classify: F) -> Result<(Vec<Bit>, Status)>
    where
        F: Fn([Bit; 2]) -> Option<Bit>,
    {
        let buffer = &mut self.buffer;
        let mut output = Vec::with_capacity(buffer.len() / 2);
        let mut status = Status::Continue;
        while buffer.len() >= 2 {
            let pair = [buffer.as_slice()[0], buffer.as_slice()[1]];
            match classify(pair) {
                Some(bit) => output.push(bit),
                None => {
                    policy.check(Error::InvalidSymbol {
                        offset: buffer.offset(),
                        pair,
                    })?;
                    status = Status::Reset;
                }
            }
            buffer.consume(2);
        }
        Ok((output, status))
    }
}
