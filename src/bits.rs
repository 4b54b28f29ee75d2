//! Conversion between bytes and one-bit-per-element sequences.
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::buffer::Buffer;
use crate::stream::{Advance, Bit, Policy, Processor, Status};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitOrder {
    /// Most significant bit first, as bytes come off a demodulator.
    #[default]
    MsbFirst,
    /// Least significant bit first, as frame bytes go on the air.
    LsbFirst,
}

impl BitOrder {
    fn shift(self, idx: usize) -> usize {
        match self {
            BitOrder::MsbFirst => 7 - idx,
            BitOrder::LsbFirst => idx,
        }
    }
}

/// Expand each byte to 8 bits.
#[must_use]
pub fn unpack(bytes: &[u8], order: BitOrder) -> Vec<Bit> {
    let mut out = Vec::with_capacity(bytes.len() * 8);
    for b in bytes {
        for idx in 0..8 {
            out.push((b >> order.shift(idx)) & 1);
        }
    }
    out
}

/// Pack whole groups of 8 bits into bytes.
///
/// # Errors
/// [Error::Misaligned] if the length is not a multiple of 8, [Error::InvalidBit]
/// for any element other than 0 or 1.
pub fn pack(bits: &[Bit], order: BitOrder) -> Result<Vec<u8>> {
    if bits.len() % 8 != 0 {
        return Err(Error::Misaligned { count: bits.len() });
    }
    if let Some(offset) = bits.iter().position(|b| *b > 1) {
        return Err(Error::InvalidBit {
            offset,
            value: bits[offset],
        });
    }
    Ok(pack_partial(bits, order))
}

/// Pack bits into bytes, zero-filling a trailing partial group.
///
/// Only the low bit of each element is used.
#[must_use]
pub fn pack_partial(bits: &[Bit], order: BitOrder) -> Vec<u8> {
    bits.chunks(8)
        .map(|group| {
            group
                .iter()
                .enumerate()
                .fold(0u8, |acc, (idx, b)| acc | ((b & 1) << order.shift(idx)))
        })
        .collect()
}

/// Streaming byte to bit expansion.
#[derive(Debug, Clone, Default)]
pub struct Unpacker {
    order: BitOrder,
}

impl Unpacker {
    pub fn new(order: BitOrder) -> Self {
        Unpacker { order }
    }
}

impl Processor for Unpacker {
    type Input = u8;
    type Output = Bit;

    fn advance(&mut self, chunk: &[u8]) -> Result<Advance<Bit>> {
        Ok(Advance {
            consumed: chunk.len(),
            output: unpack(chunk, self.order),
            status: Status::Continue,
        })
    }

    fn reset(&mut self) {}
}

/// Streaming bit to byte packing. A partial trailing group is held until the
/// rest of it arrives.
#[derive(Debug, Clone, Default)]
pub struct Packer {
    order: BitOrder,
    policy: Policy,
    buffer: Buffer<Bit>,
}

impl Packer {
    pub fn new(order: BitOrder) -> Self {
        Packer {
            order,
            ..Default::default()
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }
}

impl Processor for Packer {
    type Input = Bit;
    type Output = u8;

    fn advance(&mut self, chunk: &[Bit]) -> Result<Advance<u8>> {
        let start = self.buffer.offset();
        self.buffer.extend(chunk);

        let mut status = Status::Continue;
        let whole = self.buffer.len() / 8 * 8;
        let output = match pack(&self.buffer.as_slice()[..whole], self.order) {
            Ok(bytes) => {
                self.buffer.consume(whole);
                bytes
            }
            Err(Error::InvalidBit { offset, value }) => {
                let err = Error::InvalidBit {
                    offset: start + offset,
                    value,
                };
                self.policy.check(err)?;
                trace!(offset = start + offset, "dropping packer remainder");
                self.buffer.clear();
                status = Status::Reset;
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        Ok(Advance {
            consumed: self.buffer.offset() - start,
            output,
            status,
        })
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }
}
