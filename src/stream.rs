//! The contract shared by every streaming stage.
//!
//! Stages accept arbitrary chunks of input, keep whatever they cannot use yet in
//! an internal remainder, and report how much they consumed along with any output
//! produced. A [Status::Reset] tells the caller a local protocol violation was
//! absorbed and the surrounding chain should drop its state.
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

/// A single binary element, 0 or 1. Line symbols and OOK sample levels share
/// this representation.
pub type Bit = u8;

/// How a stage reacts to malformed input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Return the error to the caller, aborting the current batch.
    #[default]
    Strict,
    /// Log the error and continue, signalling [Status::Reset] where state was dropped.
    Tolerant,
}

impl Policy {
    /// Apply the policy to `err`: strict returns it, tolerant logs it and returns `Ok`.
    pub fn check(self, err: Error) -> Result<()> {
        match self {
            Policy::Strict => Err(err),
            Policy::Tolerant => {
                warn!(error = %err, "ignoring stream error");
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Continue,
    /// The stage dropped its state; every stage in the chain should do the same.
    Reset,
}

/// The binary elements of `chunk`, whose first element sits at stream `offset`.
///
/// Any other value is an [Error::InvalidBit] handled per `policy`; under
/// [Policy::Tolerant] it is left out and [Status::Reset] reported.
pub(crate) fn binary(
    chunk: &[Bit],
    offset: usize,
    policy: Policy,
) -> Result<(Vec<Bit>, Status)> {
    let mut bits = Vec::with_capacity(chunk.len());
    let mut status = Status::Continue;
    for (idx, value) in chunk.iter().enumerate() {
        if *value > 1 {
            policy.check(Error::InvalidBit {
                offset: offset + idx,
                value: *value,
            })?;
            status = Status::Reset;
        } else {
            bits.push(*value);
        }
    }
    Ok((bits, status))
}

/// [Error::Config] naming the first of `bits` that is not 0 or 1.
pub(crate) fn check_bits<'a, I>(bits: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Bit>,
{
    match bits.into_iter().find(|b| **b > 1) {
        Some(value) => Err(Error::Config(format!("{value} is not a bit"))),
        None => Ok(()),
    }
}

/// Result of feeding one chunk to a [Processor].
#[derive(Debug, Clone, PartialEq)]
pub struct Advance<T> {
    /// Elements of remainder plus chunk consumed by this call.
    pub consumed: usize,
    pub output: Vec<T>,
    pub status: Status,
}

impl<T> Advance<T> {
    pub fn is_reset(&self) -> bool {
        self.status == Status::Reset
    }
}

/// A resumable stream transformation.
///
/// Implementations own their remainder buffer. Feeding the same data in any
/// segmentation must produce the same concatenated output.
pub trait Processor {
    type Input;
    type Output;

    /// Feed `chunk`, appended to any retained remainder.
    ///
    /// # Errors
    /// Malformed input when the processor's [Policy] is [Policy::Strict].
    fn advance(&mut self, chunk: &[Self::Input]) -> Result<Advance<Self::Output>>;

    /// Discard the remainder and any decoding state.
    ///
    /// Position in the input stream is not decoding state: a stage that pairs or
    /// times its input stays in step with it across a reset.
    fn reset(&mut self);
}
