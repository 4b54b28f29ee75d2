//! Chaining stream processors.
//!
//! A [Pipeline] feeds each chunk through its bit stages in order and into a final
//! sink. When any stage reports [Status::Reset] every stage is reset once the chunk
//! has been processed, so a protocol violation in one layer cannot leave another
//! layer holding stale state.
mod builder;

pub use builder::*;

use tracing::debug;

use crate::stream::{Advance, Bit, Processor, Status};
use crate::Result;

type Stage = Box<dyn Processor<Input = Bit, Output = Bit>>;

pub struct Pipeline<O> {
    stages: Vec<Stage>,
    sink: Box<dyn Processor<Input = Bit, Output = O>>,
    /// Number of chain-wide resets performed.
    pub resets: usize,
}

impl<O> Pipeline<O> {
    /// Create a pipeline feeding input directly to `sink`.
    pub fn new<P>(sink: P) -> Self
    where
        P: Processor<Input = Bit, Output = O> + 'static,
    {
        Pipeline {
            stages: Vec::new(),
            sink: Box::new(sink),
            resets: 0,
        }
    }

    /// Append a stage ahead of the sink, after any stages already added.
    pub fn with_stage<P>(mut self, stage: P) -> Self
    where
        P: Processor<Input = Bit, Output = Bit> + 'static,
    {
        self.stages.push(Box::new(stage));
        self
    }

    /// Feed all of `input` as a single chunk.
    ///
    /// # Errors
    /// The first error of any stage.
    pub fn run(&mut self, input: &[Bit]) -> Result<Vec<O>> {
        Ok(self.advance(input)?.output)
    }

    /// Feed `input` in consecutive chunks sized by `next_size`, concatenating the
    /// output. Sizes of zero are treated as one.
    ///
    /// # Errors
    /// The first error of any stage.
    pub fn run_chunked<F>(&mut self, input: &[Bit], next_size: F) -> Result<Vec<O>>
    where
        F: FnMut() -> usize,
    {
        chunked(self, input, next_size)
    }
}

/// Feed `input` to `processor` in consecutive chunks sized by `next_size` and
/// concatenate the output. Sizes are clamped to `1..=remaining`.
pub(crate) fn chunked<P, F>(
    processor: &mut P,
    input: &[P::Input],
    mut next_size: F,
) -> Result<Vec<P::Output>>
where
    P: Processor + ?Sized,
    F: FnMut() -> usize,
{
    let mut output = Vec::new();
    let mut rest = input;
    while !rest.is_empty() {
        let size = next_size().clamp(1, rest.len());
        let (chunk, tail) = rest.split_at(size);
        output.extend(processor.advance(chunk)?.output);
        rest = tail;
    }
    Ok(output)
}

impl<O> Processor for Pipeline<O> {
    type Input = Bit;
    type Output = O;

    fn advance(&mut self, chunk: &[Bit]) -> Result<Advance<O>> {
        let mut reset = false;
        let mut consumed = None;
        let mut data = chunk.to_vec();
        for stage in &mut self.stages {
            let zult = stage.advance(&data)?;
            consumed.get_or_insert(zult.consumed);
            reset |= zult.is_reset();
            data = zult.output;
        }
        let zult = self.sink.advance(&data)?;
        reset |= zult.is_reset();

        let status = if reset {
            debug!(resets = self.resets + 1, "resetting pipeline");
            self.reset();
            self.resets += 1;
            Status::Reset
        } else {
            Status::Continue
        };

        Ok(Advance {
            consumed: consumed.unwrap_or(zult.consumed),
            output: zult.output,
            status,
        })
    }

    fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
        self.sink.reset();
    }
}
