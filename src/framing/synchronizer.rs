use tracing::{debug, trace};

use crate::bits::{pack_partial, BitOrder};
use crate::buffer::Buffer;
use crate::stream::{Advance, Bit, Policy, Processor, Status};
use crate::{Error, Result};

use super::{
    destuff, END_OF_FRAME, MAX_FRAME_BITS, MIN_LEADING_ONES, MIN_LEADING_ZEROS, TRAILING_LENGTH,
};

const END_OF_FRAME_PATTERN: u16 = 0b1_1111_1110;
const END_OF_FRAME_MASK: u16 = 0b1_1111_1111;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Looking for the preamble zeros.
    Init,
    /// Expecting the preamble ones.
    Lead1,
    /// Expecting the single bit ending the preamble.
    Extra0,
    /// Searching for the end of a frame.
    Data,
    /// Skipping the gap between repeats.
    Trailing,
}

/// Counters describing what a [Synchronizer] has seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Preambles found.
    pub bursts: usize,
    /// Frames emitted.
    pub frames: usize,
    /// Frames dropped because of stuffing violations.
    pub dropped: usize,
    /// Bits discarded while looking for a preamble.
    pub noise_bits: usize,
    /// Errors absorbed under [Policy::Tolerant].
    pub errors: usize,
}

/// Synchronizer recovers frames from a stream of decoded bits.
///
/// Output frames are the de-stuffed frame bits packed LSB first; a trailing partial
/// byte is zero filled.
#[derive(Debug, Clone)]
pub struct Synchronizer {
    policy: Policy,
    max_frame_bits: usize,
    buffer: Buffer<Bit>,
    state: State,
    // Set once a frame of the current burst was delimited
    in_burst: bool,
    // Incremental end-of-frame search in the data state
    scanned: usize,
    window: u16,
    pub stats: SyncStats,
}

impl Default for Synchronizer {
    fn default() -> Self {
        Synchronizer {
            policy: Policy::default(),
            max_frame_bits: MAX_FRAME_BITS,
            buffer: Buffer::default(),
            state: State::Init,
            in_burst: false,
            scanned: 0,
            window: 0,
            stats: SyncStats::default(),
        }
    }
}

enum Step {
    Progress,
    NeedData,
}

impl Synchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Bound the stuffed length of a frame. Without an end of frame marker within
    /// this many bits the search is abandoned.
    pub fn with_max_frame_bits(mut self, max_frame_bits: usize) -> Self {
        self.max_frame_bits = max_frame_bits;
        self
    }

    fn enter(&mut self, state: State) {
        trace!(offset = self.buffer.offset(), from = ?self.state, to = ?state, "state");
        self.state = state;
        self.scanned = 0;
        self.window = 0;
    }

    fn fail(&mut self, err: Error) -> Result<()> {
        self.policy.check(err)?;
        self.stats.errors += 1;
        Ok(())
    }

    /// Index just past the end of frame marker, if present within the search limit.
    fn find_end_of_frame(&mut self, limit: usize) -> Option<usize> {
        let dat = self.buffer.as_slice();
        let end = dat.len().min(limit);
        while self.scanned < end {
            self.window = ((self.window << 1) | u16::from(dat[self.scanned])) & END_OF_FRAME_MASK;
            self.scanned += 1;
            if self.scanned >= END_OF_FRAME.len() && self.window == END_OF_FRAME_PATTERN {
                return Some(self.scanned);
            }
        }
        None
    }

    fn step(&mut self, output: &mut Vec<Vec<u8>>, status: &mut Status) -> Result<Step> {
        match self.state {
            State::Init => {
                let Some((level, count)) = self.buffer.leading_run() else {
                    return Ok(Step::NeedData);
                };
                if level == 0 && count >= MIN_LEADING_ZEROS {
                    self.buffer.consume(count);
                    self.enter(State::Lead1);
                } else {
                    trace!(offset = self.buffer.offset(), level, count, "noise");
                    self.stats.noise_bits += count;
                    self.buffer.consume(count);
                }
            }
            State::Lead1 => {
                let Some((level, count)) = self.buffer.leading_run() else {
                    return Ok(Step::NeedData);
                };
                if level == 1 && count >= MIN_LEADING_ONES {
                    self.buffer.consume(count);
                    self.enter(State::Extra0);
                } else {
                    // The run is left for Init to discard
                    let offset = self.buffer.offset();
                    self.fail(Error::InvalidPreamble { offset, count })?;
                    *status = Status::Reset;
                    self.enter(State::Init);
                }
            }
            State::Extra0 => {
                if self.buffer.is_empty() {
                    return Ok(Step::NeedData);
                }
                self.buffer.consume(1);
                self.stats.bursts += 1;
                self.in_burst = false;
                debug!(offset = self.buffer.offset(), "preamble");
                self.enter(State::Data);
            }
            State::Data => {
                let limit = self.max_frame_bits + END_OF_FRAME.len();
                match self.find_end_of_frame(limit) {
                    Some(end) => self.frame(end, output)?,
                    None if self.scanned >= limit => {
                        let offset = self.buffer.offset();
                        if self.in_burst {
                            debug!(offset, "end of burst");
                        } else {
                            self.fail(Error::MissingEndOfFrame { offset, limit })?;
                            *status = Status::Reset;
                        }
                        // Unconsumed bits are rescanned for the next preamble
                        self.enter(State::Init);
                    }
                    None => return Ok(Step::NeedData),
                }
            }
            State::Trailing => {
                if self.buffer.len() < TRAILING_LENGTH {
                    return Ok(Step::NeedData);
                }
                self.buffer.consume(TRAILING_LENGTH);
                self.enter(State::Data);
            }
        }
        Ok(Step::Progress)
    }

    /// Emit the frame ending at `end`, which includes the end of frame marker.
    fn frame(&mut self, end: usize, output: &mut Vec<Vec<u8>>) -> Result<()> {
        let offset = self.buffer.offset();
        let stuffed = &self.buffer.as_slice()[..end - END_OF_FRAME.len()];
        match destuff(stuffed, offset) {
            Ok(bits) => {
                let frame = pack_partial(&bits, BitOrder::LsbFirst);
                debug!(offset, bits = bits.len(), bytes = frame.len(), "frame");
                self.stats.frames += 1;
                output.push(frame);
            }
            Err(err) => {
                self.fail(err)?;
                debug!(offset, "dropping frame");
                self.stats.dropped += 1;
            }
        }
        self.in_burst = true;
        self.buffer.consume(end);
        self.enter(State::Trailing);
        Ok(())
    }
}

impl Processor for Synchronizer {
    type Input = Bit;
    type Output = Vec<u8>;

    fn advance(&mut self, chunk: &[Bit]) -> Result<Advance<Vec<u8>>> {
        let start = self.buffer.offset();
        self.buffer.extend(chunk);

        let mut output = Vec::new();
        let mut status = Status::Continue;
        while let Step::Progress = self.step(&mut output, &mut status)? {}

        Ok(Advance {
            consumed: self.buffer.offset() - start,
            output,
            status,
        })
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.in_burst = false;
        self.enter(State::Init);
    }
}
