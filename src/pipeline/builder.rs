use tracing::warn;

use crate::framing::{EncoderOpts, FrameEncoder, Synchronizer, MAX_FRAME_BITS};
use crate::line::{
    BiphaseMarkDecoder, BiphaseMarkEncoder, LineCode, ManchesterDecoder, ManchesterEncoder,
};
use crate::message::Message;
use crate::ook::{OokConfig, OokDecoder, OokEncoder};
use crate::stream::{check_bits, Advance, Bit, Policy, Processor, Status};
use crate::Result;

use super::{chunked, Pipeline};

/// Builder for the usual receive chain: optional OOK, a line decoder, frame
/// synchronization and message decoding.
#[derive(Debug, Clone)]
pub struct DecoderBuilder {
    policy: Policy,
    line: LineCode,
    ook: Option<OokConfig>,
    max_frame_bits: usize,
}

impl Default for DecoderBuilder {
    fn default() -> Self {
        DecoderBuilder {
            policy: Policy::default(),
            line: LineCode::default(),
            ook: None,
            max_frame_bits: MAX_FRAME_BITS,
        }
    }
}

impl DecoderBuilder {
    /// Policy applied by every stage, including message decoding.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_line_code(mut self, line: LineCode) -> Self {
        self.line = line;
        self
    }

    /// Expect raw OOK samples rather than line symbols.
    pub fn with_ook(mut self, config: OokConfig) -> Self {
        self.ook = Some(config);
        self
    }

    pub fn with_max_frame_bits(mut self, max_frame_bits: usize) -> Self {
        self.max_frame_bits = max_frame_bits;
        self
    }

    /// # Errors
    /// If the OOK configuration is invalid.
    pub fn build(self) -> Result<Decoder> {
        let sync = Synchronizer::new()
            .with_policy(self.policy)
            .with_max_frame_bits(self.max_frame_bits);
        let mut pipeline = Pipeline::new(sync);
        if let Some(config) = &self.ook {
            pipeline = pipeline.with_stage(OokDecoder::new(config)?.with_policy(self.policy));
        }
        pipeline = match self.line {
            LineCode::BiphaseMark => {
                pipeline.with_stage(BiphaseMarkDecoder::new().with_policy(self.policy))
            }
            LineCode::Manchester => {
                pipeline.with_stage(ManchesterDecoder::new().with_policy(self.policy))
            }
        };
        Ok(Decoder {
            pipeline,
            policy: self.policy,
        })
    }
}

/// Decoder turns line symbols, or OOK samples, into messages.
pub struct Decoder {
    pipeline: Pipeline<Vec<u8>>,
    policy: Policy,
}

impl Decoder {
    pub fn builder() -> DecoderBuilder {
        DecoderBuilder::default()
    }

    /// Decode a chunk. Partial frames are kept for the next call.
    ///
    /// # Errors
    /// Under [Policy::Strict], the first error of any layer. Under [Policy::Tolerant]
    /// frames that fail to decode are logged and skipped.
    pub fn decode(&mut self, chunk: &[Bit]) -> Result<Vec<Message>> {
        Ok(self.advance(chunk)?.output)
    }

    /// Decode `input` in chunks sized by `next_size`.
    ///
    /// # Errors
    /// See [Decoder::decode].
    pub fn decode_chunked<F>(&mut self, input: &[Bit], next_size: F) -> Result<Vec<Message>>
    where
        F: FnMut() -> usize,
    {
        chunked(self, input, next_size)
    }

    /// Number of chain-wide resets so far.
    pub fn resets(&self) -> usize {
        self.pipeline.resets
    }
}

impl Processor for Decoder {
    type Input = Bit;
    type Output = Message;

    fn advance(&mut self, chunk: &[Bit]) -> Result<Advance<Message>> {
        let zult = self.pipeline.advance(chunk)?;
        let mut output = Vec::with_capacity(zult.output.len());
        for frame in &zult.output {
            match Message::decode_with(frame, self.policy) {
                Ok(msg) => output.push(msg),
                Err(err) => {
                    if self.policy == Policy::Strict {
                        return Err(err);
                    }
                    warn!(error = %err, frame = ?frame, "dropping undecodable frame");
                }
            }
        }
        Ok(Advance {
            consumed: zult.consumed,
            output,
            status: zult.status,
        })
    }

    fn reset(&mut self) {
        self.pipeline.reset();
    }
}

/// Builder for the transmit chain: frame encoding, a line encoder and optional OOK.
#[derive(Debug, Clone, Default)]
pub struct EncoderBuilder {
    policy: Policy,
    opts: EncoderOpts,
    line: LineCode,
    manchester_prefix: Vec<Bit>,
    ook: Option<OokConfig>,
}

impl EncoderBuilder {
    /// Policy of the line and OOK encoders for input elements that are not bits.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_opts(mut self, opts: EncoderOpts) -> Self {
        self.opts = opts;
        self
    }

    pub fn with_line_code(mut self, line: LineCode) -> Self {
        self.line = line;
        self
    }

    /// Symbols emitted once ahead of a Manchester encoded session.
    pub fn with_manchester_prefix(mut self, prefix: &[Bit]) -> Self {
        self.manchester_prefix = prefix.to_vec();
        self
    }

    /// Produce OOK samples rather than line symbols.
    pub fn with_ook(mut self, config: OokConfig) -> Self {
        self.ook = Some(config);
        self
    }

    /// # Errors
    /// If the OOK configuration is invalid, or the Manchester prefix or frame
    /// separator holds a value other than 0 or 1.
    pub fn build(self) -> Result<Encoder> {
        check_bits(self.manchester_prefix.iter().chain(&self.opts.separator))?;
        let biphase = BiphaseMarkEncoder::new().with_policy(self.policy);
        let manchester = ManchesterEncoder::new()
            .with_policy(self.policy)
            .with_prefix(&self.manchester_prefix);
        let line = match &self.ook {
            Some(config) => {
                let pipeline = Pipeline::new(OokEncoder::new(config)?.with_policy(self.policy));
                match self.line {
                    LineCode::BiphaseMark => pipeline.with_stage(biphase),
                    LineCode::Manchester => pipeline.with_stage(manchester),
                }
            }
            None => match self.line {
                LineCode::BiphaseMark => Pipeline::new(biphase),
                LineCode::Manchester => Pipeline::new(manchester),
            },
        };
        Ok(Encoder {
            frames: FrameEncoder::new(self.opts),
            line,
        })
    }
}

/// Encoder turns messages into a single burst of line symbols, or OOK samples.
///
/// The preamble is sent once per session; call [Processor::reset] to start a new burst.
pub struct Encoder {
    frames: FrameEncoder,
    line: Pipeline<Bit>,
}

impl Encoder {
    pub fn builder() -> EncoderBuilder {
        EncoderBuilder::default()
    }

    /// # Errors
    /// If a message cannot be encoded.
    pub fn encode(&mut self, messages: &[Message]) -> Result<Vec<Bit>> {
        Ok(self.advance(messages)?.output)
    }
}

impl Processor for Encoder {
    type Input = Message;
    type Output = Bit;

    fn advance(&mut self, chunk: &[Message]) -> Result<Advance<Bit>> {
        let frames = chunk
            .iter()
            .map(Message::encode)
            .collect::<Result<Vec<_>>>()?;
        let bits = self.frames.advance(&frames)?.output;
        let output = self.line.run(&bits)?;
        Ok(Advance {
            consumed: chunk.len(),
            output,
            status: Status::Continue,
        })
    }

    fn reset(&mut self) {
        self.frames.reset();
        self.line.reset();
    }
}
