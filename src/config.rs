//! Serializable settings for a decode/encode chain.
use serde::{Deserialize, Serialize};

use crate::framing::{EncoderOpts, MAX_FRAME_BITS};
use crate::line::LineCode;
use crate::ook::OokConfig;
use crate::pipeline::{Decoder, Encoder};
use crate::stream::{check_bits, Bit, Policy};
use crate::{Error, Result};

/// Configuration of a [Decoder] and the matching [Encoder].
///
/// Every field has a default, so an empty JSON object is a valid configuration:
///
/// ```
/// let config = x2d::Config::from_json(r#"{"policy": "tolerant"}"#).unwrap();
/// assert_eq!(config.policy, x2d::Policy::Tolerant);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub policy: Policy,
    pub line_code: LineCode,
    /// Raw OOK sampling parameters; line symbols are expected when absent.
    pub ook: Option<OokConfig>,
    pub max_frame_bits: usize,
    /// Symbols sent once before a Manchester encoded session.
    pub manchester_prefix: Vec<Bit>,
    pub encoder: EncoderOpts,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            policy: Policy::default(),
            line_code: LineCode::default(),
            ook: None,
            max_frame_bits: MAX_FRAME_BITS,
            manchester_prefix: Vec::new(),
            encoder: EncoderOpts::default(),
        }
    }
}

impl Config {
    /// # Errors
    /// [Error::Config] if `json` is not a valid configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(json).map_err(|err| Error::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// [Error::Config] for settings no chain can be built from.
    pub fn validate(&self) -> Result<()> {
        if let Some(ook) = &self.ook {
            ook.validate()?;
        }
        if self.max_frame_bits == 0 {
            return Err(Error::Config("max_frame_bits must be positive".to_string()));
        }
        check_bits(self.manchester_prefix.iter().chain(&self.encoder.separator))
    }

    /// # Errors
    /// See [Config::validate].
    pub fn decoder(&self) -> Result<Decoder> {
        self.validate()?;
        let mut builder = Decoder::builder()
            .with_policy(self.policy)
            .with_line_code(self.line_code)
            .with_max_frame_bits(self.max_frame_bits);
        if let Some(ook) = &self.ook {
            builder = builder.with_ook(ook.clone());
        }
        builder.build()
    }

    /// # Errors
    /// See [Config::validate].
    pub fn encoder(&self) -> Result<Encoder> {
        self.validate()?;
        let mut builder = Encoder::builder()
            .with_policy(self.policy)
            .with_opts(self.encoder.clone())
            .with_line_code(self.line_code)
            .with_manchester_prefix(&self.manchester_prefix);
        if let Some(ook) = &self.ook {
            builder = builder.with_ook(ook.clone());
        }
        builder.build()
    }
}
