//! Decoding and encoding of X2D home-automation radio frames.
//!
//! The receive side is a chain of resumable stream processors:
//!
//! ```text
//! OOK samples -> line symbols -> bits -> frames -> messages
//! ```
//!
//! * [ook] turns runs of sample levels into line symbols.
//! * [line] decodes Manchester or Biphase-Mark symbol pairs into bits.
//! * [framing] finds preambles, removes bit stuffing and delimits frames.
//! * [message] parses the checksum-guarded application frame.
//! * [pipeline] chains the stages and provides [Decoder] and [Encoder].
//!
//! Every stage accepts input in chunks of any size and keeps what it cannot use yet,
//! so the result does not depend on how the input was split. Malformed input is
//! handled according to a [Policy]: fail fast, or log and resynchronize.
//!
//! ```
//! use x2d::{Decoder, Encoder};
//! # use x2d::message::*;
//! # let msg = Message::builder()
//! #     .house(0x9848)
//! #     .source(Source { index: 0, device: Device::DeltiaEmitter })
//! #     .transmitter(Transmitter {
//! #         enrollment_requested: false,
//! #         internal_fault_detected: false,
//! #         box_opened: false,
//! #         battery_failing: false,
//! #         attribute: Attribute::WithData,
//! #     })
//! #     .payload(Payload::Data(Data::BasicCommand(BasicCommand::On)))
//! #     .build()
//! #     .with_checksum()
//! #     .unwrap();
//! let symbols = Encoder::builder().build()?.encode(&[msg.clone()])?;
//! let messages = Decoder::builder().build()?.decode(&symbols)?;
//! assert_eq!(messages, [msg]);
//! # Ok::<(), x2d::Error>(())
//! ```
mod buffer;
mod config;
mod error;

pub mod bits;
pub mod capture;
pub mod framing;
pub mod line;
pub mod message;
pub mod ook;
pub mod pipeline;
pub mod stream;

pub use config::Config;
pub use error::{Error, Result};
pub use message::Message;
pub use pipeline::{Decoder, Encoder, Pipeline};
pub use stream::{Advance, Bit, Policy, Processor, Status};
