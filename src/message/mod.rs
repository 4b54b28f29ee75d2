//! X2D application messages.
//!
//! Wire layout, multi-byte fields most significant byte first unless noted:
//!
//! ```text
//! [house:2][source:1][recipient:1][transmitter:1][control:1][payload][rolling_code:0|2][checksum:2]
//! ```
//!
//! There is no length field. The payload is whatever remains of the frame once the
//! header, the optional rolling code and the checksum are accounted for.
use serde::{Deserialize, Serialize};
use tracing::trace;
use typed_builder::TypedBuilder;

use crate::stream::Policy;
use crate::{Error, Result};

/// Declare a byte-valued protocol enumeration with a fallback for unknown values.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident = $value:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// A value without a known meaning.
            Unknown(u8),
        }

        impl From<u8> for $name {
            fn from(value: u8) -> Self {
                match value {
                    $($value => $name::$variant,)+
                    other => $name::Unknown(other),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                match value {
                    $($name::$variant => $value,)+
                    $name::Unknown(other) => other,
                }
            }
        }

        impl $name {
            /// Wire value for encoding.
            ///
            /// # Errors
            /// [Error::InvalidMessage] for an `Unknown` holding a named value.
            pub fn wire(self) -> $crate::Result<u8> {
                match self {
                    $name::Unknown(value) if $name::from(value) != self => {
                        Err($crate::Error::InvalidMessage(format!(
                            "{} {value} must be encoded as {:?}",
                            stringify!($name),
                            $name::from(value)
                        )))
                    }
                    other => Ok(u8::from(other)),
                }
            }
        }
    };
}

mod payload;

pub use payload::*;

/// Length of the fixed header.
pub const HEADER_LEN: usize = 6;
pub const ROLLING_CODE_LEN: usize = 2;
pub const CHECKSUM_LEN: usize = 2;

/// Two's complement of the 16-bit sum of `dat`.
#[must_use]
pub fn checksum(dat: &[u8]) -> u16 {
    let sum = dat
        .iter()
        .fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b)));
    (!sum).wrapping_add(1)
}

/// Check the trailing checksum of a complete frame.
///
/// # Errors
/// [Error::NotEnoughData] if there is no room for a checksum, [Error::ChecksumMismatch]
/// if it does not match the preceding bytes.
pub fn verify(frame: &[u8]) -> Result<()> {
    if frame.len() < CHECKSUM_LEN {
        return Err(Error::NotEnoughData {
            actual: frame.len(),
            minimum: CHECKSUM_LEN,
        });
    }
    let (body, tail) = frame.split_at(frame.len() - CHECKSUM_LEN);
    let stored = u16::from_be_bytes([tail[0], tail[1]]);
    let computed = checksum(body);
    if stored != computed {
        return Err(Error::ChecksumMismatch {
            expected: computed,
            actual: stored,
        });
    }
    Ok(())
}

/// Fail unless `value` fits in `bits` bits.
pub(crate) fn check_width(field: &str, value: u32, bits: u32) -> Result<()> {
    if value >> bits != 0 {
        return Err(Error::InvalidMessage(format!(
            "{field} value {value} does not fit in {bits} bits"
        )));
    }
    Ok(())
}

wire_enum! {
    /// Kind of transmitting device.
    Device {
        TyxiaZzaa = 0,
        Calybox = 3,
        DeltiaEmitter = 5,
        TydomPanelController = 13,
        TyxiaXxyy = 18,
        TwoButtonsAlarmRemote = 21,
        FourButtonsAlarmRemote = 22,
        Volumetric = 32,
        VolumetricInfrared = 33,
        VolumetricPressure = 34,
        VolumetricDual = 35,
        Perimetric = 40,
        PerimetricContact = 41,
        PerimetricGlassBreakage = 42,
        PerimetricSound = 43,
        PerimetricRollerShutter = 44,
        Technical = 48,
        TechnicalWater = 49,
        Gas = 50,
        Fire = 51,
        Smoke = 52,
        Frost = 53,
        PowerOutage = 54,
        PhoneOutage = 55,
        FreezerOutage = 56,
        UsbKey = 62,
    }
}

wire_enum! {
    /// Selects how the payload is laid out.
    Attribute {
        /// No type tag; usually no payload at all.
        Simple = 1,
        /// A type tag byte followed by a typed payload.
        WithData = 5,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Sub-index distinguishing devices sharing a house code, 2 bits.
    pub index: u8,
    pub device: Device,
}

impl Source {
    fn decode(b: u8) -> Self {
        Source {
            index: b >> 6,
            device: Device::from(b & 0x3f),
        }
    }

    fn encode(&self) -> Result<u8> {
        let device = self.device.wire()?;
        check_width("source index", self.index.into(), 2)?;
        check_width("device", device.into(), 6)?;
        Ok(self.index << 6 | device)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Zero-based zone (area) index, 4 bits.
    pub zone: u8,
    /// Upper nibble flags, unnamed by the protocol.
    pub flags: u8,
}

impl Recipient {
    fn decode(b: u8) -> Self {
        Recipient {
            zone: b & 0x0f,
            flags: b >> 4,
        }
    }

    fn encode(&self) -> Result<u8> {
        check_width("zone", self.zone.into(), 4)?;
        check_width("recipient flags", self.flags.into(), 4)?;
        Ok(self.flags << 4 | self.zone)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transmitter {
    pub enrollment_requested: bool,
    pub internal_fault_detected: bool,
    pub box_opened: bool,
    pub battery_failing: bool,
    pub attribute: Attribute,
}

impl Transmitter {
    fn decode(b: u8) -> Self {
        Transmitter {
            enrollment_requested: b & 0x80 != 0,
            internal_fault_detected: b & 0x40 != 0,
            box_opened: b & 0x20 != 0,
            battery_failing: b & 0x10 != 0,
            attribute: Attribute::from(b & 0x0f),
        }
    }

    fn encode(&self) -> Result<u8> {
        let attribute = self.attribute.wire()?;
        check_width("attribute", attribute.into(), 4)?;
        Ok(u8::from(self.enrollment_requested) << 7
            | u8::from(self.internal_fault_detected) << 6
            | u8::from(self.box_opened) << 5
            | u8::from(self.battery_failing) << 4
            | attribute)
    }
}

/// Raw control flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Control(pub u8);

impl Control {
    /// A rolling code precedes the checksum.
    pub const ROLLING_CODE: u8 = 0x20;
    /// The sender expects an answer.
    pub const ANSWER_REQUESTED: u8 = 0x04;

    pub fn rolling_code(self) -> bool {
        self.0 & Self::ROLLING_CODE != 0
    }

    pub fn answer_requested(self) -> bool {
        self.0 & Self::ANSWER_REQUESTED != 0
    }

    /// Copy with `flag` set or cleared.
    #[must_use]
    pub fn with(self, flag: u8, on: bool) -> Self {
        if on {
            Control(self.0 | flag)
        } else {
            Control(self.0 & !flag)
        }
    }
}

/// A decoded X2D message.
///
/// `checksum` is the value carried on the wire. [Message::encode] always computes
/// a fresh one; use [Message::with_checksum] to store it on a constructed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct Message {
    /// Installation identifier shared by every device of a house.
    pub house: u16,
    pub source: Source,
    #[builder(default)]
    pub recipient: Recipient,
    pub transmitter: Transmitter,
    #[builder(default)]
    pub control: Control,
    #[builder(default)]
    pub payload: Payload,
    #[builder(default, setter(strip_option))]
    pub rolling_code: Option<u16>,
    #[builder(default)]
    pub checksum: u16,
}

impl Message {
    /// Shortest possible frame: a header and a checksum.
    pub const MIN_LEN: usize = HEADER_LEN + CHECKSUM_LEN;

    /// Decode a frame, failing on a checksum mismatch.
    ///
    /// # Errors
    /// See [Message::decode_with].
    pub fn decode(frame: &[u8]) -> Result<Self> {
        Message::decode_with(frame, Policy::Strict)
    }

    /// Decode a frame, handling a checksum mismatch according to `policy`.
    ///
    /// # Errors
    /// [Error::NotEnoughData] for frames too short for their header, rolling code and
    /// checksum, [Error::PayloadLength] for payloads that do not fit their type tag,
    /// and [Error::ChecksumMismatch] under [Policy::Strict].
    pub fn decode_with(frame: &[u8], policy: Policy) -> Result<Self> {
        if frame.len() < Self::MIN_LEN {
            return Err(Error::NotEnoughData {
                actual: frame.len(),
                minimum: Self::MIN_LEN,
            });
        }
        if let Err(err) = verify(frame) {
            policy.check(err)?;
        }

        let body = &frame[..frame.len() - CHECKSUM_LEN];
        let control = Control(body[5]);
        let mut rest = &body[HEADER_LEN..];
        let rolling_code = if control.rolling_code() {
            if rest.len() < ROLLING_CODE_LEN {
                return Err(Error::NotEnoughData {
                    actual: frame.len(),
                    minimum: Self::MIN_LEN + ROLLING_CODE_LEN,
                });
            }
            let (head, code) = rest.split_at(rest.len() - ROLLING_CODE_LEN);
            rest = head;
            Some(u16::from_be_bytes([code[0], code[1]]))
        } else {
            None
        };

        let transmitter = Transmitter::decode(body[4]);
        let payload = Payload::decode(transmitter.attribute, rest)?;
        let tail = &frame[frame.len() - CHECKSUM_LEN..];

        let msg = Message {
            house: u16::from_be_bytes([body[0], body[1]]),
            source: Source::decode(body[2]),
            recipient: Recipient::decode(body[3]),
            transmitter,
            control,
            payload,
            rolling_code,
            checksum: u16::from_be_bytes([tail[0], tail[1]]),
        };
        trace!(house = msg.house, zone = msg.recipient.zone, "decoded message");
        Ok(msg)
    }

    /// Every frame byte except the checksum.
    ///
    /// # Errors
    /// [Error::InvalidMessage] if a field does not fit its bits, the payload does not
    /// agree with the attribute, or the rolling code flag does not agree with
    /// `rolling_code`.
    pub fn body(&self) -> Result<Vec<u8>> {
        if self.control.rolling_code() != self.rolling_code.is_some() {
            return Err(Error::InvalidMessage(format!(
                "rolling code flag is {} but rolling code is {:?}",
                self.control.rolling_code(),
                self.rolling_code
            )));
        }

        let mut out = Vec::with_capacity(Self::MIN_LEN + ROLLING_CODE_LEN + 8);
        out.extend_from_slice(&self.house.to_be_bytes());
        out.push(self.source.encode()?);
        out.push(self.recipient.encode()?);
        out.push(self.transmitter.encode()?);
        out.push(self.control.0);
        self.payload.encode(self.transmitter.attribute, &mut out)?;
        if let Some(code) = self.rolling_code {
            out.extend_from_slice(&code.to_be_bytes());
        }
        Ok(out)
    }

    /// Encode to frame bytes with a freshly computed checksum.
    ///
    /// # Errors
    /// See [Message::body].
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = self.body()?;
        let sum = checksum(&out);
        out.extend_from_slice(&sum.to_be_bytes());
        Ok(out)
    }

    /// Copy with `checksum` set to the value [Message::encode] would write.
    ///
    /// # Errors
    /// See [Message::body].
    pub fn with_checksum(mut self) -> Result<Self> {
        self.checksum = checksum(&self.body()?);
        Ok(self)
    }
}
