use serde::{Deserialize, Serialize};

use crate::{Error, Result};

use super::{check_width, Attribute};

wire_enum! {
    /// Type tag of a [Attribute::WithData] payload.
    DataType {
        Enrollment = 0,
        HeatingLevel = 1,
        FunctioningLevel = 2,
        CurrentLevel = 3,
        InternalTemperature = 10,
        ExternalTemperature = 11,
        MeterReading = 14,
        BasicCommand = 33,
        VariationCommand = 34,
        ScenarioCommand = 35,
        Variation = 37,
        CurrentTransformerDefinition = 252,
    }
}

/// Broad role of the device emitting a data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Family {
    Regulation,
    Sensor,
    Metering,
    Actuator,
}

impl DataType {
    /// Tags with a dedicated [Data] variant rather than [Data::Other].
    #[must_use]
    pub fn has_layout(self) -> bool {
        matches!(
            self,
            DataType::Enrollment
                | DataType::HeatingLevel
                | DataType::FunctioningLevel
                | DataType::CurrentLevel
                | DataType::InternalTemperature
                | DataType::ExternalTemperature
                | DataType::MeterReading
                | DataType::BasicCommand
                | DataType::VariationCommand
        )
    }

    #[must_use]
    pub fn family(self) -> Option<Family> {
        match u8::from(self) {
            1 | 2 => Some(Family::Regulation),
            10 | 12 => Some(Family::Sensor),
            14 | 252 => Some(Family::Metering),
            33 | 34 | 35 | 37 => Some(Family::Actuator),
            _ => None,
        }
    }
}

wire_enum! {
    FunctioningMode {
        Reduced = 0,
        Moderato = 1,
        Medio = 2,
        Confort = 3,
        Stop = 4,
        AntiFrost = 5,
        Special = 6,
        Auto = 7,
        Centralized = 8,
    }
}

wire_enum! {
    BasicCommand {
        Off = 0,
        On = 1,
        Toggle = 2,
    }
}

wire_enum! {
    VariationCommand {
        More = 1,
        ShortReleasedMore = 129,
        LongReleasedMore = 65,
        Less = 2,
        ShortReleasedLess = 130,
        LongReleasedLess = 66,
        Stop = 4,
    }
}

wire_enum! {
    /// Meter register a reading refers to.
    RegisterSelection {
        CurrentTransformer1 = 0,
        CurrentTransformer2 = 1,
        CurrentTransformer3 = 2,
        Heating = 3,
        HotWater = 4,
        Total = 5,
        Cooling = 7,
        HeatingAndCooling = 8,
        ElectricityProduction = 9,
    }
}

wire_enum! {
    /// Electricity tariff period, 7 bits.
    Tariff {
        Base = 0,
        EjpOffPeakDay = 32,
        EjpPeakDay = 33,
        DoubleOffPeakHour = 64,
        DoublePeakHour = 65,
        TempoBlueDayOffPeakHour = 96,
        TempoBlueDayPeakHour = 97,
        TempoWhiteDayOffPeakHour = 98,
        TempoWhiteDayPeakHour = 99,
        TempoRedDayOffPeakHour = 100,
        TempoRedDayPeakHour = 101,
    }
}

fn expect_len(tag: u8, dat: &[u8], expected: usize) -> Result<()> {
    if dat.len() != expected {
        return Err(Error::PayloadLength {
            tag,
            expected,
            actual: dat.len(),
        });
    }
    Ok(())
}

/// Heating, functioning or current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub manual: bool,
    /// The two reserved status bits.
    pub reserved: u8,
    pub mode: FunctioningMode,
    /// Present when the duration flag is set.
    pub duration: Option<u16>,
}

impl Level {
    const MANUAL: u8 = 0x80;
    const DURATION: u8 = 0x40;

    fn decode(tag: u8, dat: &[u8]) -> Result<Self> {
        let Some(&status) = dat.first() else {
            return Err(Error::PayloadLength {
                tag,
                expected: 1,
                actual: 0,
            });
        };
        let duration = if status & Self::DURATION != 0 {
            expect_len(tag, dat, 3)?;
            Some(u16::from_be_bytes([dat[1], dat[2]]))
        } else {
            expect_len(tag, dat, 1)?;
            None
        };
        Ok(Level {
            manual: status & Self::MANUAL != 0,
            reserved: (status >> 4) & 0x3,
            mode: FunctioningMode::from(status & 0x0f),
            duration,
        })
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let mode = self.mode.wire()?;
        check_width("mode", mode.into(), 4)?;
        check_width("reserved level bits", self.reserved.into(), 2)?;
        let mut status = self.reserved << 4 | mode;
        if self.manual {
            status |= Self::MANUAL;
        }
        if self.duration.is_some() {
            status |= Self::DURATION;
        }
        out.push(status);
        if let Some(duration) = self.duration {
            out.extend_from_slice(&duration.to_be_bytes());
        }
        Ok(())
    }
}

/// Temperature in 1/512 degree Celsius steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Temperature {
    pub raw: u16,
}

impl Temperature {
    pub const SCALE: f64 = 512.0;

    #[must_use]
    pub fn celsius(&self) -> f64 {
        f64::from(self.raw) / Self::SCALE
    }

    /// Nearest representable temperature, saturating at the bounds of the raw value.
    #[must_use]
    pub fn from_celsius(value: f64) -> Self {
        Temperature {
            raw: (value * Self::SCALE).round() as u16,
        }
    }
}

/// Register reading of an energy meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterReading {
    pub selection: RegisterSelection,
    /// Value is a cost rather than an amount of energy.
    pub euro: bool,
    pub tariff: Tariff,
    /// Register value, 24 bits.
    pub value: u32,
}

impl MeterReading {
    const LEN: usize = 5;
    const EURO: u8 = 0x80;

    fn decode(tag: u8, dat: &[u8]) -> Result<Self> {
        expect_len(tag, dat, Self::LEN)?;
        Ok(MeterReading {
            selection: RegisterSelection::from(dat[0]),
            euro: dat[1] & Self::EURO != 0,
            tariff: Tariff::from(dat[1] & 0x7f),
            value: u32::from_le_bytes([dat[2], dat[3], dat[4], 0]),
        })
    }

    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let tariff = self.tariff.wire()?;
        check_width("tariff", tariff.into(), 7)?;
        check_width("meter value", self.value, 24)?;
        out.push(self.selection.wire()?);
        out.push(if self.euro { tariff | Self::EURO } else { tariff });
        out.extend_from_slice(&self.value.to_le_bytes()[..3]);
        Ok(())
    }
}

/// Typed content of a [Attribute::WithData] payload, selected by its type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Data {
    Enrollment,
    HeatingLevel(Level),
    FunctioningLevel(Level),
    CurrentLevel(Level),
    InternalTemperature(Temperature),
    ExternalTemperature(Temperature),
    MeterReading(MeterReading),
    BasicCommand(BasicCommand),
    VariationCommand {
        command: VariationCommand,
        reserved: [u8; 2],
    },
    /// A tag without a known layout; bytes are kept as received.
    Other { tag: u8, bytes: Vec<u8> },
}

impl Data {
    #[must_use]
    pub fn tag(&self) -> u8 {
        let data_type = match self {
            Data::Enrollment => DataType::Enrollment,
            Data::HeatingLevel(_) => DataType::HeatingLevel,
            Data::FunctioningLevel(_) => DataType::FunctioningLevel,
            Data::CurrentLevel(_) => DataType::CurrentLevel,
            Data::InternalTemperature(_) => DataType::InternalTemperature,
            Data::ExternalTemperature(_) => DataType::ExternalTemperature,
            Data::MeterReading(_) => DataType::MeterReading,
            Data::BasicCommand(_) => DataType::BasicCommand,
            Data::VariationCommand { .. } => DataType::VariationCommand,
            Data::Other { tag, .. } => return *tag,
        };
        data_type.into()
    }

    #[must_use]
    pub fn data_type(&self) -> DataType {
        DataType::from(self.tag())
    }

    /// Decode the bytes following type tag `tag`.
    ///
    /// # Errors
    /// [Error::PayloadLength] if `dat` does not fit the layout of `tag`.
    pub fn decode(tag: u8, dat: &[u8]) -> Result<Self> {
        let data = match DataType::from(tag) {
            DataType::Enrollment => {
                expect_len(tag, dat, 0)?;
                Data::Enrollment
            }
            DataType::HeatingLevel => Data::HeatingLevel(Level::decode(tag, dat)?),
            DataType::FunctioningLevel => Data::FunctioningLevel(Level::decode(tag, dat)?),
            DataType::CurrentLevel => Data::CurrentLevel(Level::decode(tag, dat)?),
            DataType::InternalTemperature | DataType::ExternalTemperature => {
                expect_len(tag, dat, 2)?;
                let temperature = Temperature {
                    raw: u16::from_be_bytes([dat[0], dat[1]]),
                };
                if tag == u8::from(DataType::InternalTemperature) {
                    Data::InternalTemperature(temperature)
                } else {
                    Data::ExternalTemperature(temperature)
                }
            }
            DataType::MeterReading => Data::MeterReading(MeterReading::decode(tag, dat)?),
            DataType::BasicCommand => {
                expect_len(tag, dat, 1)?;
                Data::BasicCommand(BasicCommand::from(dat[0]))
            }
            DataType::VariationCommand => {
                expect_len(tag, dat, 3)?;
                Data::VariationCommand {
                    command: VariationCommand::from(dat[0]),
                    reserved: [dat[1], dat[2]],
                }
            }
            _ => Data::Other {
                tag,
                bytes: dat.to_vec(),
            },
        };
        Ok(data)
    }

    /// Append the tag and content.
    ///
    /// # Errors
    /// [Error::InvalidMessage] for field values too wide for their bits, for
    /// [Data::Other] with a tag that has its own variant, and for an `Unknown`
    /// enumeration value that has a name.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        if let Data::Other { tag, .. } = self {
            let data_type = DataType::from(*tag);
            if data_type.has_layout() {
                return Err(Error::InvalidMessage(format!(
                    "tag {tag} must be encoded as {data_type:?} data"
                )));
            }
        }
        out.push(self.tag());
        match self {
            Data::Enrollment => {}
            Data::HeatingLevel(level) | Data::FunctioningLevel(level) | Data::CurrentLevel(level) => {
                level.encode(out)?;
            }
            Data::InternalTemperature(temperature) | Data::ExternalTemperature(temperature) => {
                out.extend_from_slice(&temperature.raw.to_be_bytes());
            }
            Data::MeterReading(reading) => reading.encode(out)?,
            Data::BasicCommand(command) => out.push(command.wire()?),
            Data::VariationCommand { command, reserved } => {
                out.push(command.wire()?);
                out.extend_from_slice(reserved);
            }
            Data::Other { bytes, .. } => out.extend_from_slice(bytes),
        }
        Ok(())
    }
}

/// Message payload, the bytes between the header and the rolling code or checksum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// No payload bytes.
    #[default]
    Empty,
    /// Type tag and typed content, for [Attribute::WithData].
    Data(Data),
    /// Bytes of a payload without a type tag.
    Raw(Vec<u8>),
}

impl Payload {
    /// # Errors
    /// [Error::NotEnoughData] if a [Attribute::WithData] payload has no type tag, and
    /// the errors of [Data::decode].
    pub fn decode(attribute: Attribute, dat: &[u8]) -> Result<Self> {
        if attribute == Attribute::WithData {
            let Some((tag, rest)) = dat.split_first() else {
                return Err(Error::NotEnoughData {
                    actual: 0,
                    minimum: 1,
                });
            };
            return Ok(Payload::Data(Data::decode(*tag, rest)?));
        }
        if dat.is_empty() {
            Ok(Payload::Empty)
        } else {
            Ok(Payload::Raw(dat.to_vec()))
        }
    }

    /// # Errors
    /// [Error::InvalidMessage] if the payload variant does not agree with `attribute`.
    pub fn encode(&self, attribute: Attribute, out: &mut Vec<u8>) -> Result<()> {
        let with_data = attribute == Attribute::WithData;
        match self {
            Payload::Data(data) if with_data => data.encode(out),
            Payload::Empty if !with_data => Ok(()),
            Payload::Raw(bytes) if !with_data && !bytes.is_empty() => {
                out.extend_from_slice(bytes);
                Ok(())
            }
            Payload::Raw(bytes) if bytes.is_empty() => Err(Error::InvalidMessage(
                "raw payload must not be empty".to_string(),
            )),
            _ => Err(Error::InvalidMessage(format!(
                "payload {:?} does not agree with attribute {:?}",
                self, attribute
            ))),
        }
    }
}
