#![allow(dead_code)]

use std::path::PathBuf;

use x2d::bits::{BitOrder, Packer, Unpacker};
use x2d::line::{ManchesterDecoder, ManchesterEncoder};
use x2d::message::{Attribute, Control, Data, Device, Message, Payload, Recipient, Source, Transmitter};
use x2d::{Bit, Processor};

pub fn fixture_path(name: &str) -> PathBuf {
    let mut path =
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    path.push("tests/fixtures");
    path.push(name);
    path
}

/// Whitespace separated pulse widths.
pub fn read_pulses(name: &str) -> Vec<u32> {
    let text = std::fs::read_to_string(fixture_path(name)).expect("failed to read fixture");
    text.split_whitespace()
        .map(|s| s.parse().expect("pulse width is not a number"))
        .collect()
}

/// Symbols carried by a transceiver capture.
///
/// The radio demodulated the Biphase-Mark signal as Manchester, so the capture is
/// the Manchester decoding of the symbol stream minus its first symbol.
pub fn capture_symbols(capture: &[u8]) -> Vec<Bit> {
    let bits = Unpacker::new(BitOrder::MsbFirst)
        .advance(capture)
        .expect("unpacking failed")
        .output;
    ManchesterEncoder::new()
        .with_prefix(&[0])
        .advance(&bits)
        .expect("manchester encoding failed")
        .output
}

/// Inverse of [capture_symbols], dropping a trailing partial byte.
pub fn symbols_to_capture(symbols: &[Bit]) -> Vec<u8> {
    let bits = ManchesterDecoder::new()
        .with_prefix(1)
        .advance(symbols)
        .expect("manchester decoding failed")
        .output;
    Packer::new(BitOrder::MsbFirst)
        .advance(&bits)
        .expect("packing failed")
        .output
}

pub fn transmitter(attribute: Attribute) -> Transmitter {
    Transmitter {
        enrollment_requested: false,
        internal_fault_detected: false,
        box_opened: false,
        battery_failing: false,
        attribute,
    }
}

/// A message with a checksum, carrying `data` to `zone` of house 0x9848.
pub fn message(zone: u8, data: Data) -> Message {
    Message::builder()
        .house(0x9848)
        .source(Source {
            index: 0,
            device: Device::DeltiaEmitter,
        })
        .recipient(Recipient { zone, flags: 0 })
        .transmitter(transmitter(Attribute::WithData))
        .control(Control(0x90))
        .payload(Payload::Data(data))
        .build()
        .with_checksum()
        .expect("valid message")
}
