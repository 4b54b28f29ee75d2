mod common;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use x2d::bits::{unpack, BitOrder};
use x2d::framing::{stuff, FrameEncoder, END_OF_FRAME, SEPARATOR};
use x2d::line::{BiphaseMarkEncoder, LineCode, ManchesterEncoder};
use x2d::message::{
    checksum, Attribute, BasicCommand, Control, Data, Device, FunctioningMode, Level,
    MeterReading, Payload, RegisterSelection, Source, Tariff, Temperature, VariationCommand,
    CHECKSUM_LEN,
};
use x2d::ook::OokConfig;
use x2d::{Bit, Decoder, Encoder, Error, Message, Policy, Processor};

use common::{message, transmitter};

fn variety() -> Vec<Message> {
    let rolling = Message::builder()
        .house(0x1234)
        .source(Source {
            index: 2,
            device: Device::TydomPanelController,
        })
        .transmitter(transmitter(Attribute::WithData))
        .control(Control(0x90).with(Control::ROLLING_CODE, true))
        .payload(Payload::Data(Data::VariationCommand {
            command: VariationCommand::LongReleasedLess,
            reserved: [0, 0],
        }))
        .rolling_code(0xbeef)
        .build()
        .with_checksum()
        .expect("valid message");

    let simple = |payload: Payload| {
        Message::builder()
            .house(0xffff)
            .source(Source {
                index: 3,
                device: Device::Unknown(60),
            })
            .transmitter(transmitter(Attribute::Simple))
            .payload(payload)
            .build()
            .with_checksum()
            .expect("valid message")
    };

    vec![
        message(3, Data::BasicCommand(BasicCommand::On)),
        message(
            1,
            Data::HeatingLevel(Level {
                manual: true,
                reserved: 1,
                mode: FunctioningMode::Moderato,
                duration: Some(0x0102),
            }),
        ),
        message(
            2,
            Data::CurrentLevel(Level {
                manual: false,
                reserved: 0,
                mode: FunctioningMode::Centralized,
                duration: None,
            }),
        ),
        message(0, Data::InternalTemperature(Temperature::from_celsius(21.5))),
        message(0, Data::ExternalTemperature(Temperature { raw: 0xfff0 })),
        message(
            15,
            Data::MeterReading(MeterReading {
                selection: RegisterSelection::Total,
                euro: true,
                tariff: Tariff::TempoRedDayPeakHour,
                value: 0x12_3456,
            }),
        ),
        message(
            4,
            Data::Other {
                tag: 200,
                bytes: vec![9, 9, 9],
            },
        ),
        message(5, Data::Enrollment),
        rolling,
        simple(Payload::Empty),
        simple(Payload::Raw(vec![0xff, 0xff, 0xff, 0xff])),
    ]
}

fn burst(messages: &[Message]) -> Vec<Bit> {
    let frames = messages
        .iter()
        .map(Message::encode)
        .collect::<Result<Vec<_>, _>>()
        .expect("encode failed");
    FrameEncoder::default()
        .advance(&frames)
        .expect("framing failed")
        .output
}

/// One burst per message group, each followed by a long silence.
fn bursts(groups: &[&[Message]]) -> Vec<Bit> {
    let mut bits = Vec::new();
    for group in groups {
        bits.extend(burst(group));
        bits.extend([0; 300]);
    }
    bits
}

fn line(bits: &[Bit]) -> Vec<Bit> {
    BiphaseMarkEncoder::new()
        .advance(bits)
        .expect("line encoding failed")
        .output
}

fn decoder(policy: Policy) -> Decoder {
    Decoder::builder()
        .with_policy(policy)
        .build()
        .expect("valid decoder")
}

#[test]
fn test_message_round_trip() {
    for msg in variety() {
        let frame = msg.encode().expect("encode failed");
        let decoded = Message::decode(&frame).expect("decode failed");
        assert_eq!(decoded, msg, "frame {}", hex::encode(&frame));
    }
}

#[test]
fn test_pipeline_round_trip() {
    let messages = variety();
    let symbols = Encoder::builder()
        .build()
        .expect("valid encoder")
        .encode(&messages)
        .expect("encode failed");
    let decoded = decoder(Policy::Strict).decode(&symbols).expect("decode failed");
    assert_eq!(decoded, messages);
}

#[test]
fn test_checksum_detects_corruption() {
    for msg in variety() {
        let frame = msg.encode().expect("encode failed");
        let (body, tail) = frame.split_at(frame.len() - CHECKSUM_LEN);
        assert_eq!(checksum(body).to_be_bytes(), tail);

        for i in 0..frame.len() {
            let mut corrupted = frame.clone();
            corrupted[i] ^= 0x01;
            assert!(
                matches!(
                    Message::decode(&corrupted),
                    Err(Error::ChecksumMismatch { .. })
                ),
                "corrupting byte {i} of {} went unnoticed",
                hex::encode(&frame)
            );
        }
    }
}

#[test]
fn test_checksum_mismatch_tolerated() {
    let msg = message(3, Data::BasicCommand(BasicCommand::Off));
    let mut frame = msg.encode().expect("encode failed");
    let last = frame.len() - 1;
    frame[last] ^= 0xff;

    let decoded = Message::decode_with(&frame, Policy::Tolerant).expect("tolerant decode failed");
    assert_eq!(decoded.payload, msg.payload);
    assert_eq!(decoded.checksum, msg.checksum ^ 0xff);
}

#[test]
fn test_segmentation_invariance() {
    let messages = variety();
    let symbols = line(&bursts(&[&messages[..4], &messages[4..5], &messages[5..]]));
    let expected = decoder(Policy::Strict).decode(&symbols).expect("decode failed");
    assert_eq!(expected, messages);

    for seed in 0..16 {
        let mut rng = StdRng::seed_from_u64(seed);
        let got = decoder(Policy::Strict)
            .decode_chunked(&symbols, || rng.gen_range(1..=64))
            .expect("chunked decode failed");
        assert_eq!(got, expected, "seed {seed}");
    }
}

#[test]
fn test_segmentation_invariance_ook() {
    let ook = OokConfig::builder()
        .sample_rate(96_000.0)
        .symbol_rate(4_800.0)
        .build();
    let messages = variety();
    let mut samples = Encoder::builder()
        .with_line_code(LineCode::Manchester)
        .with_ook(ook.clone())
        .build()
        .expect("valid encoder")
        .encode(&messages)
        .expect("encode failed");
    let last = samples.last().copied().unwrap_or(0);
    samples.extend([1 - last; 20]);

    let new_decoder = || {
        Decoder::builder()
            .with_line_code(LineCode::Manchester)
            .with_ook(ook.clone())
            .build()
            .expect("valid decoder")
    };
    let expected = new_decoder().decode(&samples).expect("decode failed");
    assert_eq!(expected, messages);

    let mut rng = StdRng::seed_from_u64(7);
    let got = new_decoder()
        .decode_chunked(&samples, || rng.gen_range(1..=500))
        .expect("chunked decode failed");
    assert_eq!(got, expected);
}

#[test]
fn test_streaming_prefix() {
    let messages = variety();
    let symbols = line(&bursts(&[&messages[..6], &messages[6..]]));
    let all = decoder(Policy::Strict).decode(&symbols).expect("decode failed");

    for cut in (0..symbols.len()).step_by(97) {
        let partial = decoder(Policy::Strict)
            .decode(&symbols[..cut])
            .expect("decode failed");
        assert!(
            all.starts_with(&partial),
            "decoding the first {cut} symbols is not a prefix"
        );
    }
}

/// Bits with runs no longer than six, so they can never hold a preamble.
fn noise(rng: &mut StdRng, len: usize) -> Vec<Bit> {
    let mut bits = Vec::with_capacity(len + 6);
    let mut level = rng.gen_range(0..=1);
    while bits.len() < len {
        let run = rng.gen_range(1..=6);
        bits.extend(std::iter::repeat(level).take(run));
        level ^= 1;
    }
    bits
}

#[test]
fn test_noise_before_bursts() {
    let messages = variety();
    let mut rng = StdRng::seed_from_u64(42);
    // a silence followed by noise would be a malformed preamble
    let mut bits = noise(&mut rng, 500);
    bits.extend(burst(&messages[..3]));
    bits.extend(noise(&mut rng, 1000));
    bits.extend(bursts(&[&messages[3..]]));
    let symbols = line(&bits);

    for policy in [Policy::Strict, Policy::Tolerant] {
        let got = decoder(policy).decode(&symbols).expect("noise must not fail");
        assert_eq!(got, messages, "{policy:?}");
    }
}

#[test]
fn test_recovery_after_stuffing_violation() {
    let good = message(6, Data::BasicCommand(BasicCommand::Toggle));
    let later = message(7, Data::Enrollment);

    let mut bits = vec![0; 9];
    bits.extend([1; 6]);
    bits.push(0);
    // six successive ones in a frame
    bits.extend([1, 0, 1, 1, 1, 1, 1, 1, 0, 0, 1, 0]);
    bits.extend(END_OF_FRAME);
    bits.extend(SEPARATOR);
    bits.extend(stuff(&unpack(&good.encode().expect("encode failed"), BitOrder::LsbFirst)));
    bits.extend(END_OF_FRAME);
    bits.extend(SEPARATOR);
    bits.extend([0; 300]);
    bits.extend(bursts(&[&[later.clone()]]));
    let symbols = line(&bits);

    let err = decoder(Policy::Strict)
        .decode(&symbols)
        .expect_err("strict decode should fail");
    assert!(matches!(err, Error::Stuffing { .. }), "{err:?}");

    let got = decoder(Policy::Tolerant)
        .decode(&symbols)
        .expect("tolerant decode failed");
    assert_eq!(got, [good, later]);
}

#[test]
fn test_recovery_after_missing_end_of_frame() {
    let msg = message(8, Data::BasicCommand(BasicCommand::On));

    let mut bits = vec![0; 9];
    bits.extend([1; 6]);
    bits.push(0);
    bits.extend([0, 1, 1, 0].repeat(100));
    bits.extend([0; 300]);
    bits.extend(bursts(&[&[msg.clone()]]));
    let symbols = line(&bits);

    let err = decoder(Policy::Strict)
        .decode(&symbols)
        .expect_err("strict decode should fail");
    assert!(matches!(err, Error::MissingEndOfFrame { .. }), "{err:?}");

    let mut tolerant = decoder(Policy::Tolerant);
    let got = tolerant.decode(&symbols).expect("tolerant decode failed");
    assert_eq!(got, [msg]);
    assert_eq!(tolerant.resets(), 1);
}

#[test]
fn test_recovery_after_bad_preamble() {
    let msg = message(9, Data::BasicCommand(BasicCommand::Off));

    let mut bits = vec![0; 12];
    bits.extend([1, 1, 1, 0, 1, 0]);
    bits.extend(bursts(&[&[msg.clone()]]));
    let symbols = line(&bits);

    let err = decoder(Policy::Strict)
        .decode(&symbols)
        .expect_err("strict decode should fail");
    assert!(matches!(err, Error::InvalidPreamble { .. }), "{err:?}");

    let got = decoder(Policy::Tolerant)
        .decode(&symbols)
        .expect("tolerant decode failed");
    assert_eq!(got, [msg]);
}

#[test]
fn test_chunked_recovery_after_bad_preamble() {
    let first = message(9, Data::BasicCommand(BasicCommand::Off));
    let second = message(10, Data::BasicCommand(BasicCommand::On));

    let mut bits = vec![0; 12];
    bits.extend([1, 1, 1, 0]);
    bits.extend([0; 40]);
    bits.extend(bursts(&[&[first.clone()]]));
    let symbols = line(&bits);
    let later = line(&bursts(&[&[second.clone()]]));

    for size in [7, 33, 35, 63] {
        let mut tolerant = decoder(Policy::Tolerant);
        let got = tolerant
            .decode_chunked(&symbols, || size)
            .expect("chunked decode failed");
        assert_eq!(got, [first.clone()], "chunks of {size}");
        assert_eq!(tolerant.resets(), 1);

        let got = tolerant
            .decode_chunked(&later, || size)
            .expect("chunked decode failed");
        assert_eq!(got, [second.clone()], "chunks of {size}");
    }
}

#[test]
fn test_tolerant_segmentation_over_resets() {
    let messages = variety();
    let mut rng = StdRng::seed_from_u64(3);
    let mut bits = noise(&mut rng, 200);
    // too few preamble ones
    bits.extend([0; 12]);
    bits.extend([1, 1, 1, 0]);
    bits.extend([0; 100]);
    bits.extend(bursts(&[&messages[..3]]));
    // a frame that never ends
    bits.extend([0; 9]);
    bits.extend([1; 6]);
    bits.push(0);
    bits.extend([0, 1, 1, 0].repeat(100));
    bits.extend([0; 400]);
    bits.extend(bursts(&[&messages[3..]]));

    let manchester = ManchesterEncoder::new()
        .advance(&bits)
        .expect("line encoding failed")
        .output;
    let cases = [
        (LineCode::BiphaseMark, line(&bits)),
        (LineCode::Manchester, manchester),
    ];
    for (code, symbols) in cases {
        let new_decoder = || {
            Decoder::builder()
                .with_policy(Policy::Tolerant)
                .with_line_code(code)
                .build()
                .expect("valid decoder")
        };
        let expected = new_decoder().decode(&symbols).expect("decode failed");
        assert_eq!(expected, messages, "{code:?}");

        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut decoder = new_decoder();
            let got = decoder
                .decode_chunked(&symbols, || rng.gen_range(1..=64))
                .expect("chunked decode failed");
            assert_eq!(got, expected, "{code:?} seed {seed}");
            assert_eq!(decoder.resets(), 2, "{code:?} seed {seed}");
        }
    }
}
