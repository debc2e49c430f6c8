use std::io::Cursor;
use std::sync::{Arc, Mutex};

use linky_core::{
    Config, Consumer, ConsumerError, ConsumerRegistry, ConsumerSpec, Measurements, ReaderSource,
    run_source,
};

const FRAME: &[u8] = b"\x02\nADCO 012345678901 E\r\nOPTARIF HC.. <\r\nISOUSC 45 ?\r\nHCHC 000835358 &\r\nHCHP 001262798 6\r\nPTEC HP..  \r\nIINST 002 Y\r\nIMAX 090 H\r\nPAPP 00510 '\r\nHHPHC A ,\r\nMOTDETAT 000000 B\r\x03";

#[derive(Default)]
struct Recording {
    frames: Mutex<Vec<(Measurements, String)>>,
}

impl Consumer for Recording {
    fn name(&self) -> &str {
        "recording"
    }

    fn compute(&self, measurements: Measurements, timestamp: &str) -> Result<(), ConsumerError> {
        self.frames
            .lock()
            .unwrap()
            .push((measurements, timestamp.to_string()));
        Ok(())
    }
}

struct Broken;

impl Consumer for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn compute(&self, _: Measurements, _: &str) -> Result<(), ConsumerError> {
        panic!("broken consumer");
    }
}

fn stream(frames: usize) -> Vec<u8> {
    let mut bytes = b"DETAT 000000 B\r\x03".to_vec();
    for _ in 0..frames {
        bytes.extend_from_slice(FRAME);
    }
    // The next frame's STX closes the last one.
    bytes.push(0x02);
    bytes
}

fn setup() -> (ConsumerRegistry, Config, Arc<Recording>) {
    let recording = Arc::new(Recording::default());
    let mut registry = ConsumerRegistry::with_builtins();
    let shared = recording.clone();
    registry.register("recording", move |_| Ok(shared.clone() as Arc<dyn Consumer>));
    registry.register("broken", |_| Ok(Arc::new(Broken) as Arc<dyn Consumer>));
    let config = Config {
        workers: 3,
        queue_capacity: 64,
        consumers: vec![
            ConsumerSpec::new("broken"),
            ConsumerSpec::new("recording"),
            ConsumerSpec::new("not-a-kind"),
        ],
        ..Config::default()
    };
    (registry, config, recording)
}

#[test]
fn every_complete_frame_reaches_consumer_despite_broken_sibling() {
    let (registry, config, recording) = setup();
    let source = ReaderSource::new(Cursor::new(stream(5)));

    let summary = run_source(source, &registry, &config).expect("run");

    assert_eq!(summary.connections, 1);
    // Truncated head plus five full frames.
    assert_eq!(summary.frames_detected, 6);
    assert_eq!(summary.frames_rejected, 0);
    let frames = recording.frames.lock().unwrap();
    assert_eq!(frames.len(), 5);
    for (measurements, timestamp) in frames.iter() {
        assert_eq!(measurements.len(), 11);
        assert_eq!(measurements.get("PAPP"), Some("00510"));
        assert!(timestamp.ends_with('Z'));
    }
}

#[test]
fn one_byte_reads_give_the_same_frames() {
    let (registry, config, recording) = setup();
    let source = ReaderSource::with_chunk_size(Cursor::new(stream(3)), 1);

    let summary = run_source(source, &registry, &config).expect("run");

    assert_eq!(summary.frames_detected, 4);
    assert_eq!(recording.frames.lock().unwrap().len(), 3);
}

#[test]
fn no_consumers_still_drains_source() {
    let (registry, _, recording) = setup();
    let config = Config {
        consumers: vec![],
        ..Config::default()
    };

    let summary = run_source(ReaderSource::new(Cursor::new(stream(2))), &registry, &config)
        .expect("run");

    assert_eq!(summary.frames_submitted, 3);
    assert!(recording.frames.lock().unwrap().is_empty());
}
