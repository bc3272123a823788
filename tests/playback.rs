//! Playback verification end to end: a session fed the looped pattern
//! passes, one deviating byte fails and stays failed.

use std::sync::mpsc;
use std::time::Duration;

use pcmsim::{
    Access, SampleFormat, SharedBuffer, StreamParams, VirtualCard, Verdict, DEFAULT_PATTERN,
};

const BUFFER_BYTES: usize = 16384;
const TICKS_PER_SECOND: u32 = 50;

fn params() -> StreamParams {
    StreamParams {
        rate: 48000,
        channels: 1,
        format: SampleFormat::S16Le,
        access: Access::Interleaved,
        period_bytes: 4096,
    }
}

/// Buffer pre-filled with the looped pattern, the way an application
/// writing `pattern_len`-periodic data would leave it.
fn patterned_buffer() -> SharedBuffer {
    let bytes: Vec<u8> = (0..BUFFER_BYTES)
        .map(|i| DEFAULT_PATTERN[i % DEFAULT_PATTERN.len()])
        .collect();
    SharedBuffer::from_vec(bytes)
}

fn run_session(buffer: SharedBuffer, periods: usize) -> (Verdict, u8) {
    let card = VirtualCard::with_ticks_per_second(TICKS_PER_SECOND);
    let (tx, rx) = mpsc::channel();
    let mut session = card
        .open_playback(buffer, Box::new(move || drop(tx.send(()))))
        .unwrap();
    session.hw_params(params()).unwrap();
    session.prepare().unwrap();
    session.trigger_start().unwrap();
    for _ in 0..periods {
        rx.recv_timeout(Duration::from_secs(5))
            .expect("period notification");
    }
    session.trigger_stop().unwrap();
    let verdict = session.close();
    (verdict, card.inspect().pc_test())
}

#[test]
fn playback_matching_pattern_passes() {
    // Two periods keep the scan well inside one buffer cycle, where the
    // static pre-fill is what the verifier expects.
    let (verdict, pc_test) = run_session(patterned_buffer(), 2);
    assert_eq!(verdict, Verdict::Pass);
    assert_eq!(pc_test, 1);
}

#[test]
fn playback_single_bad_byte_fails() {
    let buffer = patterned_buffer();
    buffer.write_at(1000, b"!");
    let (verdict, pc_test) = run_session(buffer, 1);
    assert_eq!(verdict, Verdict::Fail);
    assert_eq!(pc_test, 0);
}

#[test]
fn playback_failure_is_sticky() {
    // Correct data after the bad byte must not clear the verdict.
    let buffer = patterned_buffer();
    buffer.write_at(100, b"!");
    let (verdict, pc_test) = run_session(buffer, 2);
    assert_eq!(verdict, Verdict::Fail);
    assert_eq!(pc_test, 0);
}

#[test]
fn playback_of_silence_passes() {
    // An all-zero buffer reads as "nothing written yet" on every tick:
    // no data, no corruption.
    let (verdict, pc_test) = run_session(SharedBuffer::new(BUFFER_BYTES), 1);
    assert_eq!(verdict, Verdict::Pass);
    assert_eq!(pc_test, 1);
}
