//! Wall-clock behavior of the simulated hardware clock: progress while
//! running, none after stop, and injected delay slows the stream down.

use std::thread;
use std::time::{Duration, Instant};

use pcmsim::{Access, SampleFormat, SharedBuffer, StreamParams, VirtualCard};

fn params() -> StreamParams {
    StreamParams {
        rate: 8000,
        channels: 1,
        format: SampleFormat::S16Le,
        access: Access::Interleaved,
        period_bytes: 4096,
    }
}

#[test]
fn pointer_advances_while_running_and_freezes_on_stop() {
    let card = VirtualCard::with_ticks_per_second(50);
    let mut session = card
        .open_capture(SharedBuffer::new(16384), Box::new(|| {}))
        .unwrap();
    session.hw_params(params()).unwrap();
    session.prepare().unwrap();

    session.trigger_start().unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while session.total_bytes() == 0 {
        assert!(Instant::now() < deadline, "no tick within 5s");
        thread::sleep(Duration::from_millis(5));
    }
    session.trigger_stop().unwrap();

    let frozen = session.total_bytes();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(session.total_bytes(), frozen);
    assert_eq!(session.pointer(), (frozen % 16384) / 2);
    session.close();
}

#[test]
fn injected_delay_stalls_ticks() {
    let card = VirtualCard::with_ticks_per_second(50);
    card.config().set_inject_delay(Duration::from_secs(2));

    let mut session = card
        .open_capture(SharedBuffer::new(16384), Box::new(|| {}))
        .unwrap();
    session.hw_params(params()).unwrap();
    session.prepare().unwrap();
    session.trigger_start().unwrap();
    thread::sleep(Duration::from_millis(200));
    // The first wait is 20ms + 2s, so nothing has fired yet.
    assert_eq!(session.total_bytes(), 0);

    // Stop must still return promptly despite the long wait.
    let start = Instant::now();
    session.trigger_stop().unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));
    session.close();
}

#[test]
fn close_while_running_shuts_down_synchronously() {
    let card = VirtualCard::with_ticks_per_second(100);
    let mut session = card
        .open_capture(SharedBuffer::new(16384), Box::new(|| {}))
        .unwrap();
    session.hw_params(params()).unwrap();
    session.prepare().unwrap();
    session.trigger_start().unwrap();
    thread::sleep(Duration::from_millis(50));

    let start = Instant::now();
    session.close();
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(card.inspect().pc_test(), 1);
}
