use std::thread;
use std::time::{Duration, Instant};

use crate::channel::{bounded, Channel};

/// Creates a channel that delivers a single message after the given
/// duration.
///
/// The usual role of this channel is the timeout arm of a select.
pub fn after(duration: Duration) -> Channel<Instant> {
    let ch = bounded(1);
    let sender = ch.clone();
    thread::spawn(move || {
        thread::sleep(duration);
        let _ = sender.send(Instant::now());
    });
    ch
}
