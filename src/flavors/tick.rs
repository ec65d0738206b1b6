use std::thread;
use std::time::{Duration, Instant};

use crate::channel::{bounded, Channel};

/// Creates a channel that delivers a message every `duration`.
///
/// The channel holds at most one pending tick; if nobody receives, the
/// ticker blocks rather than piling up timestamps. Closing the channel
/// stops the ticker thread.
pub fn tick(duration: Duration) -> Channel<Instant> {
    let ch = bounded(1);
    let sender = ch.clone();
    thread::spawn(move || loop {
        thread::sleep(duration);
        if sender.send(Instant::now()).is_err() {
            break;
        }
    });
    ch
}
