//! CSP-style channels with first-class multi-way select.
//!
//! This crate provides a typed, thread-safe FIFO channel in the style of
//! the channels popularised by Go, together with a `select` coordinator
//! for blocking on several channel operations at once and committing to
//! exactly one. It is a passive library: it spawns no threads of its own
//! (except the helpers behind the timer flavors) and exposes only an
//! in-process API for coordinating producer/consumer threads, fan-in,
//! fan-out, timeouts and structured shutdown.
//!
//! # Key Features
//!
//! - **Multi-producer Multi-consumer (MPMC)**: a [`Channel`] is a
//!   cloneable handle; any number of threads can send and receive.
//! - **Bounded and unbounded**: [`bounded`] channels apply backpressure,
//!   [`unbounded`] channels never block on send. A capacity of 0 gives a
//!   rendezvous channel where each send pairs with a receive in flight.
//! - **Closure semantics**: [`Channel::close`] is explicit and
//!   idempotent; buffered values stay receivable until drained, then
//!   receives fail.
//! - **Select**: the [`Select`] coordinator and the [`select!`] macro
//!   wait on any mix of receive and send cases, with an optional default
//!   case, and guarantee that exactly one case fires.
//! - **Timer flavors**: [`after`], [`tick`] and [`never`] channels for
//!   timeouts and control flow inside selects.
//!
//! # Example
//!
//! ```rust
//! use savak::{unbounded, select};
//! use std::thread;
//!
//! let (a, b) = (unbounded::<i32>(), unbounded::<i32>());
//!
//! let a2 = a.clone();
//! thread::spawn(move || {
//!     a2.send(10).unwrap();
//! });
//!
//! select! {
//!     msg = recv(a) => println!("from a: {}", msg.unwrap()),
//!     msg = recv(b) => println!("from b: {}", msg.unwrap()),
//! }
//! ```
//!
//! # Blocking model
//!
//! Each channel's state lives behind a single mutex with two condition
//! variables; a select call parks on its own coordinator instead. No
//! lock is held while user actions run. Errors are synchronous and
//! in-band: a failed send hands the value back, nothing panics, nothing
//! is logged, nothing is retried.

#![warn(missing_docs)]

mod channel;
mod error;
/// Timer and control channel flavors.
pub mod flavors;
mod select;
mod waitlist;

pub use channel::Channel;
pub use error::{RecvError, SendError, TryRecvError, TrySendError};
pub use select::{RecvToken, Select, SendToken};

/// Creates a channel of unbounded capacity.
///
/// Sending never blocks; receiving blocks while the channel is empty and
/// open.
pub fn unbounded<T>() -> Channel<T> {
    channel::unbounded()
}

/// Creates a channel of bounded capacity.
///
/// Sending blocks while the buffer is full. A capacity of 0 yields a
/// rendezvous channel.
pub fn bounded<T>(cap: usize) -> Channel<T> {
    channel::bounded(cap)
}

pub use flavors::after::after;
pub use flavors::never::never;
pub use flavors::tick::tick;
