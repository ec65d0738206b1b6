use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::error::{RecvError, SendError, TryRecvError, TrySendError};
use crate::select::{RecvWaiter, SendWaiter};
use crate::waitlist::WaitList;

/// A typed, thread-safe FIFO channel with closure semantics.
///
/// A `Channel` is a cloneable handle; clones share the same underlying
/// channel, so handing a channel to another thread is a `clone()` away.
/// Values are delivered in FIFO order per sending thread. Closing is
/// explicit and idempotent: buffered values remain receivable after
/// [`close`](Channel::close) until the buffer drains, after which
/// receives fail with [`RecvError`].
pub struct Channel<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

struct Shared<T> {
    /// `None` means unbounded. Immutable after construction.
    capacity: Option<usize>,
    state: Mutex<State<T>>,
    /// Blocked receivers park here.
    recv_ready: Condvar,
    /// Blocked senders park here.
    send_ready: Condvar,
}

struct State<T> {
    queue: VecDeque<T>,
    closed: bool,
    /// Blocking senders currently parked on `send_ready`.
    senders: usize,
    /// Blocking receivers in flight. A parked receiver can absorb one
    /// in-flight send beyond capacity without buffer growth, which is
    /// what makes the capacity-0 rendezvous work.
    receivers: usize,
    recv_waiters: WaitList<RecvWaiter<T>>,
    send_waiters: WaitList<SendWaiter<T>>,
    /// Unified wait-id counter for both wait-lists; id 0 is reserved to
    /// mean "no registration", so the first allocated id is 1.
    wait_seq: u64,
}

impl<T> State<T> {
    fn has_room(&self, capacity: Option<usize>) -> bool {
        match capacity {
            None => true,
            Some(cap) => self.queue.len() < cap.saturating_add(self.receivers),
        }
    }

    fn alloc_wait_id(&mut self) -> u64 {
        self.wait_seq += 1;
        self.wait_seq
    }
}

/// Creates a channel of unbounded capacity.
///
/// Sending never blocks; receiving blocks while the channel is empty and
/// open.
pub fn unbounded<T>() -> Channel<T> {
    Channel::new(None)
}

/// Creates a channel of bounded capacity.
///
/// Sending blocks while the buffer is full; receiving blocks while it is
/// empty and the channel is open. A capacity of 0 yields a rendezvous
/// channel: every send pairs up with a receive in flight.
pub fn bounded<T>(cap: usize) -> Channel<T> {
    Channel::new(Some(cap))
}

impl<T> Channel<T> {
    pub(crate) fn new(capacity: Option<usize>) -> Self {
        Self {
            shared: Arc::new(Shared {
                capacity,
                state: Mutex::new(State {
                    queue: VecDeque::new(),
                    closed: false,
                    senders: 0,
                    receivers: 0,
                    recv_waiters: WaitList::new(),
                    send_waiters: WaitList::new(),
                    wait_seq: 0,
                }),
                recv_ready: Condvar::new(),
                send_ready: Condvar::new(),
            }),
        }
    }

    /// Sends a value, blocking while the channel is full.
    ///
    /// Returns `Err` iff the channel was closed before or while waiting;
    /// the unsent value is handed back inside the error.
    pub fn send(&self, mut value: T) -> Result<(), SendError<T>> {
        let mut state = self.shared.state.lock();
        loop {
            if state.closed {
                return Err(SendError(value));
            }
            // Waiting selects have priority over the buffer. A refusal
            // means that select already committed to another case; the
            // registration is dead and the next one is tried.
            while let Some((_, waiter)) = state.recv_waiters.pop_front() {
                match waiter.offer(value) {
                    Ok(()) => return Ok(()),
                    Err(v) => value = v,
                }
            }
            if state.has_room(self.shared.capacity) {
                state.queue.push_back(value);
                drop(state);
                self.shared.recv_ready.notify_one();
                return Ok(());
            }
            state.senders += 1;
            self.shared.send_ready.wait(&mut state);
            state.senders -= 1;
        }
    }

    /// Sends a value without blocking.
    ///
    /// Fails with [`TrySendError::Full`] instead of waiting for room.
    pub fn try_send(&self, mut value: T) -> Result<(), TrySendError<T>> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(TrySendError::Closed(value));
        }
        while let Some((_, waiter)) = state.recv_waiters.pop_front() {
            match waiter.offer(value) {
                Ok(()) => return Ok(()),
                Err(v) => value = v,
            }
        }
        if state.has_room(self.shared.capacity) {
            state.queue.push_back(value);
            drop(state);
            self.shared.recv_ready.notify_one();
            Ok(())
        } else {
            Err(TrySendError::Full(value))
        }
    }

    /// Receives a value, blocking while the channel is empty and open.
    ///
    /// Returns `Err` iff the channel is closed and its buffer has been
    /// drained.
    pub fn recv(&self) -> Result<T, RecvError> {
        let mut state = self.shared.state.lock();
        state.receivers += 1;
        loop {
            if let Some(value) = self.take(&mut state) {
                state.receivers -= 1;
                let wake = state.senders > 0;
                drop(state);
                if wake {
                    self.shared.send_ready.notify_one();
                }
                return Ok(value);
            }
            if state.closed {
                state.receivers -= 1;
                return Err(RecvError);
            }
            if state.senders > 0 {
                // Rendezvous opening: a parked sender can push its value
                // while this receiver sleeps, buffer room or not.
                self.shared.send_ready.notify_one();
            }
            self.shared.recv_ready.wait(&mut state);
        }
    }

    /// Receives a value without blocking.
    ///
    /// Fails with [`TryRecvError::Empty`] instead of waiting for a value.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let mut state = self.shared.state.lock();
        if let Some(value) = self.take(&mut state) {
            let wake = state.senders > 0;
            drop(state);
            if wake {
                self.shared.send_ready.notify_one();
            }
            return Ok(value);
        }
        if state.closed {
            Err(TryRecvError::Closed)
        } else {
            Err(TryRecvError::Empty)
        }
    }

    /// The receive path shared by `recv` and `try_recv`: waiting select
    /// senders first, then the buffer.
    ///
    /// A select sender's value goes straight to the caller only when the
    /// buffer is empty (the rendezvous); otherwise it is appended at the
    /// tail and the head is taken, preserving FIFO order and refilling the
    /// room this receive opened.
    fn take(&self, state: &mut State<T>) -> Option<T> {
        while let Some((_, waiter)) = state.send_waiters.pop_front() {
            match waiter.produce() {
                Some(value) => {
                    if state.queue.is_empty() {
                        return Some(value);
                    }
                    state.queue.push_back(value);
                    return state.queue.pop_front();
                }
                // that select already committed elsewhere
                None => continue,
            }
        }
        state.queue.pop_front()
    }

    /// Closes the channel. Idempotent.
    ///
    /// Buffered values remain receivable; blocked senders fail, blocked
    /// receivers drain the buffer and then fail, and armed select cases
    /// fire with the closed indication.
    pub fn close(&self) {
        let mut state = self.shared.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        while let Some((_, waiter)) = state.recv_waiters.pop_front() {
            waiter.close();
        }
        while let Some((_, waiter)) = state.send_waiters.pop_front() {
            waiter.close();
        }
        drop(state);
        self.shared.recv_ready.notify_all();
        self.shared.send_ready.notify_all();
    }

    /// Returns true iff the channel is closed **and** drained.
    ///
    /// A closed channel with buffered values left is not yet observably
    /// closed to receivers, so this keeps returning false until the last
    /// value is taken.
    pub fn is_closed(&self) -> bool {
        let state = self.shared.state.lock();
        state.closed && state.queue.is_empty()
    }

    /// Returns the number of values currently buffered.
    pub fn len(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Returns true if the buffer currently holds no values.
    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().queue.is_empty()
    }

    /// Returns the configured capacity, or `None` for an unbounded channel.
    pub fn capacity(&self) -> Option<usize> {
        self.shared.capacity
    }

    /// Select probe: takes a pending value for `waiter` or registers it.
    ///
    /// Never blocks. Returns `None` when the waiter was resolved on the
    /// spot (value offered, or closure reported); `Some(id)` when it was
    /// parked on the receive wait-list.
    pub(crate) fn recv_or_register(&self, waiter: RecvWaiter<T>) -> Option<u64> {
        let mut state = self.shared.state.lock();
        if let Some(value) = state.queue.pop_front() {
            match waiter.offer(value) {
                Ok(()) => {
                    // Room opened: refill the tail from a waiting select
                    // sender, else let a parked blocking sender at it.
                    let mut refilled = false;
                    while let Some((_, sender)) = state.send_waiters.pop_front() {
                        if let Some(v) = sender.produce() {
                            state.queue.push_back(v);
                            refilled = true;
                            break;
                        }
                    }
                    let wake = !refilled && state.senders > 0;
                    drop(state);
                    if wake {
                        self.shared.send_ready.notify_one();
                    }
                }
                // the select lost the race to another case; the value goes
                // back to the head so the order stays intact
                Err(value) => state.queue.push_front(value),
            }
            return None;
        }
        if state.closed {
            waiter.close();
            return None;
        }
        let id = state.alloc_wait_id();
        state.recv_waiters.push_back(id, waiter);
        if state.senders > 0 {
            // rendezvous opening, select edition: a parked sender can hand
            // its value to this registration once it re-checks
            self.shared.send_ready.notify_one();
        }
        Some(id)
    }

    /// Select probe: places `waiter`'s value if there is room or registers it.
    ///
    /// Never blocks. Mirrors [`recv_or_register`](Channel::recv_or_register):
    /// `None` when resolved synchronously, `Some(id)` when parked on the
    /// send wait-list.
    pub(crate) fn send_or_register(&self, waiter: SendWaiter<T>) -> Option<u64> {
        let mut state = self.shared.state.lock();
        if state.closed {
            waiter.close();
            return None;
        }
        if state.has_room(self.shared.capacity) {
            let Some(mut value) = waiter.produce() else {
                return None;
            };
            // Waiting selects take the value directly; the buffer is empty
            // whenever any are registered.
            while let Some((_, receiver)) = state.recv_waiters.pop_front() {
                match receiver.offer(value) {
                    Ok(()) => return None,
                    Err(v) => value = v,
                }
            }
            state.queue.push_back(value);
            drop(state);
            self.shared.recv_ready.notify_one();
            return None;
        }
        let id = state.alloc_wait_id();
        state.send_waiters.push_back(id, waiter);
        Some(id)
    }

    /// Removes a still-pending select registration.
    ///
    /// The id space is unified across both wait-lists. Returns false on a
    /// miss, which is the common case of a waiter that already fired.
    pub(crate) fn unregister(&self, id: u64) -> bool {
        let mut state = self.shared.state.lock();
        state.recv_waiters.remove(id).is_some() || state.send_waiters.remove(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendezvous_accounting_keeps_wait_lists_consistent() {
        let ch = bounded::<u32>(2);
        ch.try_send(1).unwrap();
        ch.try_send(2).unwrap();
        assert!(ch.try_send(3).unwrap_err().is_full());

        let state = ch.shared.state.lock();
        assert!(state.send_waiters.is_empty());
        assert!(state.recv_waiters.is_empty());
        assert_eq!(state.queue.len(), 2);
    }

    #[test]
    fn wait_ids_start_past_the_reserved_zero() {
        let ch = unbounded::<u32>();
        let mut state = ch.shared.state.lock();
        assert_eq!(state.alloc_wait_id(), 1);
        assert_eq!(state.alloc_wait_id(), 2);
    }
}
