use std::mem;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::channel::Channel;
use crate::error::{RecvError, SendError};

/// Shared core of one select call.
///
/// Notifiers installed in channels hold an `Arc` to this, so they stay
/// valid no matter when a channel gets around to firing them; `completed`
/// is the monotonic guard behind the "at most one case fires" contract.
struct Core {
    state: Mutex<CoreState>,
    ready: Condvar,
}

struct CoreState {
    completed: bool,
    winner: usize,
}

impl Core {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(CoreState {
                completed: false,
                winner: 0,
            }),
            ready: Condvar::new(),
        })
    }

    fn is_winner(&self, index: usize) -> bool {
        let state = self.state.lock();
        state.completed && state.winner == index
    }
}

/// A pending receive registration, stored in a channel's wait-list.
///
/// Single-shot: the channel pops it before invoking it, under the channel
/// mutex. It acquires only the coordinator mutex, never another channel's,
/// which is what keeps the cross-pair lock ordering acyclic.
pub(crate) struct RecvWaiter<T> {
    core: Arc<Core>,
    index: usize,
    slot: Arc<Mutex<Option<Result<T, RecvError>>>>,
}

impl<T> RecvWaiter<T> {
    /// Offers a value. The value comes back on refusal so the channel can
    /// un-claim it.
    ///
    /// The payload lands in the slot before `completed` is published, both
    /// under the coordinator mutex: anyone who observes the win also sees
    /// the payload.
    pub(crate) fn offer(self, value: T) -> Result<(), T> {
        let mut state = self.core.state.lock();
        if state.completed {
            return Err(value);
        }
        *self.slot.lock() = Some(Ok(value));
        state.completed = true;
        state.winner = self.index;
        drop(state);
        self.core.ready.notify_all();
        Ok(())
    }

    /// Reports closure. Nothing was taken from the channel, so there is
    /// nothing to hand back whether the case wins or not.
    pub(crate) fn close(self) {
        let mut state = self.core.state.lock();
        if state.completed {
            return;
        }
        *self.slot.lock() = Some(Err(RecvError));
        state.completed = true;
        state.winner = self.index;
        drop(state);
        self.core.ready.notify_all();
    }
}

enum SendSlot<T> {
    /// Armed; the value waits to be produced.
    Ready(T),
    /// Fired; what the caller will be told.
    Done(Result<(), SendError<T>>),
    /// The outcome has been handed to the caller.
    Taken,
}

/// A pending send registration, stored in a channel's wait-list.
///
/// Same single-shot and lock-ordering contract as [`RecvWaiter`].
pub(crate) struct SendWaiter<T> {
    core: Arc<Core>,
    index: usize,
    slot: Arc<Mutex<SendSlot<T>>>,
}

impl<T> SendWaiter<T> {
    /// Hands out the pending value, committing the select to this case.
    /// Returns `None` if the select already committed elsewhere; the
    /// channel then simply drops the registration.
    pub(crate) fn produce(self) -> Option<T> {
        let mut state = self.core.state.lock();
        if state.completed {
            return None;
        }
        let value = match mem::replace(&mut *self.slot.lock(), SendSlot::Done(Ok(()))) {
            SendSlot::Ready(value) => value,
            _ => unreachable!("send case fired twice"),
        };
        state.completed = true;
        state.winner = self.index;
        drop(state);
        self.core.ready.notify_all();
        Some(value)
    }

    /// Reports closure; the unsent value is routed back to the caller.
    pub(crate) fn close(self) {
        let mut state = self.core.state.lock();
        if state.completed {
            return;
        }
        {
            let mut slot = self.slot.lock();
            match mem::replace(&mut *slot, SendSlot::Taken) {
                SendSlot::Ready(value) => *slot = SendSlot::Done(Err(SendError(value))),
                _ => unreachable!("send case fired twice"),
            }
        }
        state.completed = true;
        state.winner = self.index;
        drop(state);
        self.core.ready.notify_all();
    }
}

/// Names a receive case of a [`Select`] and carries its payload out.
///
/// After the select returns, [`complete`](RecvToken::complete) yields the
/// received value (or the closed indication) iff this case is the one
/// that fired.
pub struct RecvToken<T> {
    core: Arc<Core>,
    index: usize,
    slot: Arc<Mutex<Option<Result<T, RecvError>>>>,
}

impl<T> RecvToken<T> {
    /// Returns this case's outcome if it won the select, once.
    ///
    /// `Some(Ok(value))` for a delivered value, `Some(Err(_))` when the
    /// channel was closed and drained; `None` if another case won or the
    /// outcome was already taken.
    pub fn complete(&self) -> Option<Result<T, RecvError>> {
        if !self.core.is_winner(self.index) {
            return None;
        }
        self.slot.lock().take()
    }
}

/// Names a send case of a [`Select`] and carries its outcome out.
pub struct SendToken<T> {
    core: Arc<Core>,
    index: usize,
    slot: Arc<Mutex<SendSlot<T>>>,
}

impl<T> SendToken<T> {
    /// Returns this case's outcome if it won the select, once.
    ///
    /// `Some(Ok(()))` when the value went into the channel, `Some(Err(_))`
    /// when the channel closed first, handing the unsent value back;
    /// `None` if another case won or the outcome was already taken.
    pub fn complete(&self) -> Option<Result<(), SendError<T>>> {
        if !self.core.is_winner(self.index) {
            return None;
        }
        match mem::replace(&mut *self.slot.lock(), SendSlot::Taken) {
            SendSlot::Done(result) => Some(result),
            SendSlot::Taken => None,
            SendSlot::Ready(_) => unreachable!("winning send case still pending"),
        }
    }
}

struct Case<'scope> {
    arm: Option<Box<dyn FnOnce() -> Option<u64> + 'scope>>,
    unregister: Option<Box<dyn FnOnce(u64) + 'scope>>,
}

/// A one-shot multi-way wait over channel operations.
///
/// Cases are declared in order with [`recv`](Select::recv) and
/// [`send`](Select::send), each handing back a token; the select is then
/// committed with [`wait`](Select::wait) (parks until one case fires) or
/// [`try_wait`](Select::try_wait) (never parks; the caller's default path
/// runs when nothing was ready). Exactly one case fires per committed
/// select; its token yields the payload.
///
/// Among cases ready at arming time the first declared wins; among cases
/// that become ready while the select is parked, the first notifier to
/// claim the coordinator wins. There is no fairness guarantee across
/// repeated selects.
///
/// # Examples
///
/// ```
/// use savak::{unbounded, Select};
///
/// let ch = unbounded();
/// ch.send(7).unwrap();
///
/// let mut sel = Select::new();
/// let token = sel.recv(&ch);
/// sel.wait();
///
/// assert_eq!(token.complete(), Some(Ok(7)));
/// ```
pub struct Select<'scope> {
    core: Arc<Core>,
    cases: Vec<Case<'scope>>,
}

impl<'scope> Select<'scope> {
    /// Creates a select with no cases.
    ///
    /// Waiting on an empty select parks forever.
    pub fn new() -> Self {
        Self {
            core: Core::new(),
            cases: Vec::new(),
        }
    }

    /// Adds a receive case on `channel`.
    pub fn recv<T>(&mut self, channel: &'scope Channel<T>) -> RecvToken<T> {
        let index = self.cases.len();
        let core = self.core.clone();
        let slot: Arc<Mutex<Option<Result<T, RecvError>>>> = Arc::new(Mutex::new(None));
        let armed_slot = slot.clone();
        let armed_core = core.clone();
        self.cases.push(Case {
            arm: Some(Box::new(move || {
                channel.recv_or_register(RecvWaiter {
                    core: armed_core,
                    index,
                    slot: armed_slot,
                })
            })),
            unregister: Some(Box::new(move |id| {
                channel.unregister(id);
            })),
        });
        RecvToken { core, index, slot }
    }

    /// Adds a send case on `channel` carrying `value`.
    pub fn send<T>(&mut self, channel: &'scope Channel<T>, value: T) -> SendToken<T> {
        let index = self.cases.len();
        let core = self.core.clone();
        let slot = Arc::new(Mutex::new(SendSlot::Ready(value)));
        let armed_slot = slot.clone();
        let armed_core = core.clone();
        self.cases.push(Case {
            arm: Some(Box::new(move || {
                channel.send_or_register(SendWaiter {
                    core: armed_core,
                    index,
                    slot: armed_slot,
                })
            })),
            unregister: Some(Box::new(move |id| {
                channel.unregister(id);
            })),
        });
        SendToken { core, index, slot }
    }

    /// Arms every case in declaration order and parks until one fires.
    ///
    /// Every pending registration is torn down before this returns, so
    /// the tokens can be read race-free and the channels involved stay
    /// unencumbered.
    pub fn wait(self) {
        self.run(true);
    }

    /// Arms every case in declaration order without parking.
    ///
    /// Returns true iff some case fired; false is the caller's cue to run
    /// its default path. A case that fires during teardown still counts,
    /// so no value is ever taken from a channel and then dropped.
    pub fn try_wait(self) -> bool {
        self.run(false)
    }

    fn run(mut self, park: bool) -> bool {
        // Arm in declaration order; once a case fires synchronously the
        // remaining ones are skipped.
        let mut armed: Vec<(usize, u64)> = Vec::with_capacity(self.cases.len());
        for index in 0..self.cases.len() {
            if self.core.state.lock().completed {
                break;
            }
            let arm = self.cases[index].arm.take().expect("case armed once");
            if let Some(id) = arm() {
                armed.push((index, id));
            }
        }

        if park {
            let mut state = self.core.state.lock();
            while !state.completed {
                self.core.ready.wait(&mut state);
            }
        }

        // Teardown: after this loop no notifier can fire, so the answer
        // below is final. Without parking this doubles as the race
        // resolution: a case that completed before its registration came
        // out wins over the default path, and its value is not lost.
        for (index, id) in armed {
            let unregister = self.cases[index]
                .unregister
                .take()
                .expect("case torn down once");
            unregister(id);
        }

        self.core.state.lock().completed
    }
}

impl<'scope> Default for Select<'scope> {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits on multiple channel operations, committing to exactly one.
///
/// Arms are declared in order; each is a receive, a send, or the single
/// `default`, which must come last. The winning arm's body runs on the
/// calling thread with the operation's result bound to the given pattern:
/// `Result<T, RecvError>` for a receive, `Result<(), SendError<T>>` for a
/// send.
///
/// An arm's pattern may be refutable (`Ok(v) = recv(ch)`), but then the
/// winning case's outcome must match it: a closed channel fires its case
/// with `Err(..)`, and rather than drop that outcome on the floor the
/// select panics. Bind the full `Result` in any arm whose channel may
/// close.
///
/// # Examples
///
/// ```
/// use savak::{unbounded, select};
///
/// let (a, b) = (unbounded::<i32>(), unbounded::<i32>());
/// a.send(10).unwrap();
///
/// select! {
///     msg = recv(a) => assert_eq!(msg.unwrap(), 10),
///     msg = recv(b) => panic!("b has nothing to deliver: {msg:?}"),
/// }
/// ```
///
/// With a default case:
///
/// ```
/// use savak::{unbounded, select};
///
/// let ch = unbounded::<i32>();
/// let mut fallback = 0;
///
/// select! {
///     _msg = recv(ch) => panic!("nothing was sent"),
///     default => fallback = 10,
/// }
/// assert_eq!(fallback, 10);
/// ```
#[macro_export]
macro_rules! select {
    ($($arms:tt)*) => {{
        let mut __sel = $crate::Select::new();
        $crate::__select_case!(@arm __sel {} $($arms)*)
    }};
}

/// Internal recursion of [`select!`]: registers one case per step while
/// accumulating the post-wait dispatch chain.
#[doc(hidden)]
#[macro_export]
macro_rules! __select_case {
    (@arm $sel:ident { $($dispatch:tt)* }) => {{
        $sel.wait();
        $($dispatch)* {
            ::core::panic!("select case fired but the arm's pattern rejected its outcome")
        }
    }};
    (@arm $sel:ident { $($dispatch:tt)* } default => $body:expr $(,)?) => {{
        if $sel.try_wait() {
            $($dispatch)* {
                ::core::panic!("select case fired but the arm's pattern rejected its outcome")
            }
        } else {
            $body;
        }
    }};
    (@arm $sel:ident { $($dispatch:tt)* } $res:pat = recv($ch:expr) => $body:expr $(, $($rest:tt)*)?) => {{
        let __token = $sel.recv(&$ch);
        $crate::__select_case!(@arm $sel {
            $($dispatch)*
            if let ::core::option::Option::Some($res) = __token.complete() { $body; } else
        } $($($rest)*)?)
    }};
    (@arm $sel:ident { $($dispatch:tt)* } $res:pat = send($ch:expr, $value:expr) => $body:expr $(, $($rest:tt)*)?) => {{
        let __token = $sel.send(&$ch, $value);
        $crate::__select_case!(@arm $sel {
            $($dispatch)*
            if let ::core::option::Option::Some($res) = __token.complete() { $body; } else
        } $($($rest)*)?)
    }};
}
