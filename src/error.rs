use std::fmt;

use thiserror::Error;

/// Error returned by [`Channel::send`](crate::Channel::send).
///
/// The channel was closed before the value could be delivered; the unsent
/// value is handed back to the caller.
#[derive(Error, Clone, Copy, PartialEq, Eq)]
#[error("sending on a closed channel")]
pub struct SendError<T>(pub T);

impl<T> SendError<T> {
    /// Unwraps the value that could not be sent.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SendError(..)")
    }
}

/// Error returned by [`Channel::try_send`](crate::Channel::try_send).
#[derive(Error, Clone, Copy, PartialEq, Eq)]
pub enum TrySendError<T> {
    /// The channel is full and open; the value would have to wait for room.
    #[error("sending on a full channel")]
    Full(T),
    /// The channel was closed before the value could be delivered.
    #[error("sending on a closed channel")]
    Closed(T),
}

impl<T> TrySendError<T> {
    /// Unwraps the value that could not be sent.
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::Full(v) | TrySendError::Closed(v) => v,
        }
    }

    /// Returns true if the send failed because the channel is full.
    pub fn is_full(&self) -> bool {
        matches!(self, TrySendError::Full(_))
    }

    /// Returns true if the send failed because the channel is closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, TrySendError::Closed(_))
    }
}

impl<T> fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::Full(_) => f.write_str("Full(..)"),
            TrySendError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

/// Error returned by [`Channel::recv`](crate::Channel::recv).
///
/// The channel is closed and its buffer has been drained.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("receiving on a drained channel")]
pub struct RecvError;

/// Error returned by [`Channel::try_recv`](crate::Channel::try_recv).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// The channel is open but currently holds no value.
    #[error("receiving on an empty channel")]
    Empty,
    /// The channel is closed and its buffer has been drained.
    #[error("receiving on a drained channel")]
    Closed,
}

impl TryRecvError {
    /// Returns true if the receive failed because the channel is empty and open.
    pub fn is_empty(&self) -> bool {
        matches!(self, TryRecvError::Empty)
    }

    /// Returns true if the receive failed because the channel is drained and closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, TryRecvError::Closed)
    }
}
