use crate::channel::{unbounded, Channel};

/// Creates a channel that never delivers a value.
///
/// Nothing ever sends on it and it never closes, so a receive case armed
/// on it never fires; useful for disabling a select arm.
pub fn never<T>() -> Channel<T> {
    unbounded()
}
