/// Channel that delivers a single timestamp after a duration.
pub mod after;
/// Channel that never delivers a value.
pub mod never;
/// Channel that delivers timestamps periodically.
pub mod tick;
