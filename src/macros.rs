/// Acquires a read guard on an `RwLock`.
///
/// Lock poisoning means a writer panicked half-way through mutating metadata, which leaves the
/// module in an unknown state; the macro treats that as a fatal bug.
macro_rules! read_lock {
    ($rwlock:expr) => {
        $rwlock.read().expect("Failed to acquire read lock")
    };
}

/// Acquires a write guard on an `RwLock`.
///
/// See [`read_lock!`] for the poisoning policy.
macro_rules! write_lock {
    ($rwlock:expr) => {
        $rwlock.write().expect("Failed to acquire write lock")
    };
}
