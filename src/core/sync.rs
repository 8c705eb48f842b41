//! Synchronization utilities for robust mutex handling
//!
//! Converts mutex poison errors into application-specific errors so callers
//! never unwrap a lock result.

use std::sync::LockResult;

/// Handle poisoned mutex cases with consistent error handling
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use vulnwatch::core::sync::handle_mutex_poison;
/// use vulnwatch::scan::error::ScanError;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(
///     mutex.lock(),
///     |message| ScanError::Internal { message },
/// ).unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "mutex poisoned, a panic occurred while the lock was held: {:?}",
            poison_err
        ))
    })
}
