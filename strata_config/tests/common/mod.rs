//! Shared helpers for integration tests.

use std::env;
use std::ffi::OsString;

/// RAII guard that sets an environment variable and restores the previous
/// state on drop.
///
/// Tests mutating the environment must run under `#[serial]`; the guard only
/// handles restoration, not synchronisation.
pub struct EnvGuard {
    key: String,
    previous: Option<OsString>,
}

impl EnvGuard {
    /// Set `key` to `value` for the duration of the guard.
    pub fn set(key: impl Into<String>, value: &str) -> Self {
        let key = key.into();
        let previous = env::var_os(&key);
        // SAFETY: env-mutating tests are serialised via `#[serial]`.
        unsafe { env::set_var(&key, value) };
        Self { key, previous }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.previous.take() {
            // SAFETY: restoration happens on the same serialised test thread.
            Some(value) => unsafe { env::set_var(&self.key, value) },
            None => unsafe { env::remove_var(&self.key) },
        }
    }
}
