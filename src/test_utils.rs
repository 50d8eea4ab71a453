use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// A fixed set of environment variables owned by one test.
///
/// Creating the scope serializes env access, records the listed variables and
/// unsets them. Dropping it puts the recorded values back.
#[must_use]
pub struct EnvScope {
    saved: Vec<(&'static str, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvScope {
    pub fn cleared(keys: &[&'static str]) -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved = keys.iter().map(|&key| (key, env::var_os(key))).collect();
        for key in keys {
            unsafe { env::remove_var(key) };
        }
        Self { saved, _lock: lock }
    }

    /// Sets one of the scoped variables.
    pub fn set(&self, key: &'static str, value: &str) {
        assert!(
            self.saved.iter().any(|(k, _)| *k == key),
            "{key} is not part of this scope"
        );
        unsafe { env::set_var(key, value) };
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(value) => unsafe { env::set_var(key, value) },
                None => unsafe { env::remove_var(key) },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "WS_STATS_ENV_SCOPE_CHECK";

    #[test]
    fn test_scope_clears_then_restores() {
        unsafe { env::set_var(KEY, "original") };
        {
            let scope = EnvScope::cleared(&[KEY]);
            assert_eq!(env::var_os(KEY), None);
            scope.set(KEY, "scoped");
            assert_eq!(env::var(KEY).as_deref(), Ok("scoped"));
        }
        assert_eq!(env::var(KEY).as_deref(), Ok("original"));
        unsafe { env::remove_var(KEY) };
    }
}
