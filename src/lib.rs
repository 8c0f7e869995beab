pub mod error;
pub mod config;
pub mod identity;
pub mod routes;
pub mod permissions;
pub mod guard;
pub mod api;
pub mod app;
pub mod cli;

// Test-only printing helper: expands to eprintln! during tests/debug and is absent otherwise.
// Usage: dprintln!("session.set user={}", name);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! dprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In release builds, provide a no-op dprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! dprintln {
    ($($arg:tt)*) => ({
        // Preserve formatting checks in release without producing code
        if false { let _ = format!($($arg)*); }
    });
}
