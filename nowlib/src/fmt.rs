//! Logging shim.
//!
//! Forwards to [defmt] when the `defmt` feature is on, otherwise to the
//! [log] facade when `log` is on, otherwise expands to nothing (while
//! still touching the arguments, so they don't warn as unused).

#![allow(unused_macros)]

macro_rules! __nowlib_log {
    ($level:ident, $s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt")]
            ::defmt::$level!($s $(, $x)*);
            #[cfg(all(feature = "log", not(feature = "defmt")))]
            ::log::$level!($s $(, $x)*);
            #[cfg(not(any(feature = "log", feature = "defmt")))]
            let _ = ($( & $x ),*);
        }
    };
}

macro_rules! trace {
    ($($arg:tt)*) => (__nowlib_log!(trace, $($arg)*));
}

macro_rules! debug {
    ($($arg:tt)*) => (__nowlib_log!(debug, $($arg)*));
}

macro_rules! info {
    ($($arg:tt)*) => (__nowlib_log!(info, $($arg)*));
}

macro_rules! warn {
    ($($arg:tt)*) => (__nowlib_log!(warn, $($arg)*));
}

macro_rules! error {
    ($($arg:tt)*) => (__nowlib_log!(error, $($arg)*));
}
