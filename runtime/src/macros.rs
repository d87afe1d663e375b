macro_rules! debug_log {
    ($($arg:tt)*) => {
        if cfg!(feature = "log-runtime-traces") {
            tracing_log::log::debug!($($arg)*);
        }
    };
}

macro_rules! trace_log {
    ($($arg:tt)*) => {
        if cfg!(feature = "log-runtime-traces") {
            tracing_log::log::trace!($($arg)*);
        }
    };
}

pub(crate) use debug_log;
pub(crate) use trace_log;
