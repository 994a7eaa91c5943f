#[cfg(not(feature = "no_logging"))]
macro_rules! log {
    ($logger:expr, $($arg:tt)*) => {{
        if let Some(w) = $logger.line_writer() {
            let _ = writeln!(w, $($arg)*);
        }
    }};
}
#[cfg(feature = "no_logging")]
macro_rules! log {
    ($logger:expr, $($arg:tt)*) => {{}};
}
