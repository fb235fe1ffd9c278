//! Macros for printing diagnostics to the console with different styles.
//!
//! Everything goes to stderr: stdout is reserved for metric lines.
#[macro_export]
macro_rules! error_message {
    ($($arg:tt)*) => {
        eprintln!("{} {}", "  [ERROR]".red().bold(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! warning_message {
    ($($arg:tt)*) => {
        eprintln!("{} {}", "[WARNING]".yellow().bold(), format!($($arg)*));
    };
}
