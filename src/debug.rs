//! Debug logging
//!
//! Tracing of probes, planned command lines, and tool invocations. Off
//! unless `--debug` is passed or `EXTFORGE_DEBUG` is set; when off, the
//! `debug!` macro never formats its arguments.

use std::sync::OnceLock;

static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// Turn debug output on or off for the rest of the process.
///
/// Only the first call wins. The `EXTFORGE_DEBUG` variable enables debug
/// output even when `enabled` is false.
pub fn init_debug(enabled: bool) {
    let enabled = enabled || crate::env_vars::extforge_debug();
    DEBUG_ENABLED.get_or_init(|| enabled);
}

/// Whether debug output is on
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.get().copied().unwrap_or(false)
}

/// Render a command line the way a shell user would type it
pub fn format_command(program: &str, args: &[String]) -> String {
    let mut line = String::from(program);
    for arg in args {
        line.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            line.push('\'');
            line.push_str(arg);
            line.push('\'');
        } else {
            line.push_str(arg);
        }
    }
    line
}

/// Print a debug line to stderr when debug mode is on
///
/// Usage: `debug!("compiling {}", source.display())`
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        if $crate::debug::is_debug_enabled() {
            eprintln!("[DEBUG] {}", format_args!($($arg)*));
        }
    };
}
