//! Output formatting - console, JSON, and test-stub file reporters

mod console;
mod json;
mod stubs;

pub use console::ConsoleReporter;
pub use json::JsonReporter;
pub use stubs::write_stub_file;
