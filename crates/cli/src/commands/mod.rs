//! CLI command implementations.

pub mod account;
pub mod admin;
pub mod checkout;
pub mod shop;

use std::fmt::Display;

/// Print one line of command output.
#[allow(clippy::print_stdout)]
pub fn say(line: impl Display) {
    println!("{line}");
}
