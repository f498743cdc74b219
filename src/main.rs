//! Binary entrypoint that launches the chat backend.
//! Run with: cargo run --bin skald-server

use std::process::ExitCode;

use skald_chat::start_skald;

fn main() -> ExitCode {
    start_skald::run()
}
