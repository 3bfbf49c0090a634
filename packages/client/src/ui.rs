//! Console output for the interactive client.

use std::io::Write;

use crate::output::OutputHandler;

pub const PROMPT: &str = "> ";

/// Redisplay the prompt after printing a message
pub fn redisplay_prompt() {
    print!("{PROMPT}");
    std::io::stdout().flush().ok();
}

/// Prints every message on its own line, then restores the prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOutput;

impl OutputHandler for ConsoleOutput {
    fn handle_msg(&self, msg: &str) {
        println!("\r{msg}");
        redisplay_prompt();
    }
}
