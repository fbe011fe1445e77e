//! Terminal helpers for the CLI client.

use std::io::Write;

/// Redisplay the input prompt after printing an incoming event.
pub fn redisplay_prompt(username: &str) {
    print!("{}> ", username);
    let _ = std::io::stdout().flush();
}
