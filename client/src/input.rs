//! Username entry prompt

use crate::error::ClientError;
use macroquad::prelude::*;

pub const MAX_USERNAME_LEN: usize = 24;

/// Trims a username and checks it is usable
pub fn normalize_username(input: &str) -> Result<String, ClientError> {
    let name = input.trim();
    if name.is_empty() {
        return Err(ClientError::EmptyUsername);
    }
    if name.chars().count() > MAX_USERNAME_LEN {
        return Err(ClientError::UsernameTooLong {
            max: MAX_USERNAME_LEN,
        });
    }
    Ok(name.to_string())
}

/// Text buffer behind the entry screen
#[derive(Debug, Default)]
pub struct UsernamePrompt {
    buffer: String,
}

impl UsernamePrompt {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn push_char(&mut self, c: char) {
        if c.is_control() || self.buffer.chars().count() >= MAX_USERNAME_LEN {
            return;
        }
        self.buffer.push(c);
    }

    pub fn backspace(&mut self) {
        self.buffer.pop();
    }

    /// Returns the normalized username; the buffer is kept so it can be
    /// edited after a rejection
    pub fn submit(&self) -> Result<String, ClientError> {
        normalize_username(&self.buffer)
    }

    /// Reads this frame's keyboard input
    ///
    /// Returns `Some` with the submission result when Enter was pressed.
    pub fn poll_keys(&mut self) -> Option<Result<String, ClientError>> {
        while let Some(c) = get_char_pressed() {
            self.push_char(c);
        }

        if is_key_pressed(KeyCode::Backspace) {
            self.backspace();
        }

        if is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::KpEnter) {
            return Some(self.submit());
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_whitespace() {
        assert_eq!(normalize_username("  alice \t").unwrap(), "alice");
        assert_eq!(normalize_username("bob smith").unwrap(), "bob smith");
    }

    #[test]
    fn test_normalize_rejects_empty() {
        for input in ["", "   ", "\n\t"] {
            assert!(matches!(
                normalize_username(input),
                Err(ClientError::EmptyUsername)
            ));
        }
        assert_eq!(
            ClientError::EmptyUsername.to_string(),
            "Please enter a username."
        );
    }

    #[test]
    fn test_normalize_rejects_long_names() {
        let long = "x".repeat(MAX_USERNAME_LEN + 1);
        assert!(matches!(
            normalize_username(&long),
            Err(ClientError::UsernameTooLong { .. })
        ));
        assert!(normalize_username(&"x".repeat(MAX_USERNAME_LEN)).is_ok());
    }

    #[test]
    fn test_prompt_editing() {
        let mut prompt = UsernamePrompt::new();
        for c in "alicex".chars() {
            prompt.push_char(c);
        }
        prompt.backspace();
        prompt.push_char('\r');
        prompt.push_char('\u{8}');

        assert_eq!(prompt.text(), "alice");
        assert_eq!(prompt.submit().unwrap(), "alice");
        // Buffer survives submission
        assert_eq!(prompt.text(), "alice");
    }

    #[test]
    fn test_prompt_caps_length() {
        let mut prompt = UsernamePrompt::new();
        for _ in 0..(MAX_USERNAME_LEN + 10) {
            prompt.push_char('a');
        }
        assert_eq!(prompt.text().len(), MAX_USERNAME_LEN);
    }

    #[test]
    fn test_backspace_on_empty_prompt() {
        let mut prompt = UsernamePrompt::new();
        prompt.backspace();
        assert_eq!(prompt.text(), "");
        assert!(prompt.submit().is_err());
    }
}
