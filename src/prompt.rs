use std::io::{self, BufRead, Write};

use crate::error::{AppError, AppResult};

/// Supplies the account seed; injected so runs are testable without a
/// terminal.
pub trait CredentialSource {
    fn seed(&self) -> AppResult<String>;
}

/// Yes/no gate in front of any submission side effect.
pub trait ConfirmationGate {
    fn confirm(&self) -> AppResult<bool>;
}

/// Reads the seed from an environment variable, falling back to a
/// masked terminal prompt.
pub struct EnvOrPromptCredentials {
    env_var: String,
    prompt: String,
}

impl EnvOrPromptCredentials {
    pub fn new(env_var: &str, prompt: &str) -> Self {
        Self {
            env_var: env_var.to_string(),
            prompt: prompt.to_string(),
        }
    }
}

impl CredentialSource for EnvOrPromptCredentials {
    fn seed(&self) -> AppResult<String> {
        if let Ok(seed) = std::env::var(&self.env_var) {
            if !seed.is_empty() {
                return Ok(seed);
            }
        }
        rpassword::prompt_password(&self.prompt)
            .map_err(|e| AppError::InvalidInput(format!("failed to read seed: {}", e)))
    }
}

/// Requires one exact literal phrase; anything else cancels the run.
pub struct TypedPhraseGate {
    prompt: String,
    phrase: String,
}

impl TypedPhraseGate {
    pub fn new(prompt: &str, phrase: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            phrase: phrase.to_string(),
        }
    }

    fn matches(&self, input: &str) -> bool {
        input.trim_end_matches(|c| c == '\r' || c == '\n') == self.phrase
    }
}

impl ConfirmationGate for TypedPhraseGate {
    fn confirm(&self) -> AppResult<bool> {
        print!("{}", self.prompt);
        io::stdout()
            .flush()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        let mut input = String::new();
        io::stdin()
            .lock()
            .read_line(&mut input)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        Ok(self.matches(&input))
    }
}
