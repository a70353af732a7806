//! Terminal prompts.

use cairn_core::{CoreError, CoreResult, Prompter};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};

/// [`Prompter`] backed by `dialoguer`.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    /// Creates a prompter using the colourful theme.
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

fn prompt_error(err: dialoguer::Error) -> CoreError {
    CoreError::Prompt(err.to_string())
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str, default: bool) -> CoreResult<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(default)
            .interact()
            .map_err(prompt_error)
    }

    fn input(&self, message: &str) -> CoreResult<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(message)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)
    }

    fn password(&self, message: &str) -> CoreResult<String> {
        Password::with_theme(&self.theme)
            .with_prompt(message)
            .allow_empty_password(true)
            .interact()
            .map_err(prompt_error)
    }

    fn select(&self, message: &str, options: &[&str], default: usize) -> CoreResult<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(options)
            .default(default)
            .interact()
            .map_err(prompt_error)
    }
}
