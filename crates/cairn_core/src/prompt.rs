//! Interactive decisions.
//!
//! Commands never read the terminal directly; they ask a [`Prompter`].
//! The CLI supplies a terminal implementation, tests a [`ScriptedPrompter`].

use crate::error::{CoreError, CoreResult};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Source of user decisions.
pub trait Prompter: Send + Sync {
    /// Asks a yes/no question.
    ///
    /// # Errors
    ///
    /// Returns an error if no answer can be obtained.
    fn confirm(&self, message: &str, default: bool) -> CoreResult<bool>;

    /// Asks for a line of text.
    ///
    /// # Errors
    ///
    /// Returns an error if no answer can be obtained.
    fn input(&self, message: &str) -> CoreResult<String>;

    /// Asks for a secret without echo.
    ///
    /// # Errors
    ///
    /// Returns an error if no answer can be obtained.
    fn password(&self, message: &str) -> CoreResult<String>;

    /// Asks to pick one of `options`; returns its index.
    ///
    /// # Errors
    ///
    /// Returns an error if no answer can be obtained.
    fn select(&self, message: &str, options: &[&str], default: usize) -> CoreResult<usize>;
}

/// A pre-recorded answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Answer to [`Prompter::confirm`].
    Confirm(bool),
    /// Answer to [`Prompter::input`] or [`Prompter::password`].
    Text(String),
    /// Answer to [`Prompter::select`].
    Select(usize),
}

/// Replays queued answers in order and records every question.
///
/// A question with no queued answer, or with an answer of the wrong kind,
/// fails with [`CoreError::Prompt`], unless a fallback confirmation is set.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Answer>>,
    asked: Mutex<Vec<String>>,
    fallback_confirm: Option<bool>,
}

impl ScriptedPrompter {
    /// Creates a prompter with no answers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a prompter that answers every confirmation with `answer`.
    #[must_use]
    pub fn always(answer: bool) -> Self {
        Self {
            fallback_confirm: Some(answer),
            ..Self::default()
        }
    }

    /// Queues an answer.
    #[must_use]
    pub fn then(self, answer: Answer) -> Self {
        self.answers.lock().push_back(answer);
        self
    }

    /// Queues a confirmation.
    #[must_use]
    pub fn then_confirm(self, yes: bool) -> Self {
        self.then(Answer::Confirm(yes))
    }

    /// Queues a text answer.
    #[must_use]
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.then(Answer::Text(text.into()))
    }

    /// Queues a selection.
    #[must_use]
    pub fn then_select(self, index: usize) -> Self {
        self.then(Answer::Select(index))
    }

    /// Every question asked so far.
    #[must_use]
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().clone()
    }

    /// Number of answers not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.lock().len()
    }

    fn next(&self, message: &str) -> Option<Answer> {
        self.asked.lock().push(message.to_string());
        self.answers.lock().pop_front()
    }

    fn unexpected(message: &str, got: Option<Answer>) -> CoreError {
        CoreError::Prompt(format!("no scripted answer for `{message}` (got {got:?})"))
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str, _default: bool) -> CoreResult<bool> {
        match self.next(message) {
            Some(Answer::Confirm(yes)) => Ok(yes),
            None => self
                .fallback_confirm
                .ok_or_else(|| Self::unexpected(message, None)),
            other => Err(Self::unexpected(message, other)),
        }
    }

    fn input(&self, message: &str) -> CoreResult<String> {
        match self.next(message) {
            Some(Answer::Text(text)) => Ok(text),
            other => Err(Self::unexpected(message, other)),
        }
    }

    fn password(&self, message: &str) -> CoreResult<String> {
        self.input(message)
    }

    fn select(&self, message: &str, options: &[&str], _default: usize) -> CoreResult<usize> {
        match self.next(message) {
            Some(Answer::Select(index)) if index < options.len() => Ok(index),
            other => Err(Self::unexpected(message, other)),
        }
    }
}
