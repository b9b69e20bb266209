//! Decision points of the update flow
//!
//! Every question the updater asks goes through [`Selector`], so the release
//! resolution and version checks never read from stdin themselves.

#[cfg(test)]
use std::collections::VecDeque;

use inquire::{InquireError, Select, Text};

use crate::error::Result;

/// Label appended to every interactive menu
const EXIT_LABEL: &str = "Exit";

/// A question for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionRequest {
    /// Pick one of `options` (an Exit choice is always available)
    Menu { prompt: String, options: Vec<String> },
    /// Enter free text
    Text { prompt: String },
}

impl SelectionRequest {
    pub fn menu(prompt: impl Into<String>, options: Vec<String>) -> Self {
        SelectionRequest::Menu {
            prompt: prompt.into(),
            options,
        }
    }

    pub fn text(prompt: impl Into<String>) -> Self {
        SelectionRequest::Text {
            prompt: prompt.into(),
        }
    }
}

/// The user's answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionResponse {
    /// Zero-based index into the menu options
    Choice(usize),
    Text(String),
    /// Exit, cancel, or anything that cannot be interpreted
    Exit,
}

/// Source of answers for [`SelectionRequest`]s
pub trait Selector {
    fn select(&mut self, request: SelectionRequest) -> Result<SelectionResponse>;
}

/// Terminal menus rendered with inquire
#[derive(Debug, Default)]
pub struct InteractiveSelector;

/// One menu line, numbered from 1 like the printed menus users know
struct MenuEntry {
    index: Option<usize>,
    label: String,
}

impl std::fmt::Display for MenuEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

fn menu_entries(options: &[String]) -> Vec<MenuEntry> {
    let mut entries: Vec<MenuEntry> = options
        .iter()
        .enumerate()
        .map(|(index, option)| MenuEntry {
            index: Some(index),
            label: format!("{}. {}", index + 1, option),
        })
        .collect();
    entries.push(MenuEntry {
        index: None,
        label: format!("{}. {}", options.len() + 1, EXIT_LABEL),
    });
    entries
}

fn interrupted_as_exit<T>(result: std::result::Result<Option<T>, InquireError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(value),
        Err(InquireError::OperationInterrupted | InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Selector for InteractiveSelector {
    fn select(&mut self, request: SelectionRequest) -> Result<SelectionResponse> {
        match request {
            SelectionRequest::Menu { prompt, options } => {
                let entries = menu_entries(&options);
                let page_size = entries.len().clamp(1, 15);
                let picked = interrupted_as_exit(
                    Select::new(&prompt, entries)
                        .with_starting_cursor(0)
                        .with_page_size(page_size)
                        .without_filtering()
                        .with_help_message("↑↓ to move, ENTER to select, ESC to exit")
                        .prompt_skippable(),
                )?;
                Ok(match picked.and_then(|entry| entry.index) {
                    Some(index) => SelectionResponse::Choice(index),
                    None => SelectionResponse::Exit,
                })
            }
            SelectionRequest::Text { prompt } => {
                let value = interrupted_as_exit(Text::new(&prompt).prompt_skippable())?;
                Ok(match value.map(|v| v.trim().to_string()) {
                    Some(v) if !v.is_empty() => SelectionResponse::Text(v),
                    _ => SelectionResponse::Exit,
                })
            }
        }
    }
}

/// Replays canned answers; answers [`SelectionResponse::Exit`] once exhausted
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedSelector {
    responses: VecDeque<SelectionResponse>,
    /// Every request received, in order
    pub asked: Vec<SelectionRequest>,
}

#[cfg(test)]
impl ScriptedSelector {
    pub fn new(responses: impl IntoIterator<Item = SelectionResponse>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
            asked: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Selector for ScriptedSelector {
    fn select(&mut self, request: SelectionRequest) -> Result<SelectionResponse> {
        self.asked.push(request);
        Ok(self.responses.pop_front().unwrap_or(SelectionResponse::Exit))
    }
}
