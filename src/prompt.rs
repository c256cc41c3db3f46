//! Operator input: URLs, output paths, credentials and challenge answers.

use anyhow::Result;
use std::io::{self, BufRead, Write};

pub trait Prompter: Send + Sync {
    /// Show `prompt` and read one line; `None` at end of input
    fn ask(&self, prompt: &str) -> Result<Option<String>>;

    /// Like [`Prompter::ask`] for values that must not be echoed back in logs
    fn ask_secret(&self, prompt: &str) -> Result<Option<String>> {
        self.ask(prompt)
    }
}

/// Reads from stdin, writes prompts to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&self, prompt: &str) -> Result<Option<String>> {
        print!("{}", prompt);
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        Ok(Some(input.trim_end_matches(['\r', '\n']).to_string()))
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers prompts from a fixed list and records what was asked
    #[derive(Default)]
    pub struct ScriptedPrompter {
        answers: Mutex<VecDeque<String>>,
        pub asked: Mutex<Vec<String>>,
    }

    impl ScriptedPrompter {
        pub fn new(answers: &[&str]) -> Self {
            Self {
                answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
                asked: Mutex::new(Vec::new()),
            }
        }

        pub fn asked(&self) -> Vec<String> {
            self.asked.lock().unwrap().clone()
        }
    }

    impl Prompter for ScriptedPrompter {
        fn ask(&self, prompt: &str) -> Result<Option<String>> {
            self.asked.lock().unwrap().push(prompt.to_string());
            Ok(self.answers.lock().unwrap().pop_front())
        }
    }
}
