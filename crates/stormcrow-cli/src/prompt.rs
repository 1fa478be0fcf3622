use anyhow::Result;
use stormcrow::agent::AgentEvent;

pub mod rustyline;
pub mod thinking;

const EXIT_COMMANDS: [&str; 5] = ["quit", "exit", "q", "/quit", "/exit"];

pub trait Prompt {
    fn render(&mut self, event: &AgentEvent);
    fn render_error(&mut self, message: &str);
    fn get_input(&mut self) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&mut self);
    fn close(&self);
    fn render_interrupt(&mut self) {
        println!(" Interrupt: the question was cancelled, ask another one.");
        println!();
    }
    fn stormcrow_ready(&self) {
        println!();
        println!("Ask about the weather anywhere. Type \"exit\" to quit.");
        println!();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // Optional content as sometimes the user may be issuing a command eg. (Exit)
}

impl Input {
    pub fn message(content: impl Into<String>) -> Self {
        Input {
            input_type: InputType::Message,
            content: Some(content.into()),
        }
    }

    pub fn ask_again() -> Self {
        Input {
            input_type: InputType::AskAgain,
            content: None,
        }
    }

    pub fn exit() -> Self {
        Input {
            input_type: InputType::Exit,
            content: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    AskAgain, // Ask the user for input again. Control flow command.
    Message,  // User sent a message
    Exit,     // User wants to exit the session
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

/// Classify a line the user typed
pub fn parse_input(line: &str) -> Input {
    let text = line.trim();
    if text.is_empty() {
        Input::ask_again()
    } else if EXIT_COMMANDS
        .iter()
        .any(|command| text.eq_ignore_ascii_case(command))
    {
        Input::exit()
    } else {
        Input::message(text)
    }
}
