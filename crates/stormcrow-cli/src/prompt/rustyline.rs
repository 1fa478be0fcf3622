use std::io::{self, Write};

use anyhow::Result;
use bat::WrappingMode;
use cliclack::spinner;
use console::style;
use stormcrow::agent::AgentEvent;

use super::{parse_input, thinking::get_random_thinking_message, Input, Prompt, Theme};

const PROMPT: &str = "\x1b[1m\x1b[38;5;30mstormcrow> \x1b[0m";

pub struct RustylinePrompt {
    spinner: cliclack::ProgressBar,
    busy: bool,
    theme: Theme,
}

impl RustylinePrompt {
    pub fn new() -> Self {
        RustylinePrompt {
            spinner: spinner(),
            busy: false,
            theme: Theme::Dark,
        }
    }

    fn theme_name(&self) -> &'static str {
        match self.theme {
            Theme::Light => "GitHub",
            Theme::Dark => "zenburn",
        }
    }

    fn start_spinner(&mut self) {
        self.spinner = spinner();
        self.spinner
            .start(format!("{}...", get_random_thinking_message()));
    }
}

impl Default for RustylinePrompt {
    fn default() -> Self {
        Self::new()
    }
}

fn print_markdown(content: &str, theme: &str) {
    let printed = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(theme)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print();
    if printed.is_err() {
        println!("{}", content);
    }
}

fn print_newline() {
    println!();
}

impl Prompt for RustylinePrompt {
    fn render(&mut self, event: &AgentEvent) {
        // The spinner shares the terminal line, park it while printing
        if self.busy {
            self.spinner.stop("");
        }

        match event {
            AgentEvent::Start(content) => {
                println!("🔥 {}", style(content).dim());
            }
            AgentEvent::Plan(content) => {
                println!("🧠 {}", style(content).dim().italic());
            }
            AgentEvent::ToolCall { tool, input } => {
                println!(
                    "🔧 Calling: {}({})",
                    style(tool).magenta(),
                    style(input).green()
                );
            }
            AgentEvent::Observation(observation) => {
                println!("🔧 Result: {}", style(&observation.output).green());
            }
            AgentEvent::Output(content) => {
                print_newline();
                println!("🤖");
                print_markdown(content, self.theme_name());
                print_newline();
            }
        }
        let _ = io::stdout().flush();

        if self.busy {
            if matches!(event, AgentEvent::Output(_)) {
                self.busy = false;
            } else {
                self.start_spinner();
            }
        }
    }

    fn render_error(&mut self, message: &str) {
        if self.busy {
            self.spinner.stop("");
            self.busy = false;
        }
        println!("{} {}", style("Error:").red().bold(), style(message).red());
        print_newline();
    }

    fn show_busy(&mut self) {
        self.busy = true;
        self.start_spinner();
    }

    fn hide_busy(&mut self) {
        if self.busy {
            self.spinner.stop("");
            self.busy = false;
        }
    }

    fn get_input(&mut self) -> Result<Input> {
        let mut editor = rustyline::DefaultEditor::new()?;
        let message_text = match editor.readline(PROMPT) {
            Ok(text) => text,
            Err(e) => {
                match e {
                    rustyline::error::ReadlineError::Interrupted
                    | rustyline::error::ReadlineError::Eof => (),
                    _ => eprintln!("Input error: {}", e),
                }
                return Ok(Input::exit());
            }
        };
        let message_text = message_text.trim();

        if message_text.eq_ignore_ascii_case("/t") {
            self.theme = match self.theme {
                Theme::Light => {
                    println!("Switching to Dark theme");
                    Theme::Dark
                }
                Theme::Dark => {
                    println!("Switching to Light theme");
                    Theme::Light
                }
            };
            Ok(Input::ask_again())
        } else if message_text.eq_ignore_ascii_case("/?")
            || message_text.eq_ignore_ascii_case("/help")
        {
            println!("Commands:");
            println!("exit | quit | q - Exit the session");
            println!("/t - Toggle Light/Dark theme");
            println!("/? | /help - Display this help message");
            println!("Ctrl+C - Cancel the current question and keep the session");
            Ok(Input::ask_again())
        } else {
            Ok(parse_input(message_text))
        }
    }

    fn close(&self) {
        println!("{}", style("Goodbye, stay dry.").dim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stormcrow::models::step::Observation;

    #[test]
    fn test_spinner_is_released_after_the_answer() {
        let mut prompt = RustylinePrompt::new();
        prompt.show_busy();

        prompt.render(&AgentEvent::Plan("Looking up Lima".to_string()));
        assert!(prompt.busy);
        prompt.render(&AgentEvent::Observation(Observation::new(
            "get_weather",
            "lima",
            "Overcast +17°C",
        )));
        assert!(prompt.busy);

        prompt.render(&AgentEvent::Output("Overcast and 17°C in Lima.".to_string()));
        assert!(!prompt.busy);

        prompt.hide_busy();
        assert!(!prompt.busy);
    }

    #[test]
    fn test_error_releases_spinner() {
        let mut prompt = RustylinePrompt::new();
        prompt.show_busy();
        prompt.render_error("Provider error: Server error: 503");
        assert!(!prompt.busy);
    }
}
