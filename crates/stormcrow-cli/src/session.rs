use anyhow::{anyhow, Result};
use futures::StreamExt;

use crate::prompt::{InputType, Prompt};
use stormcrow::agent::{Agent, AgentEvent};

/// How a single question ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Answered(String),
    Failed(String),
    Cancelled,
}

pub struct Session<'a> {
    agent: Agent,
    prompt: Box<dyn Prompt + 'a>,
}

impl<'a> Session<'a> {
    pub fn new(agent: Agent, prompt: Box<impl Prompt + 'a>) -> Self {
        Session { agent, prompt }
    }

    /// Read questions until the user exits. A failed question is reported and
    /// the session keeps going.
    pub async fn start(&mut self) -> Result<()> {
        self.prompt.stormcrow_ready();

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = &input.content {
                        self.process_query(content).await;
                    }
                }
                InputType::Exit => break,
                InputType::AskAgain => continue,
            }
        }

        self.prompt.close();
        Ok(())
    }

    /// Answer one question and return, failing if no answer was produced
    pub async fn headless_start(&mut self, query: &str) -> Result<String> {
        match self.process_query(query).await {
            Outcome::Answered(answer) => Ok(answer),
            Outcome::Failed(reason) => Err(anyhow!(reason)),
            Outcome::Cancelled => Err(anyhow!("Interrupted")),
        }
    }

    pub async fn process_query(&mut self, query: &str) -> Outcome {
        let Session { agent, prompt } = self;

        prompt.show_busy();
        let mut transcript = match agent.start(query) {
            Ok(transcript) => transcript,
            Err(e) => {
                prompt.hide_busy();
                prompt.render_error(&e.to_string());
                return Outcome::Failed(e.to_string());
            }
        };

        let outcome = {
            let mut stream = agent.reply(&mut transcript);
            let mut answer = None;
            loop {
                tokio::select! {
                    event = stream.next() => {
                        match event {
                            Some(Ok(event)) => {
                                if let AgentEvent::Output(content) = &event {
                                    answer = Some(content.clone());
                                }
                                prompt.render(&event);
                            }
                            Some(Err(e)) => {
                                tracing::warn!(error = %e, "query failed");
                                prompt.render_error(&e.to_string());
                                break Outcome::Failed(e.to_string());
                            }
                            None => {
                                break match answer.take() {
                                    Some(answer) => Outcome::Answered(answer),
                                    None => Outcome::Failed("Reply ended without an answer".to_string()),
                                };
                            }
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        break Outcome::Cancelled;
                    }
                }
            }
        };

        tracing::debug!(messages = transcript.len(), "query finished");
        prompt.hide_busy();
        if outcome == Outcome::Cancelled {
            prompt.render_interrupt();
        }
        outcome
    }
}
