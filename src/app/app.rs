#[cfg(test)]
#[path = "app_test.rs"]
mod tests;

use std::io::Write;

use chrono::Local;
use eyre::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::app::app_state::AppState;
use crate::app::input::{HELP, Input, is_confirmed, parse_line};
use crate::models::conversation::FindMessage;
use crate::models::{Action, Conversation, Event, Message, Role};

/// Line oriented front end. Reads commands and prompts, forwards them as
/// actions and prints whatever the action service reports back.
pub struct App<W: Write> {
    action_tx: mpsc::UnboundedSender<Action>,
    event_rx: mpsc::UnboundedReceiver<Event>,
    cancel_token: CancellationToken,

    state: AppState,
    out: W,
}

impl<W: Write> App<W> {
    pub fn new(
        action_tx: mpsc::UnboundedSender<Action>,
        event_rx: mpsc::UnboundedReceiver<Event>,
        cancel_token: CancellationToken,
        out: W,
    ) -> App<W> {
        App {
            action_tx,
            event_rx,
            cancel_token,
            state: AppState::default(),
            out,
        }
    }

    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        writeln!(self.out, "Type /help for commands.")?;
        let mut lines = input.lines();
        let result = self.start_loop(&mut lines).await;
        self.cancel_token.cancel();
        self.out.flush()?;
        result
    }

    async fn start_loop<R>(&mut self, lines: &mut Lines<R>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => return Ok(()),

                event = self.event_rx.recv() => {
                    let Some(event) = event else {
                        log::debug!("Event channel closed");
                        return Ok(());
                    };
                    self.handle_event(event)?;
                }

                line = lines.next_line(), if !self.state.quitting => {
                    match line.wrap_err("reading input")? {
                        Some(line) => self.handle_line(&line)?,
                        None => self.begin_quit()?,
                    }
                }
            }

            self.out.flush()?;
            if self.state.quitting && !self.state.loading {
                return Ok(());
            }
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Notice(notice) => writeln!(self.out, "{}", notice)?,

            Event::ConversationChanged(convo) => self.show_conversation(convo)?,

            Event::ConversationList(conversations) => {
                self.state.conversations = conversations;
                if self.state.show_next_list {
                    self.state.show_next_list = false;
                    self.print_list()?;
                }
            }

            Event::ConversationDeleted(id) => {
                let title = self
                    .state
                    .conversations
                    .iter()
                    .find(|c| c.id() == id)
                    .map(|c| c.title().to_string())
                    .unwrap_or(id);
                writeln!(self.out, "Deleted \"{}\"", title)?;
            }

            Event::Loading(loading) => {
                self.state.loading = loading;
                if loading {
                    writeln!(self.out, "... waiting for the assistant")?;
                }
            }

            Event::Error(error) => {
                writeln!(self.out, "error: {}", error)?;
                writeln!(self.out, "  /retry to send again, /dismiss to hide")?;
                self.state.error = Some(error);
            }

            Event::ErrorCleared => self.state.error = None,
        }
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> Result<()> {
        if self.state.confirming_clear {
            self.state.confirming_clear = false;
            if is_confirmed(line) {
                self.send(Action::Clear)?;
            } else {
                writeln!(self.out, "Cancelled")?;
            }
            return Ok(());
        }

        match parse_line(line) {
            Input::Empty => {}

            Input::Prompt(prompt) => {
                if self.wait_for_reply()? {
                    return Ok(());
                }
                // Set ahead of the service's Loading(true) so an immediate
                // quit still waits for the reply.
                self.state.loading = true;
                self.send(Action::Submit(prompt))?;
            }

            Input::Retry => {
                if self.wait_for_reply()? {
                    return Ok(());
                }
                let retryable = self
                    .state
                    .current
                    .as_ref()
                    .and_then(|c| c.last_message_of(Some(Role::User)))
                    .is_some_and(|m| !m.content().trim().is_empty());
                self.state.loading = retryable;
                self.send(Action::Retry)?;
            }

            Input::New => self.send(Action::NewConversation)?,

            Input::List => {
                self.state.show_next_list = true;
                self.send(Action::List)?;
            }

            Input::Select(target) => {
                if let Some(id) = self.resolve(&target)? {
                    self.send(Action::Select(id))?;
                }
            }

            Input::Rename(target, title) => {
                if let Some(id) = self.resolve(&target)? {
                    self.send(Action::Rename(id, title))?;
                }
            }

            Input::Delete(target) => {
                if let Some(id) = self.resolve(&target)? {
                    self.send(Action::Delete(id))?;
                }
            }

            Input::Clear => match &self.state.current {
                Some(convo) => {
                    write!(
                        self.out,
                        "Clear all messages in \"{}\"? [y/N] ",
                        convo.title()
                    )?;
                    self.state.confirming_clear = true;
                }
                None => writeln!(self.out, "No active conversation")?,
            },

            Input::Dismiss => self.send(Action::DismissError)?,

            Input::Help => writeln!(self.out, "{}", HELP)?,

            Input::Quit => self.begin_quit()?,

            Input::Invalid(reason) => writeln!(self.out, "{}", reason)?,
        }
        Ok(())
    }

    fn send(&self, action: Action) -> Result<()> {
        self.action_tx
            .send(action)
            .wrap_err("sending action to the action service")
    }

    fn resolve(&mut self, target: &str) -> Result<Option<String>> {
        let id = self.state.resolve(target).map(|c| c.id().to_string());
        if id.is_none() {
            writeln!(self.out, "No conversation matches \"{}\", try /list", target)?;
        }
        Ok(id)
    }

    fn wait_for_reply(&mut self) -> Result<bool> {
        if self.state.loading {
            writeln!(self.out, "warning: Please wait for the current reply")?;
        }
        Ok(self.state.loading)
    }

    fn begin_quit(&mut self) -> Result<()> {
        self.state.quitting = true;
        if self.state.loading {
            writeln!(self.out, "Waiting for the pending reply before exiting...")?;
        }
        Ok(())
    }

    fn show_conversation(&mut self, convo: Option<Conversation>) -> Result<()> {
        let Some(convo) = convo else {
            self.state.current = None;
            self.state.printed = 0;
            return Ok(());
        };

        let previous = self.state.current.as_ref().filter(|c| c.id() == convo.id());
        match previous {
            None => {
                writeln!(self.out, "=== {} ===", convo.title())?;
                self.state.printed = 0;
            }
            Some(previous) => {
                if previous.title() != convo.title() {
                    writeln!(self.out, "Renamed to \"{}\"", convo.title())?;
                }
                if convo.len() < self.state.printed {
                    writeln!(self.out, "(conversation cleared)")?;
                    self.state.printed = 0;
                }
            }
        }

        for message in &convo.messages()[self.state.printed..] {
            print_message(&mut self.out, message)?;
        }
        self.state.printed = convo.len();
        self.state.current = Some(convo);
        Ok(())
    }

    fn print_list(&mut self) -> Result<()> {
        if self.state.conversations.is_empty() {
            writeln!(self.out, "No conversations yet")?;
            return Ok(());
        }

        let current_id = self.state.current_id();
        for (i, convo) in self.state.conversations.iter().enumerate() {
            let marker = if Some(convo.id()) == current_id { "*" } else { " " };
            writeln!(
                self.out,
                "{} {:>2}. {} ({} messages, {})",
                marker,
                i + 1,
                convo.title(),
                convo.len(),
                convo.updated_at().with_timezone(&Local).format("%Y-%m-%d %H:%M")
            )?;
        }
        Ok(())
    }
}

fn print_message<W: Write>(out: &mut W, message: &Message) -> Result<()> {
    let who = if message.is_user() { "you" } else { "assistant" };
    writeln!(
        out,
        "[{}] {}: {}",
        message.timestamp().with_timezone(&Local).format("%H:%M"),
        who,
        message.content()
    )?;
    Ok(())
}
