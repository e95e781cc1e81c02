//! Line-oriented console.
//!
//! Reads one line at a time. A line of colors becomes the secret for a
//! codemaker and a guess for a codebreaker; `help` and `quit` are the only
//! other commands. Session updates and notices are printed as they arrive.
//! Input and output are generic so tests can script a whole game.

use std::io;

use codebreak_app::{Notice, SessionHandle};
use codebreak_core::{Role, SessionView};
use codebreak_proto::Code;
use thiserror::Error;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines},
    sync::{mpsc, watch},
};

use crate::render;

/// Console failures.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Reading input or writing output failed
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),
}

enum Flow {
    Continue,
    Quit,
}

/// Console bound to one session.
pub struct Console<R, W> {
    handle: SessionHandle,
    views: watch::Receiver<SessionView>,
    notices: mpsc::Receiver<Notice>,
    input: Lines<R>,
    output: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Wire a console to a running session.
    pub fn new(handle: SessionHandle, notices: mpsc::Receiver<Notice>, input: R, output: W) -> Self {
        let views = handle.subscribe();
        Self { handle, views, notices, input: input.lines(), output }
    }

    /// Run until `quit`, end of input, or the runtime stops.
    pub async fn run(mut self) -> Result<(), ConsoleError> {
        let mut shown = self.views.borrow_and_update().clone();
        let intro = format!("{}\n{}", render::legend(&shown.config), render::status_line(&shown));
        self.say(&intro).await?;

        loop {
            tokio::select! {
                line = self.input.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    if let Flow::Quit = self.handle_line(line.trim()).await? {
                        break;
                    }
                },
                changed = self.views.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = self.views.borrow_and_update().clone();
                    if let Some(text) = render::changes(&shown, &view) {
                        self.say(&text).await?;
                    }
                    shown = view;
                },
                Some(notice) = self.notices.recv() => {
                    self.say(&render::notice(&notice)).await?;
                },
            }
        }

        self.output.flush().await?;
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Result<Flow, ConsoleError> {
        match line {
            "" => return Ok(Flow::Continue),
            "quit" | "exit" | "q" => return Ok(Flow::Quit),
            "help" | "?" => {
                let view = self.handle.view();
                let help = format!(
                    "{}\nenter colors separated by spaces, e.g. `r g b y`\n{}",
                    render::legend(&view.config),
                    render::status_line(&view)
                );
                self.say(&help).await?;
                return Ok(Flow::Continue);
            },
            _ => {},
        }

        let code: Code = match line.parse() {
            Ok(code) => code,
            Err(err) => {
                self.say(&err.to_string()).await?;
                return Ok(Flow::Continue);
            },
        };

        let result = match self.handle.view().role {
            Role::CodeMaker => self.handle.submit_secret(code).await,
            Role::CodeBreaker => self.handle.submit_attempt(code).await,
            Role::Unassigned => {
                self.say("no peer yet").await?;
                return Ok(Flow::Continue);
            },
        };

        if let Err(err) = result {
            tracing::debug!(%err, "command rejected");
            self.say(&format!("rejected: {err}")).await?;
        }

        Ok(Flow::Continue)
    }

    async fn say(&mut self, text: &str) -> Result<(), ConsoleError> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }
}
