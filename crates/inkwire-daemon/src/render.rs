//! Terminal stand-in for the display.

use inkwire_client::Renderer;
use inkwire_core::Notification;
use std::io::{self, Write};

const RULE: &str = "----------------------------------------";

/// Writes each notification as a short block of text.
pub struct TerminalRenderer<W> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn write(&mut self, notification: &Notification) -> io::Result<()> {
        match notification {
            Notification::PlainText { body } => {
                writeln!(self.out, "{body}")?;
            }
            Notification::Attachment {
                pretext,
                title,
                body,
            } => {
                for line in [pretext, title, body] {
                    if !line.is_empty() {
                        writeln!(self.out, "{line}")?;
                    }
                }
            }
            Notification::Ignored => return Ok(()),
        }
        writeln!(self.out, "{RULE}")?;
        self.out.flush()
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, notification: Notification) {
        if let Err(e) = self.write(&notification) {
            tracing::warn!("Failed to render notification: {}", e);
        }
    }
}
