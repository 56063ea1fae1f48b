//! Minimal serial console with tab completion.
//!
//! Command tables are `&'static` slices, nestable one level at a time
//! through [`Action::Group`]. The [`Console`] owns a fixed line buffer and
//! is fed one byte at a time from the UART interrupt; all output goes
//! through a caller-supplied [`core::fmt::Write`] sink so the transport
//! stays out of this module.

use core::fmt::{self, Write};
use thiserror::Error;

/// Line terminator used for all console output.
pub const NEW_LINE: &str = "\r\n";

/// Line buffer capacity in bytes.
pub const MAX_LINE: usize = 80;

/// Handler for a leaf command. Receives the argument tail with the command
/// word already stripped.
pub type Handler<C> = fn(&mut C, &str, &mut dyn Write) -> fmt::Result;

pub enum Action<C: 'static> {
    Run(Handler<C>),
    /// Subcommand table; the group word alone is not executable.
    Group(&'static [Command<C>]),
}

pub struct Command<C: 'static> {
    pub name: &'static str,
    pub help: &'static str,
    pub action: Action<C>,
}

/// Why a line failed to dispatch.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ShellError {
    /// No command in the table matches the first word.
    #[error("command not found")]
    NotFound,
    /// More than one command matches the first word.
    #[error("ambiguous command")]
    Ambiguous,
    /// A group name was given without a subcommand.
    #[error("incomplete command")]
    Incomplete,
    /// The output sink failed.
    #[error("console output failed")]
    Output(#[from] fmt::Error),
}

/// Dispatches one input line against a command table.
///
/// Matching is case-insensitive on the full command word. Group entries
/// recurse with the remaining words; a group word with nothing after it is
/// an incomplete command. An empty line is a successful no-op.
pub fn execute<C>(
    commands: &[Command<C>],
    ctx: &mut C,
    line: &str,
    out: &mut dyn Write,
) -> Result<(), ShellError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (line, ""),
    };

    let mut matches = commands.iter().filter(|c| c.name.eq_ignore_ascii_case(word));
    let Some(command) = matches.next() else {
        return Err(ShellError::NotFound);
    };
    if matches.next().is_some() {
        return Err(ShellError::Ambiguous);
    }

    match command.action {
        Action::Run(handler) => {
            handler(ctx, rest, out)?;
            Ok(())
        }
        Action::Group(sub) => {
            if rest.is_empty() {
                Err(ShellError::Incomplete)
            } else {
                execute(sub, ctx, rest, out)
            }
        }
    }
}

fn name_starts_with(name: &str, partial: &str) -> bool {
    name.len() >= partial.len()
        && name.as_bytes()[..partial.len()].eq_ignore_ascii_case(partial.as_bytes())
}

/// Resolves a closed word to its table entry: an exact match wins, then a
/// unique prefix match.
fn resolve<'t, C>(table: &'t [Command<C>], word: &str) -> Option<&'t Command<C>> {
    if let Some(exact) = table.iter().find(|c| c.name.eq_ignore_ascii_case(word)) {
        return Some(exact);
    }
    let mut matches = table.iter().filter(|c| name_starts_with(c.name, word));
    let first = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(first)
}

/// Walks the closed words of `line` down through group tables and returns
/// the table the trailing partial word completes against, plus that
/// partial word. `None` when a closed word does not resolve to a group.
fn completion_table<'l, C>(
    root: &'static [Command<C>],
    line: &'l str,
) -> Option<(&'static [Command<C>], &'l str)> {
    let mut table = root;
    let mut rest = line.trim_start();
    loop {
        match rest.split_once(char::is_whitespace) {
            None => return Some((table, rest)),
            Some((word, tail)) => match resolve(table, word)?.action {
                Action::Group(sub) => {
                    table = sub;
                    rest = tail.trim_start();
                }
                Action::Run(_) => return None,
            },
        }
    }
}

/// Longest shared prefix of two names, compared ASCII case-insensitively.
fn common_prefix(a: &str, b: &str) -> usize {
    a.bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x.eq_ignore_ascii_case(y))
        .count()
}

struct LineEditor {
    buf: [u8; MAX_LINE],
    len: usize,
}

impl LineEditor {
    const fn new() -> Self {
        Self {
            buf: [0; MAX_LINE],
            len: 0,
        }
    }

    fn line(&self) -> &str {
        str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    fn push(&mut self, byte: u8) -> bool {
        if self.len == MAX_LINE {
            return false;
        }
        self.buf[self.len] = byte;
        self.len += 1;
        true
    }

    fn backspace(&mut self) -> bool {
        if self.len == 0 {
            return false;
        }
        self.len -= 1;
        true
    }

    fn clear(&mut self) {
        self.len = 0;
    }

    /// Appends as much of `text` as fits and returns the accepted slice.
    fn extend(&mut self, text: &'static str) -> &'static str {
        let fits = text.len().min(MAX_LINE - self.len);
        self.buf[self.len..self.len + fits].copy_from_slice(&text.as_bytes()[..fits]);
        self.len += fits;
        &text[..fits]
    }
}

/// Interactive line console over a static command table.
pub struct Console<C: 'static> {
    commands: &'static [Command<C>],
    editor: LineEditor,
    prompt: &'static str,
}

impl<C> Console<C> {
    pub const fn new(commands: &'static [Command<C>], prompt: &'static str) -> Self {
        Self {
            commands,
            editor: LineEditor::new(),
            prompt,
        }
    }

    /// Current line buffer contents.
    pub fn line(&self) -> &str {
        self.editor.line()
    }

    /// Prints the initial prompt.
    pub fn start(&self, out: &mut dyn Write) -> fmt::Result {
        out.write_str(self.prompt)
    }

    /// Feeds one input byte.
    ///
    /// Carriage return or line feed executes the buffered line, `?` prints
    /// help for the current word position, tab completes, backspace and
    /// DEL rub out, printable bytes are appended and echoed. Everything
    /// else is ignored.
    pub fn input(&mut self, byte: u8, ctx: &mut C, out: &mut dyn Write) -> fmt::Result {
        match byte {
            b'\r' | b'\n' => self.run_line(ctx, out),
            0x08 | 0x7f => {
                if self.editor.backspace() {
                    out.write_str("\x08 \x08")?;
                }
                Ok(())
            }
            b'\t' => self.complete(out),
            b'?' => self.help(out),
            0x20..=0x7e => {
                if self.editor.push(byte) {
                    out.write_char(byte as char)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn run_line(&mut self, ctx: &mut C, out: &mut dyn Write) -> fmt::Result {
        out.write_str(NEW_LINE)?;
        match execute(self.commands, ctx, self.editor.line(), out) {
            Ok(()) => {}
            Err(ShellError::Output(e)) => return Err(e),
            Err(ShellError::NotFound) => {
                write!(out, "Command not found: {}{}", self.editor.line(), NEW_LINE)?;
            }
            Err(ShellError::Ambiguous) => {
                write!(out, "Ambiguous command: {}{}", self.editor.line(), NEW_LINE)?;
            }
            Err(ShellError::Incomplete) => {
                write!(out, "Incomplete command: {}{}", self.editor.line(), NEW_LINE)?;
            }
        }
        self.editor.clear();
        out.write_str(self.prompt)
    }

    fn complete(&mut self, out: &mut dyn Write) -> fmt::Result {
        // (text to append, whether the word is complete and gets a space)
        let append: Option<(&'static str, bool)> = {
            let Some((table, partial)) = completion_table(self.commands, self.editor.line())
            else {
                return Ok(());
            };
            let mut candidates = table.iter().filter(|c| name_starts_with(c.name, partial));
            let Some(first) = candidates.next() else {
                return Ok(());
            };
            if candidates.next().is_none() {
                Some((&first.name[partial.len()..], true))
            } else {
                let mut shared = first.name.len();
                for candidate in table.iter().filter(|c| name_starts_with(c.name, partial)) {
                    shared = shared.min(common_prefix(first.name, candidate.name));
                }
                if shared > partial.len() {
                    Some((&first.name[partial.len()..shared], false))
                } else {
                    out.write_str(NEW_LINE)?;
                    for candidate in table.iter().filter(|c| name_starts_with(c.name, partial)) {
                        write!(out, "{}: {}{}", candidate.name, candidate.help, NEW_LINE)?;
                    }
                    write!(out, "{}{}", self.prompt, self.editor.line())?;
                    None
                }
            }
        };
        if let Some((text, close)) = append {
            let accepted = self.editor.extend(text);
            out.write_str(accepted)?;
            if close && accepted.len() == text.len() {
                let space = self.editor.extend(" ");
                out.write_str(space)?;
            }
        }
        Ok(())
    }

    fn help(&self, out: &mut dyn Write) -> fmt::Result {
        out.write_str(NEW_LINE)?;
        if let Some((table, _)) = completion_table(self.commands, self.editor.line()) {
            for command in table {
                write!(out, "{}: {}{}", command.name, command.help, NEW_LINE)?;
            }
        }
        write!(out, "{}{}", self.prompt, self.editor.line())
    }
}
