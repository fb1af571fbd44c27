use std::collections::VecDeque;
use std::io::{self, BufRead, StdinLock, Stdout, Write};

use crate::error::{Error, Result};

/// The input/output capability the engine runs against.
///
/// Besides plain emit/consume, a port must be able to take back what it
/// produced and give back what it handed out, so that a step can be undone.
pub trait IoPort {
    fn emit(&mut self, text: &str) -> Result<()>;

    /// Take the next pending character, blocking on the source if needed.
    fn consume_char(&mut self) -> Result<char>;

    /// Take characters until one is a decimal digit and return its value.
    /// Non-digits skipped on the way are discarded, unless the input runs
    /// out first, in which case they are left pending.
    fn consume_digit(&mut self) -> Result<u8>;

    /// Best-effort retraction of the most recently emitted `text`.
    fn unemit(&mut self, text: &str) -> Result<()>;

    /// Put `c` back at the front of the pending input.
    fn unconsume_char(&mut self, c: char);

    /// Put the digit `d` back at the front of the pending input.
    fn unconsume_digit(&mut self, d: u8);
}

/// Pending characters in front of a line-oriented reader.
#[derive(Debug)]
struct InputQueue<R> {
    reader: R,
    pending: VecDeque<char>,
}

impl<R: BufRead> InputQueue<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
        }
    }

    fn next(&mut self) -> Result<char> {
        loop {
            if let Some(c) = self.pending.pop_front() {
                return Ok(c);
            }
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(Error::InputExhausted);
            }
            self.pending.extend(line.chars());
        }
    }

    /// A fresh line straight from the reader, without its line break.
    /// Pending characters are left alone. `None` at end of input.
    fn line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
        }
        if line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    fn unread(&mut self, c: char) {
        self.pending.push_front(c);
    }

    /// Put characters taken in order back at the front, in the same order.
    fn unread_all(&mut self, taken: Vec<char>) {
        for c in taken.into_iter().rev() {
            self.pending.push_front(c);
        }
    }

    fn pending(&self) -> String {
        self.pending.iter().collect()
    }
}

fn digit_char(d: u8) -> char {
    char::from_digit(u32::from(d % 10), 10).unwrap_or('0')
}

/// Console backend: raw input from a reader, output straight to a writer,
/// with prompts before each read.
pub struct StandardIo<R, W> {
    input: InputQueue<R>,
    output: W,
}

impl StandardIo<StdinLock<'static>, Stdout> {
    /// Backend bound to the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> StandardIo<R, W> {
    pub fn new(reader: R, output: W) -> Self {
        Self {
            input: InputQueue::new(reader),
            output,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> IoPort for StandardIo<R, W> {
    fn emit(&mut self, text: &str) -> Result<()> {
        self.write(text)
    }

    fn consume_char(&mut self) -> Result<char> {
        self.write(": ")?;
        self.input.next()
    }

    fn consume_digit(&mut self) -> Result<u8> {
        let mut skipped = Vec::new();
        let digit = loop {
            if let Err(e) = self.write("(0-9): ") {
                break Err(e);
            }
            match self.input.next() {
                Ok(c) => match c.to_digit(10) {
                    Some(d) => break Ok(d as u8),
                    None => skipped.push(c),
                },
                Err(e) => break Err(e),
            }
        };
        if digit.is_err() {
            self.input.unread_all(skipped);
        }
        digit
    }

    /// Erases with backspaces. Only text on the current terminal line can be
    /// taken back; line breaks stay where they are.
    fn unemit(&mut self, text: &str) -> Result<()> {
        let tail = text.rsplit('\n').next().unwrap_or_default();
        let erase: String = tail.chars().map(|_| "\u{8} \u{8}").collect();
        self.write(&erase)
    }

    fn unconsume_char(&mut self, c: char) {
        self.input.unread(c);
    }

    fn unconsume_digit(&mut self, d: u8) {
        self.input.unread(digit_char(d));
    }
}

/// Buffered backend for the debugger: output is kept in memory so the
/// display can show its tail and retraction is exact.
pub struct DebugIo<R, W> {
    input: InputQueue<R>,
    prompts: W,
    output: String,
}

impl DebugIo<io::Empty, io::Sink> {
    /// A backend whose whole input is `input`; reading past it fails with
    /// [`Error::InputExhausted`].
    pub fn scripted(input: &str) -> Self {
        let mut io = Self::new(io::empty(), io::sink());
        io.input.pending.extend(input.chars());
        io
    }
}

impl<R: BufRead, W: Write> DebugIo<R, W> {
    pub fn new(reader: R, prompts: W) -> Self {
        Self {
            input: InputQueue::new(reader),
            prompts,
            output: String::new(),
        }
    }

    /// Everything emitted so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Input that has been read from the source but not yet consumed.
    pub fn pending_input(&self) -> String {
        self.input.pending()
    }

    /// The last `n` lines of output, oldest first.
    pub fn tail(&self, n: usize) -> Vec<&str> {
        let lines: Vec<&str> = self.output.split('\n').collect();
        lines[lines.len().saturating_sub(n)..].to_vec()
    }

    /// Read one line from the source, for debugger commands. Program input
    /// already pending stays pending.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        self.input.line()
    }

    fn prompt(&mut self, text: &str) -> Result<()> {
        self.prompts.write_all(text.as_bytes())?;
        self.prompts.flush()?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> IoPort for DebugIo<R, W> {
    fn emit(&mut self, text: &str) -> Result<()> {
        self.output.push_str(text);
        Ok(())
    }

    fn consume_char(&mut self) -> Result<char> {
        if self.input.pending.is_empty() {
            self.prompt(": ")?;
        }
        self.input.next()
    }

    fn consume_digit(&mut self) -> Result<u8> {
        let mut skipped = Vec::new();
        let digit = loop {
            if self.input.pending.is_empty() {
                if let Err(e) = self.prompt("(0-9): ") {
                    break Err(e);
                }
            }
            match self.input.next() {
                Ok(c) => match c.to_digit(10) {
                    Some(d) => break Ok(d as u8),
                    None => skipped.push(c),
                },
                Err(e) => break Err(e),
            }
        };
        if digit.is_err() {
            self.input.unread_all(skipped);
        }
        digit
    }

    fn unemit(&mut self, text: &str) -> Result<()> {
        if self.output.ends_with(text) {
            self.output.truncate(self.output.len() - text.len());
        } else {
            let keep = self.output.chars().count().saturating_sub(text.chars().count());
            self.output = self.output.chars().take(keep).collect();
        }
        Ok(())
    }

    fn unconsume_char(&mut self, c: char) {
        self.input.unread(c);
    }

    fn unconsume_digit(&mut self, d: u8) {
        self.input.unread(digit_char(d));
    }
}
