//! Character I/O for the machine.
//!
//! The emulator never talks to stdin/stdout directly. It is handed a [`Console`]
//! and calls it from the keyboard status register and from the trap routines.
//!
//! - [`Terminal`]: interactive console on top of crossterm's raw mode.
//! - [`ChannelConsole`]: a reader thread feeding a channel, for piped stdin.
//! - [`StreamConsole`]: any `BufRead`/`Write` pair already in memory, for tests.

use std::collections::VecDeque;
use std::io::{BufRead, ErrorKind, Read, Write};
use std::time::Duration;

use crossbeam_channel as cbc;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tracing::{debug, warn};

use crate::error::ConsoleError;

pub type Result<T> = std::result::Result<T, ConsoleError>;

pub trait Console {
    /// Returns immediately, telling whether [`Console::read_byte`] would not block.
    fn key_available(&mut self) -> Result<bool>;

    /// Blocks until a character is available and consumes it.
    fn read_byte(&mut self) -> Result<u8>;

    fn write_byte(&mut self, byte: u8) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        bytes.iter().try_for_each(|&b| self.write_byte(b))
    }
}

/// Console over a plain input stream and output sink.
///
/// A key counts as available while the input still has unread bytes. Reading past the end
/// of the input is [`ConsoleError::EndOfInput`].
///
/// Availability is checked with `fill_buf`, which waits on a live stream such as a pipe.
/// Use [`ChannelConsole`] for those.
pub struct StreamConsole<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> StreamConsole<R, W> {
    pub fn new(input: R, output: W) -> Self {
        StreamConsole { input, output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl<R: BufRead, W: Write> Console for StreamConsole<R, W> {
    fn key_available(&mut self) -> Result<bool> {
        Ok(!self.input.fill_buf()?.is_empty())
    }

    fn read_byte(&mut self) -> Result<u8> {
        let byte = match self.input.fill_buf()?.first() {
            Some(&b) => b,
            None => return Err(ConsoleError::EndOfInput),
        };
        self.input.consume(1);
        Ok(byte)
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.output.write_all(&[byte])?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }
}

/// Console whose input is read on a separate thread.
///
/// The thread pushes every byte it reads into a channel, so [`Console::key_available`]
/// only has to look at the channel and never waits on the underlying stream. Once the
/// input is exhausted and drained, reads fail with [`ConsoleError::EndOfInput`].
pub struct ChannelConsole<W> {
    input: cbc::Receiver<u8>,
    lookahead: Option<u8>,
    output: W,
}

impl<W: Write> ChannelConsole<W> {
    /// Starts a reader thread on `input`. The thread lives until `input` ends or the
    /// console is dropped and another byte arrives.
    pub fn spawn<R: Read + Send + 'static>(mut input: R, output: W) -> Self {
        let (tx, rx) = cbc::unbounded();
        std::thread::spawn(move || {
            let mut buf = [0u8; 256];
            loop {
                let n = match input.read(&mut buf) {
                    Ok(0) => return,
                    Ok(n) => n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => {
                        warn!("Stopped reading console input: {e}");
                        return;
                    }
                };
                for &byte in &buf[..n] {
                    let Ok(()) = tx.send(byte) else { return };
                }
            }
        });
        Self::from_receiver(rx, output)
    }

    pub fn from_receiver(input: cbc::Receiver<u8>, output: W) -> Self {
        ChannelConsole {
            input,
            lookahead: None,
            output,
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<W: Write> Console for ChannelConsole<W> {
    fn key_available(&mut self) -> Result<bool> {
        if self.lookahead.is_none() {
            match self.input.try_recv() {
                Ok(byte) => self.lookahead = Some(byte),
                Err(cbc::TryRecvError::Empty | cbc::TryRecvError::Disconnected) => {}
            }
        }
        Ok(self.lookahead.is_some())
    }

    fn read_byte(&mut self) -> Result<u8> {
        if let Some(byte) = self.lookahead.take() {
            return Ok(byte);
        }
        self.input.recv().map_err(|_| ConsoleError::EndOfInput)
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.output.write_all(&[byte])?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }
}

/// Interactive console on the controlling terminal.
///
/// Raw mode is enabled for as long as the value lives, so keys arrive unbuffered and
/// unechoed. Dropping it restores the terminal.
pub struct Terminal<W: Write> {
    pending: VecDeque<u8>,
    output: W,
}

impl<W: Write> Terminal<W> {
    pub fn new(output: W) -> Result<Self> {
        terminal::enable_raw_mode()?;
        debug!("Terminal switched to raw mode");
        Ok(Terminal {
            pending: VecDeque::new(),
            output,
        })
    }

    /// Queues the byte for a key event, if it produces one.
    fn accept(&mut self, event: Event) -> Result<()> {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return Ok(());
        };

        let byte = match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(ConsoleError::Interrupted)
            }
            KeyCode::Char(c) if c.is_ascii() && modifiers.contains(KeyModifiers::CONTROL) => {
                c as u8 & 0x1F
            }
            KeyCode::Char(c) if c.is_ascii() => c as u8,
            KeyCode::Enter => b'\n',
            KeyCode::Tab => b'\t',
            KeyCode::Backspace => 0x7F,
            KeyCode::Esc => 0x1B,
            _ => return Ok(()),
        };
        self.pending.push_back(byte);
        Ok(())
    }
}

impl<W: Write> Drop for Terminal<W> {
    fn drop(&mut self) {
        // Nothing left to report the error to at this point
        let _ = self.output.flush();
        let _ = terminal::disable_raw_mode();
    }
}

impl<W: Write> Console for Terminal<W> {
    fn key_available(&mut self) -> Result<bool> {
        while self.pending.is_empty() && event::poll(Duration::ZERO)? {
            let event = event::read()?;
            self.accept(event)?;
        }
        Ok(!self.pending.is_empty())
    }

    fn read_byte(&mut self) -> Result<u8> {
        loop {
            if let Some(byte) = self.pending.pop_front() {
                return Ok(byte);
            }
            let event = event::read()?;
            self.accept(event)?;
        }
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        // Raw mode turns off output processing, so newlines need an explicit carriage return
        if byte == b'\n' {
            self.output.write_all(b"\r\n")?;
        } else {
            self.output.write_all(&[byte])?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_console_reports_availability_until_drained() {
        let mut console = StreamConsole::new(&b"ab"[..], Vec::new());
        assert!(console.key_available().unwrap());
        assert_eq!(console.read_byte().unwrap(), b'a');
        assert!(console.key_available().unwrap());
        assert_eq!(console.read_byte().unwrap(), b'b');
        assert!(!console.key_available().unwrap());
        assert!(matches!(
            console.read_byte(),
            Err(ConsoleError::EndOfInput)
        ));
    }

    #[test]
    fn stream_console_collects_output() {
        let mut console = StreamConsole::new(&b""[..], Vec::new());
        console.write_all(b"hi\n").unwrap();
        console.flush().unwrap();
        assert_eq!(console.output(), b"hi\n");
    }

    /// Blocks in `read` until the paired sender is dropped, like a pipe nobody writes to.
    struct IdleInput(cbc::Receiver<()>);

    impl Read for IdleInput {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[test]
    fn channel_console_does_not_wait_on_idle_input() {
        let (close, idle) = cbc::bounded::<()>(0);
        let mut console = ChannelConsole::spawn(IdleInput(idle), Vec::new());

        let (done_tx, done_rx) = cbc::bounded(1);
        std::thread::spawn(move || {
            let available = console.key_available().unwrap();
            done_tx.send(available).unwrap();
        });

        let available = done_rx.recv_timeout(Duration::from_millis(500));
        assert_eq!(available, Ok(false));
        drop(close);
    }

    #[test]
    fn channel_console_polls_and_reads() {
        let (tx, rx) = cbc::unbounded();
        let mut console = ChannelConsole::from_receiver(rx, Vec::new());
        assert!(!console.key_available().unwrap());

        tx.send(b'k').unwrap();
        assert!(console.key_available().unwrap());
        // polling again must not lose the buffered key
        assert!(console.key_available().unwrap());
        assert_eq!(console.read_byte().unwrap(), b'k');
        assert!(!console.key_available().unwrap());

        tx.send(b'z').unwrap();
        drop(tx);
        assert_eq!(console.read_byte().unwrap(), b'z');
        assert!(!console.key_available().unwrap());
        assert!(matches!(
            console.read_byte(),
            Err(ConsoleError::EndOfInput)
        ));
    }

    #[test]
    fn channel_console_reads_whole_stream() {
        let mut console = ChannelConsole::spawn(&b"hey"[..], Vec::new());
        let read: Vec<u8> = (0..3).map(|_| console.read_byte().unwrap()).collect();
        assert_eq!(read, b"hey");
        assert!(matches!(
            console.read_byte(),
            Err(ConsoleError::EndOfInput)
        ));
        console.write_all(b"ok").unwrap();
        assert_eq!(console.into_output(), b"ok");
    }
}
