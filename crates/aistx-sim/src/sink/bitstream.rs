//! Bit-string sinks
//!
//! The alternate backend consumes the pre-modulation frame as text: one
//! `'0'/'1'` line per message, NRZI line bits exactly as the modulator would
//! see them.
//!
//! A write that fails part way leaves a fragment behind. The next line is
//! then preceded by an extra `'\n'`, so the fragment sits on a line of its
//! own and fails its frame check at the receiver instead of running into
//! the following frame.

use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{Sink, SinkError, SinkInput, SinkResult, Transmission};

/// Write `line` in full, returning how many bytes went out before any error.
fn write_line<W: Write + ?Sized>(writer: &mut W, line: &[u8]) -> (usize, io::Result<()>) {
    let mut written = 0;
    while written < line.len() {
        match writer.write(&line[written..]) {
            Ok(0) => {
                let e = io::Error::new(io::ErrorKind::WriteZero, "failed to write whole line");
                return (written, Err(e));
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return (written, Err(e)),
        }
    }
    (written, writer.flush())
}

/// Bit string plus newline, led by a line break when the last write was torn
fn frame_line(tx: &Transmission, torn: bool) -> Vec<u8> {
    let bits = tx.frame.to_bit_string();
    let mut line = Vec::with_capacity(bits.len() + 2);
    if torn {
        line.push(b'\n');
    }
    line.extend_from_slice(bits.as_bytes());
    line.push(b'\n');
    line
}

/// Writes one bit-string line per transmission to any writer.
pub struct BitStreamSink<W: Write + Send> {
    name: String,
    writer: Option<W>,
    lines: u64,
    torn: bool,
}

impl<W: Write + Send> BitStreamSink<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer: Some(writer),
            lines: 0,
            torn: false,
        }
    }

    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    /// Give back the writer, flushing it first
    pub fn into_inner(mut self) -> Option<W> {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
        self.writer.take()
    }
}

impl<W: Write + Send> Sink for BitStreamSink<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn input(&self) -> SinkInput {
        SinkInput::Bits
    }

    fn emit(&mut self, tx: &Transmission) -> SinkResult<()> {
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;
        let line = frame_line(tx, self.torn);
        let (written, result) = write_line(writer, &line);
        if let Err(e) = result {
            if written > 0 && written < line.len() {
                warn!(sink = %self.name, written, "bit line cut short");
                self.torn = true;
            }
            return Err(e.into());
        }
        self.torn = false;
        self.lines += 1;
        Ok(())
    }

    fn close(&mut self) -> SinkResult<()> {
        if let Some(mut w) = self.writer.take() {
            w.flush()?;
        }
        Ok(())
    }
}

/// Bit-string lines over TCP.
///
/// Connects on first use and again after any write failure; while the
/// endpoint is unreachable every emit reports `SinkUnavailable`.
#[derive(Debug)]
pub struct TcpBitSink {
    address: String,
    name: String,
    stream: Option<TcpStream>,
    connect_timeout: Duration,
    write_timeout: Option<Duration>,
    closed: bool,
    torn: bool,
}

impl TcpBitSink {
    pub fn new(address: impl Into<String>, connect_timeout: Duration) -> Self {
        let address = address.into();
        Self {
            name: format!("tcp:{address}"),
            address,
            stream: None,
            connect_timeout,
            write_timeout: Some(Duration::from_secs(5)),
            closed: false,
            torn: false,
        }
    }

    pub fn set_write_timeout(&mut self, timeout: Option<Duration>) {
        self.write_timeout = timeout;
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn connect(&mut self) -> io::Result<&mut TcpStream> {
        if self.stream.is_none() {
            let addr = self
                .address
                .to_socket_addrs()?
                .next()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
            let stream = TcpStream::connect_timeout(&addr, self.connect_timeout)?;
            stream.set_write_timeout(self.write_timeout)?;
            stream.set_nodelay(true)?;
            info!(address = %self.address, "bit stream connected");
            self.stream = Some(stream);
        }
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "not connected"))
    }
}

impl Sink for TcpBitSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn input(&self) -> SinkInput {
        SinkInput::Bits
    }

    fn emit(&mut self, tx: &Transmission) -> SinkResult<()> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        let line = frame_line(tx, self.torn);
        let (written, result) = match self.connect() {
            Ok(stream) => write_line(stream, &line),
            Err(e) => (0, Err(e)),
        };
        match result {
            Ok(()) => {
                self.torn = false;
                debug!(mmsi = tx.mmsi, bits = tx.frame.len(), "bit stream sent");
                Ok(())
            }
            Err(e) => {
                // A stream that failed mid-write is never reused
                if self.stream.take().is_some() {
                    warn!(address = %self.address, error = %e, written, "bit stream connection lost");
                }
                if written > 0 && written < line.len() {
                    self.torn = true;
                }
                Err(SinkError::SinkUnavailable(format!("{}: {}", self.address, e)))
            }
        }
    }

    fn close(&mut self) -> SinkResult<()> {
        self.closed = true;
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        Ok(())
    }
}
