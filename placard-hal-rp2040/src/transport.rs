//! Polled HTTP transport over embassy-net
//!
//! One TCP socket, reused across requests; `Connection: close` framing
//! so the body runs to EOF. Each poll step performs at most one
//! bounded socket read and translates it into a transport event.

use defmt::{info, warn};
use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::Stack;
use embassy_time::{with_timeout, Duration};
use embedded_io_async::Write;
use heapless::{String, Vec};
use placard_core::traits::{SyncTransport, TransportEvent};

/// Bounded wait per poll step
const POLL_WAIT: Duration = Duration::from_secs(1);

/// Connect timeout per request
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum accumulated response header block
const MAX_HEADER_BYTES: usize = 1024;

/// Read chunk size per poll step
const CHUNK_BYTES: usize = 1024;

/// Errors from the HTTP transport
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// DNS lookup failed
    Dns,
    /// TCP connect failed or timed out
    Connect,
    /// Socket write failed
    Send,
    /// Socket read failed
    Recv,
    /// Connection closed before the header block finished
    TruncatedHeaders,
    /// Header block exceeded the accumulation bound
    HeaderOverflow,
    /// Status line was not parseable
    BadStatusLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No transfer in flight
    Idle,
    /// Accumulating the header block
    Headers,
    /// Headers delivered; leftover bytes from the header read pending
    BodyLeftover,
    /// Streaming body reads
    Body,
}

/// The embassy-net HTTP transport
pub struct HttpTransport<'d> {
    stack: Stack<'d>,
    socket: TcpSocket<'d>,
    host: &'static str,
    port: u16,
    phase: Phase,
    status: u16,
    header: Vec<u8, MAX_HEADER_BYTES>,
    /// End of the header block within `header`
    header_end: usize,
    chunk: [u8; CHUNK_BYTES],
}

impl<'d> HttpTransport<'d> {
    /// Create the transport over a configured network stack
    ///
    /// `rx_buffer`/`tx_buffer` back the TCP socket for the life of the
    /// transport.
    pub fn new(
        stack: Stack<'d>,
        rx_buffer: &'d mut [u8],
        tx_buffer: &'d mut [u8],
        host: &'static str,
        port: u16,
    ) -> Self {
        Self {
            stack,
            socket: TcpSocket::new(stack, rx_buffer, tx_buffer),
            host,
            port,
            phase: Phase::Idle,
            status: 0,
            header: Vec::new(),
            header_end: 0,
            chunk: [0; CHUNK_BYTES],
        }
    }

    async fn read_step(&mut self) -> Result<Option<usize>, TransportError> {
        match with_timeout(POLL_WAIT, self.socket.read(&mut self.chunk)).await {
            Ok(Ok(n)) => Ok(Some(n)),
            Ok(Err(_)) => Err(TransportError::Recv),
            Err(_) => Ok(None), // nothing arrived within the bounded wait
        }
    }
}

impl SyncTransport for HttpTransport<'_> {
    type Error = TransportError;

    async fn request(&mut self, path: &str) -> Result<(), TransportError> {
        // Any unfinished previous transfer is discarded
        self.socket.abort();
        self.phase = Phase::Idle;
        self.status = 0;
        self.header.clear();
        self.header_end = 0;

        let addrs = self
            .stack
            .dns_query(self.host, DnsQueryType::A)
            .await
            .map_err(|_| TransportError::Dns)?;
        let addr = *addrs.first().ok_or(TransportError::Dns)?;

        let connect = self.socket.connect((addr, self.port));
        match with_timeout(CONNECT_TIMEOUT, connect).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("connect to {}:{} failed: {:?}", self.host, self.port, e);
                return Err(TransportError::Connect);
            }
            Err(_) => return Err(TransportError::Connect),
        }

        let mut request: String<512> = String::new();
        use core::fmt::Write as _;
        write!(
            request,
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            path, self.host
        )
        .map_err(|_| TransportError::Send)?;

        self.socket
            .write_all(request.as_bytes())
            .await
            .map_err(|_| TransportError::Send)?;

        info!("GET {}", path);
        self.phase = Phase::Headers;
        Ok(())
    }

    async fn poll(&mut self) -> Result<TransportEvent<'_>, TransportError> {
        match self.phase {
            Phase::Idle => Ok(TransportEvent::Idle),

            Phase::Headers => {
                let Some(n) = self.read_step().await? else {
                    return Ok(TransportEvent::Idle);
                };
                if n == 0 {
                    return Err(TransportError::TruncatedHeaders);
                }
                let (chunk, header) = (&self.chunk[..n], &mut self.header);
                header
                    .extend_from_slice(chunk)
                    .map_err(|_| TransportError::HeaderOverflow)?;

                let Some(end) = self
                    .header
                    .windows(4)
                    .position(|w| w == b"\r\n\r\n")
                else {
                    // Blank line not seen yet; keep accumulating
                    return Ok(TransportEvent::Idle);
                };

                self.header_end = end + 4;
                self.status = parse_status(&self.header[..self.header_end])?;
                self.phase = Phase::BodyLeftover;
                Ok(TransportEvent::Headers(&self.header[..self.header_end]))
            }

            Phase::BodyLeftover => {
                self.phase = Phase::Body;
                // Body bytes that arrived in the same read as the
                // header tail
                Ok(TransportEvent::Body(&self.header[self.header_end..]))
            }

            Phase::Body => {
                let Some(n) = self.read_step().await? else {
                    return Ok(TransportEvent::Idle);
                };
                if n == 0 {
                    self.phase = Phase::Idle;
                    self.socket.close();
                    return Ok(TransportEvent::Complete {
                        status: self.status,
                    });
                }
                Ok(TransportEvent::Body(&self.chunk[..n]))
            }
        }
    }
}

/// Pull the status code out of `HTTP/1.x NNN ...`
fn parse_status(header: &[u8]) -> Result<u16, TransportError> {
    let line_end = header
        .windows(2)
        .position(|w| w == b"\r\n")
        .ok_or(TransportError::BadStatusLine)?;
    let line = &header[..line_end];

    let after_proto = line
        .iter()
        .position(|&b| b == b' ')
        .ok_or(TransportError::BadStatusLine)?
        + 1;
    let digits = line[after_proto..]
        .split(|&b| b == b' ')
        .next()
        .ok_or(TransportError::BadStatusLine)?;

    let mut status: u16 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(TransportError::BadStatusLine);
        }
        status = status
            .checked_mul(10)
            .and_then(|s| s.checked_add((b - b'0') as u16))
            .ok_or(TransportError::BadStatusLine)?;
    }
    if status == 0 {
        return Err(TransportError::BadStatusLine);
    }
    Ok(status)
}
