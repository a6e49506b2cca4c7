//! TCP publisher
//!
//! Writes each publish to a remote collector as a framed message:
//!
//! ```text
//! PUB <subject> <payload length>\r\n
//! <payload>\r\n
//! ```

use super::{Transport, TransportError};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on each connection attempt, including reconnects made
/// while the stream lock is held
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Transport that publishes frames over a single TCP connection
///
/// # Example
///
/// ```no_run
/// use log_forwarder::transport::TcpTransport;
/// use log_forwarder::LogForwarder;
/// use std::sync::Arc;
///
/// let transport = TcpTransport::connect("127.0.0.1:4222")
///     .expect("Failed to connect to collector");
///
/// let forwarder = LogForwarder::new(Arc::new(transport), "logs.app").unwrap();
/// ```
pub struct TcpTransport {
    stream: Mutex<Option<TcpStream>>,
    address: String,
    reconnect_on_error: bool,
    closed: AtomicBool,
}

impl TcpTransport {
    /// Connect to a collector
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address (e.g., "localhost:4222", "192.168.1.1:9000")
    ///
    /// # Errors
    ///
    /// Returns error if connection fails
    pub fn connect(addr: impl ToSocketAddrs + ToString) -> Result<Self, TransportError> {
        let address = addr.to_string();
        let stream = Self::open(&address)?;

        Ok(Self {
            stream: Mutex::new(Some(stream)),
            address,
            reconnect_on_error: false,
            closed: AtomicBool::new(false),
        })
    }

    /// Enable or disable one reconnect attempt after a failed write
    ///
    /// Default: disabled
    #[must_use]
    pub fn with_reconnect(mut self, enable: bool) -> Self {
        self.reconnect_on_error = enable;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Shut the connection down; later publishes fail with `Closed`
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        if let Some(stream) = self.stream.lock().take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    }

    fn open(address: &str) -> Result<TcpStream, TransportError> {
        let mut last_err = None;

        for addr in address.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
                Ok(stream) => {
                    // Set timeouts to prevent hanging
                    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err
            .unwrap_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("'{}' resolved to no addresses", address),
                )
            })
            .into())
    }

    fn frame(subject: &str, payload: &[u8]) -> Vec<u8> {
        let header = format!("PUB {} {}\r\n", subject, payload.len());
        let mut frame = Vec::with_capacity(header.len() + payload.len() + 2);
        frame.extend_from_slice(header.as_bytes());
        frame.extend_from_slice(payload);
        frame.extend_from_slice(b"\r\n");
        frame
    }
}

impl Transport for TcpTransport {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        if subject.is_empty() || subject.contains(char::is_whitespace) {
            return Err(TransportError::other(format!("invalid subject '{}'", subject)));
        }

        let frame = Self::frame(subject, payload);
        let mut guard = self.stream.lock();

        let result = match guard.as_mut() {
            Some(stream) => stream.write_all(&frame),
            None if self.reconnect_on_error => {
                let mut stream = Self::open(&self.address)?;
                let result = stream.write_all(&frame);
                *guard = Some(stream);
                result
            }
            None => return Err(TransportError::NotConnected),
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                // Connection lost
                *guard = None;

                if !self.reconnect_on_error {
                    return Err(e.into());
                }

                match Self::open(&self.address) {
                    Ok(mut stream) => {
                        stream.write_all(&frame)?;
                        *guard = Some(stream);
                        Ok(())
                    }
                    Err(reconnect_err) => Err(TransportError::other(format!(
                        "Failed to publish and reconnect: {} (reconnect: {})",
                        e, reconnect_err
                    ))),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read};
    use std::net::TcpListener;

    #[test]
    fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        assert!(TcpTransport::connect(addr).is_err());
    }

    #[test]
    fn test_reconnect_attempt_is_bounded() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let transport = TcpTransport::connect(addr).unwrap().with_reconnect(true);

        // Lose the connection and the collector behind it
        let (accepted, _) = listener.accept().unwrap();
        drop(accepted);
        drop(listener);
        *transport.stream.lock() = None;

        let started = std::time::Instant::now();
        assert!(transport.publish("logs.app", b"x").is_err());
        assert!(started.elapsed() < CONNECT_TIMEOUT + Duration::from_secs(1));
        assert!(transport.stream.lock().is_none());
    }

    #[test]
    fn test_open_resolves_host_names() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let transport = TcpTransport::connect(format!("localhost:{}", port)).unwrap();
        assert_eq!(transport.address(), format!("localhost:{}", port));
    }

    #[test]
    fn test_frame_layout() {
        let frame = TcpTransport::frame("logs.app", b"{\"msg\":\"hi\"}");
        assert_eq!(frame, b"PUB logs.app 12\r\n{\"msg\":\"hi\"}\r\n".to_vec());
    }

    #[test]
    fn test_publish_writes_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut header = String::new();
            reader.read_line(&mut header).unwrap();
            let len: usize = header.trim_end().rsplit(' ').next().unwrap().parse().unwrap();
            let mut payload = vec![0u8; len + 2];
            reader.read_exact(&mut payload).unwrap();
            (header, payload)
        });

        let transport = TcpTransport::connect(addr).unwrap();
        transport.publish("logs.app", b"hello").unwrap();

        let (header, payload) = server.join().unwrap();
        assert_eq!(header, "PUB logs.app 5\r\n");
        assert_eq!(payload, b"hello\r\n".to_vec());
    }

    #[test]
    fn test_close_rejects_publish() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let transport = TcpTransport::connect(listener.local_addr().unwrap()).unwrap();

        transport.close();

        assert!(transport.is_closed());
        assert!(matches!(
            transport.publish("logs.app", b"x"),
            Err(TransportError::Closed)
        ));
    }

    #[test]
    fn test_invalid_subject() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let transport = TcpTransport::connect(listener.local_addr().unwrap()).unwrap();

        assert!(matches!(
            transport.publish("logs app", b"x"),
            Err(TransportError::Other(_))
        ));
    }
}
