//! Line-oriented TCP queue sink.
//!
//! Protocol: on connect the client sends one auth line
//! `{"auth_key":"..."}`, then one JSON event per line. Nothing is read back.
//! A failed write drops the connection; the next send reconnects.

use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{info, warn};

use super::{EventSink, PublishError};

pub struct TcpQueueSink {
    host: String,
    port: u16,
    auth_key: String,
    connect_timeout: Duration,
    write_timeout: Duration,
    stream: Option<TcpStream>,
}

impl TcpQueueSink {
    /// Connect and authenticate. Fails if the queue cannot be reached.
    pub fn connect(
        host: &str,
        port: u16,
        auth_key: &str,
        connect_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Self, PublishError> {
        let mut sink = TcpQueueSink {
            host: host.to_string(),
            port,
            auth_key: auth_key.to_string(),
            connect_timeout,
            write_timeout,
            stream: None,
        };
        sink.reconnect()?;
        Ok(sink)
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn reconnect(&mut self) -> Result<(), PublishError> {
        let endpoint = self.endpoint();
        let unreachable = |source| PublishError::Unreachable {
            endpoint: endpoint.clone(),
            source,
        };

        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(unreachable)?;
        let mut last_err = std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "host resolved to no addresses",
        );
        let mut connected = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    connected = Some(stream);
                    break;
                }
                Err(e) => last_err = e,
            }
        }
        let mut stream = connected.ok_or_else(|| unreachable(last_err))?;
        stream
            .set_write_timeout(Some(self.write_timeout))
            .map_err(unreachable)?;
        stream.set_nodelay(true).map_err(unreachable)?;

        let auth = serde_json::json!({ "auth_key": self.auth_key }).to_string();
        write_line(&mut stream, &auth).map_err(unreachable)?;

        info!(endpoint = %endpoint, "connected to event queue");
        self.stream = Some(stream);
        Ok(())
    }
}

fn write_line(stream: &mut TcpStream, line: &str) -> std::io::Result<()> {
    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');
    stream.write_all(&buf)?;
    stream.flush()
}

impl EventSink for TcpQueueSink {
    fn send(&mut self, payload: &str) -> Result<(), PublishError> {
        if self.stream.is_none() {
            self.reconnect()?;
        }
        let Some(stream) = self.stream.as_mut() else {
            return Err(PublishError::Disconnected);
        };
        if let Err(source) = write_line(stream, payload) {
            warn!(endpoint = %self.endpoint(), error = %source, "queue write failed; dropping connection");
            self.stream = None;
            return Err(PublishError::Io {
                endpoint: self.endpoint(),
                source,
            });
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.endpoint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::thread;

    const TIMEOUT: Duration = Duration::from_secs(2);

    #[test]
    fn test_auth_then_event_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            BufReader::new(stream)
                .lines()
                .take(2)
                .collect::<Result<Vec<_>, _>>()
                .unwrap()
        });

        let mut sink = TcpQueueSink::connect("127.0.0.1", port, "secret", TIMEOUT, TIMEOUT).unwrap();
        assert!(sink.is_connected());
        sink.send(r#"{"file_path":"a.csv","event_type":"E"}"#).unwrap();

        let lines = server.join().unwrap();
        let auth: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(auth["auth_key"], "secret");
        assert_eq!(lines[1], r#"{"file_path":"a.csv","event_type":"E"}"#);
    }

    #[test]
    fn test_refused_connection_is_unreachable() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = TcpQueueSink::connect("127.0.0.1", port, "k", TIMEOUT, TIMEOUT)
            .err()
            .unwrap();
        assert!(matches!(err, PublishError::Unreachable { .. }));
        assert_eq!(sampler_common::Error::from(&err).code(), 50);
    }
}
