//! TN3270 client session over TCP

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::codes::{pf_aid, AID_CLEAR, AID_ENTER, AID_NONE};
use super::ebcdic;
use super::error::Tn3270Error;
use super::screen::{HostRequest, Screen};
use super::telnet::{frame_record, Negotiator, TelnetDecoder, TelnetEvent};
use crate::session::ScreenSession;

/// Upper bound on reads in one drain, so a host that never goes quiet
/// cannot hold a worker forever
const MAX_DRAIN_READS: usize = 256;

const READ_CHUNK: usize = 4096;

/// A live TN3270 connection with its presentation space
pub struct Tn3270Session {
    id: String,
    connect_timeout: Duration,
    drain_timeout: Duration,
    stream: Option<TcpStream>,
    decoder: TelnetDecoder,
    negotiator: Negotiator,
    screen: Screen,
}

impl Tn3270Session {
    pub fn new(connect_timeout: Duration, drain_timeout: Duration) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            connect_timeout,
            drain_timeout,
            stream: None,
            decoder: TelnetDecoder::new(),
            negotiator: Negotiator::new(),
            screen: Screen::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn write_raw(&mut self, bytes: &[u8]) -> Result<(), Tn3270Error> {
        let stream = self.stream.as_mut().ok_or(Tn3270Error::NotConnected)?;
        stream.write_all(bytes).await?;
        Ok(())
    }

    async fn send_record(&mut self, record: &[u8]) -> Result<(), Tn3270Error> {
        let framed = frame_record(record);
        self.write_raw(&framed).await
    }

    async fn send_aid(&mut self, aid: u8) -> Result<(), Tn3270Error> {
        let record = self.screen.inbound(aid);
        trace!("Session {} sending AID 0x{:02X} ({} bytes)", self.id, aid, record.len());
        self.send_record(&record).await
    }

    /// Run received bytes through the telnet layer. Returns the number of
    /// 3270 records applied to the screen.
    async fn process(&mut self, data: &[u8]) -> Result<usize, Tn3270Error> {
        let mut records = 0;

        for event in self.decoder.feed(data)? {
            if let Some(reply) = self.negotiator.reply(&event) {
                trace!("Session {} negotiation {:?}", self.id, event);
                self.write_raw(&reply).await?;
                continue;
            }

            if let TelnetEvent::Record(record) = event {
                records += 1;
                match self.screen.apply(&record)? {
                    HostRequest::None => {}
                    HostRequest::ReadModified => {
                        debug!("Session {} answering host read modified", self.id);
                        let reply = self.screen.inbound(AID_NONE);
                        self.send_record(&reply).await?;
                    }
                    HostRequest::ReadBuffer => {
                        debug!("Session {} answering host read buffer", self.id);
                        let reply = self.screen.read_buffer_reply();
                        self.send_record(&reply).await?;
                    }
                }
            }
        }

        Ok(records)
    }

    /// Single read bounded by `wait`. `Ok(None)` means the wait elapsed.
    async fn read_once(&mut self, wait: Duration) -> Result<Option<usize>, Tn3270Error> {
        let mut buf = [0u8; READ_CHUNK];
        let read = {
            let stream = self.stream.as_mut().ok_or(Tn3270Error::NotConnected)?;
            tokio::time::timeout(wait, stream.read(&mut buf)).await
        };

        match read {
            Err(_) => Ok(None),
            Ok(Ok(0)) => {
                warn!("Session {} closed by host", self.id);
                self.stream = None;
                Err(Tn3270Error::Disconnected)
            }
            Ok(Ok(n)) => {
                let records = self.process(&buf[..n]).await?;
                Ok(Some(records))
            }
            Ok(Err(e)) => {
                self.stream = None;
                Err(Tn3270Error::IoError(e))
            }
        }
    }
}

#[async_trait]
impl ScreenSession for Tn3270Session {
    fn session_id(&self) -> &str {
        &self.id
    }

    async fn initiate(&mut self, host: &str, port: u16) -> Result<(), Tn3270Error> {
        if self.stream.is_some() {
            self.close().await;
        }
        self.decoder = TelnetDecoder::new();
        self.negotiator = Negotiator::new();
        self.screen = Screen::new();

        info!("Session {} connecting to {}:{}", self.id, host, port);

        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| Tn3270Error::Timeout(format!("connecting to {}:{}", host, port)))?
            .map_err(|e| Tn3270Error::ConnectionFailed(e.to_string()))?;
        let _ = stream.set_nodelay(true);
        self.stream = Some(stream);

        // Negotiate until the host paints its first screen
        let deadline = Instant::now() + self.connect_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                self.close().await;
                return Err(Tn3270Error::Timeout(
                    "no screen received after negotiation".to_string(),
                ));
            }

            match self.read_once(remaining).await {
                Ok(Some(records)) if records > 0 => break,
                Ok(_) => continue,
                Err(Tn3270Error::Disconnected) => {
                    return Err(Tn3270Error::ConnectionFailed(
                        "host closed the connection during negotiation".to_string(),
                    ))
                }
                Err(e) => {
                    self.close().await;
                    return Err(e);
                }
            }
        }

        // Pick up anything sent right behind the first screen
        self.read_pending(None).await?;
        debug!("Session {} established", self.id);
        Ok(())
    }

    async fn send_committed(&mut self, text: &str) -> Result<(), Tn3270Error> {
        debug!("Session {} typing {:?} + Enter", self.id, text);
        self.screen.type_text(&ebcdic::encode_str(text));
        self.send_aid(AID_ENTER).await
    }

    async fn send_function_key(&mut self, key: u8) -> Result<(), Tn3270Error> {
        let aid = pf_aid(key)
            .ok_or_else(|| Tn3270Error::ProtocolError(format!("no such function key PF{}", key)))?;
        debug!("Session {} pressing PF{}", self.id, key);
        self.send_aid(aid).await
    }

    async fn send_clear(&mut self) -> Result<(), Tn3270Error> {
        debug!("Session {} pressing Clear", self.id);
        self.screen.clear();
        self.send_aid(AID_CLEAR).await
    }

    async fn read_pending(&mut self, timeout: Option<Duration>) -> Result<(), Tn3270Error> {
        let wait = timeout.unwrap_or(self.drain_timeout);
        for _ in 0..MAX_DRAIN_READS {
            if self.read_once(wait).await?.is_none() {
                return Ok(());
            }
        }
        warn!("Session {} still receiving after {} reads", self.id, MAX_DRAIN_READS);
        Ok(())
    }

    fn is_blank(&self) -> bool {
        self.screen.is_blank()
    }

    fn raw_text(&self) -> String {
        self.screen.text()
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!("Session {} closing", self.id);
            let _ = stream.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScanConfig, Tuning};
    use crate::enumerate::{probe_target, AttemptError, ProbeOutcome, TransactionDriver};
    use crate::tn3270::codes::*;
    use crate::tn3270::ebcdic::encode_str;
    use tokio::net::TcpListener;

    const HOST_DELAY: Duration = Duration::from_millis(500);

    fn screen_record(text: &str) -> Vec<u8> {
        let mut record = vec![0xF5, 0xC3];
        record.extend(encode_str(text));
        frame_record(&record).to_vec()
    }

    fn new_session() -> Tn3270Session {
        Tn3270Session::new(Duration::from_secs(2), Duration::from_millis(100))
    }

    fn carries(record: &[u8], text: &str) -> bool {
        let needle = encode_str(text);
        record.windows(needle.len()).any(|w| w == needle.as_slice())
    }

    /// A region that answers the init command at once and everything
    /// typed after it only after `HOST_DELAY`. PF3 and Clear get no answer.
    async fn slow_region(listener: TcpListener) {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut hello = vec![
            IAC, DO, OPT_TTYPE, IAC, SB, OPT_TTYPE, TTYPE_SEND, IAC, SE, IAC, DO, OPT_EOR, IAC,
            WILL, OPT_EOR, IAC, DO, OPT_BINARY, IAC, WILL, OPT_BINARY,
        ];
        hello.extend(screen_record("WELCOME"));
        socket.write_all(&hello).await.unwrap();

        let mut pending = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            pending.extend_from_slice(&buf[..n]);

            while let Some(end) = pending.windows(2).position(|w| w[0] == IAC && w[1] == EOR) {
                let record: Vec<u8> = pending.drain(..end + 2).collect();
                let answer = if carries(&record, "CESF LOGOFF") {
                    tokio::time::sleep(HOST_DELAY).await;
                    Some("DFHCE3549 Sign-off is complete.")
                } else if carries(&record, "ZZZZ") {
                    tokio::time::sleep(HOST_DELAY).await;
                    Some("DFHAC2001 Transaction 'ZZZZ' is not recognized.")
                } else if carries(&record, "cics") {
                    Some("CICS READY")
                } else {
                    None
                };
                if let Some(text) = answer {
                    if socket.write_all(&screen_record(text)).await.is_err() {
                        return;
                    }
                }
            }
        }
    }

    fn slow_region_config(port: u16) -> ScanConfig {
        let mut config = ScanConfig::new("127.0.0.1", port);
        config.commands = "cics".to_string();
        config.tuning = Tuning {
            drain_timeout_ms: 100,
            wait_initial_ms: 100,
            wait_step_ms: 100,
            ..Tuning::default()
        };
        config
    }

    #[tokio::test]
    async fn test_negotiate_and_submit() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut hello = vec![
                IAC, DO, OPT_TTYPE, IAC, SB, OPT_TTYPE, TTYPE_SEND, IAC, SE, IAC, DO, OPT_EOR,
                IAC, WILL, OPT_EOR, IAC, DO, OPT_BINARY, IAC, WILL, OPT_BINARY,
            ];
            hello.extend(screen_record("WELCOME"));
            socket.write_all(&hello).await.unwrap();

            let needle = encode_str("CEMT");
            let mut seen = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                assert!(n > 0, "client hung up early");
                seen.extend_from_slice(&buf[..n]);
                if seen.windows(needle.len()).any(|w| w == needle.as_slice()) {
                    break;
                }
            }
            socket
                .write_all(&screen_record("TRANSACTION NOT RECOGNIZED"))
                .await
                .unwrap();
            // Hold the connection until the client closes it
            let _ = socket.read(&mut buf).await;
            seen
        });

        let mut session = new_session();
        session.initiate("127.0.0.1", port).await.unwrap();
        assert!(session.contains_text("WELCOME"));

        session.send_clear().await.unwrap();
        assert!(session.is_blank());

        session.send_committed("CEMT").await.unwrap();
        session
            .read_pending(Some(Duration::from_millis(500)))
            .await
            .unwrap();
        assert!(session.contains_text("TRANSACTION NOT RECOGNIZED"));

        session.close().await;
        session.close().await;
        assert!(!session.is_connected());

        let seen = server.await.unwrap();
        // Terminal type answer went out during negotiation
        assert!(seen
            .windows(TERMINAL_TYPE.len())
            .any(|w| w == TERMINAL_TYPE.as_bytes()));
    }

    #[tokio::test]
    async fn test_initiate_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut session = new_session();
        let result = session.initiate("127.0.0.1", port).await;
        assert!(matches!(result, Err(Tn3270Error::ConnectionFailed(_))));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_send_without_connection() {
        let mut session = new_session();
        let result = session.send_committed("CICS").await;
        assert!(matches!(result, Err(Tn3270Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_invalid_function_key() {
        let mut session = new_session();
        let result = session.send_function_key(30).await;
        assert!(matches!(result, Err(Tn3270Error::ProtocolError(_))));
    }

    #[tokio::test]
    async fn test_submitted_id_is_not_a_painted_screen() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let host = tokio::spawn(slow_region(listener));

        let mut session = new_session();
        session.initiate("127.0.0.1", port).await.unwrap();
        session.send_clear().await.unwrap();
        session.send_committed("ZZZZ").await.unwrap();
        session.read_pending(None).await.unwrap();

        // Only our own input is on screen until the host answers
        assert!(session.contains_text("ZZZZ"));
        assert!(session.is_blank());

        session.read_pending(Some(HOST_DELAY * 2)).await.unwrap();
        assert!(!session.is_blank());
        assert!(session.contains_text("is not recognized"));

        session.close().await;
        host.await.unwrap();
    }

    #[tokio::test]
    async fn test_late_rejection_classified_invalid() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let host = tokio::spawn(slow_region(listener));

        let config = slow_region_config(port);
        let mut driver = TransactionDriver::new(new_session(), &config);
        driver.connect().await.unwrap();

        let result = driver.attempt("zzzz").await;
        assert!(
            matches!(&result, Err(AttemptError::Rejected(id)) if id == "ZZZZ"),
            "unexpected result: {:?}",
            result
        );

        driver.disconnect().await;
        host.await.unwrap();
    }

    #[tokio::test]
    async fn test_late_signoff_reaches_region() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let host = tokio::spawn(slow_region(listener));

        let config = slow_region_config(port);
        let mut session = new_session();
        let outcome = probe_target(
            &mut session,
            "127.0.0.1",
            port,
            &config.init_commands(),
            &config.tuning,
        )
        .await;

        assert_eq!(outcome, ProbeOutcome::Reachable);
        assert!(!session.is_connected());
        host.await.unwrap();
    }
}
