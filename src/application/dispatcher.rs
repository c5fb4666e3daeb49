//! Command dispatcher for the datagram and request-line channels
//!
//! Both channels funnel into the same [`Station`] entry points, so a start
//! from the schedule, a datagram or a request all see one session.

use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::Instant;

use crate::domain::command::{is_traversal_free, DatagramCommand, RequestRoute, MAX_REQUEST_LINE_LEN};

use super::ports::{AudioSource, CatalogCursor, Clock, Indicator, Storage, StorageReader};
use super::response::{status_body, ResponseHead, NOT_FOUND_BODY};
use super::station::Station;

/// Download chunk size
pub const DOWNLOAD_CHUNK_LEN: usize = 2048;

/// Header lines read (and ignored) after the request line
const MAX_HEADER_LINES: usize = 64;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Longest single wait on the peer before the recorder gets a drain
const POLL_SLICE: Duration = Duration::from_millis(20);

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No request line within {0:?}")]
    Timeout(Duration),

    #[error("Peer stopped reading for {0:?}")]
    Stalled(Duration),
}

/// Handles one message per call; holds no state between messages.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    request_timeout: Duration,
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT)
    }
}

impl CommandDispatcher {
    /// `request_timeout` bounds reading the request and every stall while
    /// writing the response.
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }

    /// Parse and execute one datagram payload
    pub async fn handle_datagram<S, A, I, C>(
        &self,
        station: &mut Station<S, A, I, C>,
        payload: &[u8],
    ) -> DatagramCommand
    where
        S: Storage,
        A: AudioSource,
        I: Indicator,
        C: Clock,
    {
        let command = DatagramCommand::parse(payload);
        match &command {
            DatagramCommand::Start => {
                info!("Datagram: start recording");
                station.start().await;
            }
            DatagramCommand::Stop => {
                info!("Datagram: stop recording");
                station.stop().await;
            }
            DatagramCommand::Erase => {
                info!("Datagram: erase storage");
                station.erase_all().await;
            }
            DatagramCommand::Unknown(text) => {
                warn!("Unknown command: {:?}", text);
            }
        }
        command
    }

    /// Serve exactly one request on `stream`, then close it.
    ///
    /// Every wait on the peer is cut into short slices with a recorder drain
    /// in between, so a slow or silent client never starves the recording.
    /// A peer that accepts no bytes for `request_timeout` is dropped.
    pub async fn handle_connection<S, A, I, C, T>(
        &self,
        station: &mut Station<S, A, I, C>,
        stream: T,
    ) -> Result<RequestRoute, DispatchError>
    where
        S: Storage,
        A: AudioSource,
        I: Indicator,
        C: Clock,
        T: AsyncRead + AsyncWrite,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let mut reader = BufReader::new(read_half);
        let mut peer = Peer {
            writer: write_half,
            stall: self.request_timeout,
        };

        let deadline = Instant::now() + self.request_timeout;
        let mut line = Vec::new();
        read_line(station, &mut reader, &mut line, deadline)
            .await?
            .ok_or(DispatchError::Timeout(self.request_timeout))?;
        // Headers are optional; a client that never sends the blank line is
        // still answered once the deadline passes.
        skip_headers(station, &mut reader, deadline).await;

        let line = String::from_utf8_lossy(&line).into_owned();
        let route = RequestRoute::parse(&line);
        debug!("Request {:?} routed to {}", line.trim_end(), route.name());

        match &route {
            RequestRoute::List => {
                peer.send(station, &ResponseHead::Json.to_bytes()).await?;
                write_listing(station, &mut peer).await?;
            }
            RequestRoute::Start => {
                station.start().await;
                peer.send(station, &ResponseHead::Json.to_bytes()).await?;
                peer.send(station, status_body("Recording started").as_bytes())
                    .await?;
            }
            RequestRoute::Stop => {
                station.stop().await;
                peer.send(station, &ResponseHead::Json.to_bytes()).await?;
                peer.send(station, status_body("Recording stopped").as_bytes())
                    .await?;
            }
            RequestRoute::Download(path) => {
                send_file(station, path, &mut peer).await?;
            }
            RequestRoute::Unknown(line) => {
                warn!("Ignoring request: {:?}", line);
            }
        }

        peer.close().await?;
        Ok(route)
    }
}

/// Read one line (at most `MAX_REQUEST_LINE_LEN` bytes) into `line`,
/// draining between slices.
///
/// # Returns
/// `None` if `deadline` passed first. End of stream yields whatever was read.
async fn read_line<S, A, I, C, R>(
    station: &mut Station<S, A, I, C>,
    reader: &mut BufReader<R>,
    line: &mut Vec<u8>,
    deadline: Instant,
) -> Result<Option<()>, DispatchError>
where
    S: Storage,
    A: AudioSource,
    I: Indicator,
    C: Clock,
    R: AsyncRead + Unpin,
{
    loop {
        let limit = MAX_REQUEST_LINE_LEN.saturating_sub(line.len()) as u64;
        let slice_end = deadline.min(Instant::now() + POLL_SLICE);
        // read_until keeps partial input in `line` when the slice ends
        let mut limited = (&mut *reader).take(limit);
        match tokio::time::timeout_at(slice_end, limited.read_until(b'\n', line)).await {
            Ok(result) => {
                result?;
                return Ok(Some(()));
            }
            Err(_) if Instant::now() >= deadline => return Ok(None),
            Err(_) => {
                station.drain().await;
            }
        }
    }
}

/// Consume header lines up to the blank line, best effort
async fn skip_headers<S, A, I, C, R>(
    station: &mut Station<S, A, I, C>,
    reader: &mut BufReader<R>,
    deadline: Instant,
) where
    S: Storage,
    A: AudioSource,
    I: Indicator,
    C: Clock,
    R: AsyncRead + Unpin,
{
    for _ in 0..MAX_HEADER_LINES {
        let mut header = Vec::new();
        match read_line(station, reader, &mut header, deadline).await {
            Ok(Some(())) if header.iter().all(u8::is_ascii_whitespace) => break,
            Ok(Some(())) => {}
            Ok(None) | Err(_) => break,
        }
    }
}

/// Write side of a connection
struct Peer<W> {
    writer: W,
    /// Longest time the peer may accept no bytes
    stall: Duration,
}

impl<W: AsyncWrite + Unpin> Peer<W> {
    /// Write all of `bytes`, draining the recorder while the peer is not
    /// accepting data.
    async fn send<S, A, I, C>(
        &mut self,
        station: &mut Station<S, A, I, C>,
        mut bytes: &[u8],
    ) -> Result<(), DispatchError>
    where
        S: Storage,
        A: AudioSource,
        I: Indicator,
        C: Clock,
    {
        let mut stall_deadline = Instant::now() + self.stall;
        while !bytes.is_empty() {
            let slice_end = stall_deadline.min(Instant::now() + POLL_SLICE);
            match tokio::time::timeout_at(slice_end, self.writer.write(bytes)).await {
                Ok(Ok(0)) => return Err(std::io::Error::from(std::io::ErrorKind::WriteZero).into()),
                Ok(Ok(n)) => {
                    bytes = &bytes[n..];
                    stall_deadline = Instant::now() + self.stall;
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) if Instant::now() >= stall_deadline => {
                    return Err(DispatchError::Stalled(self.stall));
                }
                Err(_) => {
                    station.drain().await;
                }
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DispatchError> {
        tokio::time::timeout(self.stall, async {
            self.writer.flush().await?;
            self.writer.shutdown().await
        })
        .await
        .map_err(|_| DispatchError::Stalled(self.stall))??;
        Ok(())
    }
}

async fn write_listing<S, A, I, C, W>(
    station: &mut Station<S, A, I, C>,
    peer: &mut Peer<W>,
) -> Result<(), DispatchError>
where
    S: Storage,
    A: AudioSource,
    I: Indicator,
    C: Clock,
    W: AsyncWrite + Unpin,
{
    peer.send(station, b"[").await?;

    match station.list().await {
        Ok(mut cursor) => {
            let mut first = true;
            loop {
                let entry = match cursor.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Listing stopped early: {}", e);
                        break;
                    }
                };
                if !first {
                    peer.send(station, b",").await?;
                }
                first = false;
                let quoted = serde_json::to_string(&entry.name)
                    .unwrap_or_else(|_| "\"\"".to_string());
                peer.send(station, quoted.as_bytes()).await?;
            }
        }
        Err(e) => warn!("Failed to open root directory: {}", e),
    }

    peer.send(station, b"]").await?;
    Ok(())
}

async fn send_file<S, A, I, C, W>(
    station: &mut Station<S, A, I, C>,
    path: &str,
    peer: &mut Peer<W>,
) -> Result<(), DispatchError>
where
    S: Storage,
    A: AudioSource,
    I: Indicator,
    C: Clock,
    W: AsyncWrite + Unpin,
{
    let reader = if is_traversal_free(path) && station.storage().is_file(path).await {
        match station.storage().open_read(path).await {
            Ok(reader) => Some(reader),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    } else {
        None
    };

    let Some(mut reader) = reader else {
        info!("Download of {} answered with 404", path);
        peer.send(station, &ResponseHead::NotFound.to_bytes()).await?;
        peer.send(station, NOT_FOUND_BODY.as_bytes()).await?;
        return Ok(());
    };

    peer.send(station, &ResponseHead::Binary.to_bytes()).await?;

    let mut chunk = vec![0u8; DOWNLOAD_CHUNK_LEN];
    let mut sent = 0usize;
    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!("Download of {} truncated: {}", path, e);
                break;
            }
        };
        peer.send(station, &chunk[..n]).await?;
        sent += n;
        station.drain().await;
    }

    info!("Sent {} ({} bytes)", path, sent);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::recorder::{RecorderSettings, RecordingController};
    use crate::application::station::StationSettings;
    use crate::application::testing::{FixedClock, MemoryStorage, MockIndicator, ScriptedSource};
    use crate::domain::catalog::ErasePolicy;
    use crate::domain::schedule::Schedule;

    type TestStation = Station<MemoryStorage, ScriptedSource, MockIndicator, FixedClock>;

    fn station(storage: &MemoryStorage, source: &ScriptedSource) -> TestStation {
        let recorder = RecordingController::new(
            storage.clone(),
            source.clone(),
            MockIndicator::new(),
            FixedClock::new(1_700_000_000),
            RecorderSettings {
                device_id: "unit".parse().unwrap(),
                ..Default::default()
            },
        );
        let settings = StationSettings {
            erase_policy: ErasePolicy::with_suffix(".bin"),
            ..Default::default()
        };
        Station::new(recorder, Schedule::disarmed(), settings)
    }

    async fn request(station: &mut TestStation, raw: &str) -> (RequestRoute, String) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (mut client_read, mut client_write) = tokio::io::split(client);
        client_write.write_all(raw.as_bytes()).await.unwrap();

        let route = CommandDispatcher::default()
            .handle_connection(station, server)
            .await
            .unwrap();

        let mut response = Vec::new();
        client_read.read_to_end(&mut response).await.unwrap();
        (route, String::from_utf8_lossy(&response).into_owned())
    }

    fn body(response: &str) -> &str {
        response.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or("")
    }

    #[tokio::test]
    async fn list_empty_store() {
        let storage = MemoryStorage::new();
        let mut station = station(&storage, &ScriptedSource::new());

        let (route, response) = request(&mut station, "GET /list HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert_eq!(route, RequestRoute::List);
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Type: application/json\r\n"));
        assert_eq!(body(&response), "[]");
    }

    #[tokio::test]
    async fn list_quotes_names_without_trailing_comma() {
        let storage = MemoryStorage::new();
        storage.add_file("/a.bin", b"1");
        storage.add_file("/b.bin", b"2");
        let mut station = station(&storage, &ScriptedSource::new());

        let (_, response) = request(&mut station, "GET /list HTTP/1.1\r\n\r\n").await;
        assert_eq!(body(&response), r#"["a.bin","b.bin"]"#);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let storage = MemoryStorage::new();
        let mut station = station(&storage, &ScriptedSource::new());

        let (route, response) =
            request(&mut station, "GET /nonexistent.bin HTTP/1.1\r\n\r\n").await;
        assert_eq!(route, RequestRoute::Download("/nonexistent.bin".to_string()));
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert_eq!(body(&response), NOT_FOUND_BODY);
    }

    #[tokio::test]
    async fn traversal_and_directories_are_not_found() {
        let storage = MemoryStorage::new();
        storage.add_dir("/old");
        let mut station = station(&storage, &ScriptedSource::new());

        let (_, response) = request(&mut station, "GET /../etc/passwd HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 404"));
        let (_, response) = request(&mut station, "GET /old HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 404"));
    }

    #[tokio::test]
    async fn download_streams_whole_file() {
        let storage = MemoryStorage::new();
        let contents: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        storage.add_file("/unit_1.bin", &contents);
        let mut station = station(&storage, &ScriptedSource::new());

        let (client, server) = tokio::io::duplex(64 * 1024);
        let (mut client_read, mut client_write) = tokio::io::split(client);
        client_write
            .write_all(b"GET /unit_1.bin HTTP/1.1\r\n\r\n")
            .await
            .unwrap();
        CommandDispatcher::default()
            .handle_connection(&mut station, server)
            .await
            .unwrap();

        let mut response = Vec::new();
        client_read.read_to_end(&mut response).await.unwrap();
        let split = response
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .unwrap();
        let head = String::from_utf8_lossy(&response[..split]);
        assert!(head.contains("application/octet-stream"));
        assert_eq!(&response[split + 4..], contents.as_slice());
    }

    #[tokio::test]
    async fn download_keeps_recording_drained() {
        let storage = MemoryStorage::new();
        storage.add_file("/old.bin", &vec![7u8; DOWNLOAD_CHUNK_LEN * 3]);
        let source = ScriptedSource::new();
        let mut station = station(&storage, &source);

        station.start().await;
        request(&mut station, "GET /old.bin HTTP/1.1\r\n\r\n").await;
        assert_eq!(source.reads(), 3);
    }

    #[tokio::test]
    async fn start_and_stop_routes() {
        let storage = MemoryStorage::new();
        let mut station = station(&storage, &ScriptedSource::new());

        let (_, response) = request(&mut station, "GET /start HTTP/1.1\r\n\r\n").await;
        assert_eq!(body(&response), r#"{"status":"Recording started"}"#);
        assert!(station.is_recording());

        let (_, response) = request(&mut station, "GET /stop HTTP/1.1\r\n\r\n").await;
        assert_eq!(body(&response), r#"{"status":"Recording stopped"}"#);
        assert!(!station.is_recording());
    }

    #[tokio::test]
    async fn non_get_request_gets_no_response() {
        let storage = MemoryStorage::new();
        let mut station = station(&storage, &ScriptedSource::new());

        let (route, response) = request(&mut station, "POST /start HTTP/1.1\r\n\r\n").await;
        assert!(matches!(route, RequestRoute::Unknown(_)));
        assert!(response.is_empty());
        assert!(!station.is_recording());
    }

    #[tokio::test]
    async fn silent_client_times_out() {
        let storage = MemoryStorage::new();
        let mut station = station(&storage, &ScriptedSource::new());
        let (_client, server) = tokio::io::duplex(1024);

        let result = CommandDispatcher::new(Duration::from_millis(20))
            .handle_connection(&mut station, server)
            .await;
        assert!(matches!(result, Err(DispatchError::Timeout(_))));
    }

    #[tokio::test]
    async fn missing_blank_line_still_answered_while_draining() {
        let storage = MemoryStorage::new();
        let source = ScriptedSource::new();
        let mut station = station(&storage, &source);
        station.start().await;

        let (client, server) = tokio::io::duplex(64 * 1024);
        let (mut client_read, mut client_write) = tokio::io::split(client);
        client_write
            .write_all(b"GET /list HTTP/1.1\r\nHost: x\r\n")
            .await
            .unwrap();

        let route = CommandDispatcher::new(Duration::from_millis(200))
            .handle_connection(&mut station, server)
            .await
            .unwrap();
        assert_eq!(route, RequestRoute::List);
        assert!(source.reads() >= 3, "only {} drains", source.reads());

        let mut response = Vec::new();
        client_read.read_to_end(&mut response).await.unwrap();
        assert!(String::from_utf8_lossy(&response).starts_with("HTTP/1.1 200 OK"));
    }

    #[tokio::test]
    async fn client_that_never_reads_is_dropped() {
        let storage = MemoryStorage::new();
        storage.add_file("/big.bin", &vec![0u8; 1 << 20]);
        let source = ScriptedSource::new();
        let mut station = station(&storage, &source);
        station.start().await;

        let (client, server) = tokio::io::duplex(4096);
        let (_client_read, mut client_write) = tokio::io::split(client);
        client_write
            .write_all(b"GET /big.bin HTTP/1.1\r\n\r\n")
            .await
            .unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            CommandDispatcher::new(Duration::from_millis(100)).handle_connection(&mut station, server),
        )
        .await
        .expect("handler returned");
        assert!(matches!(result, Err(DispatchError::Stalled(_))));

        // The recording kept draining while the peer was stuck
        assert!(station.is_recording());
        assert!(source.reads() >= 3, "only {} drains", source.reads());
    }

    #[tokio::test]
    async fn duplicate_start_datagram_opens_one_file() {
        let storage = MemoryStorage::new();
        let mut station = station(&storage, &ScriptedSource::new());
        let dispatcher = CommandDispatcher::default();

        assert_eq!(
            dispatcher.handle_datagram(&mut station, b"START_RECORDING\n").await,
            DatagramCommand::Start
        );
        dispatcher.handle_datagram(&mut station, b"START_RECORDING").await;
        assert_eq!(storage.creates(), 1);
        assert_eq!(storage.open_writers(), 1);

        dispatcher.handle_datagram(&mut station, b"STOP_RECORDING").await;
        assert!(!station.is_recording());
        assert_eq!(storage.open_writers(), 0);
    }

    #[tokio::test]
    async fn erase_datagram_deletes_matching_files() {
        let storage = MemoryStorage::new();
        storage.add_file("/a.bin", b"1");
        storage.add_file("/notes.txt", b"2");
        let mut station = station(&storage, &ScriptedSource::new());

        CommandDispatcher::default()
            .handle_datagram(&mut station, b"ERASE_SD")
            .await;
        assert_eq!(storage.file_paths(), vec!["/notes.txt"]);
    }

    #[tokio::test]
    async fn unknown_datagram_is_ignored() {
        let storage = MemoryStorage::new();
        let mut station = station(&storage, &ScriptedSource::new());

        let command = CommandDispatcher::default()
            .handle_datagram(&mut station, b"start_recording")
            .await;
        assert_eq!(command, DatagramCommand::Unknown("start_recording".to_string()));
        assert!(!station.is_recording());
    }
}
