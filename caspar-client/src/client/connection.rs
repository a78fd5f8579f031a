//! TCP connection management for the AMCP client.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use log::{debug, info, trace, warn};
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::client::framer::{self, ReplyShape};
use crate::client::reply;
use crate::config::ConnectionConfig;
use crate::error::ClientError;
use crate::types::{ClipInfo, Layer, LayerStatus};

type ReplyResult = Result<String, ClientError>;

/// A request waiting for its reply.
struct Pending {
    shape: ReplyShape,
    tx: oneshot::Sender<ReplyResult>,
}

/// One live TCP connection and the requests in flight on it.
struct Link {
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    /// In-flight requests, oldest first.
    pending: Mutex<VecDeque<Pending>>,
    open: AtomicBool,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl Link {
    fn new(writer: OwnedWriteHalf) -> Self {
        Self {
            writer: tokio::sync::Mutex::new(writer),
            pending: Mutex::new(VecDeque::new()),
            open: AtomicBool::new(true),
            reader: Mutex::new(None),
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Queue a request and write it. The writer lock is held across both
    /// steps so queue order always equals wire order.
    async fn send(
        &self,
        command: &str,
        shape: ReplyShape,
    ) -> Result<oneshot::Receiver<ReplyResult>, ClientError> {
        let mut writer = self.writer.lock().await;

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock();
            if !self.is_open() {
                return Err(ClientError::ConnectionClosed);
            }
            pending.push_back(Pending { shape, tx });
        }

        debug!("[Caspar] > {}", command);
        let mut line = String::with_capacity(command.len() + 2);
        line.push_str(command);
        line.push_str("\r\n");
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            warn!("[Caspar] Socket error: {}", e);
            self.close(Some(ClientError::Io(e.to_string())));
        }

        Ok(rx)
    }

    /// Hand every complete reply in `buf` to the request it belongs to.
    fn dispatch(&self, buf: &mut BytesMut) {
        let mut pending = self.pending.lock();
        while let Some(head) = pending.front() {
            let Some(resp) = framer::extract(buf, head.shape) else {
                break;
            };
            trace!("[Caspar] < {:?}", resp);
            if let Some(head) = pending.pop_front() {
                let _ = head.tx.send(Ok(resp));
            }
        }
    }

    /// Mark the link dead. `err` goes to the oldest request; every other
    /// queued request resolves with [`ClientError::ConnectionClosed`].
    fn close(&self, err: Option<ClientError>) {
        {
            let mut pending = self.pending.lock();
            if !self.open.swap(false, Ordering::AcqRel) {
                return;
            }
            if let Some(err) = err {
                if let Some(head) = pending.pop_front() {
                    let _ = head.tx.send(Err(err));
                }
            }
            pending.clear();
        }

        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
    }
}

async fn read_loop(link: Arc<Link>, mut reader: OwnedReadHalf) {
    let mut buf = BytesMut::with_capacity(8192);
    loop {
        match reader.read_buf(&mut buf).await {
            Ok(0) => {
                info!("[Caspar] Connection closed");
                link.close(None);
                break;
            }
            Ok(_) => link.dispatch(&mut buf),
            Err(e) => {
                warn!("[Caspar] Socket error: {}", e);
                link.close(Some(ClientError::Io(e.to_string())));
                break;
            }
        }
    }
}

/// Current connection and the outcome of the last failed attempt.
#[derive(Default)]
struct LinkSlot {
    link: Option<Arc<Link>>,
    last_failure: Option<(io::ErrorKind, String)>,
}

/// AMCP client over one shared, lazily (re)established connection.
///
/// Connecting is idempotent: concurrent callers wait on the same attempt
/// and share its outcome. There is no background reconnect; a dead
/// connection is replaced by the next call.
pub struct CasparClient {
    config: ConnectionConfig,
    link: tokio::sync::Mutex<LinkSlot>,
    /// Bumped each time a connect attempt finishes.
    attempts: AtomicU64,
}

impl CasparClient {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            link: tokio::sync::Mutex::new(LinkSlot::default()),
            attempts: AtomicU64::new(0),
        }
    }

    /// Channel/layer used when the caller has no preference.
    pub fn default_layer(&self) -> Layer {
        self.config.default_layer
    }

    /// Whether a connection is currently up.
    pub async fn is_connected(&self) -> bool {
        self.link
            .lock()
            .await
            .link
            .as_ref()
            .map(|link| link.is_open())
            .unwrap_or(false)
    }

    async fn ensure_connected(&self) -> Result<Arc<Link>, ClientError> {
        let seen = self.attempts.load(Ordering::Acquire);
        let mut slot = self.link.lock().await;
        if let Some(link) = slot.link.as_ref() {
            if link.is_open() {
                return Ok(Arc::clone(link));
            }
        }

        // An attempt finished while we waited for the lock and failed.
        if self.attempts.load(Ordering::Acquire) != seen {
            if let Some((kind, message)) = slot.last_failure.as_ref() {
                return Err(ClientError::Connect(io::Error::new(*kind, message.clone())));
            }
        }

        self.connect_locked(&mut slot).await
    }

    /// Make one connect attempt and record its outcome in `slot`.
    async fn connect_locked(&self, slot: &mut LinkSlot) -> Result<Arc<Link>, ClientError> {
        let result = self.connect().await;
        match &result {
            Ok(link) => {
                slot.link = Some(Arc::clone(link));
                slot.last_failure = None;
            }
            Err(ClientError::Connect(e)) => {
                slot.link = None;
                slot.last_failure = Some((e.kind(), e.to_string()));
            }
            Err(_) => slot.link = None,
        }
        self.attempts.fetch_add(1, Ordering::AcqRel);
        result
    }

    async fn connect(&self) -> Result<Arc<Link>, ClientError> {
        let addr = self.config.addr();
        let stream = match tokio::time::timeout(
            self.config.connect_timeout,
            TcpStream::connect(&addr),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                warn!("[Caspar] Failed to connect to {}: {}", addr, e);
                return Err(ClientError::Connect(e));
            }
            Err(_) => {
                warn!("[Caspar] Timed out connecting to {}", addr);
                return Err(ClientError::Connect(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {} timed out", addr),
                )));
            }
        };
        stream.set_nodelay(true).map_err(ClientError::Connect)?;

        let (reader, writer) = stream.into_split();
        let link = Arc::new(Link::new(writer));
        let handle = tokio::spawn(read_loop(Arc::clone(&link), reader));
        *link.reader.lock() = Some(handle);

        info!("[Caspar] Connected to CasparCG at {}", addr);
        Ok(link)
    }

    /// Send one command and wait for its framed reply.
    pub async fn send_raw(&self, command: &str, shape: ReplyShape) -> Result<String, ClientError> {
        let link = self.ensure_connected().await?;
        let rx = link.send(command, shape).await?;
        rx.await.unwrap_or(Err(ClientError::ConnectionClosed))
    }

    /// Drop the current connection, if any.
    pub async fn disconnect(&self) {
        if let Some(link) = self.link.lock().await.link.take() {
            link.close(None);
        }
    }

    /// `CLS`: names of every clip on the server.
    pub async fn list_clips(&self) -> Result<Vec<String>, ClientError> {
        let resp = self.send_raw("CLS", ReplyShape::Multi).await?;
        Ok(reply::parse_clip_list(&resp))
    }

    /// `CINF`: metadata for one clip.
    pub async fn clip_info(&self, name: &str) -> Result<ClipInfo, ClientError> {
        let resp = self
            .send_raw(&format!("CINF \"{}\"", name), ReplyShape::Two)
            .await?;
        Ok(reply::parse_clip_info(&resp))
    }

    /// `INFO`: live playback state of a layer. `None` for an empty reply.
    pub async fn layer_status(&self, layer: Layer) -> Result<Option<LayerStatus>, ClientError> {
        let resp = self
            .send_raw(&format!("INFO {}", layer), ReplyShape::Multi)
            .await?;
        Ok(reply::parse_layer_status(&resp))
    }

    /// `LOAD`: cue a clip paused on its first frame.
    pub async fn load_clip(&self, name: &str, layer: Layer) -> Result<(), ClientError> {
        self.acknowledge(&format!("LOAD {} \"{}\"", layer, name)).await
    }

    /// `PLAY`: play a clip, or resume whatever is loaded when `name` is `None`.
    pub async fn play_clip(&self, name: Option<&str>, layer: Layer) -> Result<(), ClientError> {
        let command = match name {
            Some(name) => format!("PLAY {} \"{}\"", layer, name),
            None => format!("PLAY {}", layer),
        };
        self.acknowledge(&command).await
    }

    /// `STOP`
    pub async fn stop(&self, layer: Layer) -> Result<(), ClientError> {
        self.acknowledge(&format!("STOP {}", layer)).await
    }

    /// `PAUSE`
    pub async fn pause(&self, layer: Layer) -> Result<(), ClientError> {
        self.acknowledge(&format!("PAUSE {}", layer)).await
    }

    async fn acknowledge(&self, command: &str) -> Result<(), ClientError> {
        let ack = self.send_raw(command, ReplyShape::Single).await?;
        debug!("[Caspar] < {}", ack);
        Ok(())
    }
}

impl Drop for CasparClient {
    fn drop(&mut self) {
        if let Some(link) = self.link.get_mut().link.take() {
            link.close(None);
        }
    }
}
