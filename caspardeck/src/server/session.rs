//! Controller session handling.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use log::{debug, info, trace};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use hyperdeck_protocol::{parse_command, Command};

use crate::device::DEVICE;
use crate::server::codec::DeckCodec;
use crate::server::dispatcher::Dispatcher;
use crate::server::state::SessionHandle;

/// Polled continuously by controllers; logged at trace only.
const NOISY_COMMANDS: [&str; 3] = ["slot info", "transport info", "clips count"];

/// One controller connection.
pub struct Session {
    handle: SessionHandle,
    addr: SocketAddr,
    socket: TcpStream,
    dispatcher: Arc<Dispatcher>,
}

impl Session {
    pub fn new(id: u64, addr: SocketAddr, socket: TcpStream, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            handle: SessionHandle::new(id),
            addr,
            socket,
            dispatcher,
        }
    }

    /// Run the session until the controller disconnects or sends `quit`.
    pub async fn run(self) -> std::io::Result<()> {
        let id = self.handle.id;
        let mut framed = Framed::new(self.socket, DeckCodec);

        framed.send(DEVICE.connection_info()).await?;
        debug!("[Session {}] Sent connection info to {}", id, self.addr);

        while let Some(line) = framed.next().await {
            let line = line?;
            let raw = match parse_command(&line) {
                Ok(raw) => raw,
                Err(e) => {
                    debug!("[Session {}] Skipping {:?}: {}", id, line, e);
                    continue;
                }
            };

            let noisy = NOISY_COMMANDS.contains(&raw.name.as_str());
            let params = serde_json::to_string(&raw.params).unwrap_or_default();
            if noisy {
                trace!("[Session {}] > {} {}", id, raw.name, params);
            } else {
                info!("[Session {}] > {} {}", id, raw.name, params);
            }

            let command = Command::from(raw);
            let quit = command == Command::Quit;
            let reply = self.dispatcher.dispatch(&self.handle, command);

            if noisy {
                trace!("[Session {}] < {}", id, reply.code());
            } else {
                debug!("[Session {}] < {}", id, reply.code());
            }
            framed.send(reply).await?;

            if quit {
                info!("[Session {}] Client quit", id);
                break;
            }
        }

        Ok(())
    }
}
