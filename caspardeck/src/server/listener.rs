//! TCP listener for accepting controller connections.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info};
use tokio::net::{TcpListener, TcpStream};

use crate::server::dispatcher::Dispatcher;
use crate::server::session::Session;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub listen_addr: SocketAddr,
}

/// Accepts controllers and runs one session per connection.
pub struct Server {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    pub fn new(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self { config, dispatcher }
    }

    /// Run the server, accepting connections until shutdown.
    ///
    /// Fails only when the listening socket cannot be bound.
    pub async fn run(&self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.listen_addr).await?;
        info!("Server listening on {}", self.config.listen_addr);

        let mut connection_count = 0u64;

        loop {
            match listener.accept().await {
                Ok((socket, addr)) => {
                    connection_count += 1;
                    let session_id = connection_count;

                    info!("[Session {}] New connection from {}", session_id, addr);

                    let dispatcher = Arc::clone(&self.dispatcher);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(socket, addr, session_id, dispatcher).await {
                            error!("[Session {}] Connection error: {}", session_id, e);
                        }
                        info!("[Session {}] Connection closed", session_id);
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

async fn handle_connection(
    socket: TcpStream,
    addr: SocketAddr,
    session_id: u64,
    dispatcher: Arc<Dispatcher>,
) -> std::io::Result<()> {
    socket.set_nodelay(true)?;
    Session::new(session_id, addr, socket, dispatcher).run().await
}
