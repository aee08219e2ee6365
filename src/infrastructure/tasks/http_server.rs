//! HTTP worker pool
//!
//! Each worker owns one socket and serves one connection at a time, so up to
//! [`HTTP_WORKERS`] clients are handled concurrently.

use beacon_core::{
    DEFAULTS,
    net::http::{self, serve_connection},
    portal::{AdminController, PortalContext},
};
use embassy_net::{Stack, tcp::TcpSocket};

use crate::{
    config::{HTTP_RX_BUFFER_SIZE, HTTP_SOCKET_TIMEOUT, HTTP_TX_BUFFER_SIZE, HTTP_WORKERS},
    infrastructure::{SharedRestart, SharedStore},
};

#[embassy_executor::task(pool_size = HTTP_WORKERS)]
pub async fn http_server_task(
    worker: usize,
    stack: Stack<'static>,
    store: &'static SharedStore,
    restart: &'static SharedRestart,
    context: &'static PortalContext,
) {
    let controller = AdminController::new(store, restart, context);
    let mut rx_buffer = [0u8; HTTP_RX_BUFFER_SIZE];
    let mut tx_buffer = [0u8; HTTP_TX_BUFFER_SIZE];

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(HTTP_SOCKET_TIMEOUT));

        if let Err(e) = socket.accept(DEFAULTS.http_port).await {
            log::warn!("http_server[{}]: accept failed: {:?}", worker, e);
            continue;
        }

        match serve_connection(&controller, &mut socket).await {
            Ok(()) | Err(http::Error::Closed) => {}
            Err(e) => log::warn!("http_server[{}]: connection error: {:?}", worker, e),
        }

        socket.close();
        if let Err(e) = socket.flush().await {
            log::debug!("http_server[{}]: flush on close failed: {:?}", worker, e);
        }
    }
}
