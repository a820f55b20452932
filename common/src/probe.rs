use core::net::SocketAddr;

use edge_net::http::io::client::Connection;
use edge_net::http::Method;
use edge_net::nal::TcpConnect;
use heapless::String;

use crate::config::{BackendUrl, ConfigError};
use crate::consts::*;
use crate::watchdog::{HealthProbe, ProbeError};

/// `GET {base}/health` over any TCP stack; 200 means the backend is up.
pub struct HttpHealthProbe<'a, T> {
    stack: &'a T,
    addr: SocketAddr,
    host: &'a str,
    path: String<MAX_PATH_LEN>,
}

impl<'a, T: TcpConnect> HttpHealthProbe<'a, T> {
    /// `addr` is the already resolved address of `backend`.
    pub fn new(stack: &'a T, addr: SocketAddr, backend: &'a BackendUrl) -> Result<Self, ConfigError> {
        Ok(Self {
            stack,
            addr,
            host: backend.host(),
            path: backend.path_to(HEALTH_PATH)?,
        })
    }
}

impl<T: TcpConnect> HealthProbe for HttpHealthProbe<'_, T> {
    async fn probe(&mut self) -> Result<(), ProbeError> {
        let mut buf = [0_u8; HTTP_BUF_SIZE];
        let mut conn: Connection<_> = Connection::new(&mut buf, self.stack, self.addr);

        conn.initiate_request(true, Method::Get, &self.path, &[("Host", self.host)])
            .await
            .map_err(|e| {
                log::debug!("health request to {} failed: {:?}", self.addr, e);
                ProbeError::Transport
            })?;
        conn.initiate_response().await.map_err(|e| {
            log::debug!("health response from {} failed: {:?}", self.addr, e);
            ProbeError::Transport
        })?;

        let code = conn.headers().map_err(|_| ProbeError::Transport)?.code;
        if code == 200 {
            Ok(())
        } else {
            Err(ProbeError::Status(code))
        }
    }
}
