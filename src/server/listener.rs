use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use hyper_util::rt::TokioIo;
use tracing::{error, info};

use crate::settings::ServerSettings;
use super::handler::Gateway;
use super::Result;

pub struct ServerListener {
    http_listener: TcpListener,
}

impl ServerListener {
    pub async fn bind(settings: &ServerSettings) -> Result<Self> {
        let addr = settings.socket_addr()?;
        let http_listener = TcpListener::bind(addr)
            .await
            .map_err(|e| {
                error!(error = %e, addr = %addr, "HTTP 포트 바인딩 실패");
                e
            })?;

        info!(addr = %addr, "HTTP 리스너 시작");
        Ok(Self { http_listener })
    }

    pub fn from_listener(http_listener: TcpListener) -> Self {
        Self { http_listener }
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.http_listener.local_addr()?)
    }

    /// `shutdown`이 끝날 때까지 연결을 받아 게이트웨이로 넘깁니다.
    pub async fn run<F>(self, gateway: Arc<Gateway>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = self.http_listener.accept() => {
                    match result {
                        Ok((stream, remote)) => {
                            let gateway = gateway.clone();
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                if let Err(err) = gateway.handle_connection(io, remote).await {
                                    error!(error = %err, remote = %remote, "HTTP 연결 처리 실패");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "HTTP 연결 수락 실패");
                        }
                    }
                }

                _ = &mut shutdown => {
                    info!("리스너 종료");
                    return Ok(());
                }
            }
        }
    }
}
