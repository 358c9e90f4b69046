use anyhow::Result;
use boost_daemon::{
    accessor::{AccessError, LinuxProcessAccessor},
    config::Config,
    engine::Engine,
    protocol::{Request, Response},
    socket::{handle_client, RequestHandler, SocketServer},
};
use std::sync::Arc;
use tracing::{error, info, warn};

struct Daemon {
    engine: Arc<Engine>,
}

fn outcome_response(result: Result<(), AccessError>) -> Response {
    let data = match result {
        Ok(()) => serde_json::json!({"outcome": "success"}),
        Err(e) => {
            let outcome = match e {
                AccessError::NotFound => "not_found",
                AccessError::AccessDenied => "access_denied",
                AccessError::Unsupported => "unsupported",
            };
            serde_json::json!({"outcome": outcome, "error": e.to_string()})
        }
    };
    Response::Response { id: None, data }
}

fn data_response(value: serde_json::Result<serde_json::Value>) -> Response {
    let data = match value {
        Ok(data) => data,
        Err(e) => serde_json::json!({"error": e.to_string()}),
    };
    Response::Response { id: None, data }
}

#[async_trait::async_trait]
impl RequestHandler for Daemon {
    async fn handle(&self, request: Request) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::GetSnapshot => {
                let snapshot = self.engine.publisher().current();
                data_response(serde_json::to_value(&*snapshot))
            }

            Request::GetLog { params } => {
                let limit = params.limit.unwrap_or(50) as usize;
                let entries = self.engine.publisher().recent_log(limit);
                data_response(serde_json::to_value(&entries))
            }

            Request::GetPolicy => {
                let policy = self.engine.policy().await;
                data_response(serde_json::to_value(&policy))
            }

            Request::BoostProcess { params } => {
                outcome_response(self.engine.boost(params.pid, params.level))
            }

            Request::KillProcess { params } => {
                outcome_response(self.engine.kill(params.pid).await)
            }

            Request::UpdatePolicy { params } => {
                self.engine.update_policy(params).await;
                outcome_response(Ok(()))
            }

            Request::Stop => {
                self.engine.stop();
                outcome_response(Ok(()))
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    info!("Process booster daemon starting...");

    let config_path = Config::config_path();
    let config = if config_path.exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        })
    } else {
        info!("No config file found, using defaults");
        Config::default()
    };

    let socket_path = SocketServer::socket_path();
    let server = SocketServer::bind(&socket_path).await?;

    let accessor = Arc::new(LinuxProcessAccessor::new());
    let engine = Arc::new(Engine::new(accessor, config, server.broadcast_sender()));

    let loop_engine = Arc::clone(&engine);
    tokio::spawn(async move {
        loop_engine.run().await;
    });

    let daemon = Arc::new(Daemon {
        engine: Arc::clone(&engine),
    });

    info!("Daemon ready, listening for connections...");

    let mut shutdown = engine.subscribe_shutdown();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, stopping");
                engine.stop();
                break;
            }
            _ = shutdown.recv() => break,
            result = server.accept() => {
                match result {
                    Ok(stream) => {
                        let daemon = Arc::clone(&daemon);
                        let broadcast_rx = server.broadcast_sender().subscribe();
                        tokio::spawn(async move {
                            handle_client(stream, broadcast_rx, daemon).await;
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                }
            }
        }
    }

    info!("Daemon stopped");
    Ok(())
}
