// Ingest + query listener — length-prefixed JSON frames over TCP (4-byte big-endian length,
// then UTF-8 JSON body). No HTTP framework appears anywhere in this crate's lineage, so this
// hand-rolled framing stands in for the HTTP-shaped endpoints described in the interface
// spec rather than pulling one in.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::dispatcher::Dispatcher;
use crate::enrichment::EnrichmentManager;
use crate::events::{Alert, AuthEvent, DetectionType};
use crate::graph::build_graph;
use crate::store::Store;

const MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Ingest { event: AuthEvent },
    ListAlerts {
        #[serde(default)]
        skip: usize,
        #[serde(default = "default_limit")]
        limit: usize,
        #[serde(default)]
        detection_type: Option<DetectionType>,
        #[serde(default)]
        since: Option<DateTime<Utc>>,
    },
    GetAlert { alert_id: String },
    AcknowledgeAlert { alert_id: String },
    EnrichmentStatus,
    Health,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
#[allow(clippy::large_enum_variant)]
pub enum Response {
    Ok(ResponseBody),
    ValidationError { message: String },
    NotFound { message: String },
    Error { message: String },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Ingest {
        event_id: String,
        alerts_fired: Vec<Alert>,
    },
    Alerts(Vec<Alert>),
    Alert(Alert),
    Acknowledged {
        acknowledged: bool,
        alert_id: String,
    },
    EnrichmentStatus {
        vault_host_count: usize,
        critical_account_count: usize,
    },
    Health {
        store_reachable: bool,
        enrichment_loaded: bool,
    },
}

pub struct Server<S: Store> {
    store: Arc<S>,
    dispatcher: Arc<Dispatcher<S>>,
    enrichment: Arc<EnrichmentManager>,
    addr: SocketAddr,
}

impl<S: Store + 'static> Server<S> {
    pub fn new(
        store: Arc<S>,
        dispatcher: Arc<Dispatcher<S>>,
        enrichment: Arc<EnrichmentManager>,
        addr: SocketAddr,
    ) -> Self {
        Self {
            store,
            dispatcher,
            enrichment,
            addr,
        }
    }

    pub async fn serve(self: Arc<Self>) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        info!(addr = %self.addr, "ingest listener bound");

        loop {
            let (stream, peer) = listener.accept().await?;
            let server = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = server.handle_connection(stream).await {
                    warn!(%peer, error = %e, "connection error");
                }
            });
        }
    }

    async fn handle_connection(&self, mut stream: TcpStream) -> anyhow::Result<()> {
        loop {
            let mut len_buf = [0u8; 4];
            match stream.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let len = u32::from_be_bytes(len_buf);
            if len > MAX_FRAME_BYTES {
                anyhow::bail!("frame too large: {len} bytes");
            }
            let mut body = vec![0u8; len as usize];
            stream.read_exact(&mut body).await?;

            let response = match serde_json::from_slice::<Request>(&body) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => Response::ValidationError {
                    message: format!("malformed request: {e}"),
                },
            };

            let response_bytes = serde_json::to_vec(&response)?;
            stream
                .write_all(&(response_bytes.len() as u32).to_be_bytes())
                .await?;
            stream.write_all(&response_bytes).await?;
        }
        Ok(())
    }

    async fn handle_request(&self, request: Request) -> Response {
        match request {
            Request::Ingest { event } => self.handle_ingest(event).await,
            Request::ListAlerts {
                skip,
                limit,
                detection_type,
                since,
            } => {
                let limit = limit.clamp(1, 500);
                match self
                    .store
                    .list_alerts(skip, limit, detection_type, since)
                    .await
                {
                    Ok(alerts) => Response::Ok(ResponseBody::Alerts(alerts)),
                    Err(e) => Response::Error { message: e.to_string() },
                }
            }
            Request::GetAlert { alert_id } => match self.store.get_alert(&alert_id).await {
                Ok(Some(alert)) => Response::Ok(ResponseBody::Alert(alert)),
                Ok(None) => Response::NotFound {
                    message: format!("alert {alert_id} not found"),
                },
                Err(e) => Response::Error { message: e.to_string() },
            },
            Request::AcknowledgeAlert { alert_id } => {
                match self.store.acknowledge_alert(&alert_id).await {
                    Ok(true) => Response::Ok(ResponseBody::Acknowledged {
                        acknowledged: true,
                        alert_id,
                    }),
                    Ok(false) => Response::NotFound {
                        message: format!("alert {alert_id} not found"),
                    },
                    Err(e) => Response::Error { message: e.to_string() },
                }
            }
            Request::EnrichmentStatus => match self.enrichment.current() {
                Ok(snapshot) => Response::Ok(ResponseBody::EnrichmentStatus {
                    vault_host_count: snapshot.vault.keytabs_by_host.len(),
                    critical_account_count: snapshot.critical_accounts.accounts.len(),
                }),
                Err(e) => Response::Error { message: e.to_string() },
            },
            Request::Health => Response::Ok(ResponseBody::Health {
                store_reachable: true,
                enrichment_loaded: self.enrichment.current().is_ok(),
            }),
        }
    }

    async fn handle_ingest(&self, event: AuthEvent) -> Response {
        if let Err(e) = event.validate() {
            return Response::ValidationError {
                message: e.to_string(),
            };
        }

        let event_id = event.id().to_string();
        if let Err(e) = self.store.insert_event(event.clone()).await {
            return Response::Error { message: e.to_string() };
        }

        let all_events = match self.store.all_events().await {
            Ok(events) => events,
            Err(e) => return Response::Error { message: e.to_string() },
        };
        let graph = build_graph(&all_events);

        match self.dispatcher.on_event_inserted(&event, &graph).await {
            Ok(alerts_fired) => Response::Ok(ResponseBody::Ingest {
                event_id,
                alerts_fired,
            }),
            Err(e) => Response::Error { message: e.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::enrichment::EnrichmentManager;
    use crate::events::{RawSource, SessionEvent, SessionMechanism};
    use crate::store::MemoryStore;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn server() -> Server<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let enrichment = Arc::new(EnrichmentManager::new(Default::default()));
        enrichment.load_sync();
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&store),
            Arc::clone(&enrichment),
            AppConfig::default(),
        ));
        Server::new(store, dispatcher, enrichment, "127.0.0.1:0".parse().unwrap())
    }

    fn event() -> AuthEvent {
        AuthEvent::Session(SessionEvent {
            id: Uuid::new_v4(),
            src_account_id: "account:a".into(),
            src_host_id: "host:h1".into(),
            dst_account_id: "account:b".into(),
            dst_host_id: "host:h1".into(),
            mechanism: SessionMechanism::Sudo,
            src_privilege: 0.1,
            dst_privilege: 0.9,
            timestamp: Utc::now(),
            session_id: None,
            host_id: "host:h1".into(),
            raw_source: RawSource::UnixAuth,
            metadata: HashMap::new(),
            auth_method: None,
            command_line: None,
        })
    }

    #[tokio::test]
    async fn ingest_persists_event_and_fires_alerts() {
        let server = server();
        let response = server.handle_request(Request::Ingest { event: event() }).await;
        match response {
            Response::Ok(ResponseBody::Ingest { alerts_fired, .. }) => {
                assert_eq!(alerts_fired.len(), 1);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_alert_not_found_yields_not_found() {
        let server = server();
        let response = server
            .handle_request(Request::GetAlert {
                alert_id: "missing".into(),
            })
            .await;
        assert!(matches!(response, Response::NotFound { .. }));
    }

    #[tokio::test]
    async fn enrichment_status_reports_current_counts() {
        let server = server();
        let response = server.handle_request(Request::EnrichmentStatus).await;
        match response {
            Response::Ok(ResponseBody::EnrichmentStatus {
                vault_host_count,
                critical_account_count,
            }) => {
                assert_eq!(vault_host_count, 4);
                assert_eq!(critical_account_count, 3);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }
}
