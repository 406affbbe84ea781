use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::bridge::tools::{ToolContext, invoke_tool};
use crate::dom::document::Document;
use crate::error::{FormPilotError, Result};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRequest {
    pub request_id: Uuid,
    pub tool: String,
    #[serde(default)]
    pub input: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub request_id: Uuid,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResponse {
    fn success(request_id: Uuid, result: Value) -> Self {
        Self { request_id, ok: true, result: Some(result), error: None }
    }

    fn failure(request_id: Uuid, error: impl Into<String>) -> Self {
        Self { request_id, ok: false, result: None, error: Some(error.into()) }
    }
}

type PendingCalls = Arc<Mutex<HashMap<Uuid, SyncSender<ToolResponse>>>>;

/// Caller side of the bridge.
///
/// Every message crosses the boundary as a serialized JSON string. Each call
/// gets a fresh request id and waits on its own one-shot channel; a delivery
/// thread routes responses back by id. A call resolves exactly once: either
/// with the first matching response or with a timeout, after which any late
/// response for that id is discarded.
pub struct BridgeClient {
    outbound: Sender<String>,
    pending: PendingCalls,
    timeout: Duration,
    _delivery: JoinHandle<()>,
}

/// Page side of the bridge: raw inbound requests and the outbound response pipe.
pub struct PageEndpoint {
    pub inbound: Receiver<String>,
    pub outbound: Sender<String>,
}

/// Create a connected client/page pair.
pub fn connect(timeout: Duration) -> (BridgeClient, PageEndpoint) {
    let (to_page, page_inbound) = mpsc::channel::<String>();
    let (to_client, client_inbound) = mpsc::channel::<String>();

    let pending: PendingCalls = Arc::new(Mutex::new(HashMap::new()));
    let delivery_pending = Arc::clone(&pending);
    let delivery = thread::spawn(move || {
        for raw in client_inbound {
            deliver(&delivery_pending, &raw);
        }
    });

    let client = BridgeClient {
        outbound: to_page,
        pending,
        timeout,
        _delivery: delivery,
    };
    let endpoint = PageEndpoint {
        inbound: page_inbound,
        outbound: to_client,
    };
    (client, endpoint)
}

/// Route one raw response to its waiting call. Returns false for responses
/// that are malformed, unknown, or arrive after their call resolved.
fn deliver(pending: &PendingCalls, raw: &str) -> bool {
    let response: ToolResponse = match serde_json::from_str(raw) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "discarding malformed bridge response");
            return false;
        }
    };

    let waiter = match pending.lock() {
        Ok(mut map) => map.remove(&response.request_id),
        Err(e) => {
            tracing::warn!(error = %e, "bridge pending map poisoned");
            return false;
        }
    };

    match waiter {
        Some(tx) => tx.try_send(response).is_ok(),
        None => {
            tracing::debug!(request_id = %response.request_id, "discarding stale bridge response");
            false
        }
    }
}

impl BridgeClient {
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Invoke a tool on the page and wait for its result.
    pub fn call(&self, tool: &str, input: Value) -> Result<Value> {
        let request = ToolRequest {
            request_id: Uuid::new_v4(),
            tool: tool.to_string(),
            input,
        };
        let id = request.request_id;

        let raw = serde_json::to_string(&request).map_err(|e| FormPilotError::JsonSerialize {
            context: format!("bridge request for '{}'", tool),
            source: e,
        })?;

        let (tx, rx) = mpsc::sync_channel(1);
        self.pending
            .lock()
            .map_err(|e| FormPilotError::Bridge(format!("pending map poisoned: {}", e)))?
            .insert(id, tx);

        if self.outbound.send(raw).is_err() {
            self.forget(id);
            return Err(FormPilotError::Bridge("page side disconnected".into()));
        }

        match rx.recv_timeout(self.timeout) {
            Ok(response) if response.ok => Ok(response.result.unwrap_or(Value::Null)),
            Ok(response) => Err(FormPilotError::Bridge(
                response
                    .error
                    .unwrap_or_else(|| format!("tool '{}' failed", tool)),
            )),
            Err(RecvTimeoutError::Timeout) => {
                self.forget(id);
                tracing::warn!(tool, "bridge call timed out");
                Err(FormPilotError::Bridge(format!(
                    "tool '{}' timed out after {:?}",
                    tool, self.timeout
                )))
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.forget(id);
                Err(FormPilotError::Bridge("page side disconnected".into()))
            }
        }
    }

    /// Number of calls still waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|m| m.len()).unwrap_or(0)
    }

    fn forget(&self, id: Uuid) {
        if let Ok(mut map) = self.pending.lock() {
            map.remove(&id);
        }
    }
}

/// Owns the page document and answers tool requests.
pub struct BridgeHost {
    doc: Document,
    ctx: ToolContext,
}

impl BridgeHost {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            ctx: ToolContext::default(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Handle one raw request. Returns `None` when the message cannot be
    /// parsed as a request, since there is no id to answer.
    pub fn handle(&mut self, raw: &str) -> Option<String> {
        let request: ToolRequest = match serde_json::from_str(raw) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed bridge request");
                return None;
            }
        };

        tracing::debug!(tool = %request.tool, request_id = %request.request_id, "bridge request");
        let response = match invoke_tool(&mut self.doc, &mut self.ctx, &request.tool, &request.input) {
            Ok(result) => ToolResponse::success(request.request_id, result),
            Err(message) => ToolResponse::failure(request.request_id, message),
        };

        serde_json::to_string(&response)
            .map_err(|e| tracing::warn!(error = %e, "failed to serialize bridge response"))
            .ok()
    }

    /// Serve requests on a dedicated thread until the client disconnects.
    /// The document is handed back when the thread finishes.
    pub fn serve(mut self, endpoint: PageEndpoint) -> JoinHandle<Document> {
        thread::spawn(move || {
            for raw in endpoint.inbound {
                if let Some(reply) = self.handle(&raw) {
                    if endpoint.outbound.send(reply).is_err() {
                        break;
                    }
                }
            }
            self.doc
        })
    }
}
