use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{Block, GraphClient, Page};
use crate::error::RoamError;
use crate::model::BlockNode;
use crate::settings::Settings;

const UID_LEN: usize = 9;

const PAGE_BY_TITLE: &str =
    "[:find ?uid . :in $ ?title :where [?p :node/title ?title] [?p :block/uid ?uid]]";
const CHILDREN_BY_STRING: &str = "[:find ?uid ?order :in $ ?parent ?string \
     :where [?p :block/uid ?parent] [?p :block/children ?c] \
     [?c :block/string ?string] [?c :block/uid ?uid] [?c :block/order ?order]]";

/// Blocking client for the Roam alpha write/query API.
pub struct RoamClient {
    http: Client,
    api_url: String,
    graph: String,
    api_key: String,
    graph_token: String,
    max_retries: u32,
    backoff_ms: u64,
}

impl RoamClient {
    pub fn new(settings: &Settings, graph: &str, api_key: &str, graph_token: &str) -> Result<Self, RoamError> {
        Ok(RoamClient {
            http: Client::builder().build()?,
            api_url: settings.roam_api_url.clone(),
            graph: graph.to_string(),
            api_key: api_key.to_string(),
            graph_token: graph_token.to_string(),
            max_retries: settings.max_retries,
            backoff_ms: settings.retry_backoff_ms,
        })
    }

    fn action(&self, body: Value) -> Result<Value, RoamError> {
        self.send(&body, None)
    }

    /// `write_uid` names the uid a write creates. A conflict on that write after
    /// a retry means an earlier attempt landed, so it counts as success.
    fn send(&self, body: &Value, write_uid: Option<&str>) -> Result<Value, RoamError> {
        for attempt in 0..=self.max_retries {
            let response = self
                .http
                .post(&self.api_url)
                .header("x-api-key", &self.api_key)
                .header("x-api-token", &self.graph_token)
                .json(body)
                .send()?;

            let status = response.status();
            let text = response.text()?;

            if status.is_success() {
                debug!(action = %body["action"], "ok");
                if text.trim().is_empty() {
                    return Ok(Value::Null);
                }
                return serde_json::from_str(&text).map_err(|e| RoamError::Decode(e.to_string()));
            }

            let err = api_error(status, &text);
            if let Some(uid) = write_uid {
                if attempt > 0 && is_conflict(&err) {
                    warn!("{} was applied by an earlier attempt, continuing", uid);
                    return Ok(Value::Null);
                }
            }

            if !is_retryable(status) || attempt == self.max_retries {
                return Err(err);
            }

            let backoff = backoff_delay(self.backoff_ms, attempt);
            warn!(
                "Roam returned {} (attempt {}/{}), backing off {:.1}s",
                status,
                attempt + 1,
                self.max_retries,
                backoff.as_secs_f64()
            );
            thread::sleep(backoff);
        }

        unreachable!("retry loop always returns on its last attempt")
    }

    fn create_at(&self, parent_uid: &str, order: usize, node: &BlockNode) -> Result<Block, RoamError> {
        let uid = short_uid();
        let body = create_block_body(&self.graph, parent_uid, order, &node.string, &uid);
        self.send(&body, Some(&uid))?;

        for (i, child) in node.children.iter().enumerate() {
            self.create_at(&uid, i, child)?;
        }

        Ok(Block {
            uid,
            string: node.string.clone(),
        })
    }
}

impl GraphClient for RoamClient {
    fn create_page(&self, title: &str) -> Result<Page, RoamError> {
        let uid = short_uid();
        match self.action(create_page_body(&self.graph, title, &uid)) {
            Ok(_) => Ok(Page {
                uid,
                title: title.to_string(),
            }),
            Err(e) if is_conflict(&e) => Err(RoamError::ObjectExists {
                title: title.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    fn get_page_by_title(&self, title: &str) -> Result<Page, RoamError> {
        let result = self.action(query_body(&self.graph, PAGE_BY_TITLE, &[title]))?;
        match result.get("success").and_then(Value::as_str) {
            Some(uid) => Ok(Page {
                uid: uid.to_string(),
                title: title.to_string(),
            }),
            None => Err(RoamError::NotFound {
                what: format!("page {:?}", title),
            }),
        }
    }

    fn get_children_by_string(&self, parent_uid: &str, string: &str) -> Result<Vec<Block>, RoamError> {
        let result = self.action(query_body(&self.graph, CHILDREN_BY_STRING, &[parent_uid, string]))?;
        parse_children(&result, string)
    }

    fn create_block(&self, parent_uid: &str, node: &BlockNode) -> Result<Block, RoamError> {
        self.create_at(parent_uid, 0, node)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Only 400/409 bodies mentioning an existing object are conflicts.
fn is_conflict(err: &RoamError) -> bool {
    matches!(err, RoamError::Api { status: 400 | 409, message } if message.contains("already exists"))
}

fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(2u64.saturating_pow(attempt)))
}

fn api_error(status: StatusCode, body: &str) -> RoamError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.trim().to_string());
    RoamError::Api {
        status: status.as_u16(),
        message,
    }
}

fn short_uid() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..UID_LEN].to_string()
}

fn create_page_body(graph: &str, title: &str, uid: &str) -> Value {
    json!({
        "action": "create-page",
        "graph": graph,
        "page": { "title": title, "uid": uid },
    })
}

fn create_block_body(graph: &str, parent_uid: &str, order: usize, string: &str, uid: &str) -> Value {
    json!({
        "action": "create-block",
        "graph": graph,
        "location": { "parent-uid": parent_uid, "order": order },
        "block": { "string": string, "uid": uid },
    })
}

fn query_body(graph: &str, query: &str, args: &[&str]) -> Value {
    json!({
        "action": "q",
        "graph": graph,
        "query": query,
        "args": args,
    })
}

/// `{"success": [[uid, order], ...]}` -> blocks sorted by order.
fn parse_children(result: &Value, string: &str) -> Result<Vec<Block>, RoamError> {
    let rows = match result.get("success") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(rows)) => rows,
        Some(other) => return Err(RoamError::Decode(format!("expected rows, got {}", other))),
    };

    let mut found = Vec::with_capacity(rows.len());
    for row in rows {
        let uid = row.get(0).and_then(Value::as_str);
        let order = row.get(1).and_then(Value::as_u64).unwrap_or(u64::MAX);
        match uid {
            Some(uid) => found.push((order, uid.to_string())),
            None => return Err(RoamError::Decode(format!("bad row {}", row))),
        }
    }
    found.sort();

    Ok(found
        .into_iter()
        .map(|(_, uid)| Block {
            uid,
            string: string.to_string(),
        })
        .collect())
}
