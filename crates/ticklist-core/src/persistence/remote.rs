use std::time::Duration;

use reqwest::{Method, Url};
use serde::Serialize;
use serde_json::Value;
use ticklist_shared::{Icon, Task, TaskId, TaskIdArg};
use tracing::{debug, info, warn};

use super::{CommitMode, Persistence};
use crate::error::PersistenceError;

const BODY_PREVIEW_LIMIT: usize = 512;

/// Body of a create request: the draft without an id.
#[derive(Debug, Serialize)]
struct NewTaskBody<'a> {
    name: &'a str,
    done: bool,
    icon: Icon,
}

/// One HTTP resource serving list/create/update/delete.
#[derive(Debug, Clone)]
pub struct RemoteAdapter {
    endpoint: Url,
    client: reqwest::Client,
}

impl RemoteAdapter {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, PersistenceError> {
        let trimmed = endpoint.trim();
        let endpoint = Url::parse(trimmed).map_err(|err| PersistenceError::InvalidEndpoint {
            endpoint: trimmed.to_string(),
            reason: err.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(PersistenceError::InvalidEndpoint {
                endpoint: trimmed.to_string(),
                reason: format!("unsupported scheme {}", endpoint.scheme()),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| PersistenceError::Transport {
                method: "BUILD".to_string(),
                endpoint: endpoint.to_string(),
                source,
            })?;

        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send(&self, method: Method, body: Option<Vec<u8>>) -> Result<String, PersistenceError> {
        debug!(%method, endpoint = %self.endpoint, has_body = body.is_some(), "sending request");

        let mut request = self
            .client
            .request(method.clone(), self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let transport_err = |source| PersistenceError::Transport {
            method: method.to_string(),
            endpoint: self.endpoint.to_string(),
            source,
        };
        let response = request.send().await.map_err(transport_err)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_err)?;

        if !status.is_success() {
            warn!(%method, status = status.as_u16(), "endpoint returned non-success status");
            return Err(PersistenceError::Status {
                method: method.to_string(),
                endpoint: self.endpoint.to_string(),
                status: status.as_u16(),
                body: preview(&text),
            });
        }

        debug!(%method, status = status.as_u16(), len = text.len(), "response received");
        Ok(text)
    }
}

fn preview(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_PREVIEW_LIMIT) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

fn encode<T: Serialize + ?Sized>(what: &'static str, value: &T) -> Result<Vec<u8>, PersistenceError> {
    serde_json::to_vec(value).map_err(|source| PersistenceError::Encode { what, source })
}

/// Reads the record a write confirmed. A full task wins; an ack that only
/// carries an `id` is merged into what was sent; a bare ack keeps `sent`
/// when `require_id` is false.
fn confirmed_record(sent: &Task, body: &str, require_id: bool) -> Result<Task, PersistenceError> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(source) if body.trim().is_empty() && !require_id => {
            debug!(%source, "empty acknowledgement body");
            return Ok(sent.clone());
        }
        Err(source) => {
            return Err(PersistenceError::Decode {
                what: "write response",
                source,
            });
        }
    };

    if let Ok(task) = serde_json::from_value::<Task>(value.clone()) {
        return Ok(task);
    }

    if let Some(raw_id) = value.get("id").cloned() {
        let id: TaskId = serde_json::from_value(raw_id).map_err(|source| PersistenceError::Decode {
            what: "task id",
            source,
        })?;
        return Ok(Task { id, ..sent.clone() });
    }

    if require_id {
        return Err(PersistenceError::MissingId);
    }
    Ok(sent.clone())
}

impl Persistence for RemoteAdapter {
    fn commit_mode(&self) -> CommitMode {
        CommitMode::Confirmed
    }

    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn load(&self) -> Result<Vec<Task>, PersistenceError> {
        let body = self.send(Method::GET, None).await?;
        let tasks: Vec<Task> = serde_json::from_str(&body).map_err(|source| PersistenceError::Decode {
            what: "task list",
            source,
        })?;
        info!(count = tasks.len(), "fetched tasks from endpoint");
        Ok(tasks)
    }

    #[tracing::instrument(skip_all, fields(endpoint = %self.endpoint, draft_id = %task.id))]
    async fn create(&self, task: &Task, _snapshot: &[Task]) -> Result<Task, PersistenceError> {
        let payload = encode(
            "task draft",
            &NewTaskBody {
                name: &task.name,
                done: task.done,
                icon: task.icon,
            },
        )?;
        let body = self.send(Method::POST, Some(payload)).await?;
        let confirmed = confirmed_record(task, &body, true)?;
        if confirmed.id.is_empty() {
            return Err(PersistenceError::MissingId);
        }
        info!(id = %confirmed.id, "endpoint assigned task id");
        Ok(confirmed)
    }

    #[tracing::instrument(skip_all, fields(endpoint = %self.endpoint, id = %task.id))]
    async fn update(&self, task: &Task, _snapshot: &[Task]) -> Result<Task, PersistenceError> {
        let payload = encode("task", task)?;
        let body = self.send(Method::PUT, Some(payload)).await?;
        confirmed_record(task, &body, false)
    }

    #[tracing::instrument(skip_all, fields(endpoint = %self.endpoint, id = %id))]
    async fn remove(&self, id: &TaskId, _snapshot: &[Task]) -> Result<(), PersistenceError> {
        let payload = encode("task id", &TaskIdArg { id: id.clone() })?;
        self.send(Method::DELETE, Some(payload)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sent() -> Task {
        Task {
            id: TaskId::new("local-draft"),
            name: "Buy milk".to_string(),
            done: false,
            icon: Icon::Cart,
        }
    }

    #[test]
    fn rejects_non_http_endpoints() {
        assert!(RemoteAdapter::new("ftp://example.com/api.php", Duration::from_secs(1)).is_err());
        assert!(RemoteAdapter::new("not a url", Duration::from_secs(1)).is_err());
        assert!(RemoteAdapter::new(" http://localhost:8000/api.php ", Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn full_task_response_wins() {
        let body = r#"{"id": 12, "name": "Buy milk", "done": 0, "icon": "🛒"}"#;
        let task = confirmed_record(&sent(), body, true).expect("confirmed");
        assert_eq!(task.id.as_str(), "12");
        assert_eq!(task.icon, Icon::Cart);
    }

    #[test]
    fn id_only_ack_is_merged_into_sent_record() {
        let body = r#"{"success": true, "id": "srv-9"}"#;
        let task = confirmed_record(&sent(), body, true).expect("confirmed");
        assert_eq!(task.id.as_str(), "srv-9");
        assert_eq!(task.name, "Buy milk");
    }

    #[test]
    fn bare_ack_needs_an_id_only_for_creates() {
        let body = r#"{"success": true}"#;
        assert!(matches!(
            confirmed_record(&sent(), body, true),
            Err(PersistenceError::MissingId)
        ));
        assert_eq!(confirmed_record(&sent(), body, false).expect("ack"), sent());
        assert_eq!(confirmed_record(&sent(), "", false).expect("empty ack"), sent());
    }

    #[test]
    fn preview_truncates_long_bodies() {
        let long = "x".repeat(BODY_PREVIEW_LIMIT + 10);
        let shown = preview(&long);
        assert!(shown.ends_with('…'));
        assert_eq!(shown.chars().count(), BODY_PREVIEW_LIMIT + 1);
    }
}
