//! reqwest implementation of [`TaskApi`]

use std::time::Duration;

use async_trait::async_trait;
use ps_core::config::ApiConfig;
use ps_core::{Page, PageParams, PsError, PsResult};
use ps_models::{
    CreateTask, NewRecord, OptionCatalog, PushRecipient, PushSettings, Task, TaskCounts,
    UpdateTask, UserRecord,
};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{TaskApi, USERS_PUSH_QUERY};

/// Backend client over one canonical base URL
#[derive(Clone, Debug)]
pub struct HttpTaskApi {
    reqwest: reqwest::Client,
    server: String,
    timeout_seconds: u64,
}

/// Bodies that arrive either bare or wrapped in `{data: ...}`
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(data) => data,
        }
    }
}

/// `GET /users/:id` answers with an object or a one-element array
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<UserRecord>),
    One(UserRecord),
}

impl HttpTaskApi {
    pub fn new(config: &ApiConfig) -> PsResult<Self> {
        let reqwest = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| PsError::Config(format!("http client: {}", e)))?;

        Ok(Self {
            reqwest,
            server: config.base_url.trim_end_matches('/').to_string(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.server, path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder) -> PsResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_seconds))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> PsResult<T> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| transport_error(e, self.timeout_seconds))
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self, params: PageParams) -> PsResult<Page<Task>> {
        debug!(page = params.page, limit = params.limit, "fetching task page");
        self.send_json(self.reqwest.get(self.url("/tasks")).query(&params))
            .await
    }

    async fn task_counts(&self) -> PsResult<TaskCounts> {
        let body: Envelope<TaskCounts> = self
            .send_json(self.reqwest.get(self.url("/tasks/count")))
            .await?;
        Ok(body.into_inner())
    }

    async fn get_task(&self, key: &str) -> PsResult<Task> {
        let result = self
            .send_json::<Envelope<Task>>(self.reqwest.get(self.url(&format!("/tasks/{}", key))))
            .await;
        match result {
            Ok(body) => Ok(body.into_inner()),
            Err(PsError::Http { status: 404, .. }) => Err(PsError::not_found("task", "key", key)),
            Err(e) => Err(e),
        }
    }

    async fn create_task(&self, task: &CreateTask) -> PsResult<Task> {
        let body: Value = self
            .send_json(self.reqwest.post(self.url("/tasks")).json(task))
            .await?;
        Ok(created_task(task, body))
    }

    async fn update_task(&self, key: &str, update: &UpdateTask) -> PsResult<()> {
        self.send(
            self.reqwest
                .patch(self.url(&format!("/tasks/{}", key)))
                .json(update),
        )
        .await?;
        Ok(())
    }

    async fn create_comment(&self, record: &NewRecord) -> PsResult<()> {
        self.send(self.reqwest.post(self.url("/comments")).json(record))
            .await?;
        Ok(())
    }

    async fn create_log(&self, record: &NewRecord) -> PsResult<()> {
        self.send(self.reqwest.post(self.url("/logs")).json(record))
            .await?;
        Ok(())
    }

    async fn get_options(&self) -> PsResult<OptionCatalog> {
        let body: Envelope<OptionCatalog> =
            self.send_json(self.reqwest.get(self.url("/options"))).await?;
        Ok(body.into_inner())
    }

    async fn get_user(&self, id: &str) -> PsResult<Option<UserRecord>> {
        let result = self
            .send(self.reqwest.get(self.url(&format!("/users/{}", id))))
            .await;
        let response = match result {
            Ok(response) => response,
            Err(PsError::Http { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let body: Value = response
            .json()
            .await
            .map_err(|e| transport_error(e, self.timeout_seconds))?;
        Ok(user_from_body(body))
    }

    async fn update_push_settings(&self, admin_key: &str, settings: &PushSettings) -> PsResult<()> {
        self.send(
            self.reqwest
                .patch(self.url(&format!("/users/{}", admin_key)))
                .json(settings),
        )
        .await?;
        Ok(())
    }

    async fn list_push_recipients(&self) -> PsResult<Vec<PushRecipient>> {
        let body: Envelope<Vec<PushRecipient>> = self
            .send_json(self.reqwest.get(self.url("/users")).query(&[USERS_PUSH_QUERY]))
            .await?;
        Ok(body
            .into_inner()
            .into_iter()
            .filter(|r| r.token().is_some())
            .collect())
    }
}

fn transport_error(err: reqwest::Error, timeout_seconds: u64) -> PsError {
    if err.is_timeout() {
        PsError::Timeout {
            seconds: timeout_seconds,
        }
    } else if err.is_decode() {
        PsError::Decode(err.to_string())
    } else if let Some(status) = err.status() {
        PsError::Http {
            status: status.as_u16(),
            message: err.to_string(),
        }
    } else {
        PsError::network(err.to_string())
    }
}

fn status_error(status: StatusCode, body: String) -> PsError {
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body
    };
    PsError::Http {
        status: status.as_u16(),
        message,
    }
}

/// The create endpoint may echo the task, wrap it, or only return its key
fn created_task(request: &CreateTask, body: Value) -> Task {
    let body = match body {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    };

    let echoed = serde_json::from_value::<Task>(body.clone()).ok();
    let mut task = Task {
        admin_key: request.admin_key.clone(),
        task_title: request.task_title.clone(),
        task_company: request.task_company.clone(),
        task_priority: request.task_priority,
        task_progressing: request.task_progressing,
        task_order_date: request.task_order_date.clone(),
        task_delivery_date: request.task_delivery_date.clone(),
        task_detail: request.task_detail.clone(),
        ..Default::default()
    };

    match echoed {
        Some(echoed) if !echoed.task_title.is_empty() => echoed,
        Some(echoed) => {
            task.task_key = echoed.task_key;
            task.created_at = echoed.created_at;
            task
        }
        None => {
            warn!("create response was not a task record");
            task
        }
    }
}

fn user_from_body(body: Value) -> Option<UserRecord> {
    let row = match serde_json::from_value::<OneOrMany>(body) {
        Ok(OneOrMany::Many(rows)) => rows.into_iter().next(),
        Ok(OneOrMany::One(row)) => Some(row),
        Err(e) => {
            debug!(error = %e, "user body did not decode");
            None
        }
    };
    row.filter(|row| row.admin_id.is_some())
}
