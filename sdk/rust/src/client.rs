use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A timer as returned by the server. Attached fields land in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: String,
    pub group: String,
    pub title: String,
    pub start: String,
    pub end: Option<String>,
    #[serde(default)]
    pub hourly_price: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Timer {
    pub fn is_running(&self) -> bool {
        self.end.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consolidation {
    pub duration: i64,
    pub price: f64,
    pub start: Option<String>,
    pub end: Option<String>,
    pub count_timers: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Debug)]
pub enum SdkError {
    Http(reqwest::Error),
    InvalidUrl(String),
    /// Non-2xx reply carrying the server's error body.
    Status {
        status: StatusCode,
        code: String,
        message: String,
    },
}

impl SdkError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SdkError::Http(e) => e.status(),
            SdkError::InvalidUrl(_) => None,
            SdkError::Status { status, .. } => Some(*status),
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            SdkError::Status { code, .. } => Some(code),
            SdkError::Http(_) | SdkError::InvalidUrl(_) => None,
        }
    }
}

impl std::fmt::Display for SdkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SdkError::Http(e) => write!(f, "HTTP error: {}", e),
            SdkError::InvalidUrl(e) => write!(f, "invalid URL: {}", e),
            SdkError::Status { status, code, message } => {
                write!(f, "server returned {} ({}): {}", status, code, message)
            }
        }
    }
}

impl std::error::Error for SdkError {}

impl From<reqwest::Error> for SdkError {
    fn from(e: reqwest::Error) -> Self {
        SdkError::Http(e)
    }
}

pub type Result<T> = std::result::Result<T, SdkError>;

/// Query filters accepted by the list and consolidate routes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimerQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
}

pub struct TimeClient {
    client: Client,
    base: Url,
}

impl TimeClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| SdkError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(SdkError::InvalidUrl(format!("{} cannot be a base URL", base_url)));
        }
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    /// `base` plus percent-encoded path segments, so names like `a/b` stay one segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client.request(method, self.url(segments))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await?;
            let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => (body.code, body.message),
                Err(_) => (String::new(), text),
            };
            return Err(SdkError::Status { status, code, message });
        }
        Ok(resp.json().await?)
    }

    /// Raw access for routes or bodies the typed methods don't cover.
    pub async fn raw(&self, method: Method, path: &str, body: Option<&Value>) -> Result<reqwest::Response> {
        let url = self.base.join(path).map_err(|e| SdkError::InvalidUrl(e.to_string()))?;
        let mut builder = self.client.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }

    pub async fn docs(&self) -> Result<Value> {
        self.send(self.request(Method::GET, &[])).await
    }

    // Timers

    pub async fn start(&self, group: &str, fields: &Value) -> Result<Timer> {
        self.send(self.request(Method::POST, &["timers", group, "start"]).json(fields))
            .await
    }

    pub async fn stop(&self, group: &str, id: &str) -> Result<Timer> {
        self.send(self.request(Method::POST, &["timers", group, id, "stop"]))
            .await
    }

    pub async fn timer(&self, group: &str, id: &str) -> Result<Timer> {
        self.send(self.request(Method::GET, &["timers", group, id]))
            .await
    }

    pub async fn update_timer(&self, group: &str, id: &str, fields: &Value) -> Result<Timer> {
        self.send(self.request(Method::PUT, &["timers", group, id]).json(fields))
            .await
    }

    pub async fn remove_timer(&self, group: &str, id: &str) -> Result<Value> {
        self.send(self.request(Method::DELETE, &["timers", group, id]))
            .await
    }

    /// All timers, or one group's when `group` is set.
    pub async fn timers(&self, group: Option<&str>, query: &TimerQuery) -> Result<Vec<Timer>> {
        self.send(self.request(Method::GET, &timers_path(group, None)).query(query))
            .await
    }

    pub async fn running(&self, group: Option<&str>, query: &TimerQuery) -> Result<Vec<Timer>> {
        self.send(self.request(Method::GET, &timers_path(group, Some("running"))).query(query))
            .await
    }

    pub async fn consolidate(&self, group: Option<&str>, query: &TimerQuery) -> Result<Consolidation> {
        self.send(self.request(Method::GET, &timers_path(group, Some("consolidate"))).query(query))
            .await
    }

    pub async fn remove_timers(&self, group: Option<&str>) -> Result<Value> {
        self.send(self.request(Method::DELETE, &timers_path(group, None)))
            .await
    }

    // Groups

    pub async fn groups(&self) -> Result<Vec<Group>> {
        self.send(self.request(Method::GET, &["groups"])).await
    }

    pub async fn group_names(&self) -> Result<Vec<String>> {
        self.send(self.request(Method::GET, &["groups", "names"])).await
    }

    pub async fn create_group(&self, name: &str, fields: &Value) -> Result<Group> {
        self.send(self.request(Method::POST, &["groups", name]).json(fields))
            .await
    }

    pub async fn group(&self, name: &str) -> Result<Group> {
        self.send(self.request(Method::GET, &["groups", name]))
            .await
    }

    pub async fn update_group(&self, name: &str, fields: &Value) -> Result<Group> {
        self.send(self.request(Method::PUT, &["groups", name]).json(fields))
            .await
    }

    pub async fn remove_group(&self, name: &str) -> Result<Value> {
        self.send(self.request(Method::DELETE, &["groups", name]))
            .await
    }

    pub async fn group_timers(&self, name: &str, query: &TimerQuery) -> Result<Vec<Timer>> {
        self.send(self.request(Method::GET, &["groups", name, "timers"]).query(query))
            .await
    }

    pub async fn group_running(&self, name: &str) -> Result<Vec<Timer>> {
        self.send(self.request(Method::GET, &["groups", name, "timers", "running"]))
            .await
    }

    pub async fn group_consolidate(&self, name: &str) -> Result<Consolidation> {
        self.send(self.request(Method::GET, &["groups", name, "consolidate"]))
            .await
    }
}

fn timers_path<'a>(group: Option<&'a str>, suffix: Option<&'a str>) -> Vec<&'a str> {
    std::iter::once("timers").chain(group).chain(suffix).collect()
}
