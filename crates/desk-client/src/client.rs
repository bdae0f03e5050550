use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    cookie::{CookieStore, Jar},
    header::CONTENT_TYPE,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    dto::{AggregatePayload, CurrentUser, ErrorBody, LoginRequest, MeResponse},
    error::ClientError,
    traits::DashboardApi,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const LOGIN: &str = "auth/login";
const LOGOUT: &str = "auth/logout";
const REFRESH_TOKEN: &str = "auth/refresh_token";
const AUTH_ME: &str = "auth/me";
const MENU_DASHBOARD: &str = "menu/dashboard";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout: Duration,
    /// Where the session cookie is kept between runs. `None` keeps it in memory only.
    pub session_file: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeout: DEFAULT_TIMEOUT,
            session_file: None,
        })
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }
}

/// Endpoints are joined onto the base, so it has to end with a slash.
fn normalize_base_url(raw: &str) -> Result<Url, ClientError> {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        Ok(Url::parse(trimmed)?)
    } else {
        Ok(Url::parse(&format!("{trimmed}/"))?)
    }
}

/// Session cookie as persisted on disk.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    base_url: String,
    cookie: String,
}

pub struct HttpDashboardClient {
    http_client: Client,
    cookies: Arc<Jar>,
    base_url: Url,
    session_file: Option<PathBuf>,
}

impl HttpDashboardClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let cookies = Arc::new(Jar::default());
        if let Some(path) = config.session_file.as_deref() {
            restore_session(&cookies, &config.base_url, path);
        }

        let http_client = http_client(Arc::clone(&cookies), config.timeout)?;

        Ok(Self {
            http_client,
            cookies,
            base_url: config.base_url,
            session_file: config.session_file,
        })
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    /// Sends a request built by `build`. On a 401 the access token is refreshed once and
    /// the request replayed once; a second rejection is reported as `Unauthorized`.
    async fn send_with_refresh<F>(&self, build: F) -> Result<Response, ClientError>
    where
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let response = build(&self.http_client).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!("Session rejected, attempting token refresh");
        let refresh = self
            .http_client
            .post(self.endpoint(REFRESH_TOKEN)?)
            .send()
            .await?;

        if refresh.status().is_success() {
            self.persist_session();
            let retried = build(&self.http_client).send().await?;
            if retried.status() != StatusCode::UNAUTHORIZED {
                return Ok(retried);
            }
        } else {
            tracing::debug!(status = %refresh.status(), "Token refresh rejected");
        }

        Err(ClientError::Unauthorized)
    }

    /// Mirrors the jar's cookies for the base URL to the session file, removing the file
    /// once the backend has cleared them. Failures only cost the next run its session.
    fn persist_session(&self) {
        let Some(path) = self.session_file.as_deref() else {
            return;
        };

        let result = match self.cookies.cookies(&self.base_url) {
            Some(header) => match header.to_str() {
                Ok(cookie) => write_session(path, &self.base_url, cookie),
                Err(err) => {
                    tracing::warn!(error = %err, "Session cookie is not valid UTF-8, not persisting");
                    return;
                }
            },
            None => match std::fs::remove_file(path) {
                Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
                _ => Ok(()),
            },
        };

        if let Err(err) = result {
            tracing::warn!(path = %path.display(), error = %err, "Failed to persist session");
        }
    }
}

fn write_session(path: &Path, base_url: &Url, cookie: &str) -> Result<(), ClientError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let stored = StoredSession {
        base_url: base_url.to_string(),
        cookie: cookie.to_string(),
    };
    std::fs::write(path, serde_json::to_vec(&stored)?)?;
    Ok(())
}

/// Loads a previously persisted session into the jar. A missing, unreadable or foreign
/// session file just means starting signed out.
fn restore_session(jar: &Jar, base_url: &Url, path: &Path) {
    let stored = match std::fs::read(path) {
        Ok(bytes) => match serde_json::from_slice::<StoredSession>(&bytes) {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Ignoring unreadable session file");
                return;
            }
        },
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %err, "Failed to read session file");
            }
            return;
        }
    };

    if stored.base_url != base_url.as_str() {
        tracing::debug!(
            stored = %stored.base_url,
            current = %base_url,
            "Session file belongs to another backend, ignoring"
        );
        return;
    }

    for pair in stored.cookie.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        jar.add_cookie_str(pair, base_url);
    }
}

#[async_trait::async_trait]
impl DashboardApi for HttpDashboardClient {
    async fn get_dashboard(&self) -> Result<AggregatePayload, ClientError> {
        let url = self.endpoint(MENU_DASHBOARD)?;
        let response = self
            .send_with_refresh(|client| {
                client
                    .get(url.clone())
                    .header(CONTENT_TYPE, "application/json")
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::StatusError(status));
        }

        let body = response.bytes().await?;
        let payload = serde_json::from_slice::<AggregatePayload>(&body)?;
        Ok(payload)
    }

    async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let response = self
            .http_client
            .post(self.endpoint(LOGIN)?)
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        if response.status().is_success() {
            self.persist_session();
            return Ok(());
        }

        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        Err(ClientError::LoginRejected {
            message: body.describe().unwrap_or_else(|| "Login failed".to_string()),
            resolution: body.resolution.filter(|r| !r.is_empty()),
        })
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let response = self
            .http_client
            .post(self.endpoint(LOGOUT)?)
            .send()
            .await?;

        if response.status().is_success() {
            self.persist_session();
            return Ok(());
        }

        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        Err(ClientError::LogoutRejected(
            body.describe().unwrap_or_else(|| "Logout failed".to_string()),
        ))
    }

    async fn current_user(&self) -> Result<CurrentUser, ClientError> {
        let url = self.endpoint(AUTH_ME)?;
        let response = self
            .send_with_refresh(|client| client.get(url.clone()))
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::StatusError(status));
        }

        let me = response.json::<MeResponse>().await?;
        Ok(me.into())
    }
}

pub fn http_client(cookies: Arc<Jar>, timeout: Duration) -> Result<Client, ClientError> {
    Client::builder()
        .cookie_provider(cookies)
        .timeout(timeout)
        .build()
        .map_err(|e| {
            tracing::error!("Failed to build HTTP client: {}", e);
            ClientError::InternalClientError
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url_appends_slash() {
        let url = normalize_base_url("http://localhost:8000").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/");
        assert_eq!(
            url.join(MENU_DASHBOARD).unwrap().as_str(),
            "http://localhost:8000/menu/dashboard"
        );

        let nested = normalize_base_url("https://desk.example.com/api/").unwrap();
        assert_eq!(
            nested.join(LOGIN).unwrap().as_str(),
            "https://desk.example.com/api/auth/login"
        );
    }

    #[test]
    fn test_normalize_base_url_rejects_garbage() {
        assert!(matches!(
            normalize_base_url("not a url"),
            Err(ClientError::UrlError(_))
        ));
    }

    #[test]
    fn test_session_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let base = normalize_base_url("http://localhost:8000").unwrap();

        write_session(&path, &base, "access_token=abc; refresh_token=def").unwrap();

        let jar = Jar::default();
        restore_session(&jar, &base, &path);
        let header = jar.cookies(&base).unwrap();
        let header = header.to_str().unwrap();
        assert!(header.contains("access_token=abc"));
        assert!(header.contains("refresh_token=def"));
    }

    #[test]
    fn test_session_for_other_backend_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let stored_for = normalize_base_url("http://other:9000").unwrap();
        let base = normalize_base_url("http://localhost:8000").unwrap();

        write_session(&path, &stored_for, "access_token=abc").unwrap();

        let jar = Jar::default();
        restore_session(&jar, &base, &path);
        assert!(jar.cookies(&base).is_none());
    }

    #[test]
    fn test_corrupt_session_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();
        let base = normalize_base_url("http://localhost:8000").unwrap();

        let jar = Jar::default();
        restore_session(&jar, &base, &path);
        assert!(jar.cookies(&base).is_none());
    }
}
