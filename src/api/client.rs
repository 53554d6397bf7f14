use super::types::*;
use anyhow::Context;
use reqwest::{StatusCode, Url};
use std::fmt;
use std::time::Duration;

#[derive(Clone)]
pub struct DucoClient {
    base: Url,
    http: reqwest::Client,
}

impl DucoClient {
    /// A request that takes longer than `timeout` fails like any other fetch.
    pub fn new(base: String, timeout: Duration) -> anyhow::Result<Self> {
        let base = Url::parse(&base).with_context(|| format!("invalid API url {base}"))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("duco-tracker/", env!("CARGO_PKG_VERSION")))
            .default_headers({
                let mut h = reqwest::header::HeaderMap::new();
                h.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                h
            })
            .build()?;
        Ok(Self { base, http })
    }

    pub fn user_url(&self, user: &str) -> anyhow::Result<Url> {
        let mut url = self.base.join("/v2/users/")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API url cannot be a base: {}", self.base))?
            .pop_if_empty()
            .push(user.trim());
        Ok(url)
    }

    /// Fetch the account document: balance, miners, recent transactions.
    /// Endpoint: GET /v2/users/<user>
    pub async fn get_user(&self, user: &str) -> anyhow::Result<UserData> {
        let url = self.user_url(user)?;
        let resp = self.http.get(url).send().await?.error_for_status()?;
        let env: UserEnvelope = resp.json().await.context("decoding user document")?;
        match env.result {
            Some(data) => Ok(data),
            None => anyhow::bail!(
                "server returned no result: {}",
                env.message.as_deref().unwrap_or("no message")
            ),
        }
    }
}

/// How a failed fetch is reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    RateLimited,
    Unreachable,
}

impl FetchFailure {
    pub fn classify(err: &anyhow::Error) -> Self {
        let status = err
            .downcast_ref::<reqwest::Error>()
            .and_then(reqwest::Error::status);
        match status {
            Some(StatusCode::FORBIDDEN) | Some(StatusCode::TOO_MANY_REQUESTS) => {
                FetchFailure::RateLimited
            }
            _ => FetchFailure::Unreachable,
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::RateLimited => write!(
                f,
                "Request to DUCO server was blocked and rate limited. Please wait a moment and try again."
            ),
            FetchFailure::Unreachable => {
                write!(f, "Failed to reach DUCO server. Please try again shortly.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn client(base: &str) -> DucoClient {
        DucoClient::new(base.to_string(), Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn test_user_url() {
        let client = client("https://server.duinocoin.com");
        assert_eq!(
            client.user_url("revox").unwrap().as_str(),
            "https://server.duinocoin.com/v2/users/revox"
        );
        // user names are a single, escaped path segment
        assert_eq!(
            client.user_url(" a/b ").unwrap().as_str(),
            "https://server.duinocoin.com/v2/users/a%2Fb"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(DucoClient::new("not a url".to_string(), Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_plain_errors_are_unreachable() {
        let err = anyhow::anyhow!("connection refused");
        assert_eq!(FetchFailure::classify(&err), FetchFailure::Unreachable);
        assert!(FetchFailure::RateLimited.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_get_user_against_closed_port() {
        let err = client("http://127.0.0.1:1").get_user("nobody").await.unwrap_err();
        assert_eq!(FetchFailure::classify(&err), FetchFailure::Unreachable);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        // accepts the connection, never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let client = DucoClient::new(format!("http://{addr}"), Duration::from_millis(300)).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), client.get_user("me"))
            .await
            .expect("request should fail on its own timeout");
        let err = result.unwrap_err();
        assert_eq!(FetchFailure::classify(&err), FetchFailure::Unreachable);
        server.abort();
    }
}
