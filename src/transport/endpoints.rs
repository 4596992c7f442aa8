use crate::types::{Credentials, RealtimeError, Result, endpoints};
use url::Url;

/// Derives every backend URL from the single configured base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base)?;
        match base.scheme() {
            "http" | "https" | "ws" | "wss" => Ok(Self { base }),
            other => Err(RealtimeError::Config(format!(
                "unsupported URL scheme '{}'",
                other
            ))),
        }
    }

    pub fn websocket(&self) -> Result<Url> {
        let mut url = self.join(endpoints::WEBSOCKET);
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            _ => "wss",
        };
        set_scheme(&mut url, scheme)?;
        Ok(url)
    }

    /// SSE cannot carry custom headers, so credentials go in the query string
    pub fn events(&self, credentials: Option<&Credentials>) -> Result<Url> {
        let mut url = self.http(endpoints::EVENTS)?;
        if let Some(credentials) = credentials {
            url.query_pairs_mut()
                .append_pair("token", &credentials.token)
                .append_pair("userId", &credentials.user_id);
        }
        Ok(url)
    }

    pub fn ping(&self) -> Result<Url> {
        self.http(endpoints::PING)
    }

    pub fn poll(&self) -> Result<Url> {
        self.http(endpoints::POLL)
    }

    pub fn send(&self) -> Result<Url> {
        self.http(endpoints::SEND)
    }

    fn http(&self, suffix: &str) -> Result<Url> {
        let mut url = self.join(suffix);
        let scheme = match url.scheme() {
            "ws" | "http" => "http",
            _ => "https",
        };
        set_scheme(&mut url, scheme)?;
        Ok(url)
    }

    fn join(&self, suffix: &str) -> Url {
        let mut url = self.base.clone();
        let path = format!("{}/{}", url.path().trim_end_matches('/'), suffix);
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}

fn set_scheme(url: &mut Url, scheme: &str) -> Result<()> {
    if url.scheme() == scheme {
        return Ok(());
    }
    url.set_scheme(scheme)
        .map_err(|_| RealtimeError::Config(format!("cannot switch {} to {}", url, scheme)))
}
