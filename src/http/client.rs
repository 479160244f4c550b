use crate::error::Result;
use crate::http::{HttpAuth, HttpRequest, HttpResponse, HttpTransport, Method};
use reqwest::blocking::Client;
use tracing::debug;

/// Blocking `reqwest` client behind the [HttpTransport] trait
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a client with the crate's user agent (GitHub rejects requests without one)
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("changelog-release/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(ReqwestTransport { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = match request.method {
            Method::Get => self.client.get(request.url.clone()),
            Method::Post => self.client.post(request.url.clone()),
        };

        builder = match &request.auth {
            Some(HttpAuth::Basic { username, password }) => {
                builder.basic_auth(username, Some(password))
            }
            Some(HttpAuth::PrivateToken(token)) => builder.header("PRIVATE-TOKEN", token),
            None => builder,
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send()?;
        let status = response.status();
        let body = response.text()?;

        debug!(status = status.as_u16(), "received response");
        Ok(HttpResponse { status, body })
    }
}
