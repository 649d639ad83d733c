use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE, HOST, LOCATION, USER_AGENT};
use hyper::Uri;
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use stl_protocol::{HttpRequest, HttpResponse, Method, FORM_CONTENT_TYPE};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tokio_rustls::TlsConnector;
use tracing::debug;

use crate::config::TransportConfig;
use crate::error::{TransportError, TransportResult};
use crate::tls::insecure_client_config;

/// Performs one blocking request/response exchange.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> TransportResult<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &HttpRequest) -> TransportResult<HttpResponse> {
        (**self).send(request)
    }
}

/// Fail on any status outside 2xx, keeping a bounded excerpt of the body.
///
/// A redirect that reaches this point was not followed, so it fails too.
pub fn ensure_success(response: HttpResponse) -> TransportResult<HttpResponse> {
    if !response.is_success() {
        return Err(TransportError::Status {
            status: response.status,
            excerpt: response.body_excerpt(),
        });
    }
    Ok(response)
}

/// Redirect hops followed for one GET before the 3xx is handed back.
pub const MAX_REDIRECTS: usize = 5;

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// HTTP/1.1 transport over plain TCP or TLS with verification disabled.
///
/// Each exchange opens a fresh connection on a private current-thread
/// runtime, so callers never need an async context. GET requests follow up
/// to [`MAX_REDIRECTS`] redirects; POST redirects are returned unfollowed.
/// A configured timeout covers the whole chain.
pub struct HttpTransport {
    runtime: Runtime,
    tls: TlsConnector,
    user_agent: String,
    timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> TransportResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TransportError::Runtime)?;
        let tls = TlsConnector::from(Arc::new(insecure_client_config()?));
        Ok(Self {
            runtime,
            tls,
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
        })
    }

    async fn follow(&self, request: &HttpRequest) -> TransportResult<HttpResponse> {
        let mut target = Target::parse(&request.url)?;
        let mut hops = 0;
        loop {
            let (response, location) = self.exchange(request, &target).await?;
            let location = match location {
                Some(location) if request.method == Method::Get && is_redirect(response.status) => location,
                _ => return Ok(response),
            };
            if hops == MAX_REDIRECTS {
                debug!(status = response.status, %location, "redirect limit reached");
                return Ok(response);
            }
            let next = target.resolve(&location);
            debug!(status = response.status, url = %next, "following redirect");
            target = Target::parse(&next)?;
            hops += 1;
        }
    }

    async fn exchange(
        &self,
        request: &HttpRequest,
        target: &Target,
    ) -> TransportResult<(HttpResponse, Option<String>)> {
        let outgoing = self.build(request, target)?;

        let tcp = TcpStream::connect((target.host.as_str(), target.port))
            .await
            .map_err(|source| TransportError::Connect {
                addr: target.authority.clone(),
                source,
            })?;

        if target.tls {
            let name = ServerName::try_from(target.host.clone())
                .map_err(|e| TransportError::Tls(e.to_string()))?;
            let stream = self
                .tls
                .connect(name, tcp)
                .await
                .map_err(|e| TransportError::Tls(e.to_string()))?;
            round_trip(stream, outgoing).await
        } else {
            round_trip(tcp, outgoing).await
        }
    }

    fn build(
        &self,
        request: &HttpRequest,
        target: &Target,
    ) -> TransportResult<hyper::Request<Full<Bytes>>> {
        let method = match request.method {
            Method::Get => hyper::Method::GET,
            Method::Post => hyper::Method::POST,
        };
        let mut builder = hyper::Request::builder()
            .method(method)
            .uri(target.path_and_query.as_str())
            .header(HOST, target.authority.as_str())
            .header(USER_AGENT, self.user_agent.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let body = match &request.body {
            Some(body) => {
                if request.header(CONTENT_TYPE.as_str()).is_none() {
                    builder = builder.header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
                }
                Full::new(Bytes::from(body.clone()))
            }
            None => Full::new(Bytes::new()),
        };

        builder
            .body(body)
            .map_err(|e| TransportError::Request(e.to_string()))
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &HttpRequest) -> TransportResult<HttpResponse> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = match self.timeout {
            Some(limit) => self
                .runtime
                .block_on(async { tokio::time::timeout(limit, self.follow(request)).await })
                .map_err(|_| TransportError::Timeout(limit))??,
            None => self.runtime.block_on(self.follow(request))?,
        };
        debug!(
            status = response.status,
            content_type = response.content_type.as_deref().unwrap_or(""),
            bytes = response.body.len(),
            "received response"
        );
        Ok(response)
    }
}

/// Send one request; the second element is the `Location` header, if any.
async fn round_trip<S>(
    stream: S,
    request: hyper::Request<Full<Bytes>>,
) -> TransportResult<(HttpResponse, Option<String>)>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            debug!(error = %e, "connection closed with error");
        }
    });

    let response = sender.send_request(request).await?;
    let status = response.status().as_u16();
    let header = |name: HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let content_type = header(CONTENT_TYPE);
    let location = header(LOCATION);
    let body = response.into_body().collect().await?.to_bytes().to_vec();

    let response = HttpResponse {
        status,
        content_type,
        body,
    };
    Ok((response, location))
}

/// Connection details extracted from an absolute URL.
#[derive(Debug, PartialEq, Eq)]
struct Target {
    tls: bool,
    host: String,
    port: u16,
    authority: String,
    path_and_query: String,
}

impl Target {
    fn parse(url: &str) -> TransportResult<Self> {
        let invalid = |reason: String| TransportError::InvalidUrl {
            url: url.to_string(),
            reason,
        };
        let uri: Uri = url.parse().map_err(|e: hyper::http::uri::InvalidUri| invalid(e.to_string()))?;

        let tls = match uri.scheme_str() {
            Some("https") => true,
            Some("http") => false,
            Some(other) => return Err(TransportError::UnsupportedScheme(other.to_string())),
            None => return Err(invalid("missing scheme".into())),
        };
        let authority = uri.authority().ok_or_else(|| invalid("missing host".into()))?;
        let host = authority.host().trim_start_matches('[').trim_end_matches(']');
        let port = authority.port_u16().unwrap_or(if tls { 443 } else { 80 });

        let path_and_query = match uri.path_and_query().map(|p| p.as_str()) {
            Some(p) if p.starts_with('/') => p.to_string(),
            Some(p) => format!("/{p}"),
            None => "/".to_string(),
        };

        Ok(Self {
            tls,
            host: host.to_string(),
            port,
            authority: authority.as_str().to_string(),
            path_and_query,
        })
    }

    /// Absolute URL of a `Location` value relative to this target.
    fn resolve(&self, location: &str) -> String {
        if location.parse::<Uri>().is_ok_and(|u| u.scheme().is_some()) {
            return location.to_string();
        }
        let scheme = if self.tls { "https" } else { "http" };
        if let Some(rest) = location.strip_prefix("//") {
            return format!("{scheme}://{rest}");
        }
        let path = self.path_and_query.split('?').next().unwrap_or("/");
        if location.starts_with('/') {
            format!("{scheme}://{}{location}", self.authority)
        } else if location.starts_with('?') {
            format!("{scheme}://{}{path}{location}", self.authority)
        } else {
            let dir = &path[..path.rfind('/').map_or(0, |i| i + 1)];
            format!("{scheme}://{}{dir}{location}", self.authority)
        }
    }
}
