//! Builds and caches `reqwest::Client`s per proxy endpoint. reqwest wires a
//! proxy in at client-construction time, not per-request, so read/write
//! endpoints that differ need two distinct clients.

use crate::parsers::ini::IniDocument;
use bbs_core::proxy::{ProxyConfig, ProxyEndpoint, ProxyMode};
use bbs_core::{Error, Result};
use std::sync::RwLock;

const READ_SECTION: &str = "ReadProxy";
const WRITE_SECTION: &str = "WriteProxy";

fn endpoint_from_section(doc: &IniDocument, section: &str) -> ProxyEndpoint {
    ProxyEndpoint {
        enabled: doc.get(section, "Proxy").map(|v| v == "1").unwrap_or(false),
        address: doc.get(section, "Address").unwrap_or_default().to_string(),
        port: doc.get(section, "Port").and_then(|v| v.parse().ok()).unwrap_or(0),
        user_id: doc.get(section, "UserID").unwrap_or_default().to_string(),
        password: doc.get(section, "Password").unwrap_or_default().to_string(),
    }
}

fn endpoint_into_section(doc: &mut IniDocument, section: &str, ep: &ProxyEndpoint) {
    doc.set(section, "Proxy", if ep.enabled { "1" } else { "0" });
    doc.set(section, "Address", ep.address.clone());
    doc.set(section, "Port", ep.port.to_string());
    doc.set(section, "UserID", ep.user_id.clone());
    doc.set(section, "Password", ep.password.clone());
}

/// `[ReadProxy]` / `[WriteProxy]` sections, keys `Proxy/Address/Port/UserID/Password`.
pub fn proxy_config_from_ini(doc: &IniDocument) -> ProxyConfig {
    ProxyConfig {
        read: endpoint_from_section(doc, READ_SECTION),
        write: endpoint_from_section(doc, WRITE_SECTION),
    }
}

pub fn proxy_config_to_ini(config: &ProxyConfig) -> IniDocument {
    let mut doc = IniDocument::default();
    endpoint_into_section(&mut doc, READ_SECTION, &config.read);
    endpoint_into_section(&mut doc, WRITE_SECTION, &config.write);
    doc
}

/// `no_redirects` is set for the write client: Machi BBS (and potentially
/// other post targets) signal post success via a bare HTTP 302 with a
/// `Location` header (§4.I), which reqwest's default `Policy::limited(10)`
/// would otherwise follow transparently, leaving only the final 200 status
/// for the plugin to inspect.
fn build_client(endpoint: Option<&ProxyEndpoint>, no_redirects: bool) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().gzip(true);
    if no_redirects {
        builder = builder.redirect(reqwest::redirect::Policy::none());
    }
    if let Some(ep) = endpoint.filter(|e| e.is_active()) {
        let mut proxy_url = format!("http://{}:{}", ep.address, ep.port);
        if !ep.user_id.is_empty() {
            proxy_url = format!(
                "http://{}:{}@{}:{}",
                ep.user_id, ep.password, ep.address, ep.port
            );
        }
        let proxy = reqwest::Proxy::all(&proxy_url)
            .map_err(|e| Error::Config(format!("invalid proxy endpoint: {e}")))?;
        builder = builder.proxy(proxy);
    } else {
        builder = builder.no_proxy();
    }
    builder
        .build()
        .map_err(|e| Error::Config(format!("failed to build http client: {e}")))
}

/// Caches a read client and a write client, rebuilding only when the
/// underlying `ProxyConfig` changes.
pub struct ProxyManager {
    config: RwLock<ProxyConfig>,
    read_client: RwLock<reqwest::Client>,
    write_client: RwLock<reqwest::Client>,
}

impl ProxyManager {
    pub fn new(config: ProxyConfig) -> Result<Self> {
        let read_client = build_client(Some(&config.read), false)?;
        let write_client = build_client(Some(&config.write), true)?;
        Ok(Self {
            config: RwLock::new(config),
            read_client: RwLock::new(read_client),
            write_client: RwLock::new(write_client),
        })
    }

    pub fn reconfigure(&self, config: ProxyConfig) -> Result<()> {
        let read_client = build_client(Some(&config.read), false)?;
        let write_client = build_client(Some(&config.write), true)?;
        *self.read_client.write().unwrap() = read_client;
        *self.write_client.write().unwrap() = write_client;
        *self.config.write().unwrap() = config;
        Ok(())
    }

    pub fn config(&self) -> ProxyConfig {
        self.config.read().unwrap().clone()
    }

    pub fn client(&self, mode: ProxyMode) -> reqwest::Client {
        match mode {
            ProxyMode::Read => self.read_client.read().unwrap().clone(),
            ProxyMode::Write => self.write_client.read().unwrap().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_endpoint_builds_a_direct_client() {
        let cfg = ProxyConfig::default();
        let mgr = ProxyManager::new(cfg).unwrap();
        let _ = mgr.client(ProxyMode::Read);
        let _ = mgr.client(ProxyMode::Write);
    }

    #[tokio::test]
    async fn write_client_does_not_follow_redirects_but_read_client_does() {
        use axum::http::{header, StatusCode};
        use axum::response::IntoResponse;
        use axum::routing::get;
        use axum::Router;
        use std::net::SocketAddr;

        let app = Router::new()
            .route(
                "/post",
                get(|| async { (StatusCode::FOUND, [(header::LOCATION, "/post/123")]).into_response() }),
            )
            .route("/post/123", get(|| async { "posted" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mgr = ProxyManager::new(ProxyConfig::default()).unwrap();
        let url = format!("http://{addr}/post");

        let write_resp = mgr.client(ProxyMode::Write).get(&url).send().await.unwrap();
        assert_eq!(write_resp.status(), reqwest::StatusCode::FOUND);
        assert!(write_resp.headers().get(reqwest::header::LOCATION).is_some());

        let read_resp = mgr.client(ProxyMode::Read).get(&url).send().await.unwrap();
        assert_eq!(read_resp.status(), reqwest::StatusCode::OK);
    }

    #[test]
    fn reconfigure_swaps_clients() {
        let mgr = ProxyManager::new(ProxyConfig::default()).unwrap();
        let mut cfg = ProxyConfig::default();
        cfg.read.enabled = true;
        cfg.read.address = "127.0.0.1".to_string();
        cfg.read.port = 8080;
        mgr.reconfigure(cfg.clone()).unwrap();
        assert_eq!(mgr.config().read.port, 8080);
    }

    #[test]
    fn parses_proxy_ini_sections() {
        let text = "[ReadProxy]\nProxy=1\nAddress=10.0.0.1\nPort=1080\nUserID=alice\nPassword=secret\n\n[WriteProxy]\nProxy=0\nAddress=\nPort=0\nUserID=\nPassword=\n";
        let doc = crate::parsers::ini::parse(text);
        let config = proxy_config_from_ini(&doc);
        assert!(config.read.enabled);
        assert_eq!(config.read.address, "10.0.0.1");
        assert_eq!(config.read.port, 1080);
        assert_eq!(config.read.user_id, "alice");
        assert_eq!(config.read.password, "secret");
        assert!(!config.write.enabled);
    }

    #[test]
    fn round_trips_proxy_config_through_ini() {
        let mut config = ProxyConfig::default();
        config.read.enabled = true;
        config.read.address = "proxy.example".to_string();
        config.read.port = 3128;
        config.write.enabled = false;
        let doc = proxy_config_to_ini(&config);
        let restored = proxy_config_from_ini(&doc);
        assert_eq!(restored, config);
    }
}
