use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Public base URL for external access (e.g., "https://cards.example.com").
    /// Used when rewriting image references to hosted URLs. If not set, URLs
    /// are derived from the bind address.
    pub public_base_url: Option<String>,
    /// Shared secret for verifying Docora webhook signatures.
    pub webhook_secret: String,
    /// Expected Docora application id. If not set, any id is accepted.
    pub webhook_app_id: Option<String>,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("lumio.db")
    }

    /// Base URL that hosted object URLs are built from.
    #[must_use]
    pub fn object_base_url(&self) -> String {
        self.public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.host, self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            public_base_url: None,
            webhook_secret: String::new(),
            webhook_app_id: None,
        }
    }
}
