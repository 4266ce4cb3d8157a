use serde::Deserialize;

pub const DEFAULT_LEADS_TABLE: &str = "leads_escuela_cuidarte";
pub const DEFAULT_KIT_URL: &str = "https://kitsupervivenvivneciacuid-arte.netlify.app/";
pub const DEFAULT_LOGO_URL: &str = "https://i.postimg.cc/Kj6R2R75/LOGODRA.png";
pub const DEFAULT_IDENTIFIER_STORE_PATH: &str = ".cuidarte_uid.json";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub leads_table: String,
    /// Origin plus path of the landing page, used to build shareable links.
    pub public_base_url: String,
    pub kit_url: String,
    pub logo_url: String,
    pub identifier_store_path: String,
    pub port: u16,
    pub session_ttl_secs: u64,
    pub request_timeout_secs: u64,
}

fn required_http_url(var: &str) -> anyhow::Result<String> {
    let url = std::env::var(var)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", var))?;
    if url.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", var);
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", var);
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn parse_or_default<T: std::str::FromStr>(var: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", var)),
        _ => Ok(default),
    }
}

fn string_or_default(var: &str, default: &str) -> String {
    std::env::var(var)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            supabase_url: required_http_url("SUPABASE_URL")?,
            supabase_anon_key: std::env::var("SUPABASE_ANON_KEY")
                .map_err(|_| anyhow::anyhow!("SUPABASE_ANON_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("SUPABASE_ANON_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            leads_table: string_or_default("LEADS_TABLE", DEFAULT_LEADS_TABLE),
            public_base_url: required_http_url("PUBLIC_BASE_URL")?,
            kit_url: string_or_default("KIT_URL", DEFAULT_KIT_URL),
            logo_url: string_or_default("LOGO_URL", DEFAULT_LOGO_URL),
            identifier_store_path: string_or_default(
                "IDENTIFIER_STORE_PATH",
                DEFAULT_IDENTIFIER_STORE_PATH,
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            session_ttl_secs: parse_or_default("SESSION_TTL_SECS", 1800)?,
            request_timeout_secs: parse_or_default("REQUEST_TIMEOUT_SECS", 15)?,
        };

        // Never log the anon key
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Supabase URL: {}", config.supabase_url);
        tracing::debug!("Leads table: {}", config.leads_table);
        tracing::debug!("Public base URL: {}", config.public_base_url);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Configuration pointing at a local store, used by tests and demos.
    pub fn for_store(supabase_url: impl Into<String>) -> Self {
        Self {
            supabase_url: supabase_url.into(),
            supabase_anon_key: "test-anon-key".to_string(),
            leads_table: DEFAULT_LEADS_TABLE.to_string(),
            public_base_url: "https://escuela.example.com/registro".to_string(),
            kit_url: DEFAULT_KIT_URL.to_string(),
            logo_url: DEFAULT_LOGO_URL.to_string(),
            identifier_store_path: DEFAULT_IDENTIFIER_STORE_PATH.to_string(),
            port: 3000,
            session_ttl_secs: 1800,
            request_timeout_secs: 15,
        }
    }
}
