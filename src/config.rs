use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub from_email: String,
    pub hubspot_token: String,
    pub hubspot_base_url: String,
    /// Comma-separated override for the accepted mail-provider domains.
    pub allowed_email_domains: Option<Vec<String>>,
    /// Comma-separated override for the accepted software vendors.
    pub allowed_vendors: Option<Vec<String>>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            smtp_host: std::env::var("SMTP_HOST")
                .map_err(|_| anyhow::anyhow!("SMTP_HOST environment variable required"))
                .and_then(|host| {
                    if host.trim().is_empty() {
                        anyhow::bail!("SMTP_HOST cannot be empty");
                    }
                    Ok(host)
                })?,
            smtp_port: std::env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SMTP_PORT must be a valid number between 1-65535"))?,
            smtp_user: std::env::var("SMTP_USER")
                .map_err(|_| anyhow::anyhow!("SMTP_USER environment variable required"))
                .and_then(|user| {
                    if user.trim().is_empty() {
                        anyhow::bail!("SMTP_USER cannot be empty");
                    }
                    Ok(user)
                })?,
            smtp_pass: std::env::var("SMTP_PASS")
                .map_err(|_| anyhow::anyhow!("SMTP_PASS environment variable required"))
                .and_then(|pass| {
                    if pass.trim().is_empty() {
                        anyhow::bail!("SMTP_PASS cannot be empty");
                    }
                    Ok(pass)
                })?,
            from_email: std::env::var("FROM_EMAIL")
                .map_err(|_| anyhow::anyhow!("FROM_EMAIL environment variable required"))
                .and_then(|from| {
                    if from.trim().is_empty() {
                        anyhow::bail!("FROM_EMAIL cannot be empty");
                    }
                    Ok(from)
                })?,
            hubspot_token: std::env::var("HUBSPOT_API_KEY")
                .map_err(|_| anyhow::anyhow!("HUBSPOT_API_KEY environment variable required"))
                .and_then(|token| {
                    if token.trim().is_empty() {
                        anyhow::bail!("HUBSPOT_API_KEY cannot be empty");
                    }
                    Ok(token)
                })?,
            hubspot_base_url: std::env::var("HUBSPOT_BASE_URL")
                .unwrap_or_else(|_| "https://api.hubapi.com".to_string())
                .trim()
                .to_string(),
            allowed_email_domains: std::env::var("ALLOWED_EMAIL_DOMAINS")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.split(',').map(|d| d.trim().to_lowercase()).collect()),
            allowed_vendors: std::env::var("ALLOWED_VENDORS")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.split(',').map(|v| v.trim().to_string()).collect()),
        };

        if !config.hubspot_base_url.starts_with("http://")
            && !config.hubspot_base_url.starts_with("https://")
        {
            anyhow::bail!("HUBSPOT_BASE_URL must start with http:// or https://");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("HubSpot base URL: {}", config.hubspot_base_url);
        tracing::debug!("SMTP relay: {}:{}", config.smtp_host, config.smtp_port);
        tracing::debug!("Server Port: {}", config.port);
        if let Some(ref domains) = config.allowed_email_domains {
            tracing::info!("Email domain allow-list overridden ({} entries)", domains.len());
        }
        if let Some(ref vendors) = config.allowed_vendors {
            tracing::info!("Vendor allow-list overridden ({} entries)", vendors.len());
        }

        Ok(config)
    }
}
