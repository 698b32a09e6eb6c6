use clap::Parser;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "athan-gateway")]
#[command(about = "Offline-first caching gateway for the Athan Wake app")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "ATHAN_GATEWAY_PORT", default_value_t = 8080)]
    pub port: u16,

    // Origin serving the app shell, audio and the prayer-times API
    #[arg(short, long, env = "ATHAN_GATEWAY_UPSTREAM", default_value = "http://localhost:3000")]
    pub upstream: String,

    // Prefix for cache partition names
    #[arg(long, env = "ATHAN_GATEWAY_APP_NAME", default_value = "athan-wake")]
    pub app_name: String,

    // Cache generation, bump to purge old partitions on activation
    #[arg(long, env = "ATHAN_GATEWAY_CACHE_VERSION", default_value = "v1")]
    pub cache_version: String,

    // Shell files cached at install (comma-separated)
    #[arg(long, env = "ATHAN_GATEWAY_STATIC_FILES", default_value = "/,/manifest.json")]
    pub static_files: String,

    // Connectivity probe interval in seconds
    #[arg(long, env = "ATHAN_GATEWAY_PROBE_INTERVAL", default_value_t = 30)]
    pub probe_interval: u64,

    // Upstream request timeout in seconds
    #[arg(long, env = "ATHAN_GATEWAY_FETCH_TIMEOUT", default_value_t = 10)]
    pub fetch_timeout: u64,
}

impl Args {
    pub fn static_file_list(&self) -> Vec<String> {
        self.static_files
            .split(',')
            .map(|s| s.trim()) // remove spaces
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s.starts_with('/') {
                    s.to_string()
                } else {
                    format!("/{}", s)
                }
            })
            .collect()
    }
}
