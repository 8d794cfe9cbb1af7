use crate::options::LocationOptions;

#[derive(Clone)]
pub struct FinderConfig {
    pub imagery_base_url: String,
    pub imagery_api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_concurrent_lookups: usize,
    pub search_radius_m: u32,
    pub locale: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub log_level: String,
    pub options: LocationOptions,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("imagery_base_url", &self.imagery_base_url)
            .field(
                "imagery_api_key",
                &self.imagery_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_concurrent_lookups", &self.max_concurrent_lookups)
            .field("search_radius_m", &self.search_radius_m)
            .field("locale", &self.locale)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("log_level", &self.log_level)
            .field("options", &self.options)
            .finish()
    }
}
