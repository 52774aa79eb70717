use serde::Deserialize;

// =======================================================
// GLOBAL CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub log_level: String,
    /// Admission limit: maximum concurrently handled connections.
    pub max_connections: u16,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            max_connections: 1024,
        }
    }
}

impl GlobalConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn max_connections(&self) -> u16 {
        self.max_connections
    }

    fn apply_defaults_from(&mut self, defaults: &GlobalConfig) {
        if self.log_level.is_empty() {
            self.log_level = defaults.log_level.clone();
        }
        if self.max_connections == 0 {
            self.max_connections = defaults.max_connections;
        }
    }
}

// =======================================================
// HTTP CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub listen: String,

    // Timeouts (seconds)
    pub client_read_timeout_secs: u64,
    pub client_write_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8787".into(),
            client_read_timeout_secs: 15,
            client_write_timeout_secs: 15,
        }
    }
}

impl HttpConfig {
    pub fn listen(&self) -> &str {
        &self.listen
    }

    pub fn client_read_timeout_secs(&self) -> u64 {
        self.client_read_timeout_secs
    }

    pub fn client_write_timeout_secs(&self) -> u64 {
        self.client_write_timeout_secs
    }

    fn apply_defaults_from(&mut self, defaults: &HttpConfig) {
        if self.listen.is_empty() {
            self.listen = defaults.listen.clone();
        }
        if self.client_read_timeout_secs == 0 {
            self.client_read_timeout_secs = defaults.client_read_timeout_secs;
        }
        if self.client_write_timeout_secs == 0 {
            self.client_write_timeout_secs = defaults.client_write_timeout_secs;
        }
    }
}

// =======================================================
// AUTH CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Startup passcode; rotatable at runtime through the admin endpoint.
    pub passcode: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            passcode: "valet-dev".into(),
        }
    }
}

impl AuthConfig {
    pub fn passcode(&self) -> &str {
        &self.passcode
    }

    fn apply_defaults_from(&mut self, defaults: &AuthConfig) {
        if self.passcode.is_empty() {
            self.passcode = defaults.passcode.clone();
        }
    }
}

// =======================================================
// UI CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Candidate locations for the web UI document, tried in order.
    pub index_candidates: Vec<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            index_candidates: vec!["web/index.html".into(), "public/index.html".into()],
        }
    }
}

impl UiConfig {
    pub fn index_candidates(&self) -> &[String] {
        &self.index_candidates
    }

    fn apply_defaults_from(&mut self, defaults: &UiConfig) {
        if self.index_candidates.is_empty() {
            self.index_candidates = defaults.index_candidates.clone();
        }
    }
}

// =======================================================
// VALET CONFIG — main config
// =======================================================
#[derive(Debug, Default, Deserialize)]
pub struct ValetConfig {
    #[serde(default)]
    pub global: GlobalConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

impl ValetConfig {
    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn http(&self) -> &HttpConfig {
        &self.http
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    pub fn ui(&self) -> &UiConfig {
        &self.ui
    }

    pub fn from_file(file_name: &str) -> Result<Self, config::ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::new(file_name, config::FileFormat::Ini).required(false))
            .build()?;

        let mut cfg: ValetConfig = built.try_deserialize()?;
        cfg.apply_defaults();
        Ok(cfg)
    }

    pub fn from_file_or_default(file_name: &str) -> Self {
        match Self::from_file(file_name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Error reading config '{file_name}': {e}");
                eprintln!("Continuing with default config...");
                ValetConfig::default()
            }
        }
    }

    fn apply_defaults(&mut self) {
        self.global.apply_defaults_from(&GlobalConfig::default());
        self.http.apply_defaults_from(&HttpConfig::default());
        self.auth.apply_defaults_from(&AuthConfig::default());
        self.ui.apply_defaults_from(&UiConfig::default());
    }
}
