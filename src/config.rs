use std::{env, fmt};

/// Which implementation of the auth/data service the server talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// A hosted Supabase project (GoTrue + PostgREST).
    Supabase { url: String, anon_key: String },
    /// The in-process backend; state is lost on restart.
    Memory { jwt_secret: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server_port: u16,
    pub server_host: String,
    pub backend: BackendConfig,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{} must be set", name),
            ConfigError::Invalid { name, value } => {
                write!(f, "{} has an invalid value: {:?}", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_port = match lookup("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "PORT", value })?,
            None => 3000,
        };
        let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let backend = match lookup("APP_BACKEND").as_deref().unwrap_or("supabase") {
            "supabase" => BackendConfig::Supabase {
                url: lookup("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?,
                anon_key: lookup("SUPABASE_ANON_KEY")
                    .ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            },
            "memory" => BackendConfig::Memory {
                jwt_secret: lookup("MEMORY_JWT_SECRET").unwrap_or_else(|| {
                    log::warn!("MEMORY_JWT_SECRET not set, tokens will not survive a restart");
                    uuid::Uuid::new_v4().to_string()
                }),
            },
            other => {
                return Err(ConfigError::Invalid {
                    name: "APP_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            server_port,
            server_host,
            backend,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
