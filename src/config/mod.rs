use once_cell::sync::Lazy;
use std::env;
use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_hosts: AllowedHosts,
}

/// Remote addresses permitted to call protected routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedHosts {
    Any,
    Only(Vec<IpAddr>),
}

impl AllowedHosts {
    /// Parse a comma separated address list. Any `*` entry opens the list to everyone.
    /// Entries that are not IP addresses are skipped with a warning.
    pub fn parse(list: &str) -> Self {
        let entries: Vec<&str> = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if entries.iter().any(|e| *e == "*") {
            return AllowedHosts::Any;
        }

        let addrs = entries
            .into_iter()
            .filter_map(|entry| match entry.parse::<IpAddr>() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    tracing::warn!("Ignoring invalid allowed host entry: {}", entry);
                    None
                }
            })
            .collect();

        AllowedHosts::Only(addrs)
    }

    /// A missing peer address only passes the wildcard.
    pub fn permits(&self, addr: Option<IpAddr>) -> bool {
        match self {
            AllowedHosts::Any => true,
            AllowedHosts::Only(addrs) => match addr {
                Some(addr) => addrs.contains(&addr) || addrs.contains(&canonical(addr)),
                None => false,
            },
        }
    }
}

// IPv4 peers can arrive as IPv4-mapped IPv6 on dual-stack listeners
fn canonical(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(addr),
        v4 => v4,
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                host: "localhost".to_string(),
                port: 5432,
                user: "postgres".to_string(),
                password: ".postmy".to_string(),
                name: "redmine".to_string(),
                max_connections: 10,
                connection_timeout: 30,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 7171,
            },
            security: SecurityConfig {
                allowed_hosts: AllowedHosts::Only(vec![IpAddr::from([127, 0, 0, 1])]),
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the process environment in production).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Database overrides
        if let Some(v) = lookup("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = lookup("DB_PORT") {
            self.database.port = v.parse().unwrap_or(self.database.port);
        }
        if let Some(v) = lookup("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = lookup("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Some(v) = lookup("DB_NAME") {
            self.database.name = v;
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Server overrides
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Security overrides
        if let Some(v) = lookup("ALLOWED_HOSTS") {
            self.security.allowed_hosts = AllowedHosts::parse(&v);
        }

        self
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
