//! Connection string parsing
//!
//! Connection strings follow the RavenDB convention of `;`-separated `Key=Value`
//! pairs with case-insensitive keys:
//!
//! - `Url=http://localhost:8080;Database=Blog` talks to a document server over HTTP
//! - `DataDir=~/raccoon/data` keeps documents in an embedded SQLite file
//! - `RunInMemory=true` keeps documents in process memory

use crate::error::StoreError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionString {
    Server { url: Url, database: Option<String> },
    Embedded { data_dir: PathBuf },
    InMemory,
}

impl FromStr for ConnectionString {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut url = None;
        let mut database = None;
        let mut data_dir = None;
        let mut in_memory = false;

        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(|| invalid(format!(
                "expected Key=Value, got '{}'",
                part
            )))?;
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "url" => {
                    let parsed = Url::parse(value)
                        .map_err(|e| invalid(format!("invalid Url '{}': {}", value, e)))?;
                    if !matches!(parsed.scheme(), "http" | "https") {
                        return Err(invalid(format!("unsupported Url scheme '{}'", parsed.scheme())));
                    }
                    url = Some(parsed);
                }
                "database" => database = Some(value.to_string()),
                "datadir" => data_dir = Some(PathBuf::from(value)),
                "runinmemory" => {
                    in_memory = match value.to_ascii_lowercase().as_str() {
                        "true" => true,
                        "false" => false,
                        _ => {
                            return Err(invalid(format!(
                                "RunInMemory expects true or false, got '{}'",
                                value
                            )))
                        }
                    };
                }
                other => return Err(invalid(format!("unknown key '{}'", other))),
            }
        }

        match (url, data_dir, in_memory) {
            (Some(url), None, false) => Ok(ConnectionString::Server { url, database }),
            (None, Some(data_dir), false) if database.is_none() => {
                Ok(ConnectionString::Embedded { data_dir })
            }
            (None, None, true) if database.is_none() => Ok(ConnectionString::InMemory),
            (None, None, false) => Err(invalid(
                "one of Url, DataDir or RunInMemory=true is required".to_string(),
            )),
            _ => Err(invalid(
                "Url, DataDir and RunInMemory are mutually exclusive, Database needs Url".to_string(),
            )),
        }
    }
}

impl ConnectionString {
    /// Copy safe to log: the Url loses its password
    pub fn redacted(&self) -> Self {
        match self {
            ConnectionString::Server { url, database } => {
                let mut url = url.clone();
                if url.password().is_some() {
                    // http(s) urls always accept userinfo changes
                    let _ = url.set_password(None);
                }
                ConnectionString::Server {
                    url,
                    database: database.clone(),
                }
            }
            other => other.clone(),
        }
    }
}

fn invalid(message: String) -> StoreError {
    StoreError::InvalidConnectionString { message }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionString::Server { url, database } => {
                write!(f, "Url={}", url)?;
                if let Some(database) = database {
                    write!(f, ";Database={}", database)?;
                }
                Ok(())
            }
            ConnectionString::Embedded { data_dir } => write!(f, "DataDir={}", data_dir.display()),
            ConnectionString::InMemory => write!(f, "RunInMemory=true"),
        }
    }
}
