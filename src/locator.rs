//! Turns the locator URL from the environment into the driver-addressed
//! connection string, and back again for the engine builder.

use crate::config::ConnectionDescriptor;
use crate::error::DbError;
use std::fmt;
use url::Url;

pub const DRIVER_SCHEME: &str = "sqlite+libsql";
pub const LOCAL_SCHEME: &str = "sqlite";
const AUTH_TOKEN_PARAM: &str = "authToken";

/// `sqlite+libsql://{host}/{database}?authToken={token}`
#[derive(Clone, PartialEq, Eq)]
pub struct DriverUrl {
    host: String,
    database: String,
    auth_token: String,
}

impl DriverUrl {
    pub fn from_descriptor(descriptor: &ConnectionDescriptor) -> Result<Self, DbError> {
        let url = Url::parse(descriptor.locator())?;
        Ok(Self {
            host: authority(&url),
            database: database_name(&url),
            auth_token: descriptor.auth_token().to_string(),
        })
    }

    /// Inverse of `Display`, used by the engine builder.
    pub fn parse(conn_str: &str) -> Result<Self, DbError> {
        let url = Url::parse(conn_str)?;
        if url.scheme() != DRIVER_SCHEME {
            return Err(DbError::InvalidConnectionString(format!(
                "expected {DRIVER_SCHEME} scheme, got {}",
                url.scheme()
            )));
        }
        let auth_token = url
            .query_pairs()
            .find(|(k, _)| k == AUTH_TOKEN_PARAM)
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| {
                DbError::InvalidConnectionString(format!("missing {AUTH_TOKEN_PARAM} parameter"))
            })?;
        Ok(Self {
            host: authority(&url),
            database: database_name(&url),
            auth_token,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Endpoint handed to the libsql remote client.
    pub fn remote_endpoint(&self) -> String {
        format!("libsql://{}/{}", self.host, self.database)
    }

    pub fn redacted(&self) -> String {
        format!(
            "{DRIVER_SCHEME}://{}/{}?{AUTH_TOKEN_PARAM}=***",
            self.host, self.database
        )
    }
}

impl fmt::Display for DriverUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{DRIVER_SCHEME}://{}/{}?{AUTH_TOKEN_PARAM}={}",
            self.host, self.database, self.auth_token
        )
    }
}

impl fmt::Debug for DriverUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Resolve the locator into the driver connection string.
pub fn resolve(descriptor: &ConnectionDescriptor) -> Result<String, DbError> {
    Ok(DriverUrl::from_descriptor(descriptor)?.to_string())
}

/// File path addressed by a `sqlite:///path` connection string.
pub fn local_path(conn_str: &str) -> Result<String, DbError> {
    let url = Url::parse(conn_str)?;
    if url.scheme() != LOCAL_SCHEME {
        return Err(DbError::InvalidConnectionString(format!(
            "expected {LOCAL_SCHEME} scheme, got {}",
            url.scheme()
        )));
    }
    Ok(database_name(&url))
}

fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

// Empty names pass through; a bare host addresses the root database.
fn database_name(url: &Url) -> String {
    let path = url.path();
    path.strip_prefix('/').unwrap_or(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(locator: &str, token: &str) -> ConnectionDescriptor {
        ConnectionDescriptor::new(locator, token).unwrap()
    }

    #[test]
    fn resolves_turso_locator() {
        let resolved = resolve(&descriptor("libsql://my-db.turso.io/main", "abc123")).unwrap();
        assert_eq!(resolved, "sqlite+libsql://my-db.turso.io/main?authToken=abc123");
    }

    #[test]
    fn host_and_path_keep_their_case() {
        let url = DriverUrl::from_descriptor(&descriptor("libsql://My-DB.turso.io/MainDb", "t"))
            .unwrap();
        assert_eq!(url.host(), "My-DB.turso.io");
        assert_eq!(url.database(), "MainDb");
    }

    #[test]
    fn empty_path_passes_through() {
        let resolved = resolve(&descriptor("libsql://my-db.turso.io", "abc123")).unwrap();
        assert_eq!(resolved, "sqlite+libsql://my-db.turso.io/?authToken=abc123");
    }

    #[test]
    fn port_is_kept_with_host() {
        let url = DriverUrl::from_descriptor(&descriptor("http://127.0.0.1:8080/dev", "t")).unwrap();
        assert_eq!(url.host(), "127.0.0.1:8080");
        assert_eq!(url.remote_endpoint(), "libsql://127.0.0.1:8080/dev");
    }

    #[test]
    fn token_is_held_verbatim() {
        let url = DriverUrl::from_descriptor(&descriptor("libsql://h/db", "a+b%2Fc")).unwrap();
        assert_eq!(url.auth_token(), "a+b%2Fc");
        assert_eq!(url.to_string(), "sqlite+libsql://h/db?authToken=a+b%2Fc");
    }

    #[test]
    fn malformed_locator_propagates_parse_error() {
        let err = resolve(&descriptor("not a url", "abc123")).unwrap_err();
        assert!(matches!(err, DbError::UrlParse(_)));
    }

    #[test]
    fn parse_reads_back_the_token() {
        let url = DriverUrl::parse("sqlite+libsql://my-db.turso.io/main?authToken=abc123").unwrap();
        assert_eq!(url.host(), "my-db.turso.io");
        assert_eq!(url.database(), "main");
        assert_eq!(url.auth_token(), "abc123");
    }

    #[test]
    fn parse_rejects_missing_token_and_foreign_scheme() {
        assert!(matches!(
            DriverUrl::parse("sqlite+libsql://my-db.turso.io/main"),
            Err(DbError::InvalidConnectionString(_))
        ));
        assert!(matches!(
            DriverUrl::parse("postgres://h/db?authToken=x"),
            Err(DbError::InvalidConnectionString(_))
        ));
    }

    #[test]
    fn redacted_form_hides_token() {
        let url = DriverUrl::parse("sqlite+libsql://h/db?authToken=abc123").unwrap();
        assert_eq!(url.redacted(), "sqlite+libsql://h/db?authToken=***");
        assert!(!format!("{url:?}").contains("abc123"));
    }

    #[test]
    fn local_path_is_relative_to_working_dir() {
        assert_eq!(
            local_path("sqlite:///student_reader.db").unwrap(),
            "student_reader.db"
        );
    }
}
