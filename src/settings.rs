//! Environment configuration for the server binary. The core never reads the
//! environment; it receives constructed values from here.

use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/switchboard";
const DEFAULT_PORT: u16 = 3000;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("PORT is not a valid port number: '{0}'")]
    InvalidPort(String),
    #[error("ENCRYPTION_KEY must be set")]
    MissingEncryptionKey,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    /// Passphrase for the field cipher key derivation.
    pub encryption_key: String,
    pub port: u16,
}

impl Settings {
    /// Read `DATABASE_URL`, `ENCRYPTION_KEY`, and `PORT`. The key has no
    /// default: serving with a known key would silently void the encryption.
    pub fn from_env() -> Result<Self, SettingsError> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.into());
        let encryption_key = std::env::var("ENCRYPTION_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(SettingsError::MissingEncryptionKey)?;
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| SettingsError::InvalidPort(raw))?,
            Err(_) => DEFAULT_PORT,
        };
        Ok(Settings {
            database_url,
            encryption_key,
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test: env vars are process-global, so the scenarios run
    // sequentially in one body.
    #[test]
    fn from_env_scenarios() {
        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("PORT");
        std::env::remove_var("ENCRYPTION_KEY");

        assert!(matches!(
            Settings::from_env(),
            Err(SettingsError::MissingEncryptionKey)
        ));

        std::env::set_var("ENCRYPTION_KEY", "hunter2");
        let s = Settings::from_env().unwrap();
        assert_eq!(s.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(s.port, DEFAULT_PORT);
        assert_eq!(s.encryption_key, "hunter2");

        std::env::set_var("PORT", "notaport");
        assert!(matches!(
            Settings::from_env(),
            Err(SettingsError::InvalidPort(_))
        ));

        std::env::set_var("PORT", "8080");
        std::env::set_var("DATABASE_URL", "postgres://db/custom");
        let s = Settings::from_env().unwrap();
        assert_eq!(s.port, 8080);
        assert_eq!(s.database_url, "postgres://db/custom");

        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("PORT");
        std::env::remove_var("ENCRYPTION_KEY");
    }
}
