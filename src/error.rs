use thiserror::Error;

/// User-facing errors.
#[derive(Error, Debug)]
pub enum SqlPassError {
    #[error("sqlpass config error: {0}")]
    Config(String),

    /// The formatted output no longer token-flattens to the same text as the
    /// input. The output must not be written; both texts are carried so the
    /// caller can diff them.
    #[error("sqlpass equivalence error: formatting changed the token stream")]
    Equivalence { original: String, formatted: String },

    /// A placeholder survived restoration. Internal consistency failure:
    /// the protect/restore pair is broken.
    #[error("sqlpass placeholder error: unresolved placeholder {token}")]
    UnresolvedPlaceholder { token: String, formatted: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SqlPassError>;
