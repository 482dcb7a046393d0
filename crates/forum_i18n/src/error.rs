use thiserror::Error;

/// Errors raised while loading locale data or configuration.
///
/// Translation itself never fails; see [`crate::Resolver::translate`].
#[derive(Debug, Error)]
pub enum I18nError {
    #[error("json locale tree error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "yaml")]
    #[error("yaml locale tree error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid locale tree: {0}")]
    InvalidTree(String),
}
