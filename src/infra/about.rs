//! Loads the about page profile from a TOML file.

use std::path::Path;

use tracing::warn;

use crate::domain::about::AboutContent;

use super::error::InfraError;

/// Read and parse the profile file. A missing file yields empty content so the
/// page still renders; a malformed file is a configuration error.
pub async fn load_about(path: &Path) -> Result<AboutContent, InfraError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(
                target = "folio::about",
                path = %path.display(),
                "about file not found; serving an empty profile"
            );
            return Ok(AboutContent::default());
        }
        Err(err) => return Err(InfraError::Io(err)),
    };

    parse_about(&raw).map_err(|err| {
        InfraError::configuration(format!("invalid about file `{}`: {err}", path.display()))
    })
}

pub fn parse_about(raw: &str) -> Result<AboutContent, toml::de::Error> {
    toml::from_str(raw)
}
