//! Loading the contact profile used for field replies.

use std::path::Path;

use saltpow_types::Profile;
use tracing::{info, warn};

use crate::ProtocolError;

/// Read and parse a JSON profile file.
pub fn load_profile(path: &Path) -> Result<Profile, ProtocolError> {
    let load_error = |reason: String| ProtocolError::ProfileLoad {
        path: path.display().to_string(),
        reason,
    };
    let contents = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    serde_json::from_str(&contents).map_err(|e| load_error(e.to_string()))
}

/// Load the profile, falling back to an empty one if the file is missing or
/// invalid. A bad profile must never block proof-of-work rounds.
pub fn load_or_default(path: Option<&Path>) -> Profile {
    let Some(path) = path else {
        info!("no profile configured, field replies will carry empty values");
        return Profile::default();
    };
    match load_profile(path) {
        Ok(profile) => {
            info!(path = %path.display(), "profile loaded");
            profile
        }
        Err(e) => {
            warn!(error = %e, "using empty profile");
            Profile::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_valid_profile() {
        let file = write_temp(r#"{"Name": "Jane Doe", "Mails": ["jane@example.com"], "Addess": ["Line 1"]}"#);
        let profile = load_profile(file.path()).unwrap();
        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.mails, vec!["jane@example.com".to_string()]);
        assert_eq!(profile.address, vec!["Line 1".to_string()]);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let file = write_temp("{ not json");
        assert!(matches!(
            load_profile(file.path()),
            Err(ProtocolError::ProfileLoad { .. })
        ));
    }

    #[test]
    fn fallback_to_default() {
        let file = write_temp("[1, 2, 3]");
        assert_eq!(load_or_default(Some(file.path())), Profile::default());
        assert_eq!(
            load_or_default(Some(Path::new("/nonexistent/profile.json"))),
            Profile::default()
        );
        assert_eq!(load_or_default(None), Profile::default());
    }
}
