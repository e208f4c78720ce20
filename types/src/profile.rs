//! Contact profile used to answer the server's field requests.

use serde::{Deserialize, Serialize};

/// Static contact record.
///
/// Field names follow the JSON layout the profile files have always used.
/// `Addess` is accepted as an alias for `Address` so older files still load.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Mails")]
    pub mails: Vec<String>,

    #[serde(rename = "Skype")]
    pub skype: String,

    /// Birth date formatted as `%d.%m.%Y`.
    #[serde(rename = "BirthDate")]
    pub birth_date: String,

    #[serde(rename = "Country")]
    pub country: String,

    #[serde(rename = "Address", alias = "Addess")]
    pub address: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_profile() {
        let json = r#"{
            "Name": "Jane Doe",
            "Mails": ["jane@example.com", "doe@example.com"],
            "Skype": "N/A",
            "BirthDate": "01.02.1990",
            "Country": "Germany",
            "Address": ["Long street 3", "32345 Big city"]
        }"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.mails.len(), 2);
        assert_eq!(profile.address[1], "32345 Big city");
    }

    #[test]
    fn legacy_address_key_is_accepted() {
        let json = r#"{"Addess": ["Line one"]}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.address, vec!["Line one".to_string()]);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let profile: Profile = serde_json::from_str("{}").unwrap();
        assert_eq!(profile, Profile::default());
    }
}
