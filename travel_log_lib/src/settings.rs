use serde::{Deserialize, Serialize};

use crate::random_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "location_enabled_default")]
    pub location_enabled: bool,
}

fn location_enabled_default() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            location_enabled: true,
        }
    }
}

/// Partial update, as sent by the settings screen.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub theme: Option<Theme>,
    pub location_enabled: Option<bool>,
}

impl AppSettings {
    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(theme) = update.theme {
            self.theme = theme;
        }
        if let Some(location_enabled) = update.location_enabled {
            self.location_enabled = location_enabled;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: String,
    pub name: String,
    pub number: String,
}

impl EmergencyContact {
    pub fn new(name: &str, number: &str) -> Self {
        Self {
            id: random_id(),
            name: name.trim().to_string(),
            number: number.trim().to_string(),
        }
    }
}

/// National helplines, always listed ahead of user contacts.
pub fn builtin_emergency_contacts() -> Vec<EmergencyContact> {
    [
        ("National Emergency Number", "112"),
        ("Police", "100"),
        ("Fire", "101"),
        ("Ambulance", "102"),
        ("Disaster Management", "108"),
        ("Women Helpline", "1091"),
        ("Child Helpline", "1098"),
    ]
    .into_iter()
    .map(|(name, number)| EmergencyContact {
        id: format!("builtin-{number}"),
        name: name.to_string(),
        number: number.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_location_flag_means_enabled() {
        let settings: AppSettings = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert!(settings.location_enabled);

        let settings: AppSettings = serde_json::from_str(r#"{"locationEnabled":false}"#).unwrap();
        assert!(!settings.location_enabled);
        assert_eq!(settings.theme, Theme::System);
    }

    #[test]
    fn partial_update() {
        let mut settings = AppSettings::default();
        settings.apply(SettingsUpdate { theme: None, location_enabled: Some(false) });
        assert_eq!(settings, AppSettings { theme: Theme::System, location_enabled: false });
    }

    #[test]
    fn builtin_contacts_start_with_112() {
        let contacts = builtin_emergency_contacts();
        assert_eq!(contacts.len(), 7);
        assert_eq!(contacts[0].number, "112");
    }
}
