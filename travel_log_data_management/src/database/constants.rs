pub const KEY_VALUE_TABLE_NAME: &str = "KeyValues";
pub const KEY: &str = "key";
pub const VALUE: &str = "value";
pub const UPDATED_AT: &str = "updated_at";

// Record keys, shared with the web client's local storage layout.
pub const TRIPS_KEY: &str = "journeys";
pub const CHECKLISTS_KEY: &str = "checklists";
pub const CONTACTS_KEY: &str = "emergencyContacts";
pub const SETTINGS_KEY: &str = "appSettings";
pub const CONSENT_KEY: &str = "dataConsent";
