use std::sync::Arc;

use tokio::sync::Mutex;
use travel_log_lib::{
    checklist::Checklist,
    settings::{builtin_emergency_contacts, AppSettings, EmergencyContact, SettingsUpdate},
    stats::{RouteAnalytics, TravelStats},
    Trip, TripDetails,
};

use crate::{
    archive::TripArchive,
    database::{constants::*, db::SqliteStore},
    store::{read_json, write_json, KeyValueStore},
    DataManagerError, StorageConfig,
};

#[derive(Clone)]
pub struct DataManager {
    pub(crate) store: Arc<dyn KeyValueStore>,
    pub(crate) archive: TripArchive,
    write_lock: Arc<Mutex<()>>,
}

/// The public interface for all travel log data management.
impl DataManager {
    pub async fn start(config: &StorageConfig) -> Result<Self, DataManagerError> {
        let data_dir = config.data_dir();
        if !data_dir.exists() {
            tokio::fs::create_dir_all(data_dir).await.inspect_err(|err| {
                tracing::error!("Failed to create data directory {:?}: {err}", data_dir);
            })?;
        }

        let store = SqliteStore::connect(&config.database_path()).await?;
        tracing::info!("Opened store at {:?}", config.database_path());

        Ok(Self::with_store(Arc::new(store)))
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            archive: TripArchive::new(store.clone()),
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn archive(&self) -> &TripArchive {
        &self.archive
    }

    // Trips

    pub async fn get_trips(&self) -> Result<Vec<Trip>, DataManagerError> {
        self.archive.list().await
    }

    pub async fn get_trip(&self, trip_id: &str) -> Result<Trip, DataManagerError> {
        self.archive.get(trip_id).await
    }

    pub async fn archive_trip(&self, trip: Trip) -> Result<(), DataManagerError> {
        self.archive.archive(trip).await
    }

    pub async fn update_trip(&self, trip_id: &str, details: TripDetails) -> Result<Trip, DataManagerError> {
        self.archive.update_details(trip_id, details).await
    }

    pub async fn delete_trip(&self, trip_id: &str) -> Result<(), DataManagerError> {
        self.archive.delete(trip_id).await
    }

    pub async fn travel_stats(&self) -> Result<TravelStats, DataManagerError> {
        Ok(TravelStats::from_trips(&self.archive.list().await?))
    }

    pub async fn route_analytics(&self, origin: &str, destination: &str) -> Result<Option<RouteAnalytics>, DataManagerError> {
        Ok(RouteAnalytics::for_route(&self.archive.list().await?, origin, destination))
    }

    // Checklists

    pub async fn get_checklists(&self) -> Result<Vec<Checklist>, DataManagerError> {
        read_json(self.store.as_ref(), CHECKLISTS_KEY).await
    }

    /// Returns `None` for a blank name.
    pub async fn create_checklist(&self, name: &str) -> Result<Option<Checklist>, DataManagerError> {
        let Some(checklist) = Checklist::new(name) else {
            return Ok(None);
        };

        let _guard = self.write_lock.lock().await;
        let mut checklists = self.get_checklists().await?;
        checklists.insert(0, checklist.clone());
        write_json(self.store.as_ref(), CHECKLISTS_KEY, &checklists).await?;
        Ok(Some(checklist))
    }

    pub async fn delete_checklist(&self, checklist_id: &str) -> Result<(), DataManagerError> {
        let _guard = self.write_lock.lock().await;
        let mut checklists = self.get_checklists().await?;
        let before = checklists.len();
        checklists.retain(|list| list.id != checklist_id);
        if checklists.len() == before {
            return Err(DataManagerError::NotFound(format!("checklist {checklist_id}")));
        }
        write_json(self.store.as_ref(), CHECKLISTS_KEY, &checklists).await
    }

    pub async fn add_checklist_item(&self, checklist_id: &str, text: &str) -> Result<Checklist, DataManagerError> {
        self.modify_checklist(checklist_id, |list| {
            list.add_item(text);
        }).await
    }

    pub async fn toggle_checklist_item(&self, checklist_id: &str, item_id: &str) -> Result<Checklist, DataManagerError> {
        let mut found = false;
        let list = self.modify_checklist(checklist_id, |list| {
            found = list.toggle_item(item_id).is_some();
        }).await?;

        if !found {
            return Err(DataManagerError::NotFound(format!("checklist item {item_id}")));
        }
        Ok(list)
    }

    pub async fn remove_checklist_item(&self, checklist_id: &str, item_id: &str) -> Result<Checklist, DataManagerError> {
        let mut found = false;
        let list = self.modify_checklist(checklist_id, |list| {
            found = list.remove_item(item_id);
        }).await?;

        if !found {
            return Err(DataManagerError::NotFound(format!("checklist item {item_id}")));
        }
        Ok(list)
    }

    async fn modify_checklist(&self, checklist_id: &str, modify: impl FnOnce(&mut Checklist)) -> Result<Checklist, DataManagerError> {
        let _guard = self.write_lock.lock().await;
        let mut checklists = self.get_checklists().await?;

        let list = checklists.iter_mut()
            .find(|list| list.id == checklist_id)
            .ok_or_else(|| DataManagerError::NotFound(format!("checklist {checklist_id}")))?;
        modify(list);
        let updated = list.clone();

        write_json(self.store.as_ref(), CHECKLISTS_KEY, &checklists).await?;
        Ok(updated)
    }

    // Emergency contacts

    /// Built-in helplines followed by the user's own contacts.
    pub async fn get_contacts(&self) -> Result<Vec<EmergencyContact>, DataManagerError> {
        let mut contacts = builtin_emergency_contacts();
        contacts.extend(self.user_contacts().await?);
        Ok(contacts)
    }

    pub async fn add_contact(&self, name: &str, number: &str) -> Result<EmergencyContact, DataManagerError> {
        let contact = EmergencyContact::new(name, number);

        let _guard = self.write_lock.lock().await;
        let mut contacts = self.user_contacts().await?;
        contacts.push(contact.clone());
        write_json(self.store.as_ref(), CONTACTS_KEY, &contacts).await?;
        Ok(contact)
    }

    pub async fn remove_contact(&self, contact_id: &str) -> Result<(), DataManagerError> {
        let _guard = self.write_lock.lock().await;
        let mut contacts = self.user_contacts().await?;
        let before = contacts.len();
        contacts.retain(|contact| contact.id != contact_id);
        if contacts.len() == before {
            return Err(DataManagerError::NotFound(format!("contact {contact_id}")));
        }
        write_json(self.store.as_ref(), CONTACTS_KEY, &contacts).await
    }

    async fn user_contacts(&self) -> Result<Vec<EmergencyContact>, DataManagerError> {
        read_json(self.store.as_ref(), CONTACTS_KEY).await
    }

    // Settings and consent

    pub async fn get_settings(&self) -> Result<AppSettings, DataManagerError> {
        read_json(self.store.as_ref(), SETTINGS_KEY).await
    }

    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<AppSettings, DataManagerError> {
        let _guard = self.write_lock.lock().await;
        let mut settings = self.get_settings().await?;
        settings.apply(update);
        write_json(self.store.as_ref(), SETTINGS_KEY, &settings).await?;
        Ok(settings)
    }

    pub async fn has_consented(&self) -> Result<bool, DataManagerError> {
        Ok(self.store.get(CONSENT_KEY).await?.is_some_and(|value| value == b"true"))
    }

    pub async fn give_consent(&self) -> Result<(), DataManagerError> {
        self.store.set(CONSENT_KEY, b"true".to_vec()).await
    }
}

#[cfg(test)]
mod tests {
    use travel_log_lib::settings::Theme;

    use super::*;
    use crate::MemoryStore;

    fn manager() -> DataManager {
        DataManager::with_store(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn start_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new(dir.path().join("nested").join("data"));
        let manager = DataManager::start(&config).await.unwrap();
        assert!(config.database_path().exists());
        assert!(manager.get_trips().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn checklists() {
        let manager = manager();
        assert!(manager.create_checklist("  ").await.unwrap().is_none());

        let packing = manager.create_checklist("Packing").await.unwrap().unwrap();
        manager.create_checklist("Groceries").await.unwrap();
        assert_eq!(manager.get_checklists().await.unwrap()[0].name, "Groceries");

        let list = manager.add_checklist_item(&packing.id, "Tickets").await.unwrap();
        let item_id = list.items[0].id.clone();

        let list = manager.toggle_checklist_item(&packing.id, &item_id).await.unwrap();
        assert!(list.items[0].completed);

        assert!(matches!(
            manager.toggle_checklist_item(&packing.id, "nope").await,
            Err(DataManagerError::NotFound(_))
        ));

        let list = manager.remove_checklist_item(&packing.id, &item_id).await.unwrap();
        assert!(list.items.is_empty());

        manager.delete_checklist(&packing.id).await.unwrap();
        assert_eq!(manager.get_checklists().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn contacts_follow_builtins() {
        let manager = manager();
        let contact = manager.add_contact(" Amma ", "9876543210").await.unwrap();
        let contacts = manager.get_contacts().await.unwrap();
        assert_eq!(contacts.len(), 8);
        assert_eq!(contacts[7].name, "Amma");

        manager.remove_contact(&contact.id).await.unwrap();
        assert_eq!(manager.get_contacts().await.unwrap().len(), 7);
        assert!(manager.remove_contact("builtin-112").await.is_err());
    }

    #[tokio::test]
    async fn settings_and_consent() {
        let manager = manager();
        assert_eq!(manager.get_settings().await.unwrap(), AppSettings::default());
        assert!(!manager.has_consented().await.unwrap());

        let settings = manager
            .update_settings(SettingsUpdate { theme: Some(Theme::Dark), location_enabled: Some(false) })
            .await
            .unwrap();
        assert!(!settings.location_enabled);
        assert_eq!(manager.get_settings().await.unwrap().theme, Theme::Dark);

        manager.give_consent().await.unwrap();
        assert!(manager.has_consented().await.unwrap());
    }
}
