use async_trait::async_trait;
use mockall::mock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::StoreError;
use crate::models::common::{EntryId, FormId};
use crate::models::form::{FormSchema, SubmissionEntry};
use crate::models::payload::UserInfo;
use crate::services::store::{EntryStore, FormStore, MetadataStore, UserDirectory};

// Mock doubles for the form platform capabilities
mock! {
    pub Entries {}

    #[async_trait]
    impl EntryStore for Entries {
        async fn get_entry(&self, entry_id: EntryId) -> Result<SubmissionEntry, StoreError>;
    }
}

mock! {
    pub Forms {}

    #[async_trait]
    impl FormStore for Forms {
        async fn get_form(&self, form_id: FormId) -> Result<FormSchema, StoreError>;
    }
}

mock! {
    pub Metadata {}

    impl MetadataStore for Metadata {
        fn get_entry_meta(&self, entry_id: EntryId, key: &str) -> Result<Option<String>, StoreError>;
        fn set_entry_meta(&self, entry_id: EntryId, key: &str, value: &str) -> Result<(), StoreError>;
    }
}

// A simple in-memory form platform for tests
pub struct InMemoryPlatform {
    forms: Mutex<HashMap<FormId, FormSchema>>,
    entries: Mutex<HashMap<EntryId, SubmissionEntry>>,
    users: Mutex<HashMap<u64, UserInfo>>,
    meta: Mutex<HashMap<(EntryId, String), String>>,
    entry_delays: Mutex<HashMap<EntryId, u64>>, // entry_id -> milliseconds
    platform_down: AtomicBool,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self {
            forms: Mutex::new(HashMap::new()),
            entries: Mutex::new(HashMap::new()),
            users: Mutex::new(HashMap::new()),
            meta: Mutex::new(HashMap::new()),
            entry_delays: Mutex::new(HashMap::new()),
            platform_down: AtomicBool::new(false),
        }
    }

    pub fn insert_form(&self, form: FormSchema) {
        self.forms.lock().unwrap().insert(form.id, form);
    }

    pub fn insert_entry(&self, entry: SubmissionEntry) {
        self.entries.lock().unwrap().insert(entry.id, entry);
    }

    pub fn remove_entry(&self, entry_id: EntryId) {
        self.entries.lock().unwrap().remove(&entry_id);
    }

    pub fn insert_user(&self, user: UserInfo) {
        self.users.lock().unwrap().insert(user.user_id, user);
    }

    /// Delay responses for one entry to simulate a slow backend
    pub fn delay_entry(&self, entry_id: EntryId, millis: u64) {
        self.entry_delays.lock().unwrap().insert(entry_id, millis);
    }

    /// Make every platform call fail with a transport-style error
    pub fn set_platform_down(&self, down: bool) {
        self.platform_down.store(down, Ordering::SeqCst);
    }

    pub fn meta_value(&self, entry_id: EntryId, key: &str) -> Option<String> {
        self.meta
            .lock()
            .unwrap()
            .get(&(entry_id, key.to_string()))
            .cloned()
    }

    fn check_up(&self) -> Result<(), StoreError> {
        if self.platform_down.load(Ordering::SeqCst) {
            Err(StoreError::Decode("platform unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FormStore for InMemoryPlatform {
    async fn get_form(&self, form_id: FormId) -> Result<FormSchema, StoreError> {
        self.check_up()?;
        self.forms
            .lock()
            .unwrap()
            .get(&form_id)
            .cloned()
            .ok_or_else(|| StoreError::form_not_found(form_id))
    }
}

#[async_trait]
impl EntryStore for InMemoryPlatform {
    async fn get_entry(&self, entry_id: EntryId) -> Result<SubmissionEntry, StoreError> {
        self.check_up()?;
        let delay = self.entry_delays.lock().unwrap().get(&entry_id).copied();
        if let Some(millis) = delay {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
        self.entries
            .lock()
            .unwrap()
            .get(&entry_id)
            .cloned()
            .ok_or_else(|| StoreError::entry_not_found(entry_id))
    }
}

#[async_trait]
impl UserDirectory for InMemoryPlatform {
    async fn get_user(&self, user_id: u64) -> Result<Option<UserInfo>, StoreError> {
        self.check_up()?;
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }
}

impl MetadataStore for InMemoryPlatform {
    fn get_entry_meta(&self, entry_id: EntryId, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.meta_value(entry_id, key))
    }

    fn set_entry_meta(&self, entry_id: EntryId, key: &str, value: &str) -> Result<(), StoreError> {
        self.meta
            .lock()
            .unwrap()
            .insert((entry_id, key.to_string()), value.to_string());
        Ok(())
    }
}
