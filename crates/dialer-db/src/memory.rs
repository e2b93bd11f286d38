//! In-memory repository implementations
//!
//! A single [`MemoryStore`] implements every repository trait over shared
//! maps, with the same ownership scoping, uniqueness and cascade rules as the
//! PostgreSQL schema. Used by service and API tests; `set_available(false)`
//! makes every call fail with a store error.

use async_trait::async_trait;
use chrono::Utc;
use dialer_core::{
    models::{
        CallRecord, CallRecordDetail, Contact, ContactDraft, ContactList,
        ContactListWithContacts, NewCallRecord, NewUser, User,
    },
    traits::{CallRecordRepository, ContactListRepository, ContactRepository, UserRepository},
    AppError, AppResult,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    contacts: BTreeMap<i64, Contact>,
    lists: BTreeMap<i64, ContactList>,
    members: BTreeSet<(i64, i64)>,
    records: BTreeMap<i64, CallRecord>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn detail(&self, record: &CallRecord) -> CallRecordDetail {
        CallRecordDetail {
            record: record.clone(),
            contact: record
                .contact_id
                .and_then(|id| self.contacts.get(&id))
                .cloned(),
        }
    }
}

/// Shared in-memory store
pub struct MemoryStore {
    tables: RwLock<Tables>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate a store outage (`false`) or recovery (`true`)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored call records
    pub fn call_record_count(&self) -> usize {
        self.tables.read().records.len()
    }

    fn check(&self) -> AppResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::Database("store unavailable".to_string()))
        }
    }
}

fn page<T: Clone>(items: Vec<T>, limit: i64, offset: i64) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let page = items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    (page, total)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.check()?;
        let tables = self.tables.read();
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        self.check()?;
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        self.check()?;
        let mut tables = self.tables.write();

        if tables.users.values().any(|u| u.username == user.username) {
            return Err(AppError::AlreadyExists(format!(
                "User {} already exists",
                user.username
            )));
        }

        let id = tables.next_id();
        let created = User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            ..Default::default()
        };
        tables.users.insert(id, created.clone());
        Ok(created)
    }

    async fn update_last_login(&self, id: i64) -> AppResult<()> {
        self.check()?;
        if let Some(user) = self.tables.write().users.get_mut(&id) {
            user.last_login = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl ContactRepository for MemoryStore {
    async fn find_by_id(&self, owner: i64, id: i64) -> AppResult<Option<Contact>> {
        self.check()?;
        Ok(self
            .tables
            .read()
            .contacts
            .get(&id)
            .filter(|c| c.user_id == owner)
            .cloned())
    }

    async fn list(&self, owner: i64, limit: i64, offset: i64) -> AppResult<(Vec<Contact>, i64)> {
        self.check()?;
        let tables = self.tables.read();
        let owned = tables
            .contacts
            .values()
            .filter(|c| c.user_id == owner)
            .cloned()
            .collect();
        Ok(page(owned, limit, offset))
    }

    async fn create(&self, owner: i64, draft: &ContactDraft) -> AppResult<Contact> {
        self.check()?;
        let mut tables = self.tables.write();

        if tables
            .contacts
            .values()
            .any(|c| c.user_id == owner && c.phone_number == draft.phone_number)
        {
            return Err(AppError::AlreadyExists(format!(
                "Contact with phone number {} already exists",
                draft.phone_number
            )));
        }

        let id = tables.next_id();
        let contact = Contact {
            id,
            user_id: owner,
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            city: draft.city.clone(),
            phone_number: draft.phone_number.clone(),
            ..Default::default()
        };
        tables.contacts.insert(id, contact.clone());
        Ok(contact)
    }

    async fn update(
        &self,
        owner: i64,
        id: i64,
        draft: &ContactDraft,
    ) -> AppResult<Option<Contact>> {
        self.check()?;
        let mut tables = self.tables.write();

        if tables.contacts.values().any(|c| {
            c.user_id == owner && c.id != id && c.phone_number == draft.phone_number
        }) {
            return Err(AppError::AlreadyExists(format!(
                "Contact with phone number {} already exists",
                draft.phone_number
            )));
        }

        let Some(contact) = tables
            .contacts
            .get_mut(&id)
            .filter(|c| c.user_id == owner)
        else {
            return Ok(None);
        };

        contact.first_name = draft.first_name.clone();
        contact.last_name = draft.last_name.clone();
        contact.city = draft.city.clone();
        contact.phone_number = draft.phone_number.clone();
        contact.updated_at = Utc::now();
        Ok(Some(contact.clone()))
    }

    async fn delete(&self, owner: i64, id: i64) -> AppResult<bool> {
        self.check()?;
        let mut tables = self.tables.write();

        if !tables.contacts.get(&id).is_some_and(|c| c.user_id == owner) {
            return Ok(false);
        }

        tables.contacts.remove(&id);
        tables.members.retain(|(_, contact_id)| *contact_id != id);
        for record in tables.records.values_mut() {
            if record.contact_id == Some(id) {
                record.contact_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl ContactListRepository for MemoryStore {
    async fn find_by_id(&self, owner: i64, id: i64) -> AppResult<Option<ContactList>> {
        self.check()?;
        Ok(self
            .tables
            .read()
            .lists
            .get(&id)
            .filter(|l| l.user_id == owner)
            .cloned())
    }

    async fn find_with_contacts(&self, id: i64) -> AppResult<Option<ContactListWithContacts>> {
        self.check()?;
        let tables = self.tables.read();

        let Some(list) = tables.lists.get(&id).cloned() else {
            return Ok(None);
        };

        let contacts = tables
            .members
            .iter()
            .filter(|(list_id, _)| *list_id == id)
            .filter_map(|(_, contact_id)| tables.contacts.get(contact_id).cloned())
            .collect();

        Ok(Some(ContactListWithContacts { list, contacts }))
    }

    async fn list(
        &self,
        owner: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<ContactList>, i64)> {
        self.check()?;
        let tables = self.tables.read();
        let owned = tables
            .lists
            .values()
            .filter(|l| l.user_id == owner)
            .cloned()
            .collect();
        Ok(page(owned, limit, offset))
    }

    async fn create(&self, owner: i64, name: &str) -> AppResult<ContactList> {
        self.check()?;
        let mut tables = self.tables.write();
        let id = tables.next_id();
        let list = ContactList {
            id,
            user_id: owner,
            name: name.to_string(),
            ..Default::default()
        };
        tables.lists.insert(id, list.clone());
        Ok(list)
    }

    async fn rename(&self, owner: i64, id: i64, name: &str) -> AppResult<Option<ContactList>> {
        self.check()?;
        let mut tables = self.tables.write();
        Ok(tables
            .lists
            .get_mut(&id)
            .filter(|l| l.user_id == owner)
            .map(|list| {
                list.name = name.to_string();
                list.clone()
            }))
    }

    async fn delete(&self, owner: i64, id: i64) -> AppResult<bool> {
        self.check()?;
        let mut tables = self.tables.write();

        if !tables.lists.get(&id).is_some_and(|l| l.user_id == owner) {
            return Ok(false);
        }

        tables.lists.remove(&id);
        tables.members.retain(|(list_id, _)| *list_id != id);
        Ok(true)
    }

    async fn add_contact(&self, list_id: i64, contact_id: i64) -> AppResult<()> {
        self.check()?;
        let mut tables = self.tables.write();

        if !tables.lists.contains_key(&list_id) || !tables.contacts.contains_key(&contact_id) {
            return Err(AppError::Database(format!(
                "foreign key violation: list {} / contact {}",
                list_id, contact_id
            )));
        }

        tables.members.insert((list_id, contact_id));
        Ok(())
    }

    async fn remove_contact(&self, list_id: i64, contact_id: i64) -> AppResult<bool> {
        self.check()?;
        Ok(self.tables.write().members.remove(&(list_id, contact_id)))
    }
}

#[async_trait]
impl CallRecordRepository for MemoryStore {
    async fn bulk_insert(&self, records: &[NewCallRecord]) -> AppResult<u64> {
        self.check()?;
        let mut tables = self.tables.write();
        let mut inserted = 0;

        for new in records {
            if tables
                .records
                .values()
                .any(|r| r.external_id == new.external_id)
            {
                continue;
            }

            let id = tables.next_id();
            tables.records.insert(
                id,
                CallRecord {
                    id,
                    external_id: new.external_id.clone(),
                    user_id: new.user_id,
                    contact_id: new.contact_id,
                    phone_number: new.phone_number.clone(),
                    duration: new.duration.max(0),
                    cost: new.cost.abs(),
                    status: new.status.clone(),
                    created_at: Utc::now(),
                },
            );
            inserted += 1;
        }

        Ok(inserted)
    }

    async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<CallRecord>> {
        self.check()?;
        Ok(self
            .tables
            .read()
            .records
            .values()
            .find(|r| r.external_id == external_id)
            .cloned())
    }

    async fn update_status(
        &self,
        external_id: &str,
        status: &str,
        duration: Option<i32>,
    ) -> AppResult<CallRecord> {
        self.check()?;
        let mut tables = self.tables.write();

        let record = tables
            .records
            .values_mut()
            .find(|r| r.external_id == external_id)
            .ok_or_else(|| AppError::NotFound(format!("Call record {} not found", external_id)))?;

        record.status = status.to_string();
        if let Some(duration) = duration {
            record.duration = duration.max(0);
        }
        Ok(record.clone())
    }

    async fn list_filtered(
        &self,
        owner: i64,
        contact_name: Option<&str>,
        phone_number: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<CallRecordDetail>, i64)> {
        self.check()?;
        let tables = self.tables.read();

        let mut matching: Vec<CallRecordDetail> = tables
            .records
            .values()
            .filter(|r| r.user_id == owner)
            .map(|r| tables.detail(r))
            .filter(|d| match contact_name {
                Some(name) => d
                    .contact
                    .as_ref()
                    .is_some_and(|c| contains_ignore_case(&c.first_name, name)),
                None => true,
            })
            .filter(|d| match phone_number {
                Some(phone) => contains_ignore_case(&d.record.phone_number, phone),
                None => true,
            })
            .collect();

        matching.sort_by(|a, b| {
            b.record
                .created_at
                .cmp(&a.record.created_at)
                .then(b.record.id.cmp(&a.record.id))
        });

        Ok(page(matching, limit, offset))
    }

    async fn find_by_id(&self, owner: i64, id: i64) -> AppResult<Option<CallRecordDetail>> {
        self.check()?;
        let tables = self.tables.read();
        Ok(tables
            .records
            .get(&id)
            .filter(|r| r.user_id == owner)
            .map(|r| tables.detail(r)))
    }

    async fn delete(&self, owner: i64, id: i64) -> AppResult<bool> {
        self.check()?;
        let mut tables = self.tables.write();

        if !tables.records.get(&id).is_some_and(|r| r.user_id == owner) {
            return Ok(false);
        }

        tables.records.remove(&id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn draft(phone: &str) -> ContactDraft {
        ContactDraft {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            city: "London".to_string(),
            phone_number: phone.to_string(),
        }
    }

    fn candidate(external_id: &str, contact: &Contact) -> NewCallRecord {
        NewCallRecord {
            external_id: external_id.to_string(),
            user_id: contact.user_id,
            contact_id: Some(contact.id),
            phone_number: contact.phone_number.clone(),
            duration: 0,
            cost: Decimal::ZERO,
            status: "queued".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_phone_per_owner_is_rejected() {
        let store = MemoryStore::new();
        ContactRepository::create(&store, 1, &draft("+1111"))
            .await
            .unwrap();

        let err = ContactRepository::create(&store, 1, &draft("+1111"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));

        // another owner may reuse the number
        assert!(ContactRepository::create(&store, 2, &draft("+1111"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_bulk_insert_skips_existing_external_id() {
        let store = MemoryStore::new();
        let contact = ContactRepository::create(&store, 1, &draft("+1111"))
            .await
            .unwrap();

        let mut first = candidate("CA1", &contact);
        first.cost = dec!(0.5);
        assert_eq!(store.bulk_insert(&[first]).await.unwrap(), 1);

        let mut again = candidate("CA1", &contact);
        again.status = "failed".to_string();
        let inserted = store
            .bulk_insert(&[again, candidate("CA2", &contact)])
            .await
            .unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(store.call_record_count(), 2);

        let kept = store.find_by_external_id("CA1").await.unwrap().unwrap();
        assert_eq!(kept.status, "queued");
        assert_eq!(kept.cost, dec!(0.5));
    }

    #[tokio::test]
    async fn test_update_status_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_status("CA999", "completed", Some(10))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.call_record_count(), 0);
    }

    #[tokio::test]
    async fn test_deleting_contact_keeps_call_records() {
        let store = MemoryStore::new();
        let contact = ContactRepository::create(&store, 1, &draft("+1111"))
            .await
            .unwrap();
        store
            .bulk_insert(&[candidate("CA1", &contact)])
            .await
            .unwrap();

        assert!(ContactRepository::delete(&store, 1, contact.id)
            .await
            .unwrap());

        let record = store.find_by_external_id("CA1").await.unwrap().unwrap();
        assert_eq!(record.contact_id, None);
        assert_eq!(record.user_id, 1);
        assert_eq!(record.phone_number, "+1111");
    }

    #[tokio::test]
    async fn test_list_members_and_cascade() {
        let store = MemoryStore::new();
        let a = ContactRepository::create(&store, 1, &draft("+1111"))
            .await
            .unwrap();
        let b = ContactRepository::create(&store, 1, &draft("+2222"))
            .await
            .unwrap();
        let list = ContactListRepository::create(&store, 1, "Sales")
            .await
            .unwrap();

        store.add_contact(list.id, b.id).await.unwrap();
        store.add_contact(list.id, a.id).await.unwrap();
        store.add_contact(list.id, a.id).await.unwrap();

        let loaded = store.find_with_contacts(list.id).await.unwrap().unwrap();
        let phones: Vec<_> = loaded.contacts.iter().map(|c| c.phone_number.as_str()).collect();
        assert_eq!(phones, vec!["+1111", "+2222"]);

        assert!(ContactListRepository::delete(&store, 1, list.id)
            .await
            .unwrap());
        assert!(ContactRepository::find_by_id(&store, 1, a.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_filters_are_case_insensitive() {
        let store = MemoryStore::new();
        let contact = ContactRepository::create(&store, 1, &draft("+1111"))
            .await
            .unwrap();
        store
            .bulk_insert(&[candidate("CA1", &contact)])
            .await
            .unwrap();

        let (hits, total) = store
            .list_filtered(1, Some("aD"), None, 20, 0)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(hits[0].contact.as_ref().unwrap().id, contact.id);

        let (_, total) = store
            .list_filtered(1, None, Some("999"), 20, 0)
            .await
            .unwrap();
        assert_eq!(total, 0);

        let (_, total) = store.list_filtered(2, None, None, 20, 0).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = MemoryStore::new();
        store.set_available(false);

        let err = store.bulk_insert(&[]).await.unwrap_err();
        assert!(err.is_store_error());
    }
}
