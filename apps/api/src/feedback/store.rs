//! Feedback Store: sole owner of the persisted feedback collection.
//!
//! Records live under one key as a JSON array, newest first. Every mutation
//! reads the array, changes one entry and writes the whole array back; those
//! read-modify-write cycles are serialized through `write_lock`, so
//! concurrent requests in this process cannot lose each other's updates.
//!
//! "Not found" is a normal outcome and comes back as `Ok(None)`. Reads never
//! fail on bad data: undecodable values are logged and treated as absent.
//! Writes do fail (`StorageError::Corrupt`) rather than overwrite a collection
//! they could not parse; undecodable entries elsewhere in the list are kept.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::feedback::seed::{seed_feedback, seed_users};
use crate::models::feedback::{
    FeedbackPatch, FeedbackRecord, FeedbackStatus, NewFeedback, OfficialResponse,
};
use crate::models::user::{Session, User};
use crate::storage::{KvBackend, StorageError, CURRENT_USER_KEY, FEEDBACKS_KEY, USERS_KEY};

pub const ANONYMOUS: &str = "Anonymous";

pub struct FeedbackStore {
    backend: Arc<dyn KvBackend>,
    write_lock: Mutex<()>,
}

impl FeedbackStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend_kind(&self) -> &'static str {
        self.backend.kind()
    }

    /// Seeds the collection, the roster and the current-user slot when each is
    /// missing. Existing values are never overwritten, so this is safe to run
    /// on every start.
    pub async fn initialize(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        if self.backend.get(FEEDBACKS_KEY).await?.is_none() {
            let records = seed_feedback(Utc::now());
            self.write_json(FEEDBACKS_KEY, &records).await?;
            info!("Seeded feedback collection with {} records", records.len());
        }

        let users = seed_users();
        if self.backend.get(USERS_KEY).await?.is_none() {
            self.write_json(USERS_KEY, &users).await?;
            info!("Seeded user roster with {} users", users.len());
        }

        if self.backend.get(CURRENT_USER_KEY).await?.is_none() {
            if let Some(first) = users.first() {
                self.write_json(CURRENT_USER_KEY, first).await?;
                info!("Default current user set to {}", first.name);
            }
        }

        Ok(())
    }

    /// Entire collection in stored order.
    ///
    /// Entries that fail to decode are skipped with a warning; a collection
    /// that is not a JSON array at all reads as empty.
    pub async fn get_all(&self) -> Result<Vec<FeedbackRecord>, StorageError> {
        let entries = match self.load_entries().await {
            Ok(entries) => entries,
            Err(StorageError::Corrupt(msg)) => {
                warn!("{msg}; treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        Ok(entries
            .into_iter()
            .enumerate()
            .filter_map(|(idx, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping undecodable feedback entry at position {idx}: {e}");
                    None
                }
            })
            .collect())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<FeedbackRecord>, StorageError> {
        Ok(self.get_all().await?.into_iter().find(|r| r.id == id))
    }

    /// Creates a record with a fresh id, zero upvotes and `pending` status, and
    /// places it at the head of the collection.
    pub async fn add(
        &self,
        session: &Session,
        input: NewFeedback,
    ) -> Result<FeedbackRecord, StorageError> {
        let created_by = input
            .created_by
            .or_else(|| session.display_name().map(str::to_string))
            .unwrap_or_else(|| ANONYMOUS.to_string());

        let record = FeedbackRecord {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            description: input.description,
            category: input.category,
            status: FeedbackStatus::Pending,
            upvotes: 0,
            created_at: Utc::now(),
            created_by,
            location: input.location,
            attachments: input.attachments,
            official_response: None,
        };

        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_entries().await?;
        entries.insert(0, serde_json::to_value(&record)?);
        self.write_json(FEEDBACKS_KEY, &entries).await?;

        info!(
            "Added feedback {} ({}) by {}",
            record.id,
            record.category.as_str(),
            record.created_by
        );
        Ok(record)
    }

    /// Shallow-merges `patch` over the record with `id`. No write happens when
    /// the id is unknown.
    pub async fn update(
        &self,
        id: &str,
        patch: FeedbackPatch,
    ) -> Result<Option<FeedbackRecord>, StorageError> {
        self.modify(id, move |_| patch).await
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: FeedbackStatus,
    ) -> Result<Option<FeedbackRecord>, StorageError> {
        self.update(
            id,
            FeedbackPatch {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    /// Adds one upvote. The count is read and written under the store lock.
    pub async fn increment_upvotes(&self, id: &str) -> Result<Option<FeedbackRecord>, StorageError> {
        self.modify(id, |current| FeedbackPatch {
            upvotes: Some(current.upvotes.saturating_add(1)),
            ..Default::default()
        })
        .await
    }

    pub async fn upvote(&self, id: &str) -> Result<Option<FeedbackRecord>, StorageError> {
        self.increment_upvotes(id).await
    }

    /// Attaches (or replaces) the official response and forces `in-progress`.
    /// Returns `None` when the record is unknown or the session has no user.
    pub async fn add_official_response(
        &self,
        session: &Session,
        id: &str,
        content: &str,
    ) -> Result<Option<FeedbackRecord>, StorageError> {
        let Some(user) = session.user.as_ref() else {
            warn!("Response to {id} rejected: no current user");
            return Ok(None);
        };

        let now = Utc::now();
        let response = OfficialResponse {
            id: format!("{id}-response-{}", now.timestamp_millis()),
            content: content.to_string(),
            responded_by: user.name.clone(),
            responded_at: now,
        };

        self.modify(id, move |_| FeedbackPatch {
            official_response: Some(response),
            status: Some(FeedbackStatus::InProgress),
            ..Default::default()
        })
        .await
    }

    // ────────────────────────────────────────────────────────────────────────
    // Current identity
    // ────────────────────────────────────────────────────────────────────────

    pub async fn current_user(&self) -> Result<Option<User>, StorageError> {
        self.read_json(CURRENT_USER_KEY).await
    }

    pub async fn set_current_user(&self, user: &User) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.write_json(CURRENT_USER_KEY, user).await?;
        info!("Current user is now {} ({:?})", user.name, user.role);
        Ok(())
    }

    pub async fn is_official(&self) -> Result<bool, StorageError> {
        Ok(self.current_user().await?.is_some_and(|u| u.is_official()))
    }

    /// Session for the identity held in the current-user slot.
    pub async fn session(&self) -> Result<Session, StorageError> {
        Ok(Session {
            user: self.current_user().await?,
        })
    }

    pub async fn users(&self) -> Result<Vec<User>, StorageError> {
        Ok(self.read_json(USERS_KEY).await?.unwrap_or_default())
    }

    /// Makes the roster member with `user_id` the current user.
    pub async fn switch_user(&self, user_id: &str) -> Result<Option<User>, StorageError> {
        let Some(user) = self.users().await?.into_iter().find(|u| u.id == user_id) else {
            return Ok(None);
        };
        self.set_current_user(&user).await?;
        Ok(Some(user))
    }

    // ────────────────────────────────────────────────────────────────────────
    // Internals
    // ────────────────────────────────────────────────────────────────────────

    /// The single write path for existing records: builds a patch from the
    /// current value, applies it in place and persists the collection.
    /// Other entries are written back exactly as they were read.
    async fn modify<F>(&self, id: &str, build: F) -> Result<Option<FeedbackRecord>, StorageError>
    where
        F: FnOnce(&FeedbackRecord) -> FeedbackPatch,
    {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_entries().await?;

        let Some(slot) = entries
            .iter_mut()
            .find(|e| e.get("id").and_then(Value::as_str) == Some(id))
        else {
            debug!("Feedback {id} not found; nothing written");
            return Ok(None);
        };

        let mut record: FeedbackRecord = serde_json::from_value(slot.clone())
            .map_err(|e| StorageError::Corrupt(format!("feedback {id} cannot be decoded: {e}")))?;
        let patch = build(&record);
        record.apply(patch);
        *slot = serde_json::to_value(&record)?;

        self.write_json(FEEDBACKS_KEY, &entries).await?;
        debug!("Updated feedback {id}");
        Ok(Some(record))
    }

    /// Raw collection entries for a write. Refuses to proceed when the stored
    /// value is not a JSON array, so a write never replaces data it could not read.
    async fn load_entries(&self) -> Result<Vec<Value>, StorageError> {
        let Some(raw) = self.backend.get(FEEDBACKS_KEY).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|e| {
            StorageError::Corrupt(format!("stored value under '{FEEDBACKS_KEY}' is not a list ({e})"))
        })
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.backend.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Stored value under '{key}' is corrupt ({e}); treating as absent");
                Ok(None)
            }
        }
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(value)?;
        self.backend.set(key, &encoded).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feedback::FeedbackCategory;
    use crate::models::user::Role;
    use crate::storage::MemoryBackend;

    async fn seeded() -> (Arc<MemoryBackend>, FeedbackStore) {
        let backend = Arc::new(MemoryBackend::new());
        let store = FeedbackStore::new(backend.clone());
        store.initialize().await.unwrap();
        (backend, store)
    }

    fn new_feedback(title: &str) -> NewFeedback {
        NewFeedback {
            title: title.to_string(),
            category: FeedbackCategory::Safety,
            description: "Crosswalk paint has faded near the library.".to_string(),
            location: Some("Library Road".to_string()),
            attachments: None,
            created_by: None,
        }
    }

    fn official() -> User {
        User {
            id: "9".to_string(),
            name: "Chief Roberts".to_string(),
            email: "roberts@example.com".to_string(),
            role: Role::Official,
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn test_initialize_seeds_once() {
        let (backend, store) = seeded().await;
        let first = backend.get(FEEDBACKS_KEY).await.unwrap();

        store
            .update_status("2", FeedbackStatus::Rejected)
            .await
            .unwrap();
        let after_update = backend.get(FEEDBACKS_KEY).await.unwrap();
        assert_ne!(first, after_update);

        store.initialize().await.unwrap();
        assert_eq!(backend.get(FEEDBACKS_KEY).await.unwrap(), after_update);
        assert_eq!(store.get_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_initialize_sets_citizen_as_current_user() {
        let (_, store) = seeded().await;
        let user = store.current_user().await.unwrap().unwrap();
        assert_eq!(user.name, "Jane Smith");
        assert!(!store.is_official().await.unwrap());
        assert_eq!(store.users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_all_on_empty_store() {
        let store = FeedbackStore::new(Arc::new(MemoryBackend::new()));
        assert!(store.get_all().await.unwrap().is_empty());
        assert!(store.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_collection_defaults_to_empty() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set(FEEDBACKS_KEY, "{not json").await.unwrap();
        backend.set(CURRENT_USER_KEY, "42").await.unwrap();
        let store = FeedbackStore::new(backend);

        assert!(store.get_all().await.unwrap().is_empty());
        assert!(store.get_by_id("1").await.unwrap().is_none());
        assert!(store.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bad_entry_is_skipped_and_survives_writes() {
        let (backend, store) = seeded().await;
        let raw = backend.get(FEEDBACKS_KEY).await.unwrap().unwrap();
        let mut entries: Vec<Value> = serde_json::from_str(&raw).unwrap();
        entries[3]["upvotes"] = serde_json::json!(-1);
        backend
            .set(FEEDBACKS_KEY, &serde_json::to_string(&entries).unwrap())
            .await
            .unwrap();

        let visible = store.get_all().await.unwrap();
        assert_eq!(visible.len(), 3);
        assert!(visible.iter().all(|r| r.id != "4"));

        let created = store
            .add(&Session::default(), new_feedback("Faded crosswalk"))
            .await
            .unwrap();
        store.upvote("2").await.unwrap().unwrap();

        let visible = store.get_all().await.unwrap();
        assert_eq!(visible.len(), 4);
        assert_eq!(visible[0].id, created.id);

        let stored: Vec<Value> =
            serde_json::from_str(&backend.get(FEEDBACKS_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(stored.len(), 5);
        assert_eq!(stored[4], entries[3]);
    }

    #[tokio::test]
    async fn test_modifying_bad_entry_fails_without_writing() {
        let (backend, store) = seeded().await;
        let raw = backend.get(FEEDBACKS_KEY).await.unwrap().unwrap();
        let mut entries: Vec<Value> = serde_json::from_str(&raw).unwrap();
        entries[3]["status"] = serde_json::json!("archived");
        let broken = serde_json::to_string(&entries).unwrap();
        backend.set(FEEDBACKS_KEY, &broken).await.unwrap();

        let err = store.upvote("4").await.err().unwrap();
        assert!(matches!(err, StorageError::Corrupt(_)));
        assert_eq!(backend.get(FEEDBACKS_KEY).await.unwrap(), Some(broken));
    }

    #[tokio::test]
    async fn test_unparseable_collection_is_never_overwritten() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set(FEEDBACKS_KEY, "{not json").await.unwrap();
        let store = FeedbackStore::new(backend.clone());

        let err = store
            .add(&Session::default(), new_feedback("Lost?"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StorageError::Corrupt(_)));
        assert!(store.update_status("1", FeedbackStatus::Resolved).await.is_err());
        assert_eq!(
            backend.get(FEEDBACKS_KEY).await.unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let (_, store) = seeded().await;
        let found = store.get_by_id("3").await.unwrap().unwrap();
        assert_eq!(found.title, "Community Garden Proposal");
        assert!(store.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_assigns_fresh_pending_record_at_head() {
        let (_, store) = seeded().await;
        let existing: Vec<String> = store
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();

        let session = store.session().await.unwrap();
        let created = store.add(&session, new_feedback("Faded crosswalk")).await.unwrap();

        assert_eq!(created.status, FeedbackStatus::Pending);
        assert_eq!(created.upvotes, 0);
        assert!(created.official_response.is_none());
        assert!(!existing.contains(&created.id));
        assert_eq!(created.created_by, "Jane Smith");

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0], created);
    }

    #[tokio::test]
    async fn test_add_ids_are_unique_under_rapid_creation() {
        let (_, store) = seeded().await;
        let session = Session::default();
        let a = store.add(&session, new_feedback("First")).await.unwrap();
        let b = store.add(&session, new_feedback("Second")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.created_by, ANONYMOUS);
    }

    #[tokio::test]
    async fn test_add_keeps_caller_resolved_author() {
        let (_, store) = seeded().await;
        let session = Session::for_user(official());
        let mut input = new_feedback("Named");
        input.created_by = Some("Anonymous".to_string());
        let created = store.add(&session, input).await.unwrap();
        assert_eq!(created.created_by, "Anonymous");
    }

    #[tokio::test]
    async fn test_upvote_touches_only_target() {
        let (_, store) = seeded().await;
        let before = store.get_all().await.unwrap();

        let updated = store.upvote("2").await.unwrap().unwrap();
        assert_eq!(updated.upvotes, 19);

        let after = store.get_all().await.unwrap();
        for (old, new) in before.iter().zip(after.iter()) {
            if old.id == "2" {
                assert_eq!(new.upvotes, old.upvotes + 1);
            } else {
                assert_eq!(old, new);
            }
        }
    }

    #[tokio::test]
    async fn test_upvote_unknown_id_writes_nothing() {
        let (backend, store) = seeded().await;
        let before = backend.get(FEEDBACKS_KEY).await.unwrap();
        assert!(store.upvote("nope").await.unwrap().is_none());
        assert_eq!(backend.get(FEEDBACKS_KEY).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_concurrent_upvotes_are_not_lost() {
        let (_, store) = seeded().await;
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.upvote("1").await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let record = store.get_by_id("1").await.unwrap().unwrap();
        assert_eq!(record.upvotes, 24 + 20);
    }

    #[tokio::test]
    async fn test_official_response_forces_in_progress() {
        let (_, store) = seeded().await;
        let session = Session::for_user(official());

        let before = store.get_by_id("4").await.unwrap().unwrap();
        assert_eq!(before.status, FeedbackStatus::Resolved);

        let updated = store
            .add_official_response(&session, "4", "text")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, FeedbackStatus::InProgress);

        let response = updated.official_response.unwrap();
        assert_eq!(response.content, "text");
        assert_eq!(response.responded_by, "Chief Roberts");
        assert!(response.id.starts_with("4-response-"));
    }

    #[tokio::test]
    async fn test_second_response_replaces_first() {
        let (_, store) = seeded().await;
        let session = Session::for_user(official());
        store
            .add_official_response(&session, "2", "Looking into it")
            .await
            .unwrap();
        let updated = store
            .add_official_response(&session, "2", "Bins ordered")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.official_response.unwrap().content, "Bins ordered");
    }

    #[tokio::test]
    async fn test_official_response_needs_identity_and_record() {
        let (backend, store) = seeded().await;
        let before = backend.get(FEEDBACKS_KEY).await.unwrap();

        let none = store
            .add_official_response(&Session::default(), "1", "text")
            .await
            .unwrap();
        assert!(none.is_none());

        let missing = store
            .add_official_response(&Session::for_user(official()), "missing", "text")
            .await
            .unwrap();
        assert!(missing.is_none());

        assert_eq!(backend.get(FEEDBACKS_KEY).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_round_trip() {
        let (_, store) = seeded().await;
        let before = store.get_by_id("3").await.unwrap().unwrap();

        store
            .update(
                "3",
                FeedbackPatch {
                    title: Some("X".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        let after = store.get_by_id("3").await.unwrap().unwrap();
        assert_eq!(after.title, "X");
        assert_eq!(FeedbackRecord { title: before.title.clone(), ..after }, before);
    }

    #[tokio::test]
    async fn test_update_keeps_position() {
        let (_, store) = seeded().await;
        store.update_status("3", FeedbackStatus::Rejected).await.unwrap();
        let all = store.get_all().await.unwrap();
        assert_eq!(all[2].id, "3");
        assert_eq!(all[2].status, FeedbackStatus::Rejected);
    }

    #[tokio::test]
    async fn test_any_status_reachable() {
        let (_, store) = seeded().await;
        for status in FeedbackStatus::ALL {
            let updated = store.update_status("4", status).await.unwrap().unwrap();
            assert_eq!(updated.status, status);
        }
    }

    #[tokio::test]
    async fn test_switch_user() {
        let (_, store) = seeded().await;
        let user = store.switch_user("2").await.unwrap().unwrap();
        assert_eq!(user.name, "Tom Johnson");
        assert!(store.is_official().await.unwrap());
        assert!(store.session().await.unwrap().is_official());

        assert!(store.switch_user("404").await.unwrap().is_none());
        assert!(store.is_official().await.unwrap());
    }
}
