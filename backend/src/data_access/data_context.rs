use std::{collections::HashMap, sync::Arc};

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    feedback::Feedback,
    notification::Notification,
    payment::Payment,
    profile::Profile,
    project::Project,
    rating::Rating,
    subscription::Subscription,
    task::Task,
    user::User,
};

pub type DocumentTable = TableDefinition<'static, &'static [u8], &'static [u8]>;

const USERS_TABLE: DocumentTable = TableDefinition::new("users");
const PROFILES_TABLE: DocumentTable = TableDefinition::new("profiles");
const PROJECTS_TABLE: DocumentTable = TableDefinition::new("projects");
const TASKS_TABLE: DocumentTable = TableDefinition::new("tasks");
const NOTIFICATIONS_TABLE: DocumentTable = TableDefinition::new("notifications");
const RATINGS_TABLE: DocumentTable = TableDefinition::new("ratings");
const PAYMENTS_TABLE: DocumentTable = TableDefinition::new("payments");
const SUBSCRIPTIONS_TABLE: DocumentTable = TableDefinition::new("subscriptions");
const FEEDBACKS_TABLE: DocumentTable = TableDefinition::new("feedbacks");

const EMAIL_INDEX: TableDefinition<&str, &[u8]> = TableDefinition::new("email_index");
const PROFILE_AUTH_INDEX: TableDefinition<&[u8], &[u8]> = TableDefinition::new("profile_auth_index");
const RATING_UNIQUE_INDEX: TableDefinition<&str, &[u8]> = TableDefinition::new("rating_unique_index");
const SESSION_INDEX: TableDefinition<&str, &[u8]> = TableDefinition::new("session_index");

const UNKNOWN_NAME: &str = "Unknown";

// ── Errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum DataError {
    #[error("redb: {0}")]
    Redb(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("encode: {0}")]
    Encode(String),
}

// redb 2.x has many error types. Blanket them all into DataError::Redb.
macro_rules! from_redb {
    ($($t:ty),*) => {
        $(impl From<$t> for DataError {
            fn from(e: $t) -> Self { DataError::Redb(e.to_string()) }
        })*
    };
}

from_redb!(
    redb::Error,
    redb::DatabaseError,
    redb::TableError,
    redb::TransactionError,
    redb::StorageError,
    redb::CommitError
);

fn encode<T: Serialize>(doc: &T) -> Result<Vec<u8>, DataError> {
    serde_json::to_vec(doc).map_err(|e| DataError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DataError> {
    serde_json::from_slice(bytes).map_err(|e| DataError::Decode(e.to_string()))
}

// ── Documents ──────────────────────────────────────────────────

/// A top-level record stored as JSON under its UUID in its own table.
pub trait Document: Serialize + DeserializeOwned {
    const TABLE: DocumentTable;
    fn id(&self) -> Uuid;
}

macro_rules! document {
    ($($t:ty => $table:expr),* $(,)?) => {
        $(impl Document for $t {
            const TABLE: DocumentTable = $table;
            fn id(&self) -> Uuid { self.id }
        })*
    };
}

document!(
    User => USERS_TABLE,
    Profile => PROFILES_TABLE,
    Project => PROJECTS_TABLE,
    Task => TASKS_TABLE,
    Notification => NOTIFICATIONS_TABLE,
    Rating => RATINGS_TABLE,
    Payment => PAYMENTS_TABLE,
    Subscription => SUBSCRIPTIONS_TABLE,
    Feedback => FEEDBACKS_TABLE,
);

#[derive(Clone)]
pub struct DataContext {
    db: Arc<Database>,
}

impl DataContext {
    pub fn new(path: &str) -> Result<Self, DataError> {
        let db = Database::create(path)?;
        let write_txn = db.begin_write()?;
        {
            for table in [
                USERS_TABLE,
                PROFILES_TABLE,
                PROJECTS_TABLE,
                TASKS_TABLE,
                NOTIFICATIONS_TABLE,
                RATINGS_TABLE,
                PAYMENTS_TABLE,
                SUBSCRIPTIONS_TABLE,
                FEEDBACKS_TABLE,
            ] {
                let _ = write_txn.open_table(table)?;
            }
            let _ = write_txn.open_table(EMAIL_INDEX)?;
            let _ = write_txn.open_table(PROFILE_AUTH_INDEX)?;
            let _ = write_txn.open_table(RATING_UNIQUE_INDEX)?;
            let _ = write_txn.open_table(SESSION_INDEX)?;
        }
        write_txn.commit()?;
        debug!(path, "database opened");
        Ok(DataContext { db: Arc::new(db) })
    }

    // GENERIC DOCUMENTS
    pub fn get<T: Document>(&self, id: Uuid) -> Result<Option<T>, DataError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(T::TABLE)?;
        let stored = table.get(id.as_bytes().as_slice())?.map(|data| data.value().to_vec());
        stored.map(|bytes| decode(&bytes)).transpose()
    }

    /// Inserts or replaces the document under its id.
    pub fn put<T: Document>(&self, doc: &T) -> Result<(), DataError> {
        let bytes = encode(doc)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(T::TABLE)?;
            table.insert(doc.id().as_bytes().as_slice(), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Every document of the collection, in key order.
    pub fn scan<T: Document>(&self) -> Result<Vec<T>, DataError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(T::TABLE)?;
        let mut docs = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            docs.push(decode(value.value())?);
        }
        Ok(docs)
    }

    pub fn remove<T: Document>(&self, id: Uuid) -> Result<bool, DataError> {
        let write_txn = self.db.begin_write()?;
        let deleted;
        {
            let mut table = write_txn.open_table(T::TABLE)?;
            deleted = table.remove(id.as_bytes().as_slice())?.is_some();
        }
        write_txn.commit()?;
        Ok(deleted)
    }

    /// Read-modify-write of one document inside a single write transaction.
    /// Returns `Ok(None)` when the id is unknown. When `change` fails the
    /// transaction is aborted and the stored document is left untouched.
    pub fn modify<T, R, E, F>(&self, id: Uuid, change: F) -> Result<Option<R>, E>
    where
        T: Document,
        E: From<DataError>,
        F: FnOnce(&mut T) -> Result<R, E>,
    {
        let write_txn = self.db.begin_write().map_err(DataError::from)?;
        let outcome = {
            let mut table = write_txn.open_table(T::TABLE).map_err(DataError::from)?;
            let key = id.as_bytes();
            let stored = table
                .get(key.as_slice())
                .map_err(DataError::from)?
                .map(|data| data.value().to_vec());
            match stored {
                None => None,
                Some(bytes) => {
                    let mut doc: T = decode(&bytes)?;
                    match change(&mut doc) {
                        Ok(result) => {
                            let bytes = encode(&doc)?;
                            table
                                .insert(key.as_slice(), bytes.as_slice())
                                .map_err(DataError::from)?;
                            Some(Ok(result))
                        }
                        Err(e) => Some(Err(e)),
                    }
                }
            }
        };

        match outcome {
            Some(Ok(result)) => {
                write_txn.commit().map_err(DataError::from)?;
                Ok(Some(result))
            }
            Some(Err(e)) => {
                write_txn.abort().map_err(DataError::from)?;
                Err(e)
            }
            None => {
                write_txn.abort().map_err(DataError::from)?;
                Ok(None)
            }
        }
    }

    // USERS
    /// Returns false without writing when the email is already registered.
    pub fn create_user(&self, user: &User) -> Result<bool, DataError> {
        let bytes = encode(user)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut email_index = write_txn.open_table(EMAIL_INDEX)?;
            let taken = email_index.get(user.email.as_str())?.is_some();
            if taken {
                drop(email_index);
                write_txn.abort()?;
                return Ok(false);
            }
            let mut users_table = write_txn.open_table(USERS_TABLE)?;
            let id_bytes = user.id.as_bytes();
            users_table.insert(id_bytes.as_slice(), bytes.as_slice())?;
            email_index.insert(user.email.as_str(), id_bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(true)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DataError> {
        let read_txn = self.db.begin_read()?;
        let email_index = read_txn.open_table(EMAIL_INDEX)?;
        let id = email_index
            .get(email.trim().to_lowercase().as_str())?
            .map(|data| data.value().to_vec());
        let Some(id) = id else { return Ok(None) };

        let users_table = read_txn.open_table(USERS_TABLE)?;
        let stored = users_table.get(id.as_slice())?.map(|data| data.value().to_vec());
        stored.map(|bytes| decode(&bytes)).transpose()
    }

    pub fn count_users(&self) -> Result<u64, DataError> {
        let read_txn = self.db.begin_read()?;
        let users_table = read_txn.open_table(USERS_TABLE)?;
        Ok(users_table.len()?)
    }

    // PROFILES
    /// Returns false without writing when the user already owns a profile.
    pub fn create_profile(&self, profile: &Profile) -> Result<bool, DataError> {
        let bytes = encode(profile)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut auth_index = write_txn.open_table(PROFILE_AUTH_INDEX)?;
            let taken = auth_index.get(profile.auth.as_bytes().as_slice())?.is_some();
            if taken {
                drop(auth_index);
                write_txn.abort()?;
                return Ok(false);
            }
            let mut profiles_table = write_txn.open_table(PROFILES_TABLE)?;
            profiles_table.insert(profile.id.as_bytes().as_slice(), bytes.as_slice())?;
            auth_index.insert(profile.auth.as_bytes().as_slice(), profile.id.as_bytes().as_slice())?;
        }
        write_txn.commit()?;
        Ok(true)
    }

    pub fn get_profile_by_auth(&self, user_id: Uuid) -> Result<Option<Profile>, DataError> {
        let read_txn = self.db.begin_read()?;
        let auth_index = read_txn.open_table(PROFILE_AUTH_INDEX)?;
        let profile_id = auth_index
            .get(user_id.as_bytes().as_slice())?
            .map(|data| data.value().to_vec());
        let Some(profile_id) = profile_id else { return Ok(None) };

        let profiles_table = read_txn.open_table(PROFILES_TABLE)?;
        let stored = profiles_table
            .get(profile_id.as_slice())?
            .map(|data| data.value().to_vec());
        stored.map(|bytes| decode(&bytes)).transpose()
    }

    /// Profile name per user id, "Unknown" when the user has no profile.
    pub fn display_names<I>(&self, user_ids: I) -> Result<HashMap<Uuid, String>, DataError>
    where
        I: IntoIterator<Item = Uuid>,
    {
        let read_txn = self.db.begin_read()?;
        let auth_index = read_txn.open_table(PROFILE_AUTH_INDEX)?;
        let profiles_table = read_txn.open_table(PROFILES_TABLE)?;

        let mut names = HashMap::new();
        for user_id in user_ids {
            if names.contains_key(&user_id) {
                continue;
            }
            let profile_id = auth_index
                .get(user_id.as_bytes().as_slice())?
                .map(|data| data.value().to_vec());
            let stored = match profile_id {
                Some(profile_id) => profiles_table
                    .get(profile_id.as_slice())?
                    .map(|data| data.value().to_vec()),
                None => None,
            };
            let name = match stored {
                Some(bytes) => decode::<Profile>(&bytes)?.name,
                None => UNKNOWN_NAME.to_string(),
            };
            names.insert(user_id, name);
        }
        Ok(names)
    }

    pub fn display_name(&self, user_id: Uuid) -> Result<String, DataError> {
        let mut names = self.display_names([user_id])?;
        Ok(names.remove(&user_id).unwrap_or_else(|| UNKNOWN_NAME.to_string()))
    }

    // RATINGS
    /// Checks and claims the (rater, entity) uniqueness key in the same
    /// transaction as the insert. Returns false when the key is taken.
    pub fn create_rating(&self, rating: &Rating) -> Result<bool, DataError> {
        let bytes = encode(rating)?;
        let key = Rating::uniqueness_key(rating.from_user_id, rating.related_entity);
        let write_txn = self.db.begin_write()?;
        {
            let mut unique_index = write_txn.open_table(RATING_UNIQUE_INDEX)?;
            let taken = unique_index.get(key.as_str())?.is_some();
            if taken {
                drop(unique_index);
                write_txn.abort()?;
                return Ok(false);
            }
            let mut ratings_table = write_txn.open_table(RATINGS_TABLE)?;
            ratings_table.insert(rating.id.as_bytes().as_slice(), bytes.as_slice())?;
            unique_index.insert(key.as_str(), rating.id.as_bytes().as_slice())?;
        }
        write_txn.commit()?;
        Ok(true)
    }

    pub fn rating_key_exists(&self, key: &str) -> Result<bool, DataError> {
        let read_txn = self.db.begin_read()?;
        let unique_index = read_txn.open_table(RATING_UNIQUE_INDEX)?;
        let exists = unique_index.get(key)?.is_some();
        Ok(exists)
    }

    // SUBSCRIPTIONS
    /// Stores the subscription and indexes its checkout session, if any.
    pub fn put_subscription(&self, subscription: &Subscription) -> Result<(), DataError> {
        let bytes = encode(subscription)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SUBSCRIPTIONS_TABLE)?;
            let id_bytes = subscription.id.as_bytes();
            table.insert(id_bytes.as_slice(), bytes.as_slice())?;
            if let Some(session_id) = subscription.stripe_session_id.as_deref() {
                let mut session_index = write_txn.open_table(SESSION_INDEX)?;
                session_index.insert(session_id, id_bytes.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_subscription_by_session(&self, session_id: &str) -> Result<Option<Subscription>, DataError> {
        let read_txn = self.db.begin_read()?;
        let session_index = read_txn.open_table(SESSION_INDEX)?;
        let id = session_index.get(session_id)?.map(|data| data.value().to_vec());
        let Some(id) = id else { return Ok(None) };

        let table = read_txn.open_table(SUBSCRIPTIONS_TABLE)?;
        let stored = table.get(id.as_slice())?.map(|data| data.value().to_vec());
        stored.map(|bytes| decode(&bytes)).transpose()
    }
}

// ── Tests ──────────────────────────────────────────────────────
