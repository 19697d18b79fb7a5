//! In-process document store.
//!
//! Each collection is a vector of typed documents behind a tokio mutex.
//! Writes are checked against the collection's unique keys and, when a data
//! directory is configured, flushed as a JSON snapshot before the lock is
//! released.

use crate::auth::password;
use crate::models::{Coupon, Customer, Order, Product, Role, StoreSettings, User};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    /// Fields that must be unique across the collection, with their values.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate {field} '{value}' in {collection}")]
    Duplicate {
        collection: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("failed to persist collection: {0}")]
    Persist(String),
}

#[derive(Clone)]
pub struct Collection<T> {
    docs: Arc<Mutex<Vec<T>>>,
    snapshot: Option<PathBuf>,
}

impl<T: Document> Collection<T> {
    pub fn in_memory() -> Self {
        Self {
            docs: Arc::new(Mutex::new(Vec::new())),
            snapshot: None,
        }
    }

    /// Open a collection backed by `<dir>/<collection>.json`, loading any
    /// existing snapshot.
    pub async fn open(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(format!("{}.json", T::COLLECTION));
        let docs = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<T>>(&bytes)
                .map_err(|e| StoreError::Persist(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StoreError::Persist(format!("{}: {e}", path.display()))),
        };
        info!(collection = T::COLLECTION, documents = docs.len(), "collection loaded");
        Ok(Self {
            docs: Arc::new(Mutex::new(docs)),
            snapshot: Some(path),
        })
    }

    pub async fn find_all(&self) -> Vec<T> {
        self.docs.lock().await.clone()
    }

    pub async fn find_by_id(&self, id: &str) -> Option<T> {
        self.find_one(|d| d.id() == id).await
    }

    pub async fn find_one<F>(&self, filter: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        self.docs.lock().await.iter().find(|&d| filter(d)).cloned()
    }

    pub async fn count(&self) -> usize {
        self.docs.lock().await.len()
    }

    pub async fn insert(&self, doc: T) -> Result<T, StoreError> {
        let mut docs = self.docs.lock().await;
        check_unique(&docs, &doc, None)?;
        docs.push(doc.clone());
        if let Err(e) = self.persist(&docs).await {
            docs.pop();
            return Err(e);
        }
        debug!(collection = T::COLLECTION, id = doc.id(), "document inserted");
        Ok(doc)
    }

    /// Apply `apply` to the document with the given id. `Ok(None)` when no
    /// such document exists.
    pub async fn update_by_id<F, E>(&self, id: &str, apply: F) -> Result<Option<T>, E>
    where
        F: FnOnce(&mut T) -> Result<(), E>,
        E: From<StoreError>,
    {
        self.update_one(|d| d.id() == id, apply).await
    }

    /// Conditional update: the filter, the mutation and the write happen
    /// under one lock acquisition, so no other writer can interleave.
    pub async fn update_one<P, F, E>(&self, filter: P, apply: F) -> Result<Option<T>, E>
    where
        P: Fn(&T) -> bool,
        F: FnOnce(&mut T) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut docs = self.docs.lock().await;
        let Some(index) = docs.iter().position(|d| filter(d)) else {
            return Ok(None);
        };

        let mut updated = docs[index].clone();
        apply(&mut updated)?;
        check_unique(&docs, &updated, Some(index))?;

        let previous = std::mem::replace(&mut docs[index], updated.clone());
        if let Err(e) = self.persist(&docs).await {
            docs[index] = previous;
            return Err(e.into());
        }
        debug!(collection = T::COLLECTION, id = updated.id(), "document updated");
        Ok(Some(updated))
    }

    /// Replace the document with `id` by `upsert(existing)`, inserting the
    /// result when no such document exists yet.
    pub async fn upsert_by_id<F, E>(&self, id: &str, upsert: F) -> Result<T, E>
    where
        F: FnOnce(Option<T>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut docs = self.docs.lock().await;
        let index = docs.iter().position(|d| d.id() == id);
        let doc = upsert(index.map(|i| docs[i].clone()))?;
        check_unique(&docs, &doc, index)?;

        match index {
            Some(i) => {
                let previous = std::mem::replace(&mut docs[i], doc.clone());
                if let Err(e) = self.persist(&docs).await {
                    docs[i] = previous;
                    return Err(e.into());
                }
            }
            None => {
                docs.push(doc.clone());
                if let Err(e) = self.persist(&docs).await {
                    docs.pop();
                    return Err(e.into());
                }
            }
        }
        Ok(doc)
    }

    /// Return the document with `id`, inserting `default()` first if absent.
    pub async fn find_or_insert<F>(&self, id: &str, default: F) -> Result<T, StoreError>
    where
        F: FnOnce() -> T,
    {
        let mut docs = self.docs.lock().await;
        if let Some(doc) = docs.iter().find(|d| d.id() == id) {
            return Ok(doc.clone());
        }
        let doc = default();
        docs.push(doc.clone());
        if let Err(e) = self.persist(&docs).await {
            docs.pop();
            return Err(e);
        }
        Ok(doc)
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<Option<T>, StoreError> {
        let mut docs = self.docs.lock().await;
        let Some(index) = docs.iter().position(|d| d.id() == id) else {
            return Ok(None);
        };
        let removed = docs.remove(index);
        if let Err(e) = self.persist(&docs).await {
            docs.insert(index, removed);
            return Err(e);
        }
        debug!(collection = T::COLLECTION, id, "document deleted");
        Ok(Some(removed))
    }

    async fn persist(&self, docs: &[T]) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(docs).map_err(|e| StoreError::Persist(e.to_string()))?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| StoreError::Persist(format!("{}: {e}", path.display())))
    }
}

fn check_unique<T: Document>(docs: &[T], candidate: &T, skip: Option<usize>) -> Result<(), StoreError> {
    let keys = candidate.unique_keys();
    for (index, existing) in docs.iter().enumerate() {
        if Some(index) == skip {
            continue;
        }
        if existing.id() == candidate.id() {
            return Err(StoreError::Duplicate {
                collection: T::COLLECTION,
                field: "_id",
                value: candidate.id().to_string(),
            });
        }
        for (field, value) in existing.unique_keys() {
            if keys.iter().any(|(f, v)| *f == field && *v == value) {
                return Err(StoreError::Duplicate {
                    collection: T::COLLECTION,
                    field,
                    value,
                });
            }
        }
    }
    Ok(())
}

/// All collections the service works with.
#[derive(Clone)]
pub struct Database {
    pub products: Collection<Product>,
    pub users: Collection<User>,
    pub customers: Collection<Customer>,
    pub orders: Collection<Order>,
    pub coupons: Collection<Coupon>,
    pub store_settings: Collection<StoreSettings>,
}

impl Database {
    pub fn in_memory() -> Self {
        Self {
            products: Collection::in_memory(),
            users: Collection::in_memory(),
            customers: Collection::in_memory(),
            orders: Collection::in_memory(),
            coupons: Collection::in_memory(),
            store_settings: Collection::in_memory(),
        }
    }

    pub async fn open(dir: &Path) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| StoreError::Persist(format!("{}: {e}", dir.display())))?;
        Ok(Self {
            products: Collection::open(dir).await?,
            users: Collection::open(dir).await?,
            customers: Collection::open(dir).await?,
            orders: Collection::open(dir).await?,
            coupons: Collection::open(dir).await?,
            store_settings: Collection::open(dir).await?,
        })
    }

    /// Create an admin account when the user collection is empty.
    /// Returns whether a user was created.
    pub async fn seed_admin(&self, username: &str, plaintext: &str) -> Result<bool, crate::error::ApiError> {
        if self.users.count().await > 0 {
            return Ok(false);
        }
        let digest = password::hash_blocking(plaintext.to_string()).await?;
        let user = User::new(username.to_string(), digest, Role::Admin);
        self.users.insert(user).await?;
        info!(username, "seeded admin user");
        Ok(true)
    }
}
