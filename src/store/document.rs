use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{EntityStore, StoredEntity};
use crate::error::{StoreError, StoreResult};
use crate::model::{
    EntityId, EntityKind, EntityPatch, NewPoint, NewZone, PointEntity, PointKind, Review, ReviewDraft, ZoneEntity,
};

const ID_LEN: usize = 12;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Collections {
    landmarks: Vec<PointEntity>,
    services: Vec<PointEntity>,
    zones: Vec<ZoneEntity>,
    reviews: Vec<Review>,
}

impl Collections {
    fn points(&self, kind: PointKind) -> &Vec<PointEntity> {
        match kind {
            PointKind::Landmark => &self.landmarks,
            PointKind::Service => &self.services,
        }
    }

    fn points_mut(&mut self, kind: PointKind) -> &mut Vec<PointEntity> {
        match kind {
            PointKind::Landmark => &mut self.landmarks,
            PointKind::Service => &mut self.services,
        }
    }
}

#[derive(Clone, Debug, Default)]
enum Backing {
    #[default]
    Memory,
    File(PathBuf),
    /// Read-only placeholder until a data file opens.
    Detached,
}

/// In-memory document store, optionally mirrored to a JSON file after every mutation.
///
/// Cloning yields another handle to the same collections.
#[derive(Clone, Debug, Default)]
pub struct DocumentStore {
    inner: Arc<RwLock<Collections>>,
    backing: Backing,
}

fn new_id() -> EntityId {
    nanoid::nanoid!(ID_LEN)
}

fn not_found(kind: EntityKind, id: &str) -> StoreError {
    StoreError::NotFound {
        kind: Cow::Borrowed(kind.label()),
        id: id.to_string(),
    }
}

fn require_name(name: &str) -> StoreResult<()> {
    if name.trim().is_empty() {
        return Err(StoreError::Validation("name must not be empty".into()));
    }
    Ok(())
}

fn point_kind(kind: EntityKind) -> Option<PointKind> {
    match kind {
        EntityKind::Landmark => Some(PointKind::Landmark),
        EntityKind::Service => Some(PointKind::Service),
        EntityKind::Zone => None,
    }
}

impl DocumentStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// An empty store that refuses every mutation with [`StoreError::Detached`].
    pub fn detached() -> Self {
        Self {
            inner: Arc::default(),
            backing: Backing::Detached,
        }
    }

    pub fn is_detached(&self) -> bool {
        matches!(self.backing, Backing::Detached)
    }

    /// Loads `path` if it exists; a missing file starts an empty store that is
    /// created on the first mutation.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let collections = match tokio::fs::read_to_string(&path).await {
            Ok(text) if text.trim().is_empty() => Collections::default(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "data file missing; starting empty");
                Collections::default()
            }
            Err(err) => return Err(err.into()),
        };
        info!(
            path = %path.display(),
            landmarks = collections.landmarks.len(),
            services = collections.services.len(),
            zones = collections.zones.len(),
            "document store opened"
        );
        Ok(Self {
            inner: Arc::new(RwLock::new(collections)),
            backing: Backing::File(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.backing {
            Backing::File(path) => Some(path),
            Backing::Memory | Backing::Detached => None,
        }
    }

    /// Pretty JSON of every collection, as written to the data file.
    pub async fn export_json(&self) -> StoreResult<String> {
        let data = self.inner.read().await;
        Ok(serde_json::to_string_pretty(&*data)?)
    }

    async fn persist(&self, data: &Collections) -> StoreResult<()> {
        let Backing::File(path) = &self.backing else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(data)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!(path = %path.display(), "data file written");
        Ok(())
    }

    /// Applies `change` to a copy of the collections and swaps it in only once
    /// the copy is written. A failed write leaves memory as it was.
    async fn commit<T>(&self, change: impl FnOnce(&mut Collections) -> StoreResult<T>) -> StoreResult<T> {
        if self.is_detached() {
            return Err(StoreError::Detached);
        }
        let mut data = self.inner.write().await;
        let mut next = data.clone();
        let out = change(&mut next)?;
        self.persist(&next).await?;
        *data = next;
        Ok(out)
    }
}

impl EntityStore for DocumentStore {
    async fn list_points(&self, kind: PointKind) -> StoreResult<Vec<PointEntity>> {
        Ok(self.inner.read().await.points(kind).clone())
    }

    async fn list_zones(&self) -> StoreResult<Vec<ZoneEntity>> {
        Ok(self.inner.read().await.zones.clone())
    }

    async fn get_point(&self, kind: PointKind, id: &str) -> StoreResult<PointEntity> {
        self.inner
            .read()
            .await
            .points(kind)
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| not_found(kind.into(), id))
    }

    async fn get_zone(&self, id: &str) -> StoreResult<ZoneEntity> {
        self.inner
            .read()
            .await
            .zones
            .iter()
            .find(|z| z.id == id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::Zone, id))
    }

    async fn create_point(&self, kind: PointKind, point: NewPoint) -> StoreResult<PointEntity> {
        require_name(&point.name)?;
        if !point.location.is_valid() {
            return Err(StoreError::Validation("location is out of range".into()));
        }
        let entity = PointEntity {
            id: new_id(),
            name: point.name,
            description: point.description,
            location: point.location,
            kind,
        };
        self.commit(|data| {
            data.points_mut(kind).push(entity.clone());
            Ok(())
        })
        .await?;
        info!(id = %entity.id, %kind, name = %entity.name, "point created");
        Ok(entity)
    }

    async fn create_zone(&self, zone: NewZone) -> StoreResult<ZoneEntity> {
        require_name(&zone.name)?;
        let entity = ZoneEntity {
            id: new_id(),
            name: zone.name,
            description: zone.description,
            shape: zone.shape,
        };
        self.commit(|data| {
            data.zones.push(entity.clone());
            Ok(())
        })
        .await?;
        info!(id = %entity.id, shape = entity.shape.type_name(), name = %entity.name, "zone created");
        Ok(entity)
    }

    async fn update_entity(&self, kind: EntityKind, id: &str, patch: EntityPatch) -> StoreResult<StoredEntity> {
        if let Some(name) = &patch.name {
            require_name(name)?;
        }
        if patch.location.is_some_and(|l| !l.is_valid()) {
            return Err(StoreError::Validation("location is out of range".into()));
        }

        let updated = self
            .commit(|data| match point_kind(kind) {
                Some(pk) => {
                    let point = data
                        .points_mut(pk)
                        .iter_mut()
                        .find(|p| p.id == id)
                        .ok_or_else(|| not_found(kind, id))?;
                    if let Some(name) = patch.name {
                        point.name = name;
                    }
                    if let Some(description) = patch.description {
                        point.description = description;
                    }
                    if let Some(location) = patch.location {
                        point.location = location;
                    }
                    Ok(StoredEntity::Point(point.clone()))
                }
                None => {
                    if patch.location.is_some() {
                        return Err(StoreError::Validation("zones cannot be relocated".into()));
                    }
                    let zone = data
                        .zones
                        .iter_mut()
                        .find(|z| z.id == id)
                        .ok_or_else(|| not_found(kind, id))?;
                    if let Some(name) = patch.name {
                        zone.name = name;
                    }
                    if let Some(description) = patch.description {
                        zone.description = description;
                    }
                    Ok(StoredEntity::Zone(zone.clone()))
                }
            })
            .await?;
        info!(%id, %kind, "entity updated");
        Ok(updated)
    }

    async fn delete_entity(&self, kind: EntityKind, id: &str) -> StoreResult<()> {
        self.commit(|data| {
            let removed = match point_kind(kind) {
                Some(pk) => {
                    let points = data.points_mut(pk);
                    let before = points.len();
                    points.retain(|p| p.id != id);
                    before != points.len()
                }
                None => {
                    let before = data.zones.len();
                    data.zones.retain(|z| z.id != id);
                    before != data.zones.len()
                }
            };
            if !removed {
                return Err(not_found(kind, id));
            }
            data.reviews.retain(|r| r.target_entity_id != id);
            Ok(())
        })
        .await?;
        info!(%id, %kind, "entity deleted");
        Ok(())
    }

    async fn create_review(&self, user_id: &str, draft: ReviewDraft) -> StoreResult<Review> {
        if !(1..=5).contains(&draft.rating) {
            return Err(StoreError::Validation(
                format!("rating must be between 1 and 5, got {}", draft.rating).into(),
            ));
        }
        if draft.comment.trim().is_empty() {
            return Err(StoreError::Validation("comment must not be empty".into()));
        }

        let review = self
            .commit(|data| {
                if !data.points(draft.target_kind).iter().any(|p| p.id == draft.target_entity_id) {
                    return Err(not_found(draft.target_kind.into(), &draft.target_entity_id));
                }
                let review = Review {
                    id: new_id(),
                    user_id: user_id.to_string(),
                    target_entity_id: draft.target_entity_id,
                    target_kind: draft.target_kind,
                    rating: draft.rating,
                    comment: draft.comment,
                    created_at: chrono::Utc::now(),
                };
                data.reviews.push(review.clone());
                Ok(review)
            })
            .await?;
        info!(id = %review.id, target = %review.target_entity_id, rating = review.rating, "review created");
        Ok(review)
    }

    async fn list_reviews(&self, target_id: &str) -> StoreResult<Vec<Review>> {
        Ok(self
            .inner
            .read()
            .await
            .reviews
            .iter()
            .filter(|r| r.target_entity_id == target_id)
            .cloned()
            .collect())
    }
}
