//! Persistence collaborator.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::model::{
    EntityKind, EntityPatch, Named, NewPoint, NewZone, PointEntity, PointKind, Review, ReviewDraft, ZoneEntity,
};

mod document;

pub use document::DocumentStore;

/// A record returned by an update, tagged by collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredEntity {
    Point(PointEntity),
    Zone(ZoneEntity),
}

impl StoredEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            StoredEntity::Point(p) => p.kind.into(),
            StoredEntity::Zone(_) => EntityKind::Zone,
        }
    }
}

impl Named for StoredEntity {
    fn id(&self) -> &str {
        match self {
            StoredEntity::Point(p) => &p.id,
            StoredEntity::Zone(z) => &z.id,
        }
    }

    fn name(&self) -> &str {
        match self {
            StoredEntity::Point(p) => &p.name,
            StoredEntity::Zone(z) => &z.name,
        }
    }
}

/// Asynchronous key-addressed document store with one collection per kind.
pub trait EntityStore: Send + Sync {
    fn list_points(&self, kind: PointKind) -> impl Future<Output = StoreResult<Vec<PointEntity>>> + Send;

    fn list_zones(&self) -> impl Future<Output = StoreResult<Vec<ZoneEntity>>> + Send;

    fn get_point(&self, kind: PointKind, id: &str) -> impl Future<Output = StoreResult<PointEntity>> + Send;

    fn get_zone(&self, id: &str) -> impl Future<Output = StoreResult<ZoneEntity>> + Send;

    fn create_point(&self, kind: PointKind, point: NewPoint) -> impl Future<Output = StoreResult<PointEntity>> + Send;

    fn create_zone(&self, zone: NewZone) -> impl Future<Output = StoreResult<ZoneEntity>> + Send;

    /// Applies the non-`None` fields of `patch` and returns the updated record.
    fn update_entity(
        &self,
        kind: EntityKind,
        id: &str,
        patch: EntityPatch,
    ) -> impl Future<Output = StoreResult<StoredEntity>> + Send;

    fn delete_entity(&self, kind: EntityKind, id: &str) -> impl Future<Output = StoreResult<()>> + Send;

    fn create_review(&self, user_id: &str, draft: ReviewDraft) -> impl Future<Output = StoreResult<Review>> + Send;

    /// Reviews of one point, oldest first.
    fn list_reviews(&self, target_id: &str) -> impl Future<Output = StoreResult<Vec<Review>>> + Send;
}
