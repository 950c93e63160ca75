use tempfile::TempDir;
use tourmap::engine::{EntityCache, Snapshot};
use tourmap::model::{
    Bounds, Coordinate, EntityKind, EntityPatch, NewPoint, NewZone, PointEntity, PointKind, Review, ReviewDraft,
    ZoneEntity, ZoneShape,
};
use tourmap::store::{DocumentStore, EntityStore, StoredEntity};
use tourmap::{StoreError, StoreResult};

fn point(name: &str, latitude: f64, longitude: f64) -> NewPoint {
    NewPoint {
        name: name.to_string(),
        description: format!("{name} description"),
        location: Coordinate { latitude, longitude },
    }
}

fn square_zone(name: &str) -> NewZone {
    NewZone {
        name: name.to_string(),
        description: String::new(),
        shape: ZoneShape::Rectangle(Bounds {
            north: 1.0,
            south: 0.0,
            east: 1.0,
            west: 0.0,
        }),
    }
}

#[tokio::test]
async fn test_create_update_delete_roundtrip() {
    let store = DocumentStore::in_memory();

    let museo = store.create_point(PointKind::Landmark, point("Museo", 19.40, -99.13)).await.unwrap();
    let fetched = store.get_point(PointKind::Landmark, &museo.id).await.unwrap();
    assert_eq!(fetched, museo);

    let updated = store
        .update_entity(EntityKind::Landmark, &museo.id, EntityPatch::details("Museo Nacional", "Historia"))
        .await
        .unwrap();
    let StoredEntity::Point(updated) = updated else {
        panic!("expected a point");
    };
    assert_eq!(updated.name, "Museo Nacional");
    assert_eq!(updated.location, museo.location);

    let moved = Coordinate { latitude: 19.41, longitude: -99.14 };
    store
        .update_entity(EntityKind::Landmark, &museo.id, EntityPatch::location(moved))
        .await
        .unwrap();
    assert_eq!(store.get_point(PointKind::Landmark, &museo.id).await.unwrap().location, moved);

    store.delete_entity(EntityKind::Landmark, &museo.id).await.unwrap();
    assert!(matches!(
        store.get_point(PointKind::Landmark, &museo.id).await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_zone_cannot_be_relocated() {
    let store = DocumentStore::in_memory();
    let zone = store.create_zone(square_zone("Centro")).await.unwrap();
    let err = store
        .update_entity(EntityKind::Zone, &zone.id, EntityPatch::location(Coordinate::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn test_file_store_reloads_after_restart() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data").join("tourmap.json");

    let store = DocumentStore::open(&path).await.unwrap();
    let taqueria = store.create_point(PointKind::Service, point("Taqueria", 19.5, -99.2)).await.unwrap();
    store.create_zone(square_zone("Centro")).await.unwrap();
    let review = store
        .create_review(
            "ana",
            ReviewDraft {
                target_entity_id: taqueria.id.clone(),
                target_kind: PointKind::Service,
                rating: 5,
                comment: "Excelente".to_string(),
            },
        )
        .await
        .unwrap();
    drop(store);

    let reopened = DocumentStore::open(&path).await.unwrap();
    assert_eq!(reopened.list_points(PointKind::Service).await.unwrap(), vec![taqueria.clone()]);
    assert_eq!(reopened.list_zones().await.unwrap().len(), 1);
    assert_eq!(reopened.list_reviews(&taqueria.id).await.unwrap(), vec![review]);
}

#[tokio::test]
async fn test_deleting_point_drops_its_reviews() {
    let store = DocumentStore::in_memory();
    let museo = store.create_point(PointKind::Landmark, point("Museo", 0.0, 0.0)).await.unwrap();
    store
        .create_review(
            "ana",
            ReviewDraft {
                target_entity_id: museo.id.clone(),
                target_kind: PointKind::Landmark,
                rating: 3,
                comment: "Bien".to_string(),
            },
        )
        .await
        .unwrap();
    store.delete_entity(EntityKind::Landmark, &museo.id).await.unwrap();
    assert!(store.list_reviews(&museo.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_file_is_reported() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        DocumentStore::open(&path).await,
        Err(StoreError::Serialization(_))
    ));
}

#[tokio::test]
async fn test_failed_write_leaves_collections_unchanged() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("data");
    let path = dir.join("tourmap.json");

    let store = DocumentStore::open(&path).await.unwrap();
    let museo = store.create_point(PointKind::Landmark, point("Museo", 19.40, -99.13)).await.unwrap();

    // The data directory becomes a plain file, so every later write fails.
    std::fs::remove_dir_all(&dir).unwrap();
    std::fs::write(&dir, "").unwrap();

    let err = store
        .create_point(PointKind::Landmark, point("Catedral", 19.43, -99.13))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
    assert_eq!(store.list_points(PointKind::Landmark).await.unwrap(), vec![museo.clone()]);

    assert!(store.create_zone(square_zone("Centro")).await.is_err());
    assert!(store.list_zones().await.unwrap().is_empty());

    assert!(store
        .update_entity(EntityKind::Landmark, &museo.id, EntityPatch::details("Otro", ""))
        .await
        .is_err());
    assert!(store
        .create_review(
            "ana",
            ReviewDraft {
                target_entity_id: museo.id.clone(),
                target_kind: PointKind::Landmark,
                rating: 4,
                comment: "Bien".to_string(),
            },
        )
        .await
        .is_err());
    assert!(store.delete_entity(EntityKind::Landmark, &museo.id).await.is_err());

    assert_eq!(store.get_point(PointKind::Landmark, &museo.id).await.unwrap(), museo);
    assert!(store.list_reviews(&museo.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cache_refresh_loads_all_collections() {
    let store = DocumentStore::in_memory();
    store.create_point(PointKind::Landmark, point("Museo", 0.0, 0.0)).await.unwrap();
    store.create_point(PointKind::Service, point("Taqueria", 0.0, 0.0)).await.unwrap();
    store.create_zone(square_zone("Centro")).await.unwrap();

    let mut cache = EntityCache::new();
    cache.refresh(&store).await.unwrap();
    let snapshot = cache.snapshot();
    assert_eq!(snapshot.landmarks.len(), 1);
    assert_eq!(snapshot.services.len(), 1);
    assert_eq!(snapshot.zones.len(), 1);
    assert_eq!(cache.generation(), 1);
}

/// Lists points fine but fails on zones.
struct BrokenZones(DocumentStore);

impl EntityStore for BrokenZones {
    async fn list_points(&self, kind: PointKind) -> StoreResult<Vec<PointEntity>> {
        self.0.list_points(kind).await
    }

    async fn list_zones(&self) -> StoreResult<Vec<ZoneEntity>> {
        Err(StoreError::Io(std::io::Error::other("zones unavailable")))
    }

    async fn get_point(&self, kind: PointKind, id: &str) -> StoreResult<PointEntity> {
        self.0.get_point(kind, id).await
    }

    async fn get_zone(&self, id: &str) -> StoreResult<ZoneEntity> {
        self.0.get_zone(id).await
    }

    async fn create_point(&self, kind: PointKind, point: NewPoint) -> StoreResult<PointEntity> {
        self.0.create_point(kind, point).await
    }

    async fn create_zone(&self, zone: NewZone) -> StoreResult<ZoneEntity> {
        self.0.create_zone(zone).await
    }

    async fn update_entity(&self, kind: EntityKind, id: &str, patch: EntityPatch) -> StoreResult<StoredEntity> {
        self.0.update_entity(kind, id, patch).await
    }

    async fn delete_entity(&self, kind: EntityKind, id: &str) -> StoreResult<()> {
        self.0.delete_entity(kind, id).await
    }

    async fn create_review(&self, user_id: &str, draft: ReviewDraft) -> StoreResult<Review> {
        self.0.create_review(user_id, draft).await
    }

    async fn list_reviews(&self, target_id: &str) -> StoreResult<Vec<Review>> {
        self.0.list_reviews(target_id).await
    }
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let store = DocumentStore::in_memory();
    store.create_point(PointKind::Landmark, point("Museo", 0.0, 0.0)).await.unwrap();

    let mut cache = EntityCache::new();
    cache.refresh(&store).await.unwrap();
    let before = cache.snapshot();

    store.create_point(PointKind::Landmark, point("Catedral", 0.0, 0.0)).await.unwrap();
    let broken = BrokenZones(store.clone());
    assert!(cache.refresh(&broken).await.is_err());

    assert_eq!(*cache.snapshot(), *before);
    assert_eq!(cache.generation(), 1);
    assert_ne!(*cache.snapshot(), Snapshot::default());
}
