use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::model::{Coordinate, EntityKind, Named, PointEntity, PointKind, ZoneEntity};
use crate::store::EntityStore;

/// One full load of the three collections.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub landmarks: Vec<PointEntity>,
    pub services: Vec<PointEntity>,
    pub zones: Vec<ZoneEntity>,
}

/// Borrowed view of a cached record tagged with its origin collection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CacheEntry<'a> {
    Point(&'a PointEntity),
    Zone(&'a ZoneEntity),
}

impl CacheEntry<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            CacheEntry::Point(p) => p.kind.into(),
            CacheEntry::Zone(_) => EntityKind::Zone,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            CacheEntry::Point(p) => &p.description,
            CacheEntry::Zone(z) => &z.description,
        }
    }

    /// Marker location or zone bounds center.
    pub fn anchor(&self) -> Option<Coordinate> {
        match self {
            CacheEntry::Point(p) => Some(p.location),
            CacheEntry::Zone(z) => z.shape.center(),
        }
    }

    pub fn location_text(&self) -> String {
        self.anchor()
            .map(|c| format!("Lat: {:.4}, Lng: {:.4}", c.latitude, c.longitude))
            .unwrap_or_default()
    }
}

impl Named for CacheEntry<'_> {
    fn id(&self) -> &str {
        match self {
            CacheEntry::Point(p) => &p.id,
            CacheEntry::Zone(z) => &z.id,
        }
    }

    fn name(&self) -> &str {
        match self {
            CacheEntry::Point(p) => &p.name,
            CacheEntry::Zone(z) => &z.name,
        }
    }
}

impl Snapshot {
    /// Landmarks first, then services, each in load order.
    pub fn point_entities(&self) -> impl Iterator<Item = &PointEntity> {
        self.landmarks.iter().chain(self.services.iter())
    }

    pub fn all(&self) -> Vec<CacheEntry<'_>> {
        self.point_entities()
            .map(CacheEntry::Point)
            .chain(self.zones.iter().map(CacheEntry::Zone))
            .collect()
    }

    pub fn find(&self, kind: EntityKind, id: &str) -> Option<CacheEntry<'_>> {
        match kind {
            EntityKind::Landmark => self.landmarks.iter().find(|p| p.id == id).map(CacheEntry::Point),
            EntityKind::Service => self.services.iter().find(|p| p.id == id).map(CacheEntry::Point),
            EntityKind::Zone => self.zones.iter().find(|z| z.id == id).map(CacheEntry::Zone),
        }
    }

    pub fn len(&self) -> usize {
        self.landmarks.len() + self.services.len() + self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Loads every collection concurrently. Fails as a whole if any list fails.
pub async fn load_snapshot<S: EntityStore>(store: &S) -> StoreResult<Snapshot> {
    let (landmarks, services, zones) = tokio::try_join!(
        store.list_points(PointKind::Landmark),
        store.list_points(PointKind::Service),
        store.list_zones(),
    )?;
    Ok(Snapshot {
        landmarks,
        services,
        zones,
    })
}

/// Holds the last successfully loaded snapshot. Replaced wholesale, never patched.
#[derive(Clone, Debug, Default)]
pub struct EntityCache {
    snapshot: Arc<Snapshot>,
    generation: u64,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle; holders keep seeing this snapshot even after a refresh.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn install(&mut self, snapshot: Snapshot) {
        self.snapshot = Arc::new(snapshot);
        self.generation += 1;
        debug!(
            generation = self.generation,
            entries = self.snapshot.len(),
            "entity cache replaced"
        );
    }

    /// Keeps the previous snapshot when loading fails.
    pub async fn refresh<S: EntityStore>(&mut self, store: &S) -> StoreResult<()> {
        match load_snapshot(store).await {
            Ok(snapshot) => {
                self.install(snapshot);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "entity cache refresh failed; keeping previous snapshot");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bounds, ZoneShape};

    fn snapshot() -> Snapshot {
        let point = |id: &str, kind| PointEntity {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: String::new(),
            location: Coordinate { latitude: 1.0, longitude: 2.0 },
            kind,
        };
        Snapshot {
            landmarks: vec![point("a", PointKind::Landmark)],
            services: vec![point("b", PointKind::Service)],
            zones: vec![ZoneEntity {
                id: "z".to_string(),
                name: "Zona".to_string(),
                description: String::new(),
                shape: ZoneShape::Rectangle(Bounds {
                    north: 2.0,
                    south: 0.0,
                    east: 2.0,
                    west: 0.0,
                }),
            }],
        }
    }

    #[test]
    fn all_is_tagged_in_collection_order() {
        let s = snapshot();
        let kinds: Vec<_> = s.all().iter().map(CacheEntry::kind).collect();
        assert_eq!(kinds, vec![EntityKind::Landmark, EntityKind::Service, EntityKind::Zone]);
        assert_eq!(s.all()[2].location_text(), "Lat: 1.0000, Lng: 1.0000");
    }

    #[test]
    fn install_keeps_old_handles_intact() {
        let mut cache = EntityCache::new();
        cache.install(snapshot());
        let before = cache.snapshot();
        cache.install(Snapshot::default());
        assert_eq!(before.len(), 3);
        assert!(cache.snapshot().is_empty());
        assert_eq!(cache.generation(), 2);
    }

    #[test]
    fn find_by_kind_and_id() {
        let s = snapshot();
        assert!(s.find(EntityKind::Service, "b").is_some());
        assert!(s.find(EntityKind::Landmark, "b").is_none());
    }
}
