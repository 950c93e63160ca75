use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{EngineError, EngineResult};

pub type EntityId = String;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> EngineResult<Self> {
        let c = Self { latitude, longitude };
        if c.is_valid() {
            Ok(c)
        } else {
            Err(EngineError::InvalidCoordinate { latitude, longitude })
        }
    }

    pub fn is_valid(self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Axis-aligned lat/lon box.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    pub fn from_corners(a: Coordinate, b: Coordinate) -> Self {
        Self {
            north: a.latitude.max(b.latitude),
            south: a.latitude.min(b.latitude),
            east: a.longitude.max(b.longitude),
            west: a.longitude.min(b.longitude),
        }
    }

    pub fn from_points(points: &[Coordinate]) -> Option<Self> {
        let mut it = points.iter();
        let first = *it.next()?;
        let mut bounds = Self::from_corners(first, first);
        for p in it {
            bounds.north = bounds.north.max(p.latitude);
            bounds.south = bounds.south.min(p.latitude);
            bounds.east = bounds.east.max(p.longitude);
            bounds.west = bounds.west.min(p.longitude);
        }
        Some(bounds)
    }

    /// `|Δlat| × |Δlon|` in square degrees.
    pub fn area(self) -> f64 {
        (self.north - self.south).abs() * (self.east - self.west).abs()
    }

    pub fn center(self) -> Coordinate {
        Coordinate {
            latitude: (self.north + self.south) * 0.5,
            longitude: (self.east + self.west) * 0.5,
        }
    }

    pub fn is_valid(self) -> bool {
        self.north > self.south && self.east > self.west
    }

    pub fn contains(self, c: Coordinate) -> bool {
        (self.south..=self.north).contains(&c.latitude) && (self.west..=self.east).contains(&c.longitude)
    }
}

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PointKind {
    Landmark,
    Service,
}

impl PointKind {
    pub fn label(self) -> &'static str {
        match self {
            PointKind::Landmark => "Landmark",
            PointKind::Service => "Service",
        }
    }
}

/// Origin collection of a stored record.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Landmark,
    Service,
    Zone,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Landmark => "Landmark",
            EntityKind::Service => "Service",
            EntityKind::Zone => "Zone",
        }
    }
}

impl From<PointKind> for EntityKind {
    fn from(kind: PointKind) -> Self {
        match kind {
            PointKind::Landmark => EntityKind::Landmark,
            PointKind::Service => EntityKind::Service,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PointEntity {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub location: Coordinate,
    pub kind: PointKind,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZoneShape {
    Polygon { vertices: Vec<Coordinate> },
    Rectangle(Bounds),
}

impl ZoneShape {
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            ZoneShape::Polygon { vertices } => Bounds::from_points(vertices),
            ZoneShape::Rectangle(bounds) => Some(*bounds),
        }
    }

    pub fn center(&self) -> Option<Coordinate> {
        self.bounds().map(Bounds::center)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ZoneShape::Polygon { .. } => "polygon",
            ZoneShape::Rectangle(_) => "rectangle",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ZoneEntity {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub shape: ZoneShape,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewPoint {
    pub name: String,
    pub description: String,
    pub location: Coordinate,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewZone {
    pub name: String,
    pub description: String,
    pub shape: ZoneShape,
}

/// Partial update; `None` fields are left untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EntityPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinate>,
}

impl EntityPatch {
    pub fn details(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: Some(description.into()),
            location: None,
        }
    }

    pub fn location(location: Coordinate) -> Self {
        Self {
            location: Some(location),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewDraft {
    pub target_entity_id: EntityId,
    pub target_kind: PointKind,
    pub rating: u8,
    pub comment: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: EntityId,
    pub user_id: String,
    pub target_entity_id: EntityId,
    pub target_kind: PointKind,
    pub rating: u8,
    pub comment: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Anything addressable by id and display name.
pub trait Named {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

impl Named for PointEntity {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for ZoneEntity {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
