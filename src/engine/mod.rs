//! Drawing and location-matching engine.
//!
//! Pointer input flows `events` -> `session` -> `builders`; text and click
//! lookups go through `matcher` and `proximity` against the `cache` snapshot.

pub mod builders;
pub mod cache;
pub mod events;
pub mod forms;
pub mod matcher;
pub mod proximity;
pub mod session;

pub use builders::ShapeCandidate;
pub use cache::{CacheEntry, EntityCache, Snapshot};
pub use events::{GeometryEventBus, PointerEvent, RawPointerInput};
pub use forms::{FormOutput, FormSession, FormStep};
pub use matcher::{SearchFocus, SearchOptions};
pub use session::{
    DrawingSessionController, FinalizedShape, FocusRequest, FocusTarget, SessionMode, SessionOutcome,
    SurfaceObserver, Tool,
};
