use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tracing::debug;

use super::cache::{CacheEntry, Snapshot};
use super::session::{FocusRequest, FocusTarget, SurfaceObserver};
use crate::model::{EntityId, Named};

/// Which rule picked the winner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    UniqueSubstring,
    Prefix,
    FirstSubstring,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NameMatch<'a, T> {
    pub entity: &'a T,
    pub kind: MatchKind,
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Resolves a free-text query to at most one entity.
///
/// Exact (case-insensitive, trimmed) name equality wins. With `allow_partial`,
/// substring matches are considered next: a single one wins outright, otherwise
/// the first whose name starts with the query, otherwise the first in order.
pub fn resolve<'a, T: Named>(query: &str, entities: &'a [T], allow_partial: bool) -> Option<NameMatch<'a, T>> {
    let needle = normalize(query);
    if needle.is_empty() {
        return None;
    }

    let lowered: Vec<String> = entities.iter().map(|e| e.name().to_lowercase()).collect();

    if let Some(i) = lowered.iter().position(|name| *name == needle) {
        return Some(NameMatch {
            entity: &entities[i],
            kind: MatchKind::Exact,
        });
    }
    if !allow_partial {
        return None;
    }

    let partial: Vec<usize> = lowered
        .iter()
        .enumerate()
        .filter(|(_, name)| name.contains(&needle))
        .map(|(i, _)| i)
        .collect();

    match partial.as_slice() {
        [] => None,
        [only] => Some(NameMatch {
            entity: &entities[*only],
            kind: MatchKind::UniqueSubstring,
        }),
        [first, ..] => {
            let (i, kind) = partial
                .iter()
                .find(|&&i| lowered[i].starts_with(&needle))
                .map_or((*first, MatchKind::FirstSubstring), |&i| (i, MatchKind::Prefix));
            Some(NameMatch {
                entity: &entities[i],
                kind,
            })
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub allow_partial: bool,
    /// Re-focus even if the match is the entity focused last.
    pub force: bool,
}

impl SearchOptions {
    /// Search-as-you-type.
    pub const TYPING: Self = Self {
        allow_partial: false,
        force: false,
    };

    /// Explicit submit (Enter).
    pub const SUBMIT: Self = Self {
        allow_partial: true,
        force: true,
    };
}

/// Turns search input into focus requests, suppressing repeats.
#[derive(Clone, Debug, Default)]
pub struct SearchFocus {
    last_focused: Option<EntityId>,
}

impl SearchFocus {
    pub fn last_focused(&self) -> Option<&str> {
        self.last_focused.as_deref()
    }

    /// Called after every cache replacement.
    pub fn reset(&mut self) {
        self.last_focused = None;
    }

    pub fn focus_by_name(
        &mut self,
        query: &str,
        snapshot: &Snapshot,
        options: SearchOptions,
        observer: &mut impl SurfaceObserver,
    ) -> Option<FocusRequest> {
        if normalize(query).is_empty() {
            self.last_focused = None;
            return None;
        }
        let entries = snapshot.all();
        let found = resolve(query, &entries, options.allow_partial)?;
        if !options.force && self.last_focused.as_deref() == Some(found.entity.id()) {
            return None;
        }
        debug!(query, kind = ?found.kind, id = found.entity.id(), "search matched");
        self.focus_entry(*found.entity, observer)
    }

    pub fn focus_entry(&mut self, entry: CacheEntry<'_>, observer: &mut impl SurfaceObserver) -> Option<FocusRequest> {
        let target = match entry {
            CacheEntry::Point(p) => FocusTarget::Point(p.location),
            CacheEntry::Zone(z) => FocusTarget::Bounds(z.shape.bounds()?),
        };
        let request = FocusRequest {
            entity_id: entry.id().to_string(),
            kind: entry.kind(),
            target,
        };
        observer.focus_requested(&request);
        self.last_focused = Some(request.entity_id.clone());
        Some(request)
    }
}

/// Sidebar filter: case-insensitive substring over the row text.
pub fn filter_entries<'a>(query: &str, entries: &[CacheEntry<'a>]) -> Vec<CacheEntry<'a>> {
    let needle = query.to_lowercase();
    entries
        .iter()
        .filter(|e| {
            let row = format!(
                "{}{}{}{}",
                e.name(),
                e.description(),
                e.kind().label(),
                e.location_text()
            );
            row.to_lowercase().contains(&needle)
        })
        .copied()
        .collect()
}

/// Fuzzy-ranked names for the search dropdown, best first.
pub fn suggest<'a>(query: &str, entries: &[CacheEntry<'a>], limit: usize) -> Vec<CacheEntry<'a>> {
    let needle = query.trim();
    if needle.is_empty() {
        return Vec::new();
    }
    let matcher = SkimMatcherV2::default().ignore_case();
    let mut scored: Vec<(i64, usize)> = entries
        .iter()
        .enumerate()
        .filter_map(|(i, e)| matcher.fuzzy_match(e.name(), needle).map(|score| (score, i)))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().take(limit).map(|(_, i)| entries[i]).collect()
}
