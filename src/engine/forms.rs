use std::borrow::Cow;

use tracing::debug;

use super::cache::CacheEntry;
use crate::error::{EngineError, EngineResult};
use crate::model::{
    Coordinate, EntityId, EntityKind, EntityPatch, Named, NewPoint, NewZone, PointEntity, PointKind, ReviewDraft,
    ZoneShape,
};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Name,
    Description,
    Rating,
    Comment,
}

impl Field {
    pub fn key(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Description => "description",
            Field::Rating => "rating",
            Field::Comment => "comment",
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Description => "Description",
            Field::Rating => "Rating (1-5)",
            Field::Comment => "Comment",
        }
    }
}

const DETAIL_FIELDS: &[Field] = &[Field::Name, Field::Description];
const REVIEW_FIELDS: &[Field] = &[Field::Rating, Field::Comment];

/// What the collected answers turn into.
#[derive(Clone, Debug, PartialEq)]
pub enum FormPurpose {
    CreatePoint { kind: PointKind, location: Coordinate },
    CreateZone(ZoneShape),
    EditDetails { id: EntityId, kind: EntityKind },
    Review { target_id: EntityId, target_kind: PointKind, target_name: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormOutput {
    NewPoint { kind: PointKind, point: NewPoint },
    NewZone(NewZone),
    Patch { id: EntityId, kind: EntityKind, patch: EntityPatch },
    Review(ReviewDraft),
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormStep {
    Next(Field),
    Cancelled,
    Complete(FormOutput),
}

/// Asks one field at a time. Empty input at any field abandons the whole form.
#[derive(Clone, Debug)]
pub struct FormSession {
    purpose: FormPurpose,
    fields: &'static [Field],
    defaults: Vec<String>,
    answers: Vec<String>,
    finished: bool,
}

impl FormSession {
    fn new(purpose: FormPurpose, fields: &'static [Field], defaults: Vec<String>) -> Self {
        Self {
            purpose,
            fields,
            defaults,
            answers: Vec::with_capacity(fields.len()),
            finished: false,
        }
    }

    pub fn create_point(kind: PointKind, location: Coordinate) -> Self {
        Self::new(FormPurpose::CreatePoint { kind, location }, DETAIL_FIELDS, Vec::new())
    }

    pub fn create_zone(shape: ZoneShape) -> Self {
        Self::new(FormPurpose::CreateZone(shape), DETAIL_FIELDS, Vec::new())
    }

    /// Pre-fills the current name and description.
    pub fn edit(entry: CacheEntry<'_>) -> Self {
        Self::new(
            FormPurpose::EditDetails {
                id: entry.id().to_string(),
                kind: entry.kind(),
            },
            DETAIL_FIELDS,
            vec![entry.name().to_string(), entry.description().to_string()],
        )
    }

    pub fn review(target: &PointEntity) -> Self {
        Self::new(
            FormPurpose::Review {
                target_id: target.id.clone(),
                target_kind: target.kind,
                target_name: target.name.clone(),
            },
            REVIEW_FIELDS,
            Vec::new(),
        )
    }

    pub fn purpose(&self) -> &FormPurpose {
        &self.purpose
    }

    pub fn title(&self) -> Cow<'static, str> {
        match &self.purpose {
            FormPurpose::CreatePoint { kind, .. } => format!("New {}", kind.label().to_lowercase()).into(),
            FormPurpose::CreateZone(shape) => format!("New {} zone", shape.type_name()).into(),
            FormPurpose::EditDetails { kind, .. } => format!("Edit {}", kind.label().to_lowercase()).into(),
            FormPurpose::Review { target_name, .. } => format!("Review of {target_name}").into(),
        }
    }

    pub fn current(&self) -> Option<Field> {
        if self.finished {
            return None;
        }
        self.fields.get(self.answers.len()).copied()
    }

    /// Pre-filled text for the current field.
    pub fn default_value(&self) -> &str {
        self.defaults.get(self.answers.len()).map_or("", String::as_str)
    }

    /// Feeds the answer for the current field.
    ///
    /// An invalid rating is reported as `InvalidField` and the same field is
    /// asked again.
    pub fn submit(&mut self, input: &str) -> EngineResult<FormStep> {
        let Some(field) = self.current() else {
            return Err(EngineError::NotActive {
                expected: "an open form",
            });
        };
        let value = input.trim();
        if value.is_empty() {
            debug!(field = field.key(), "form cancelled");
            self.finished = true;
            return Ok(FormStep::Cancelled);
        }
        if field == Field::Rating {
            parse_rating(value)?;
        }
        self.answers.push(value.to_string());

        match self.current() {
            Some(next) => Ok(FormStep::Next(next)),
            None => {
                self.finished = true;
                Ok(FormStep::Complete(self.build()?))
            }
        }
    }

    pub fn cancel(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn answer(&self, field: Field) -> String {
        self.fields
            .iter()
            .position(|f| *f == field)
            .and_then(|i| self.answers.get(i))
            .cloned()
            .unwrap_or_default()
    }

    fn build(&self) -> EngineResult<FormOutput> {
        let output = match &self.purpose {
            FormPurpose::CreatePoint { kind, location } => FormOutput::NewPoint {
                kind: *kind,
                point: NewPoint {
                    name: self.answer(Field::Name),
                    description: self.answer(Field::Description),
                    location: *location,
                },
            },
            FormPurpose::CreateZone(shape) => FormOutput::NewZone(NewZone {
                name: self.answer(Field::Name),
                description: self.answer(Field::Description),
                shape: shape.clone(),
            }),
            FormPurpose::EditDetails { id, kind } => FormOutput::Patch {
                id: id.clone(),
                kind: *kind,
                patch: EntityPatch::details(self.answer(Field::Name), self.answer(Field::Description)),
            },
            FormPurpose::Review {
                target_id, target_kind, ..
            } => FormOutput::Review(ReviewDraft {
                target_entity_id: target_id.clone(),
                target_kind: *target_kind,
                rating: parse_rating(&self.answer(Field::Rating))?,
                comment: self.answer(Field::Comment),
            }),
        };
        Ok(output)
    }
}

pub fn parse_rating(input: &str) -> EngineResult<u8> {
    let invalid = || EngineError::InvalidField {
        field: "rating",
        reason: format!("expected a whole number from {MIN_RATING} to {MAX_RATING}, got {input:?}").into(),
    };
    let rating: u8 = input.trim().parse().map_err(|_| invalid())?;
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn museo() -> PointEntity {
        PointEntity {
            id: "p1".to_string(),
            name: "Museo".to_string(),
            description: "Arte".to_string(),
            location: Coordinate { latitude: 19.40, longitude: -99.13 },
            kind: PointKind::Landmark,
        }
    }

    #[test]
    fn point_form_collects_name_then_description() {
        let at = Coordinate { latitude: 19.40, longitude: -99.13 };
        let mut form = FormSession::create_point(PointKind::Landmark, at);
        assert_eq!(form.current(), Some(Field::Name));
        assert_eq!(form.submit(" Museo ").unwrap(), FormStep::Next(Field::Description));
        let FormStep::Complete(FormOutput::NewPoint { kind, point }) = form.submit("Arte").unwrap() else {
            panic!("expected a new point");
        };
        assert_eq!(kind, PointKind::Landmark);
        assert_eq!(point.name, "Museo");
        assert_eq!(point.location, at);
        assert!(form.is_finished());
    }

    #[test]
    fn empty_answer_cancels_at_any_field() {
        let mut form = FormSession::create_point(PointKind::Service, Coordinate::default());
        assert_eq!(form.submit("").unwrap(), FormStep::Cancelled);
        assert!(form.submit("late").is_err());

        let mut form = FormSession::create_point(PointKind::Service, Coordinate::default());
        form.submit("Taqueria").unwrap();
        assert_eq!(form.submit("   ").unwrap(), FormStep::Cancelled);
        assert_eq!(form.current(), None);
    }

    #[test]
    fn invalid_rating_asks_again() {
        let mut form = FormSession::review(&museo());
        for bad in ["0", "6", "tres", "4.5"] {
            let err = form.submit(bad).unwrap_err();
            assert!(matches!(err, EngineError::InvalidField { field: "rating", .. }));
            assert_eq!(form.current(), Some(Field::Rating));
        }
        assert_eq!(form.submit("4").unwrap(), FormStep::Next(Field::Comment));
        let FormStep::Complete(FormOutput::Review(draft)) = form.submit("Muy bonito").unwrap() else {
            panic!("expected a review");
        };
        assert_eq!(draft.rating, 4);
        assert_eq!(draft.target_entity_id, "p1");
        assert_eq!(draft.target_kind, PointKind::Landmark);
    }

    #[test]
    fn edit_form_prefills_current_values() {
        let entity = museo();
        let mut form = FormSession::edit(CacheEntry::Point(&entity));
        assert_eq!(form.default_value(), "Museo");
        form.submit("Museo Nacional").unwrap();
        assert_eq!(form.default_value(), "Arte");
        let FormStep::Complete(FormOutput::Patch { id, kind, patch }) = form.submit("Arte").unwrap() else {
            panic!("expected a patch");
        };
        assert_eq!(id, "p1");
        assert_eq!(kind, EntityKind::Landmark);
        assert_eq!(patch.name.as_deref(), Some("Museo Nacional"));
        assert_eq!(patch.location, None);
    }
}
