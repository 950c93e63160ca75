use tracing::trace;

use crate::model::Coordinate;

/// Raw pointer input as reported by the map surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RawPointerInput {
    Pressed { latitude: f64, longitude: f64 },
    Moved { latitude: f64, longitude: f64 },
    Released { latitude: f64, longitude: f64 },
    Clicked { latitude: f64, longitude: f64 },
    DoubleClicked { latitude: f64, longitude: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(Coordinate),
    Move(Coordinate),
    Up(Coordinate),
    Click(Coordinate),
    DoubleClick(Coordinate),
}

impl PointerEvent {
    pub fn position(self) -> Coordinate {
        match self {
            PointerEvent::Down(c)
            | PointerEvent::Move(c)
            | PointerEvent::Up(c)
            | PointerEvent::Click(c)
            | PointerEvent::DoubleClick(c) => c,
        }
    }
}

/// Stateless normalizer from surface input to typed pointer events.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeometryEventBus;

impl GeometryEventBus {
    /// Returns `None` for input outside the lat/lon domain.
    pub fn normalize(&self, raw: RawPointerInput) -> Option<PointerEvent> {
        let (latitude, longitude, make): (f64, f64, fn(Coordinate) -> PointerEvent) = match raw {
            RawPointerInput::Pressed { latitude, longitude } => (latitude, longitude, PointerEvent::Down),
            RawPointerInput::Moved { latitude, longitude } => (latitude, longitude, PointerEvent::Move),
            RawPointerInput::Released { latitude, longitude } => (latitude, longitude, PointerEvent::Up),
            RawPointerInput::Clicked { latitude, longitude } => (latitude, longitude, PointerEvent::Click),
            RawPointerInput::DoubleClicked { latitude, longitude } => {
                (latitude, longitude, PointerEvent::DoubleClick)
            }
        };
        match Coordinate::new(latitude, longitude) {
            Ok(c) => Some(make(c)),
            Err(_) => {
                trace!(?raw, "dropping pointer input outside the map domain");
                None
            }
        }
    }

    /// Normalizes a batch, preserving arrival order.
    pub fn drain<I>(self, raw: I) -> impl Iterator<Item = PointerEvent>
    where
        I: IntoIterator<Item = RawPointerInput>,
    {
        raw.into_iter().filter_map(move |r| self.normalize(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_each_kind() {
        let bus = GeometryEventBus;
        let c = Coordinate { latitude: 19.4, longitude: -99.1 };
        assert_eq!(
            bus.normalize(RawPointerInput::Pressed { latitude: 19.4, longitude: -99.1 }),
            Some(PointerEvent::Down(c))
        );
        assert_eq!(
            bus.normalize(RawPointerInput::DoubleClicked { latitude: 19.4, longitude: -99.1 }),
            Some(PointerEvent::DoubleClick(c))
        );
    }

    #[test]
    fn drops_out_of_range_input() {
        let bus = GeometryEventBus;
        assert_eq!(bus.normalize(RawPointerInput::Clicked { latitude: 91.0, longitude: 0.0 }), None);
        assert_eq!(
            bus.normalize(RawPointerInput::Moved { latitude: 0.0, longitude: f64::INFINITY }),
            None
        );
    }

    #[test]
    fn drain_keeps_arrival_order() {
        let bus = GeometryEventBus;
        let events: Vec<_> = bus
            .drain(vec![
                RawPointerInput::Pressed { latitude: 0.0, longitude: 0.0 },
                RawPointerInput::Moved { latitude: 200.0, longitude: 0.0 },
                RawPointerInput::Released { latitude: 1.0, longitude: 1.0 },
            ])
            .collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], PointerEvent::Down(_)));
        assert!(matches!(events[1], PointerEvent::Up(_)));
    }
}
