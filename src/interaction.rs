use crate::annotation::{BoundingBox, Point};
use crate::store::AnnotationStore;

// ── Pointer Gesture State ───────────────────────────────────────────────────

/// Pointer input on the drawing surface, already in surface-local
/// coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Press(Point),
    Move(Point),
    Release,
    /// The pointer left the drawing surface.
    Leave,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { start: Point, current: Point },
}

/// What a single pointer event did to the gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transition {
    Ignored,
    Started,
    Updated,
    Committed(BoundingBox),
    Cancelled,
}

impl Transition {
    /// Whether the overlay has to be repainted.
    pub fn needs_redraw(&self) -> bool {
        !matches!(self, Transition::Ignored)
    }
}

/// Converts an absolute pointer position into coordinates relative to the
/// surface origin.
pub fn to_surface(pos: (f32, f32), origin: (f32, f32)) -> Point {
    Point::new(pos.0 - origin.0, pos.1 - origin.1)
}

#[derive(Debug, Default)]
pub struct RectangleController {
    state: DragState,
}

impl RectangleController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// The box the current gesture would commit, if one is in progress.
    pub fn live_box(&self) -> Option<BoundingBox> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging { start, current } => {
                Some(BoundingBox::from_corners(start, current))
            }
        }
    }

    /// Advances the gesture without touching any store.
    pub fn step(&mut self, event: PointerEvent) -> Transition {
        match (self.state, event) {
            (_, PointerEvent::Press(at)) => {
                self.state = DragState::Dragging {
                    start: at,
                    current: at,
                };
                tracing::debug!(x = at.x, y = at.y, "drag started");
                Transition::Started
            }
            (DragState::Dragging { start, .. }, PointerEvent::Move(to)) => {
                self.state = DragState::Dragging { start, current: to };
                Transition::Updated
            }
            (DragState::Dragging { start, current }, PointerEvent::Release) => {
                self.state = DragState::Idle;
                Transition::Committed(BoundingBox::from_corners(start, current))
            }
            (DragState::Dragging { .. }, PointerEvent::Leave) => self.cancel(),
            (DragState::Idle, _) => Transition::Ignored,
        }
    }

    /// Advances the gesture and commits a finished box to `frame`.
    pub fn dispatch(
        &mut self,
        event: PointerEvent,
        frame: u32,
        store: &mut AnnotationStore,
    ) -> Transition {
        let transition = self.step(event);
        if let Transition::Committed(bbox) = transition {
            store.commit_box(frame, bbox);
        }
        transition
    }

    /// Drops any gesture in progress.
    pub fn cancel(&mut self) -> Transition {
        if self.is_dragging() {
            self.state = DragState::Idle;
            tracing::debug!("drag cancelled");
            Transition::Cancelled
        } else {
            Transition::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> AnnotationStore {
        AnnotationStore::new(Box::new(MemoryStorage::new()))
    }

    fn drag(ctrl: &mut RectangleController, store: &mut AnnotationStore, a: Point, b: Point) {
        ctrl.dispatch(PointerEvent::Press(a), 0, store);
        ctrl.dispatch(PointerEvent::Move(b), 0, store);
        ctrl.dispatch(PointerEvent::Release, 0, store);
    }

    #[test]
    fn drag_up_and_left_is_normalized() {
        let mut store = store();
        let mut ctrl = RectangleController::new();
        drag(&mut ctrl, &mut store, Point::new(50.0, 50.0), Point::new(10.0, 20.0));
        assert_eq!(store.get_boxes(0), &[BoundingBox::new(10.0, 20.0, 40.0, 30.0)]);
        assert_eq!(ctrl.state(), DragState::Idle);
    }

    #[test]
    fn all_four_directions_give_the_same_box() {
        let mut store = store();
        let mut ctrl = RectangleController::new();
        let center = Point::new(50.0, 50.0);
        for target in [
            Point::new(90.0, 90.0),
            Point::new(10.0, 90.0),
            Point::new(90.0, 10.0),
            Point::new(10.0, 10.0),
        ] {
            drag(&mut ctrl, &mut store, center, target);
        }
        let boxes = store.get_boxes(0);
        assert_eq!(boxes[0], BoundingBox::new(50.0, 50.0, 40.0, 40.0));
        assert_eq!(boxes[1], BoundingBox::new(10.0, 50.0, 40.0, 40.0));
        assert_eq!(boxes[2], BoundingBox::new(50.0, 10.0, 40.0, 40.0));
        assert_eq!(boxes[3], BoundingBox::new(10.0, 10.0, 40.0, 40.0));
    }

    #[test]
    fn release_without_movement_commits_empty_box() {
        let mut store = store();
        store.commit_box(3, BoundingBox::new(0.0, 0.0, 5.0, 5.0));
        store.commit_box(3, BoundingBox::new(5.0, 5.0, 5.0, 5.0));

        let mut ctrl = RectangleController::new();
        ctrl.dispatch(PointerEvent::Press(Point::new(100.0, 100.0)), 3, &mut store);
        let t = ctrl.dispatch(PointerEvent::Release, 3, &mut store);

        let empty = BoundingBox::new(100.0, 100.0, 0.0, 0.0);
        assert_eq!(t, Transition::Committed(empty));
        assert_eq!(store.get_boxes(3).len(), 3);
        assert_eq!(store.get_boxes(3)[2], empty);
    }

    #[test]
    fn leaving_the_surface_discards_the_gesture() {
        let mut store = store();
        let mut ctrl = RectangleController::new();
        ctrl.dispatch(PointerEvent::Press(Point::new(1.0, 1.0)), 0, &mut store);
        ctrl.dispatch(PointerEvent::Move(Point::new(30.0, 30.0)), 0, &mut store);
        assert!(ctrl.live_box().is_some());

        assert_eq!(ctrl.dispatch(PointerEvent::Leave, 0, &mut store), Transition::Cancelled);
        assert_eq!(ctrl.live_box(), None);
        assert_eq!(ctrl.dispatch(PointerEvent::Release, 0, &mut store), Transition::Ignored);
        assert!(store.get_boxes(0).is_empty());
    }

    #[test]
    fn moves_while_idle_are_ignored() {
        let mut ctrl = RectangleController::new();
        let t = ctrl.step(PointerEvent::Move(Point::new(4.0, 4.0)));
        assert_eq!(t, Transition::Ignored);
        assert!(!t.needs_redraw());
        assert_eq!(ctrl.state(), DragState::Idle);
        assert_eq!(ctrl.cancel(), Transition::Ignored);
    }

    #[test]
    fn live_box_follows_the_pointer() {
        let mut ctrl = RectangleController::new();
        ctrl.step(PointerEvent::Press(Point::new(20.0, 20.0)));
        assert_eq!(ctrl.live_box(), Some(BoundingBox::new(20.0, 20.0, 0.0, 0.0)));
        assert!(ctrl.step(PointerEvent::Move(Point::new(5.0, 35.0))).needs_redraw());
        assert_eq!(ctrl.live_box(), Some(BoundingBox::new(5.0, 20.0, 15.0, 15.0)));
    }

    #[test]
    fn surface_coordinates_subtract_the_origin() {
        assert_eq!(to_surface((130.0, 245.5), (30.0, 45.5)), Point::new(100.0, 200.0));
    }
}
