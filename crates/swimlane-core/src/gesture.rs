//! Maps a released horizontal drag to a column transition.

use crate::Status;

/// End-state of a card drag, captured once at the release event.
///
/// Dragging that is cancelled before release (for example because the view
/// went away) never produces a `DragRelease`, so no partial transition can
/// leak out of an unfinished gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragRelease {
    /// Column the card was picked up from.
    pub origin: Status,
    /// Net horizontal displacement in points; positive is rightward.
    pub displacement: f32,
}

impl DragRelease {
    /// Classify this release against the configured threshold.
    #[must_use]
    pub fn classify(self, threshold: f32) -> Status {
        classify(self.origin, self.displacement, threshold)
    }
}

/// Decide the destination column for a released drag.
///
/// A displacement beyond `threshold` moves the card one column to the
/// right, beyond `-threshold` one column to the left; both directions
/// saturate at the board edges. Anything in between, including a NaN
/// displacement, leaves the card where it started. The result is never
/// more than one step away from `origin`.
///
/// `threshold` is expected to be positive; callers usually derive it from
/// the column width.
#[must_use]
pub fn classify(origin: Status, displacement: f32, threshold: f32) -> Status {
    if displacement > threshold {
        origin.advanced()
    } else if displacement < -threshold {
        origin.retreated()
    } else {
        origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f32 = 96.0;

    #[test]
    fn large_rightward_drag_advances_one_column() {
        assert_eq!(classify(Status::Todo, 500.0, THRESHOLD), Status::InProgress);
        assert_eq!(classify(Status::InProgress, 500.0, THRESHOLD), Status::Done);
    }

    #[test]
    fn large_leftward_drag_retreats_one_column() {
        assert_eq!(classify(Status::InProgress, -500.0, THRESHOLD), Status::Todo);
        assert_eq!(classify(Status::Done, -500.0, THRESHOLD), Status::InProgress);
    }

    #[test]
    fn drags_saturate_at_board_edges() {
        assert_eq!(classify(Status::Done, 500.0, THRESHOLD), Status::Done);
        assert_eq!(classify(Status::Todo, -500.0, THRESHOLD), Status::Todo);
    }

    #[test]
    fn sub_threshold_drag_is_a_no_op() {
        for origin in Status::ALL {
            assert_eq!(classify(origin, 0.0, THRESHOLD), origin);
            assert_eq!(classify(origin, THRESHOLD, THRESHOLD), origin);
            assert_eq!(classify(origin, -THRESHOLD, THRESHOLD), origin);
        }
    }

    #[test]
    fn destination_is_never_more_than_one_step_away() {
        let displacements = [-1e6_f32, -200.0, -1.0, 0.0, 1.0, 200.0, 1e6];
        for origin in Status::ALL {
            for displacement in displacements {
                let dest = classify(origin, displacement, THRESHOLD);
                let steps = (dest as i8 - origin as i8).abs();
                assert!(steps <= 1, "{origin:?} + {displacement} jumped to {dest:?}");
            }
        }
    }

    #[test]
    fn non_finite_displacements_are_classified_by_sign() {
        assert_eq!(classify(Status::Todo, f32::NAN, THRESHOLD), Status::Todo);
        assert_eq!(
            classify(Status::Done, f32::NEG_INFINITY, THRESHOLD),
            Status::InProgress
        );
        assert_eq!(classify(Status::Todo, f32::INFINITY, THRESHOLD), Status::InProgress);
    }

    #[test]
    fn release_struct_delegates_to_classify() {
        let release = DragRelease {
            origin: Status::Todo,
            displacement: 120.0,
        };
        assert_eq!(release.classify(THRESHOLD), Status::InProgress);
    }
}
