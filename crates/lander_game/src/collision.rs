//! Axis-aligned box overlap tests and the per-step collision report.
//!
//! Boxes are centre + half-extents. Two boxes overlap only when they
//! penetrate on both axes by more than `CONTACT_EPSILON`; boxes that merely
//! touch (the state right after a snap) do not count, so a player resting on
//! a block is not re-detected when the horizontal pass runs.

pub const CONTACT_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center_x: f32,
    pub center_y: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl Aabb {
    pub fn new(center_x: f32, center_y: f32, width: f32, height: f32) -> Self {
        Self {
            center_x,
            center_y,
            half_w: width * 0.5,
            half_h: height * 0.5,
        }
    }

    /// Signed gap along each axis; negative means the boxes interpenetrate
    /// on that axis by that much.
    pub fn gaps(&self, other: &Aabb) -> (f32, f32) {
        let gap_x = (self.center_x - other.center_x).abs() - (self.half_w + other.half_w);
        let gap_y = (self.center_y - other.center_y).abs() - (self.half_h + other.half_h);
        (gap_x, gap_y)
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        let (gap_x, gap_y) = self.gaps(other);
        gap_x < -CONTACT_EPSILON && gap_y < -CONTACT_EPSILON
    }

    #[allow(dead_code)]
    pub fn bottom(&self) -> f32 {
        self.center_y - self.half_h
    }

    #[allow(dead_code)]
    pub fn top(&self) -> f32 {
        self.center_y + self.half_h
    }
}

/// Outcome of one `Entity::update` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionResult {
    #[default]
    NoCollision,
    /// Index into the world slice of the last block hit this step. When both
    /// axes collide the horizontal hit is reported, since it resolves last.
    HitBlock(usize),
    /// The entity dropped below the playable area.
    FellOffMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_boxes_are_detected() {
        let a = Aabb::new(0.0, 0.0, 1.0, 1.0);
        let b = Aabb::new(0.5, 0.5, 1.0, 1.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn touching_boxes_do_not_overlap() {
        let a = Aabb::new(0.0, 0.0, 1.0, 1.0);
        let below = Aabb::new(0.0, -1.0, 1.0, 1.0);
        let beside = Aabb::new(1.0, 0.0, 1.0, 1.0);
        assert!(!a.overlaps(&below));
        assert!(!a.overlaps(&beside));
    }

    #[test]
    fn overlap_requires_both_axes() {
        let a = Aabb::new(0.0, 0.0, 1.0, 1.0);
        // Same row, far apart horizontally.
        let b = Aabb::new(3.0, 0.2, 1.0, 1.0);
        let (gap_x, gap_y) = a.gaps(&b);
        assert!(gap_x > 0.0);
        assert!(gap_y < 0.0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn edges_follow_half_extents() {
        let a = Aabb::new(1.0, 2.0, 4.0, 3.0);
        assert_eq!(a.bottom(), 0.5);
        assert_eq!(a.top(), 3.5);
    }

    #[test]
    fn default_result_is_no_collision() {
        assert_eq!(CollisionResult::default(), CollisionResult::NoCollision);
    }
}
