use crate::coords::Vec2;
use crate::paint::Color;

use super::BrushStamp;

/// Most stamps a single pointer segment may produce.
///
/// Longer segments are covered by this many evenly spread stamps instead of
/// one per step.
pub const MAX_STAMPS_PER_SEGMENT: usize = 4096;

/// Turns pointer samples into evenly spaced brush stamps.
///
/// Spacing is a fraction of the radius. Distance left over at the end of one
/// segment carries into the next, so stamp density does not depend on how
/// often the pointer is sampled.
#[derive(Debug, Clone)]
pub struct Stroke {
    radius: f32,
    hardness: f32,
    color: Color,
    spacing: f32,
    last: Option<Vec2>,
    carry: f32,
}

impl Stroke {
    pub fn new(radius: f32, color: Color) -> Self {
        Self {
            radius: radius.max(0.5),
            hardness: 0.5,
            color,
            spacing: 0.25,
            last: None,
            carry: 0.0,
        }
    }

    /// Stamp spacing as a fraction of the radius, clamped to `[0.05, 4]`.
    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing.clamp(0.05, 4.0);
        self
    }

    pub fn with_hardness(mut self, hardness: f32) -> Self {
        self.hardness = hardness.clamp(0.0, 1.0);
        self
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.last.is_some()
    }

    /// Distance between consecutive stamps.
    #[inline]
    pub fn step(&self) -> f32 {
        (self.radius * self.spacing).max(0.5)
    }

    fn stamp(&self, at: Vec2) -> BrushStamp {
        BrushStamp::new(at, self.radius, self.color).with_hardness(self.hardness)
    }

    /// Starts a stroke with a stamp at `at`.
    pub fn begin(&mut self, at: Vec2, out: &mut Vec<BrushStamp>) {
        if !at.is_finite() {
            return;
        }
        out.push(self.stamp(at));
        self.last = Some(at);
        self.carry = 0.0;
    }

    /// Continues the stroke to `to`, pushing every stamp that falls on the way.
    ///
    /// Starts a new stroke if none is active.
    pub fn extend_to(&mut self, to: Vec2, out: &mut Vec<BrushStamp>) {
        let Some(from) = self.last else {
            self.begin(to, out);
            return;
        };
        if !to.is_finite() {
            return;
        }

        let delta = to - from;
        let dist = delta.length();
        if !dist.is_finite() {
            log::warn!("stroke segment length overflowed; restarting at {to:?}");
            self.begin(to, out);
            return;
        }
        if dist <= f32::EPSILON {
            return;
        }

        let dir = delta / dist;
        let step = self.step();
        let first = (step - self.carry).max(0.0);
        if first > dist {
            self.carry += dist;
            self.last = Some(to);
            return;
        }

        let span = (dist - first) / step;
        if span >= MAX_STAMPS_PER_SEGMENT as f32 {
            log::warn!(
                "stroke segment of {dist}px needs {span:.0} stamps; spreading {} instead",
                MAX_STAMPS_PER_SEGMENT
            );
            let gap = (dist - first) / (MAX_STAMPS_PER_SEGMENT - 1) as f32;
            out.reserve(MAX_STAMPS_PER_SEGMENT);
            for i in 0..MAX_STAMPS_PER_SEGMENT - 1 {
                out.push(self.stamp(from + dir * (first + gap * i as f32)));
            }
            out.push(self.stamp(to));
            self.carry = 0.0;
            self.last = Some(to);
            return;
        }

        // `span` is finite and below the cap here, so the cast is exact.
        let count = span.floor() as usize + 1;
        out.reserve(count);
        for i in 0..count {
            out.push(self.stamp(from + dir * (first + step * i as f32)));
        }
        let last_at = first + step * (count - 1) as f32;
        self.carry = (dist - last_at).max(0.0);
        self.last = Some(to);
    }

    /// Ends the stroke; the next sample starts a fresh one.
    pub fn end(&mut self) {
        self.last = None;
        self.carry = 0.0;
    }
}
