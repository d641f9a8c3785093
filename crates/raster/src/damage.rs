//! Damage bookkeeping for a display surface.
//!
//! Records which window regions changed between two publishes so a display
//! backend can present only those regions. Rects are clamped to the surface
//! bounds and coalesced; once the list grows past a small cap the best pair is
//! merged.

use crate::geometry::{Rect, Size};
use core::mem;

/// Default number of disjoint rects kept before coalescing.
const DEFAULT_MAX_RECTS: usize = 8;

/// Accumulates damaged regions of a fixed-size surface.
#[derive(Debug, Clone)]
pub struct DamageTracker {
    /// Disjoint-ish damaged regions, in surface coordinates.
    rects: Vec<Rect>,
    /// Surface bounds every rect is clamped to.
    bounds: Size,
    /// Coalescing threshold.
    max_rects: usize,
}

impl DamageTracker {
    /// Create a tracker for a surface of `bounds`.
    #[inline]
    #[must_use]
    pub const fn new(bounds: Size) -> Self {
        Self {
            rects: Vec::new(),
            bounds,
            max_rects: DEFAULT_MAX_RECTS,
        }
    }

    /// Override the coalescing threshold. Values below one are raised to one.
    #[inline]
    #[must_use]
    pub fn with_max_rects(mut self, max_rects: usize) -> Self {
        self.max_rects = max_rects.max(1);
        self
    }

    /// Mark the whole surface as damaged.
    pub fn damage_all(&mut self) {
        self.rects.clear();
        if !self.bounds.is_empty() {
            self.rects.push(Rect::from_size(self.bounds));
        }
    }

    /// Record a damaged region. Parts outside the surface are dropped.
    pub fn damage(&mut self, rect: Rect) {
        let clamped = rect.intersect(Rect::from_size(self.bounds));
        if clamped.is_empty() {
            return;
        }
        if let Some(existing) = self.rects.iter_mut().find(|existing| existing.intersects(clamped)) {
            *existing = existing.union(clamped);
        } else {
            self.rects.push(clamped);
        }
        while self.rects.len() > self.max_rects {
            self.merge_best_pair();
        }
    }

    /// Currently damaged regions.
    #[inline]
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// True when nothing has been damaged since the last take.
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rects.is_empty()
    }

    /// True when a single rect covers the whole surface.
    #[inline]
    #[must_use]
    pub fn is_fully_damaged(&self) -> bool {
        matches!(self.rects.as_slice(), [only] if *only == Rect::from_size(self.bounds))
    }

    /// Union of every damaged region.
    #[inline]
    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        self.rects
            .iter()
            .fold(Rect::EMPTY, |acc, rect| acc.union(*rect))
    }

    /// Drain the damaged regions, leaving the tracker clean.
    #[inline]
    pub fn take(&mut self) -> Vec<Rect> {
        mem::take(&mut self.rects)
    }

    /// Change the surface bounds and damage all of it.
    pub fn resize(&mut self, bounds: Size) {
        self.bounds = bounds;
        self.damage_all();
    }

    /// Merge the pair with the most overlap, or the two smallest rects when
    /// none overlap.
    fn merge_best_pair(&mut self) {
        if self.rects.len() < 2 {
            return;
        }
        let (first, second) = self.best_overlap_pair().unwrap_or_else(|| self.smallest_pair());
        let merged = self.rects[first].union(self.rects[second]);
        self.rects.swap_remove(second);
        self.rects[first] = merged;
    }

    /// Indices of the most-overlapping pair, `first < second`.
    fn best_overlap_pair(&self) -> Option<(usize, usize)> {
        let mut best: Option<(u64, usize, usize)> = None;
        for (first_idx, first) in self.rects.iter().enumerate() {
            for (offset, second) in self.rects[first_idx + 1..].iter().enumerate() {
                let overlap = first.intersect(*second).area();
                if overlap > 0 && best.is_none_or(|(area, _, _)| overlap > area) {
                    best = Some((overlap, first_idx, first_idx + 1 + offset));
                }
            }
        }
        best.map(|(_, first_idx, second_idx)| (first_idx, second_idx))
    }

    /// Indices of the two smallest rects, `first < second`.
    fn smallest_pair(&self) -> (usize, usize) {
        let mut by_area: Vec<(usize, u64)> = self
            .rects
            .iter()
            .enumerate()
            .map(|(idx, rect)| (idx, rect.area()))
            .collect();
        by_area.sort_by_key(|entry| entry.1);
        let (lhs, rhs) = (by_area[0].0, by_area[1].0);
        (lhs.min(rhs), lhs.max(rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that damaging everything reports a full damage.
    ///
    /// # Panics
    /// Panics if the tracker is not fully damaged after `damage_all`.
    #[test]
    fn damage_all_covers_bounds() {
        let mut tracker = DamageTracker::new(Size::new(320, 200));
        tracker.damage_all();
        assert!(tracker.is_fully_damaged());
        assert_eq!(tracker.bounding_rect(), Rect::new(0, 0, 320, 200));
    }

    /// Test that intersecting regions collapse into their union.
    ///
    /// # Panics
    /// Panics if the two regions are not merged.
    #[test]
    fn overlapping_regions_merge() {
        let mut tracker = DamageTracker::new(Size::new(800, 600));
        tracker.damage(Rect::new(0, 0, 100, 100));
        tracker.damage(Rect::new(50, 50, 100, 100));
        assert_eq!(tracker.rects(), &[Rect::new(0, 0, 150, 150)]);
    }

    /// Test that regions are clamped to the surface and offscreen ones dropped.
    ///
    /// # Panics
    /// Panics if a region escapes the surface bounds.
    #[test]
    fn regions_are_clamped() {
        let mut tracker = DamageTracker::new(Size::new(100, 100));
        tracker.damage(Rect::new(-20, 90, 50, 50));
        tracker.damage(Rect::new(200, 200, 10, 10));
        assert_eq!(tracker.rects(), &[Rect::new(0, 90, 30, 10)]);
    }

    /// Test that the rect count never exceeds the cap.
    ///
    /// # Panics
    /// Panics if disjoint regions are not coalesced.
    #[test]
    fn disjoint_regions_coalesce_past_cap() {
        let mut tracker = DamageTracker::new(Size::new(1000, 10)).with_max_rects(3);
        for step in 0..6 {
            tracker.damage(Rect::new(step * 100, 0, 10, 10));
        }
        assert!(tracker.rects().len() <= 3);
        assert_eq!(tracker.bounding_rect(), Rect::new(0, 0, 510, 10));
    }

    /// Test that taking the damage leaves the tracker clean.
    ///
    /// # Panics
    /// Panics if damage survives a take.
    #[test]
    fn take_clears() {
        let mut tracker = DamageTracker::new(Size::new(10, 10));
        tracker.damage(Rect::new(1, 1, 2, 2));
        assert_eq!(tracker.take().len(), 1);
        assert!(tracker.is_clean());
    }
}
