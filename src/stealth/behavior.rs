//! Human-like interaction primitives
//!
//! Browser-automated adapters pace themselves with these instead of firing
//! requests back to back: randomized delays, smoothed pointer paths, and
//! incremental scrolling.

use crate::config::StealthSettings;
use rand::Rng;
use std::time::Duration;

/// A point on the page, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Inter-action pacing configuration
#[derive(Debug, Clone)]
pub struct BehaviorConfig {
    min_delay: Duration,
    max_delay: Duration,
}

impl BehaviorConfig {
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay: max_delay.max(min_delay),
        }
    }

    pub fn from_settings(settings: &StealthSettings) -> Self {
        Self::new(
            Duration::from_millis(settings.min_delay_ms),
            Duration::from_millis(settings.max_delay_ms),
        )
    }

    /// Draw a randomized inter-action delay from the configured range
    pub fn action_delay(&self) -> Duration {
        if self.min_delay == self.max_delay {
            return self.min_delay;
        }
        let mut rng = rand::thread_rng();
        let millis = rng.gen_range(self.min_delay.as_millis()..=self.max_delay.as_millis());
        Duration::from_millis(millis as u64)
    }

    /// Sleep for one randomized inter-action delay
    pub async fn pause(&self) {
        tokio::time::sleep(self.action_delay()).await;
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self::new(Duration::from_millis(250), Duration::from_millis(1800))
    }
}

/// Pointer movement along a smoothed quadratic curve with per-step jitter.
///
/// The path starts at `from`, ends exactly at `to`, and bows through a
/// randomly displaced control point so no two traversals look alike.
pub fn pointer_path(from: Point, to: Point, steps: usize) -> Vec<Point> {
    let steps = steps.max(2);
    let mut rng = rand::thread_rng();

    // Displace the control point off the straight line
    let mid_x = (from.x + to.x) / 2.0;
    let mid_y = (from.y + to.y) / 2.0;
    let spread = ((to.x - from.x).abs() + (to.y - from.y).abs()).max(40.0) / 4.0;
    let control = Point::new(
        mid_x + rng.gen_range(-spread..spread),
        mid_y + rng.gen_range(-spread..spread),
    );

    let mut path = Vec::with_capacity(steps);
    for i in 0..steps {
        let t = i as f64 / (steps - 1) as f64;
        let inv = 1.0 - t;

        // quadratic Bezier
        let mut x = inv * inv * from.x + 2.0 * inv * t * control.x + t * t * to.x;
        let mut y = inv * inv * from.y + 2.0 * inv * t * control.y + t * t * to.y;

        // small jitter everywhere except the endpoints
        if i != 0 && i != steps - 1 {
            x += rng.gen_range(-2.0..2.0);
            y += rng.gen_range(-2.0..2.0);
        }

        path.push(Point::new(x, y));
    }

    path
}

/// Split a scroll distance into several human-sized increments that sum to
/// the requested total, rather than one jump.
pub fn scroll_plan(total_px: u32, max_step_px: u32) -> Vec<u32> {
    if total_px == 0 {
        return Vec::new();
    }
    let max_step = max_step_px.max(1);
    let min_step = (max_step / 3).max(1);

    let mut rng = rand::thread_rng();
    let mut plan = Vec::new();
    let mut remaining = total_px;

    while remaining > 0 {
        let step = rng.gen_range(min_step..=max_step).min(remaining);
        plan.push(step);
        remaining -= step;
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_within_range() {
        let config = BehaviorConfig::new(Duration::from_millis(100), Duration::from_millis(200));
        for _ in 0..50 {
            let delay = config.action_delay();
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(200));
        }
    }

    #[test]
    fn test_degenerate_range() {
        let config = BehaviorConfig::new(Duration::from_millis(100), Duration::from_millis(100));
        assert_eq!(config.action_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_pointer_path_endpoints() {
        let from = Point::new(10.0, 10.0);
        let to = Point::new(600.0, 420.0);
        let path = pointer_path(from, to, 25);

        assert_eq!(path.len(), 25);
        assert_eq!(path[0], from);
        assert_eq!(*path.last().unwrap(), to);
    }

    #[test]
    fn test_pointer_paths_vary() {
        let from = Point::new(0.0, 0.0);
        let to = Point::new(500.0, 300.0);
        let a = pointer_path(from, to, 20);
        let b = pointer_path(from, to, 20);

        // Midpoints should differ thanks to the jittered control point
        let same = a
            .iter()
            .zip(b.iter())
            .all(|(p, q)| (p.x - q.x).abs() < f64::EPSILON && (p.y - q.y).abs() < f64::EPSILON);
        assert!(!same);
    }

    #[test]
    fn test_scroll_plan_sums_to_total() {
        for total in [1u32, 180, 777, 3000] {
            let plan = scroll_plan(total, 200);
            assert_eq!(plan.iter().sum::<u32>(), total);
            assert!(plan.iter().all(|&step| step > 0 && step <= 200));
        }
    }

    #[test]
    fn test_scroll_plan_many_increments() {
        let plan = scroll_plan(3000, 200);
        assert!(plan.len() > 5, "expected several increments, got {:?}", plan);
    }

    #[test]
    fn test_scroll_plan_zero() {
        assert!(scroll_plan(0, 200).is_empty());
    }
}
