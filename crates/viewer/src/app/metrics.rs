use std::time::{Duration, Instant};

use compositor::{RenderStats, SkipReason};

/// Where terrain quads found their texture over an interval, as fractions of drawn quads.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct TextureMix {
    pub(crate) texmap: f32,
    pub(crate) art: f32,
    pub(crate) placeholder: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SkipCounts {
    pub(crate) map_not_loaded: u32,
    pub(crate) empty_viewport: u32,
    pub(crate) frame_buffer_unavailable: u32,
}

impl SkipCounts {
    pub(crate) fn total(&self) -> u32 {
        self.map_not_loaded + self.empty_viewport + self.frame_buffer_unavailable
    }

    fn record(&mut self, reason: SkipReason) {
        let slot = match reason {
            SkipReason::MapNotLoaded => &mut self.map_not_loaded,
            SkipReason::EmptyViewport => &mut self.empty_viewport,
            SkipReason::FrameBufferUnavailable => &mut self.frame_buffer_unavailable,
        };
        *slot = slot.saturating_add(1);
    }
}

/// One log interval of loop timing and compositor output.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct IntervalReport {
    pub(crate) fps: f32,
    pub(crate) tps: f32,
    pub(crate) frame_time_ms: f32,
    pub(crate) drawn_frames: u32,
    pub(crate) skipped: SkipCounts,
    pub(crate) avg_quads_rendered: f32,
    pub(crate) avg_entities_rendered: f32,
    pub(crate) peak_sprite_draws: u32,
    pub(crate) texture_mix: TextureMix,
    pub(crate) latest: RenderStats,
}

#[derive(Debug, Default)]
struct StatsTotals {
    quads_rendered: u64,
    entities_rendered: u64,
    texmap_hits: u64,
    art_fallbacks: u64,
    placeholder_fallbacks: u64,
    peak_sprite_draws: u32,
}

impl StatsTotals {
    fn add(&mut self, stats: &RenderStats) {
        self.quads_rendered += u64::from(stats.quads_rendered);
        self.entities_rendered += u64::from(stats.entities_rendered);
        self.texmap_hits += u64::from(stats.texmap_hits);
        self.art_fallbacks += u64::from(stats.art_fallbacks);
        self.placeholder_fallbacks += u64::from(stats.placeholder_fallbacks);
        self.peak_sprite_draws = self.peak_sprite_draws.max(stats.sprite_draws);
    }

    fn texture_mix(&self) -> TextureMix {
        let resolved = self.texmap_hits + self.art_fallbacks + self.placeholder_fallbacks;
        if resolved == 0 {
            return TextureMix::default();
        }
        let share = |count: u64| count as f32 / resolved as f32;
        TextureMix {
            texmap: share(self.texmap_hits),
            art: share(self.art_fallbacks),
            placeholder: share(self.placeholder_fallbacks),
        }
    }
}

/// Collects frame outcomes between log intervals.
#[derive(Debug)]
pub(crate) struct RenderMetrics {
    interval_start: Instant,
    interval: Duration,
    frames: u32,
    ticks: u32,
    frame_time_sum: Duration,
    drawn_frames: u32,
    skipped: SkipCounts,
    totals: StatsTotals,
    latest: RenderStats,
}

impl RenderMetrics {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval_start: Instant::now(),
            interval,
            frames: 0,
            ticks: 0,
            frame_time_sum: Duration::ZERO,
            drawn_frames: 0,
            skipped: SkipCounts::default(),
            totals: StatsTotals::default(),
            latest: RenderStats::default(),
        }
    }

    pub(crate) fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    pub(crate) fn record_drawn(&mut self, frame_dt: Duration, stats: RenderStats) {
        self.record_frame_time(frame_dt);
        self.drawn_frames = self.drawn_frames.saturating_add(1);
        self.totals.add(&stats);
        self.latest = stats;
    }

    pub(crate) fn record_skipped(&mut self, frame_dt: Duration, reason: SkipReason) {
        self.record_frame_time(frame_dt);
        self.skipped.record(reason);
    }

    fn record_frame_time(&mut self, frame_dt: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
    }

    pub(crate) fn maybe_report(&mut self, now: Instant) -> Option<IntervalReport> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let per_frame = |total: Duration| {
            if self.frames == 0 {
                0.0
            } else {
                total.as_secs_f32() * 1000.0 / self.frames as f32
            }
        };
        let per_drawn = |total: u64| {
            if self.drawn_frames == 0 {
                0.0
            } else {
                total as f32 / self.drawn_frames as f32
            }
        };

        let report = IntervalReport {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
            frame_time_ms: per_frame(self.frame_time_sum),
            drawn_frames: self.drawn_frames,
            skipped: self.skipped,
            avg_quads_rendered: per_drawn(self.totals.quads_rendered),
            avg_entities_rendered: per_drawn(self.totals.entities_rendered),
            peak_sprite_draws: self.totals.peak_sprite_draws,
            texture_mix: self.totals.texture_mix(),
            latest: self.latest,
        };

        // `latest` survives the reset.
        self.interval_start = now;
        self.frames = 0;
        self.ticks = 0;
        self.frame_time_sum = Duration::ZERO;
        self.drawn_frames = 0;
        self.skipped = SkipCounts::default();
        self.totals = StatsTotals::default();

        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(quads: u32, texmap: u32, art: u32, placeholder: u32) -> RenderStats {
        RenderStats {
            quads_rendered: quads,
            texmap_hits: texmap,
            art_fallbacks: art,
            placeholder_fallbacks: placeholder,
            entities_rendered: 4,
            sprite_draws: quads / 2,
            ..RenderStats::default()
        }
    }

    #[test]
    fn report_averages_drawn_frames_and_counts_skips_by_reason() {
        let mut metrics = RenderMetrics::new(Duration::from_secs(1));
        let base = metrics.interval_start;

        metrics.record_drawn(Duration::from_millis(16), stats(100, 50, 30, 20));
        metrics.record_drawn(Duration::from_millis(16), stats(60, 30, 10, 20));
        metrics.record_skipped(Duration::from_millis(16), SkipReason::MapNotLoaded);
        metrics.record_skipped(Duration::from_millis(16), SkipReason::EmptyViewport);
        for _ in 0..4 {
            metrics.record_tick();
        }

        let report = metrics
            .maybe_report(base + Duration::from_secs(1))
            .expect("report");
        assert!((report.fps - 4.0).abs() < 0.05);
        assert!((report.tps - 4.0).abs() < 0.05);
        assert!((report.frame_time_ms - 16.0).abs() < 0.001);
        assert_eq!(report.drawn_frames, 2);
        assert_eq!(report.skipped.map_not_loaded, 1);
        assert_eq!(report.skipped.empty_viewport, 1);
        assert_eq!(report.skipped.total(), 2);
        assert!((report.avg_quads_rendered - 80.0).abs() < 0.001);
        assert!((report.avg_entities_rendered - 4.0).abs() < 0.001);
        assert_eq!(report.peak_sprite_draws, 50);
        assert_eq!(report.latest.quads_rendered, 60);
    }

    #[test]
    fn texture_mix_splits_resolved_quads_by_source() {
        let mut metrics = RenderMetrics::new(Duration::from_millis(100));
        let base = metrics.interval_start;
        metrics.record_drawn(Duration::from_millis(10), stats(8, 4, 2, 2));
        metrics.record_drawn(Duration::from_millis(10), stats(8, 4, 2, 2));

        let mix = metrics
            .maybe_report(base + Duration::from_millis(100))
            .expect("report")
            .texture_mix;
        assert!((mix.texmap - 0.5).abs() < 0.001);
        assert!((mix.art - 0.25).abs() < 0.001);
        assert!((mix.placeholder - 0.25).abs() < 0.001);
    }

    #[test]
    fn only_skipped_frames_report_zero_averages() {
        let mut metrics = RenderMetrics::new(Duration::from_millis(100));
        let base = metrics.interval_start;
        metrics.record_skipped(Duration::from_millis(10), SkipReason::MapNotLoaded);

        let report = metrics
            .maybe_report(base + Duration::from_millis(100))
            .expect("report");
        assert_eq!(report.drawn_frames, 0);
        assert_eq!(report.avg_quads_rendered, 0.0);
        assert_eq!(report.texture_mix, TextureMix::default());
    }

    #[test]
    fn interval_resets_counters_but_keeps_latest_stats() {
        let mut metrics = RenderMetrics::new(Duration::from_millis(100));
        let base = metrics.interval_start;
        metrics.record_drawn(Duration::from_millis(10), stats(12, 12, 0, 0));
        assert!(metrics
            .maybe_report(base + Duration::from_millis(50))
            .is_none());
        metrics.maybe_report(base + Duration::from_millis(100));

        let next = metrics
            .maybe_report(base + Duration::from_millis(200))
            .expect("second report");
        assert_eq!(next.fps, 0.0);
        assert_eq!(next.drawn_frames, 0);
        assert_eq!(next.skipped.total(), 0);
        assert_eq!(next.latest.quads_rendered, 12);
    }
}
