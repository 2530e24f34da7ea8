/// Per-frame counters for diagnostics overlays. Reset at the start of every render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub quads_rendered: u32,
    pub quads_skipped_void: u32,
    pub quads_culled: u32,
    pub texmap_hits: u32,
    pub art_fallbacks: u32,
    pub placeholder_fallbacks: u32,
    pub statics_rendered: u32,
    pub entities_rendered: u32,
    pub entities_without_animation: u32,
    pub sprites_culled: u32,
    pub sprite_draws: u32,
}

impl RenderStats {
    pub fn quads_considered(&self) -> u32 {
        self.quads_rendered + self.quads_skipped_void + self.quads_culled
    }

    /// Compact one-line form for window titles and logs.
    pub fn summary(&self) -> String {
        format!(
            "quads {} (void {}, culled {}) tex {} art {} ph {} | statics {} entities {}",
            self.quads_rendered,
            self.quads_skipped_void,
            self.quads_culled,
            self.texmap_hits,
            self.art_fallbacks,
            self.placeholder_fallbacks,
            self.statics_rendered,
            self.entities_rendered,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn considered_sums_all_quad_outcomes() {
        let stats = RenderStats {
            quads_rendered: 10,
            quads_skipped_void: 3,
            quads_culled: 2,
            ..RenderStats::default()
        };
        assert_eq!(stats.quads_considered(), 15);
        assert!(stats.summary().starts_with("quads 10 (void 3, culled 2)"));
    }
}
