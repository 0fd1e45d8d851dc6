use std::path::PathBuf;

use crate::config::DashboardConfig;
use crate::data::cache::{LayerCache, Memo};
use crate::data::frames::MapAnimation;
use crate::data::prediction::BruunAnalysis;
use crate::data::sources::{
    AnalysisModel, RegressionModel, Shared, analysis_model, bruun_analysis, map_animation, regression_model, share,
};

// ---------------------------------------------------------------------------
// Session state: the user's selections, threaded through every render call
// ---------------------------------------------------------------------------

/// Enlarged chart shown under the summary grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryPlot {
    NetChange,
    Rate,
    ErosionVsAccretion,
    MeanStd,
}

impl SummaryPlot {
    pub const ALL: [SummaryPlot; 4] = [
        SummaryPlot::NetChange,
        SummaryPlot::Rate,
        SummaryPlot::ErosionVsAccretion,
        SummaryPlot::MeanStd,
    ];

    pub fn button_label(self) -> &'static str {
        match self {
            SummaryPlot::NetChange => "📊 Net Change",
            SummaryPlot::Rate => "📈 Rate of Change",
            SummaryPlot::ErosionVsAccretion => "⚖ Erosion vs Accretion",
            SummaryPlot::MeanStd => "📉 Mean ± Std Dev",
        }
    }
}

/// Year-slider position and playback of one map.
#[derive(Debug, Clone, Default)]
pub struct AnimationState {
    /// Frame index; `None` shows the most recent year.
    pub frame: Option<usize>,
    pub playing: bool,
    /// Time of the last automatic step (egui input time, seconds).
    pub last_step: f64,
}

impl AnimationState {
    pub fn current(&self, n_frames: usize) -> Option<usize> {
        if n_frames == 0 {
            return None;
        }
        Some(self.frame.map_or(n_frames - 1, |f| f.min(n_frames - 1)))
    }

    /// Advance one frame once `interval` seconds have passed. Playback stops
    /// on the last frame. Returns true when the frame changed.
    pub fn tick(&mut self, now: f64, interval: f64, n_frames: usize) -> bool {
        if !self.playing || now - self.last_step < interval {
            return false;
        }
        self.last_step = now;
        let Some(current) = self.current(n_frames) else {
            self.playing = false;
            return false;
        };
        if current + 1 >= n_frames {
            self.playing = false;
            return false;
        }
        self.frame = Some(current + 1);
        if current + 2 >= n_frames {
            self.playing = false;
        }
        true
    }

    /// Start playing, rewinding to the first frame when already at the end.
    pub fn play(&mut self, now: f64, n_frames: usize) {
        if self.current(n_frames).is_some_and(|c| c + 1 >= n_frames) {
            self.frame = Some(0);
        }
        self.playing = true;
        self.last_step = now;
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Index into `analysis_methods`.
    pub analysis_method: usize,
    /// Index into `slr_scenarios`, for maps with a scenario selector.
    pub map_scenario: usize,
    /// Index into `slr_scenarios`, for the Bruun-rule prediction.
    pub prediction_scenario: usize,
    pub selected_plot: Option<SummaryPlot>,
    /// Selected transect name of the time-series panel.
    pub analysis_transect: Option<String>,
    /// Selected transect name of the regression panel.
    pub regression_transect: Option<String>,
    /// One per configured map source.
    pub maps: Vec<AnimationState>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PanelMemos {
    maps: Vec<Memo<Option<usize>, Shared<MapAnimation>>>,
    analysis: Memo<usize, Shared<AnalysisModel>>,
    bruun: Memo<usize, Shared<BruunAnalysis>>,
    regression: Memo<(), Shared<RegressionModel>>,
}

impl PanelMemos {
    fn new(n_maps: usize) -> Self {
        Self {
            maps: (0..n_maps).map(|_| Memo::new()).collect(),
            ..Default::default()
        }
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,
    pub session: SessionState,
    cache: LayerCache,
    memos: PanelMemos,
    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let n_maps = config.map_sources.len();
        Self {
            session: SessionState {
                maps: vec![AnimationState::default(); n_maps],
                ..Default::default()
            },
            memos: PanelMemos::new(n_maps),
            cache: LayerCache::new(),
            config,
            status_message: None,
        }
    }

    /// Drop every loaded file and computed model; panels reload on the next
    /// frame.
    pub fn reload(&mut self) {
        log::info!("Reloading data from {}", self.config.data_dir.display());
        self.cache.clear();
        self.memos = PanelMemos::new(self.config.map_sources.len());
        self.status_message = None;
    }

    pub fn set_data_dir(&mut self, dir: PathBuf) {
        self.config.data_dir = dir;
        self.reload();
        self.status_message = Some(format!("Data folder: {}", self.config.data_dir.display()));
    }

    // -- Panel models (memoized on the selection) --

    pub fn map(&mut self, index: usize) -> Option<Shared<MapAnimation>> {
        let source = self.config.map_sources.get(index)?;
        let scenario_index = source.scenario_select.then_some(self.session.map_scenario);
        let scenario = scenario_index.and_then(|i| self.config.slr_scenarios.get(i));
        let (config, cache) = (&self.config, &mut self.cache);
        let memo = self.memos.maps.get_mut(index)?;
        Some(
            memo.get_or_compute(scenario_index, || {
                share(&source.title, map_animation(config, cache, source, scenario))
            })
            .clone(),
        )
    }

    pub fn analysis(&mut self) -> Option<Shared<AnalysisModel>> {
        let index = self.session.analysis_method;
        let method = self.config.analysis_methods.get(index)?;
        let method_dir = method.method_dir.as_deref()?;
        let (config, cache) = (&self.config, &mut self.cache);
        Some(
            self.memos
                .analysis
                .get_or_compute(index, || {
                    share(&method.label, analysis_model(config, cache, method_dir, method.time_axis))
                })
                .clone(),
        )
    }

    pub fn bruun(&mut self) -> Option<Shared<BruunAnalysis>> {
        let index = self.session.prediction_scenario;
        let scenario = self.config.slr_scenarios.get(index)?;
        let (config, cache) = (&self.config, &mut self.cache);
        Some(
            self.memos
                .bruun
                .get_or_compute(index, || share("Bruun prediction", bruun_analysis(config, cache, scenario)))
                .clone(),
        )
    }

    pub fn regression(&mut self) -> Shared<RegressionModel> {
        let (config, cache) = (&self.config, &mut self.cache);
        self.memos
            .regression
            .get_or_compute((), || share("Regression prediction", regression_model(config, cache)))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_frame_is_most_recent() {
        let anim = AnimationState::default();
        assert_eq!(anim.current(0), None);
        assert_eq!(anim.current(5), Some(4));
    }

    #[test]
    fn playback_steps_once_per_interval_and_stops_at_end() {
        let mut anim = AnimationState::default();
        anim.play(10.0, 3);
        assert_eq!(anim.current(3), Some(0), "play from the end rewinds");

        assert!(!anim.tick(10.5, 1.0, 3));
        assert!(anim.tick(11.0, 1.0, 3));
        assert_eq!(anim.current(3), Some(1));
        assert!(anim.tick(12.0, 1.0, 3));
        assert_eq!(anim.current(3), Some(2));
        assert!(!anim.playing);
        assert!(!anim.tick(13.0, 1.0, 3));
    }

    #[test]
    fn memoized_error_survives_until_reload() {
        let mut config = DashboardConfig::default();
        config.data_dir = std::env::temp_dir().join(format!("shorecast-state-{}", std::process::id()));
        let mut state = AppState::new(config);

        let first = state.map(0).unwrap().unwrap_err();
        let second = state.map(0).unwrap().unwrap_err();
        assert!(std::sync::Arc::ptr_eq(&first, &second));

        state.reload();
        let third = state.map(0).unwrap().unwrap_err();
        assert!(!std::sync::Arc::ptr_eq(&first, &third));
        assert!(state.map(99).is_none());
    }

    #[test]
    fn methods_without_directory_have_no_model() {
        let mut state = AppState::new(DashboardConfig::default());
        state.session.analysis_method = 3;
        assert!(state.analysis().is_none());
    }
}
