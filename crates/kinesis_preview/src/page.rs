// SPDX-License-Identifier: MIT OR Apache-2.0
//! Simulated landing page wired to the motion primitives.

use kinesis_motion::host::{Axis, Document, Rect, Scheduler, Size};
use kinesis_motion::{
    word_windows, AutoplaySequencer, Counter, DerivedValue, IndexChange, IntervalProgress, KeyframeValue,
    MotionConfig, PointerProgress, RangeMapper, Result, ScrollOffset, ScrollProgress, ScrollWatcher,
    SequencerState, SpringFollower, StaggeredReveal, Subscription,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

const HERO_SLIDES: usize = 4;
const ABOUT_TEXT: &str = "We design motion that follows the reader down the page";
const STATS: [(f32, &str); 4] = [(120.0, "+"), (15_000.0, "+"), (2_500_000.0, ""), (98.0, "%")];
const FEATURES: usize = 6;

/// What the page would render at one instant
#[derive(Debug, Serialize)]
pub struct FrameSnapshot {
    /// Scheduler clock
    pub time_ms: u128,
    /// Vertical scroll offset
    pub scroll_y: f32,
    /// Active hero slide
    pub hero_slide: Option<usize>,
    /// Slide progress bar, 0 while the carousel is paused
    pub hero_progress: f32,
    /// Hero parallax offset
    pub hero_offset: f32,
    /// Fully revealed words of the about paragraph
    pub words_shown: usize,
    /// Counter texts
    pub counters: Vec<String>,
    /// Feature cards that have started animating
    pub features_started: Vec<usize>,
    /// Header hidden while scrolling down
    pub header_hidden: bool,
    /// Back-to-top button visible
    pub back_to_top: bool,
    /// Smoothed cursor position
    pub cursor_x: f32,
}

/// Page state: every primitive a page component would own
pub struct SimulatedPage {
    /// Simulated viewport and layout
    pub document: Document,
    /// Page clock
    pub scheduler: Scheduler,
    hero: AutoplaySequencer,
    hero_progress: Arc<IntervalProgress>,
    _hero_subscription: Subscription,
    _hero_state: Subscription,
    _hero_scroll: ScrollProgress,
    hero_offset: DerivedValue<KeyframeValue>,
    word_opacity: Vec<DerivedValue<KeyframeValue>>,
    _about_scroll: ScrollProgress,
    counters: Vec<Counter>,
    features: StaggeredReveal,
    features_started: Arc<Mutex<Vec<usize>>>,
    watcher: ScrollWatcher,
    _pointer: PointerProgress,
    cursor: SpringFollower,
}

impl SimulatedPage {
    /// Lay out the page and mount every component
    pub fn mount(config: &MotionConfig) -> Result<Self> {
        let document = Document::new(Size::new(1280.0, 800.0));
        let scheduler = Scheduler::new();

        let hero_element = document.insert_element(Rect::new(0.0, 0.0, 1280.0, 800.0));
        let about = document.insert_element(Rect::new(0.0, 1000.0, 1280.0, 400.0));
        let stats = STATS
            .iter()
            .enumerate()
            .map(|(i, _)| document.insert_element(Rect::new(40.0 + 310.0 * i as f32, 1650.0, 280.0, 160.0)))
            .collect::<Vec<_>>();
        let features_group = document.insert_element(Rect::new(0.0, 2200.0, 1280.0, 600.0));
        document.insert_element(Rect::new(0.0, 3000.0, 1280.0, 400.0));

        let hero = AutoplaySequencer::new(&scheduler).with_hover_policy(config.autoplay.hover_policy);
        let hero_progress = Arc::new(IntervalProgress::track(&scheduler, config.autoplay.period())?);
        hero_progress.pause();
        let hero_subscription = hero.subscribe(|change: &IndexChange| {
            tracing::info!("Hero slide {:?} -> {} ({:?})", change.previous, change.current, change.cause);
        });
        // The bar runs only while playing and restarts on every tick and resume
        let bar = Arc::clone(&hero_progress);
        let hero_state = hero.on_state_change(move |state| match state {
            SequencerState::Running(_) => bar.resume(),
            SequencerState::Paused(_) | SequencerState::Stopped => {
                bar.pause();
                bar.restart();
            }
        });
        hero.start(HERO_SLIDES, config.autoplay.period())?;

        let hero_scroll = ScrollProgress::track(&document, hero_element, ScrollOffset::START_START, ScrollOffset::END_START)?;
        let parallax = config
            .range("hero_parallax")
            .or_else(|_| RangeMapper::numeric([0.0, 1.0], [0.0, 300.0]))?;
        let hero_offset = parallax.drive(&hero_scroll.value());

        let about_scroll = ScrollProgress::track(&document, about, ScrollOffset::new(0.0, 0.9), ScrollOffset::new(0.0, 0.25))?;
        let words = ABOUT_TEXT.split_whitespace().count();
        let word_opacity = word_windows(words)?
            .into_iter()
            .map(|(start, end)| Ok(RangeMapper::numeric([start, end], [0.2, 1.0])?.drive(&about_scroll.value())))
            .collect::<Result<Vec<_>>>()?;

        let counters = stats
            .iter()
            .zip(STATS)
            .map(|(element, (target, suffix))| Counter::mount(&document, &scheduler, *element, target, suffix, config.reveal))
            .collect::<Result<Vec<_>>>()?;

        let features_started = Arc::new(Mutex::new(Vec::new()));
        let started = Arc::clone(&features_started);
        let features = StaggeredReveal::arm(
            &document,
            &scheduler,
            features_group,
            config.reveal,
            config.stagger.schedule(FEATURES),
            move |i| {
                tracing::debug!("Feature card {i} animating in");
                started.lock().push(i);
            },
        )?;

        let watcher = ScrollWatcher::watch(&document, config.scroll)?;
        let pointer = PointerProgress::track(&document, Axis::X)?;
        let cursor = SpringFollower::follow(&scheduler, &pointer.value(), config.spring)?;

        tracing::info!("Mounted page: {} elements, {} words, {} counters", 5 + STATS.len(), words, STATS.len());

        Ok(Self {
            document,
            scheduler,
            hero,
            hero_progress,
            _hero_subscription: hero_subscription,
            _hero_state: hero_state,
            _hero_scroll: hero_scroll,
            hero_offset,
            word_opacity,
            _about_scroll: about_scroll,
            counters,
            features,
            features_started,
            watcher,
            _pointer: pointer,
            cursor,
        })
    }

    /// Pointer entered hero slide `index`
    pub fn hover_slide(&self, index: usize) -> Result<()> {
        self.hero.hover_enter(index)
    }

    /// Pointer left the hero strip
    pub fn leave_slides(&self) {
        self.hero.hover_leave();
    }

    /// Capture the rendered state
    pub fn snapshot(&self) -> FrameSnapshot {
        let offset = self.hero_offset.get().as_numeric().unwrap_or_default();
        let words_shown = self
            .word_opacity
            .iter()
            .filter(|opacity| opacity.get().as_numeric().is_some_and(|o| o >= 1.0))
            .count();
        let flags = self.watcher.get();

        FrameSnapshot {
            time_ms: self.scheduler.now().as_millis(),
            scroll_y: self.document.scroll().y,
            hero_slide: self.hero.active_index(),
            hero_progress: self.hero_progress.get(),
            hero_offset: offset,
            words_shown,
            counters: self.counters.iter().map(Counter::text).collect(),
            features_started: self.features_started.lock().clone(),
            header_hidden: flags.hidden,
            back_to_top: flags.show_back_to_top,
            cursor_x: self.cursor.get(),
        }
    }

    /// Whether every entrance animation has finished
    pub fn settled(&self) -> bool {
        self.counters.iter().all(Counter::is_finished) && self.features.has_fired() && self.features.pending_items() == 0
    }

    /// Stop the hero carousel and release its timer
    pub fn stop(&self) {
        self.hero.stop();
    }
}
