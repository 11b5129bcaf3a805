// SPDX-License-Identifier: MIT OR Apache-2.0
//! Kinesis preview - headless run of the motion primitives
//!
//! Mounts a simulated landing page (hero carousel, word-by-word paragraph,
//! stat counters, staggered feature cards, sticky header) and plays a
//! scripted visit against it, logging what the page would render.
//!
//! ## Usage
//!
//! `kinesis_preview [CONFIG.ron] [--realtime]`
//!
//! Without `--realtime` the scheduler clock is stepped deterministically;
//! with it a tokio frame driver advances the clock in wall-clock time.

mod page;

use kinesis_motion::host::driver::DEFAULT_FRAME_INTERVAL;
use kinesis_motion::host::FrameDriver;
use kinesis_motion::{ConfigLoadError, ConfigurationError, MotionConfig};
use page::SimulatedPage;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const STEP: Duration = Duration::from_millis(100);
const VISIT: Duration = Duration::from_secs(20);
const REALTIME_VISIT: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
enum PreviewError {
    #[error(transparent)]
    Config(#[from] ConfigLoadError),
    #[error(transparent)]
    Motion(#[from] ConfigurationError),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to encode snapshot: {0}")]
    Snapshot(#[from] ron::Error),
}

#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    realtime: bool,
}

impl Options {
    fn from_args(args: impl Iterator<Item = String>) -> Self {
        let mut options = Self::default();
        for arg in args {
            if arg == "--realtime" {
                options.realtime = true;
            } else {
                options.config = Some(PathBuf::from(arg));
            }
        }
        options
    }
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("kinesis_preview=info".parse().unwrap())
        .add_directive("kinesis_motion=debug".parse().unwrap());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Kinesis preview v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(Options::from_args(std::env::args().skip(1))) {
        tracing::error!("Preview failed: {e}");
        std::process::exit(1);
    }
}

fn run(options: Options) -> Result<(), PreviewError> {
    let config = match &options.config {
        Some(path) => MotionConfig::load(path)?,
        None => MotionConfig::default(),
    };

    if options.realtime {
        run_realtime(&config)
    } else {
        run_simulated(&config)
    }
}

/// Scripted visit: scroll down through the page, hover the hero, scroll back up a little
fn scroll_at(elapsed: Duration) -> f32 {
    let t = elapsed.as_secs_f32();
    if t < 2.0 {
        0.0
    } else if t < 15.0 {
        (t - 2.0) * 200.0
    } else {
        (2600.0 - (t - 15.0) * 150.0).max(0.0)
    }
}

fn log_snapshot(page: &SimulatedPage) -> Result<(), PreviewError> {
    let snapshot = ron::ser::to_string(&page.snapshot())?;
    tracing::info!("{snapshot}");
    Ok(())
}

fn run_simulated(config: &MotionConfig) -> Result<(), PreviewError> {
    let page = SimulatedPage::mount(config)?;
    let mut elapsed = Duration::ZERO;

    while elapsed < VISIT {
        elapsed += STEP;
        let ms = elapsed.as_millis();

        if ms == 3000 {
            page.hover_slide(2)?;
        } else if ms == 4500 {
            page.leave_slides();
        }
        page.document.scroll_to(0.0, scroll_at(elapsed));
        page.document.move_pointer(640.0 + 400.0 * (elapsed.as_secs_f32() * 0.7).sin(), 400.0);
        page.scheduler.advance(STEP);

        if ms % 1000 == 0 {
            log_snapshot(&page)?;
        }
    }

    tracing::info!("Visit finished, entrance animations settled: {}", page.settled());
    page.stop();
    Ok(())
}

fn run_realtime(config: &MotionConfig) -> Result<(), PreviewError> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build()?;

    runtime.block_on(async {
        let page = SimulatedPage::mount(config)?;
        let mut driver = FrameDriver::spawn(page.scheduler.clone(), DEFAULT_FRAME_INTERVAL)?;
        let started = tokio::time::Instant::now();
        let mut next_log = Duration::from_secs(1);

        while started.elapsed() < REALTIME_VISIT {
            tokio::time::sleep(STEP).await;
            let elapsed = started.elapsed();
            page.document.scroll_to(0.0, scroll_at(elapsed * 2));
            if elapsed >= next_log {
                log_snapshot(&page)?;
                next_log += Duration::from_secs(1);
            }
        }

        driver.stop();
        page.stop();
        Ok::<(), PreviewError>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_args() {
        let options = Options::from_args(["motion.ron".to_string(), "--realtime".to_string()].into_iter());
        assert_eq!(options.config, Some(PathBuf::from("motion.ron")));
        assert!(options.realtime);
        assert!(!Options::from_args(std::iter::empty()).realtime);
    }

    #[test]
    fn test_scroll_script() {
        assert_eq!(scroll_at(Duration::from_secs(1)), 0.0);
        assert_eq!(scroll_at(Duration::from_secs(7)), 1000.0);
        assert_eq!(scroll_at(Duration::from_secs(15)), 2600.0);
        assert_eq!(scroll_at(Duration::from_secs(60)), 0.0);
    }

    #[test]
    fn test_simulated_visit_reveals_everything() {
        let page = SimulatedPage::mount(&MotionConfig::default()).unwrap();
        for step in 1..=140_u32 {
            page.document.scroll_to(0.0, scroll_at(STEP * step));
            page.scheduler.advance(STEP);
        }
        for _ in 0..100 {
            page.scheduler.advance(STEP);
        }

        let snapshot = page.snapshot();
        assert_eq!(snapshot.counters, vec!["120+", "15K+", "2.5M", "98%"]);
        assert_eq!(snapshot.features_started, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(snapshot.words_shown, 10);
        assert!(snapshot.back_to_top);
        assert!(page.settled());
    }

    #[test]
    fn test_hover_pauses_hero() {
        let page = SimulatedPage::mount(&MotionConfig::default()).unwrap();
        page.hover_slide(2).unwrap();
        page.scheduler.advance(Duration::from_secs(12));
        assert_eq!(page.snapshot().hero_slide, Some(2));

        page.leave_slides();
        page.scheduler.advance(Duration::from_secs(5));
        assert_eq!(page.snapshot().hero_slide, Some(3));
    }

    #[test]
    fn test_hero_bar_tracks_ticks_across_hover() {
        let page = SimulatedPage::mount(&MotionConfig::default()).unwrap();
        for _ in 0..30 {
            page.scheduler.advance(STEP);
        }
        assert!((page.snapshot().hero_progress - 0.6).abs() < 1e-6);

        page.hover_slide(2).unwrap();
        for _ in 0..15 {
            page.scheduler.advance(STEP);
            assert_eq!(page.snapshot().hero_progress, 0.0);
        }

        page.leave_slides();
        let mut last = 0.0;
        for _ in 0..49 {
            page.scheduler.advance(STEP);
            let snapshot = page.snapshot();
            assert_eq!(snapshot.hero_slide, Some(2));
            assert!(snapshot.hero_progress > last);
            last = snapshot.hero_progress;
        }
        assert!(last > 0.95);

        page.scheduler.advance(STEP);
        let snapshot = page.snapshot();
        assert_eq!(snapshot.hero_slide, Some(3));
        assert_eq!(snapshot.hero_progress, 0.0);
    }
}
