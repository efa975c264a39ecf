#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ashare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Candlestick chart rendering.
//!
//! - [`plot_candle`] - Render bars to a PNG file
//! - [`moving_average`] - Simple moving average used for the overlay lines
//! - [`ChartConfig`] - Image size, moving-average windows, font location

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ashare_core::Bar;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Font family name fonts are registered under.
const FONT_FAMILY: &str = "sans-serif";

/// Environment variable pointing at a TrueType font file.
pub const ENV_FONT_PATH: &str = "ASHARE_CHART_FONT";

/// Locations searched when no font path is configured.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Moving-average line colors, cycled per window.
const MA_COLORS: [RGBColor; 3] = [
    RGBColor(255, 140, 0),
    RGBColor(30, 144, 255),
    RGBColor(186, 85, 211),
];

/// Rising candles.
const UP: RGBColor = RGBColor(38, 166, 91);
/// Falling candles.
const DOWN: RGBColor = RGBColor(214, 39, 40);

/// Set once the first chart resolves its font.
static FONT_READY: OnceLock<bool> = OnceLock::new();

/// Errors that can occur while rendering a chart.
#[derive(Error, Debug)]
pub enum ChartError {
    /// The drawing backend failed.
    #[error("Drawing error: {0}")]
    Draw(String),

    /// The output location could not be prepared.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Chart rendering settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartConfig {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Moving-average windows drawn over the closes.
    pub moving_averages: Vec<usize>,
    /// TrueType font used for text.
    pub font_path: Option<PathBuf>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            moving_averages: vec![5, 10, 20],
            font_path: None,
        }
    }
}

impl ChartConfig {
    /// Default settings with the font taken from `ASHARE_CHART_FONT` if set.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            font_path: std::env::var_os(ENV_FONT_PATH).map(PathBuf::from),
            ..Self::default()
        }
    }

    /// Sets the moving-average windows.
    #[must_use]
    pub fn with_moving_averages(mut self, windows: Vec<usize>) -> Self {
        self.moving_averages = windows;
        self
    }

    /// Sets the image size.
    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Simple moving average over `window` values, aligned with the input.
///
/// Entries before the window is full are `None`. A zero window yields only
/// `None`.
#[must_use]
pub fn moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            (i + 1 >= window)
                .then(|| values[i + 1 - window..=i].iter().sum::<f64>() / window as f64)
        })
        .collect()
}

/// Renders `bars` as a candlestick chart with volume and writes a PNG to `path`.
///
/// Returns the written path, or `None` when `bars` is empty, in which case no
/// file is created.
///
/// The font is resolved once per process; later `font_path` values are ignored.
pub fn plot_candle(
    bars: &[Bar],
    title: &str,
    path: impl AsRef<Path>,
    config: &ChartConfig,
) -> Result<Option<PathBuf>, ChartError> {
    let path = path.as_ref();

    if bars.is_empty() {
        warn!(title, "No bars to plot, chart not written");
        return Ok(None);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let with_text = ensure_font(config.font_path.as_deref());
    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();

    draw(&root, bars, title, config, with_text).map_err(|e| ChartError::Draw(e.to_string()))?;
    root.present()
        .map_err(|e| ChartError::Draw(e.to_string()))?;

    info!(path = %path.display(), bars = bars.len(), "Chart written");
    Ok(Some(path.to_path_buf()))
}

fn ensure_font(configured: Option<&Path>) -> bool {
    *FONT_READY.get_or_init(|| {
        let candidates = configured
            .into_iter()
            .chain(FONT_CANDIDATES.iter().map(Path::new));

        for candidate in candidates {
            let Ok(bytes) = std::fs::read(candidate) else {
                continue;
            };
            // The registry needs 'static data; this runs at most once.
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            if register_font(FONT_FAMILY, FontStyle::Normal, bytes).is_ok() {
                debug!(font = %candidate.display(), "Registered chart font");
                return true;
            }
        }

        warn!("No usable TrueType font found, charts are drawn without text");
        false
    })
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    bars: &[Bar],
    title: &str,
    config: &ChartConfig,
    with_text: bool,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;
    let root = if with_text {
        root.titled(title, (FONT_FAMILY, 24))?
    } else {
        root.clone()
    };

    let (_, height) = root.dim_in_pixel();
    let (upper, lower) = root.split_vertically(height * 7 / 10);

    let count = bars.len();
    let x_range = -0.5..(count as f64 - 0.5);
    let (low, high) = price_bounds(bars);
    let candle_width = ((f64::from(config.width) / count as f64) * 0.6).clamp(1.0, 15.0) as u32;

    let date_label = |x: &f64| -> String {
        let i = x.round();
        if i < 0.0 {
            return String::new();
        }
        bars.get(i as usize)
            .map(|b| b.trading_date().to_string())
            .unwrap_or_default()
    };

    let mut builder = ChartBuilder::on(&upper);
    builder.margin(10);
    if with_text {
        builder.x_label_area_size(0).y_label_area_size(60);
    }
    let mut price = builder.build_cartesian_2d(x_range.clone(), low..high)?;

    if with_text {
        price
            .configure_mesh()
            .y_desc("Price")
            .x_labels(8)
            .x_label_formatter(&date_label)
            .draw()?;
    }

    price.draw_series(bars.iter().enumerate().map(|(i, b)| {
        CandleStick::new(
            i as f64,
            b.open(),
            b.high(),
            b.low(),
            b.close(),
            UP.filled(),
            DOWN.filled(),
            candle_width,
        )
    }))?;

    let closes: Vec<f64> = bars.iter().map(Bar::close).collect();
    let mut labelled = false;
    for (k, &window) in config.moving_averages.iter().enumerate() {
        let points: Vec<(f64, f64)> = moving_average(&closes, window)
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
            .collect();
        if points.is_empty() {
            continue;
        }

        let color = MA_COLORS[k % MA_COLORS.len()];
        let series = price.draw_series(LineSeries::new(points, color.stroke_width(1)))?;
        if with_text {
            series
                .label(format!("MA{window}"))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], &color));
            labelled = true;
        }
    }

    if labelled {
        price
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    let max_volume = bars.iter().map(Bar::volume).fold(0.0, f64::max);
    let volume_top = if max_volume > 0.0 { max_volume * 1.1 } else { 1.0 };

    let mut builder = ChartBuilder::on(&lower);
    builder.margin(10);
    if with_text {
        builder.x_label_area_size(30).y_label_area_size(60);
    }
    let mut volume = builder.build_cartesian_2d(x_range, 0.0..volume_top)?;

    if with_text {
        volume
            .configure_mesh()
            .y_desc("Volume")
            .x_labels(8)
            .x_label_formatter(&date_label)
            .y_labels(4)
            .draw()?;
    }

    volume.draw_series(bars.iter().enumerate().map(|(i, b)| {
        let style = if b.close() >= b.open() {
            UP.filled()
        } else {
            DOWN.filled()
        };
        let x = i as f64;
        Rectangle::new([(x - 0.35, 0.0), (x + 0.35, b.volume())], style)
    }))?;

    debug!(bars = count, "Chart drawn");
    Ok(())
}

/// Lowest low and highest high with a small margin.
fn price_bounds(bars: &[Bar]) -> (f64, f64) {
    let low = bars.iter().map(Bar::low).fold(f64::INFINITY, f64::min);
    let high = bars.iter().map(Bar::high).fold(f64::NEG_INFINITY, f64::max);

    if !low.is_finite() || !high.is_finite() {
        return (0.0, 1.0);
    }
    if high <= low {
        return (low - 1.0, high + 1.0);
    }

    let pad = (high - low) * 0.05;
    (low - pad, high + pad)
}
