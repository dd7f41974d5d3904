//! Radar chart rendering.
//!
//! Long-form series are drawn as closed polygons on a polar grid, one axis
//! per competency group, radius scaled to the Likert range.

use crate::models::LongFormRow;
use crate::survey::likert::MAX_SCORE;
use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::PI;

/// Series colours, assigned in series order.
const SERIES_COLORS: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

const GRID_COLOR: RGBColor = RGBColor(200, 200, 200);
const SCALE_COLOR: RGBColor = RGBColor(150, 150, 150);

/// Chart dimensions and caption.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "미래역량 프로파일".to_string(),
            width: 720,
            height: 560,
        }
    }
}

/// Values of one named series, aligned with the chart axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// Regroup long-form points into axes and per-series value vectors.
///
/// Axes and series keep first-seen order; a series missing a point on some
/// axis reads 0 there.
pub fn collect_series(points: &[LongFormRow]) -> (Vec<String>, Vec<Series>) {
    let mut axes: Vec<String> = Vec::new();
    for point in points {
        if !axes.contains(&point.axis) {
            axes.push(point.axis.clone());
        }
    }

    let mut series: Vec<Series> = Vec::new();
    for point in points {
        let index = match series.iter().position(|s| s.name == point.series) {
            Some(i) => i,
            None => {
                series.push(Series {
                    name: point.series.clone(),
                    values: vec![0.0; axes.len()],
                });
                series.len() - 1
            }
        };
        if let Some(axis) = axes.iter().position(|a| *a == point.axis) {
            series[index].values[axis] = point.value;
        }
    }

    (axes, series)
}

/// Pixel position of `value` on axis `index` of `count`.
///
/// The first axis points straight up and the rest follow clockwise.
pub fn polar_point(center: (i32, i32), radius: f64, index: usize, count: usize, value: f64) -> (i32, i32) {
    let angle = -PI / 2.0 + 2.0 * PI * index as f64 / count.max(1) as f64;
    let scaled = radius * (value / MAX_SCORE).clamp(0.0, 1.0);
    (
        center.0 + (scaled * angle.cos()).round() as i32,
        center.1 + (scaled * angle.sin()).round() as i32,
    )
}

/// Render the radar chart as an SVG document.
pub fn render_radar_svg(points: &[LongFormRow], options: &ChartOptions) -> Result<String> {
    let (axes, series) = collect_series(points);
    let mut svg = String::new();

    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let width = options.width as i32;
        let height = options.height as i32;
        let center = (width * 2 / 5, height / 2 + 15);
        let radius = f64::from(height.min(width)) * 0.32;
        let centered = Pos::new(HPos::Center, VPos::Center);

        root.draw(&Text::new(
            options.title.clone(),
            (width / 2, 24),
            ("sans-serif", 20).into_font().color(&BLACK).pos(centered),
        ))?;

        let n = axes.len();
        let whole = if n == 0 { 0 } else { MAX_SCORE as usize };

        for level in 1..=whole {
            let mut ring: Vec<(i32, i32)> = (0..n)
                .map(|i| polar_point(center, radius, i, n, level as f64))
                .collect();
            if let Some(first) = ring.first().copied() {
                ring.push(first);
            }
            root.draw(&PathElement::new(ring, GRID_COLOR.stroke_width(1)))?;

            let (x, y) = polar_point(center, radius, 0, n, level as f64);
            root.draw(&Text::new(
                level.to_string(),
                (x + 4, y),
                ("sans-serif", 11).into_font().color(&SCALE_COLOR),
            ))?;
        }

        for (i, axis) in axes.iter().enumerate() {
            let tip = polar_point(center, radius, i, n, MAX_SCORE);
            root.draw(&PathElement::new(vec![center, tip], GRID_COLOR.stroke_width(1)))?;

            let label = polar_point(center, radius + 28.0, i, n, MAX_SCORE);
            root.draw(&Text::new(
                axis.clone(),
                label,
                ("sans-serif", 14).into_font().color(&BLACK).pos(centered),
            ))?;
        }

        for (i, s) in series.iter().enumerate() {
            let color = SERIES_COLORS[i % SERIES_COLORS.len()];
            let outline: Vec<(i32, i32)> = s
                .values
                .iter()
                .enumerate()
                .map(|(axis, value)| polar_point(center, radius, axis, n, *value))
                .collect();

            root.draw(&Polygon::new(outline.clone(), color.mix(0.15).filled()))?;

            let mut closed = outline.clone();
            if let Some(first) = outline.first().copied() {
                closed.push(first);
            }
            root.draw(&PathElement::new(closed, color.stroke_width(2)))?;
            for point in outline {
                root.draw(&Circle::new(point, 3, color.filled()))?;
            }

            let legend_x = width * 3 / 4;
            let legend_y = 70 + 24 * i as i32;
            root.draw(&Rectangle::new(
                [(legend_x, legend_y - 6), (legend_x + 16, legend_y + 6)],
                color.filled(),
            ))?;
            root.draw(&Text::new(
                s.name.clone(),
                (legend_x + 24, legend_y),
                ("sans-serif", 13)
                    .into_font()
                    .color(&BLACK)
                    .pos(Pos::new(HPos::Left, VPos::Center)),
            ))?;
        }

        root.present()?;
    }

    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(series: &str, axis: &str, value: f64) -> LongFormRow {
        LongFormRow {
            series: series.to_string(),
            axis: axis.to_string(),
            value,
        }
    }

    fn sample() -> Vec<LongFormRow> {
        vec![
            point("본교 평균", "공감소통역량", 4.1),
            point("본교 평균", "자기관리역량", 3.9),
            point("본교 평균", "공동체역량", 4.4),
            point("대구 평균", "공감소통역량", 4.45),
            point("대구 평균", "자기관리역량", 4.28),
            point("대구 평균", "공동체역량", 4.35),
        ]
    }

    #[test]
    fn test_collect_series_keeps_order() {
        let (axes, series) = collect_series(&sample());
        assert_eq!(axes, vec!["공감소통역량", "자기관리역량", "공동체역량"]);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "본교 평균");
        assert_eq!(series[1].values, vec![4.45, 4.28, 4.35]);
    }

    #[test]
    fn test_collect_series_fills_gaps() {
        let points = vec![point("a", "x", 1.0), point("b", "y", 2.0)];
        let (axes, series) = collect_series(&points);
        assert_eq!(axes, vec!["x", "y"]);
        assert_eq!(series[0].values, vec![1.0, 0.0]);
        assert_eq!(series[1].values, vec![0.0, 2.0]);
    }

    #[test]
    fn test_polar_point() {
        let center = (100, 100);
        assert_eq!(polar_point(center, 50.0, 0, 4, MAX_SCORE), (100, 50));
        assert_eq!(polar_point(center, 50.0, 1, 4, MAX_SCORE), (150, 100));
        assert_eq!(polar_point(center, 50.0, 2, 4, 0.0), center);
        // values beyond the scale stay on the outer ring
        assert_eq!(polar_point(center, 50.0, 0, 4, 9.0), (100, 50));
    }

    #[test]
    fn test_render_radar_svg() {
        let svg = render_radar_svg(&sample(), &ChartOptions::default()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("공감소통역량"));
        assert!(svg.contains("대구 평균"));
        assert!(svg.contains("미래역량 프로파일"));
    }

    #[test]
    fn test_render_empty_chart() {
        let svg = render_radar_svg(&[], &ChartOptions::default()).unwrap();
        assert!(svg.contains("<svg"));
    }
}
