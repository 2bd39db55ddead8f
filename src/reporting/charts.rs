use crate::error::{Result, SurveyError};
use crate::reporting::equivalence::EquivalenceCurve;
use crate::reporting::stats::{outcome_stats, MeanSem, Observation, Outcome};
use crate::survey::{Condition, Topic};
use log::{debug, info};
use plotters::coord::ranged1d::SegmentedCoord;
use plotters::coord::types::RangedCoordi32;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

/// 10.7 x 2.5 in at 300 dpi.
const BAR_CHART_SIZE: (u32, u32) = (3210, 750);
/// 10 x 4 in at 300 dpi.
const EQUIVALENCE_CHART_SIZE: (u32, u32) = (3000, 1200);

const FONT: &str = "sans-serif";
const TOST_LOWER_COLOR: RGBColor = RGBColor(0xff, 0x6b, 0x58);
const TOST_UPPER_COLOR: RGBColor = RGBColor(0x84, 0x51, 0x96);
const SIGNIFICANCE_LEVEL: f64 = 0.05;

pub fn condition_color(condition: Condition) -> RGBColor {
    match condition {
        Condition::Llm => RGBColor(0x2f, 0x4b, 0x7c),
        Condition::Hum => RGBColor(0xd5, 0x50, 0x87),
        Condition::NoLabel => RGBColor(0xff, 0xa6, 0x00),
    }
}

pub fn condition_axis_label(condition: Condition) -> &'static str {
    match condition {
        Condition::Llm => "AI Label",
        Condition::Hum => "Human Label",
        Condition::NoLabel => "No Label",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub condition: Condition,
    pub stat: Option<MeanSem>,
}

/// One subplot: all policies or a single topic.
#[derive(Debug, Clone, PartialEq)]
pub struct BarPanel {
    pub title: &'static str,
    pub bars: Vec<Bar>,
}

/// Aggregate panel followed by one panel per topic, bars in display order.
pub fn bar_panels(observations: &[Observation], outcome: Outcome) -> Vec<BarPanel> {
    let panel = |title: &'static str, topic: Option<Topic>| BarPanel {
        title,
        bars: Condition::DISPLAY_ORDER
            .iter()
            .map(|&condition| Bar {
                condition,
                stat: outcome_stats(
                    observations.iter().filter(|obs| {
                        obs.condition == condition && topic.is_none_or(|t| obs.topic == t)
                    }),
                    outcome,
                ),
            })
            .collect(),
    };

    let mut panels = vec![panel("All Policies", None)];
    panels.extend(Topic::ALL.iter().map(|&topic| panel(topic.name(), Some(topic))));
    panels
}

/// Y range covering every bar and error bar of every panel, and zero.
pub fn shared_y_range(panels: &[BarPanel]) -> (f64, f64) {
    let (mut low, mut high) = (0.0f64, 0.0f64);
    for stat in panels.iter().flat_map(|p| &p.bars).filter_map(|b| b.stat) {
        low = low.min(stat.mean - stat.ci95());
        high = high.max(stat.mean + stat.ci95());
    }
    if high - low < f64::EPSILON {
        return (-1.0, 1.0);
    }
    let pad = (high - low) * 0.05;
    (if low < 0.0 { low - pad } else { low }, high + pad)
}

/// One segment per condition. The inner range is inclusive, so it ends at
/// the last display position.
fn condition_axis() -> SegmentedCoord<RangedCoordi32> {
    (0..Condition::DISPLAY_ORDER.len() as i32 - 1).into_segmented()
}

/// Left and right edges of the segment holding the bar at `position`.
fn bar_span(position: usize) -> (SegmentValue<i32>, SegmentValue<i32>) {
    let x = position as i32;
    let right = if position + 1 >= Condition::DISPLAY_ORDER.len() {
        SegmentValue::Last
    } else {
        SegmentValue::Exact(x + 1)
    };
    (SegmentValue::Exact(x), right)
}

pub fn render_bar_chart(panels: &[BarPanel], outcome: Outcome, output_path: &Path) -> Result<()> {
    let (y_min, y_max) = shared_y_range(panels);
    debug!(
        "Rendering {} panels for {} with y range {:.2}..{:.2}",
        panels.len(),
        outcome.name(),
        y_min,
        y_max
    );

    let root = BitMapBackend::new(output_path, BAR_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(SurveyError::chart)?;
    let areas = root.split_evenly((1, panels.len().max(1)));

    for (index, (area, panel)) in areas.iter().zip(panels).enumerate() {
        let mut chart = ChartBuilder::on(area)
            .caption(panel.title, (FONT, 40))
            .margin(16)
            .x_label_area_size(110)
            .y_label_area_size(if index == 0 { 130 } else { 70 })
            .build_cartesian_2d(condition_axis(), y_min..y_max)
            .map_err(SurveyError::chart)?;

        let x_formatter = |value: &SegmentValue<i32>| match value {
            SegmentValue::CenterOf(i) => Condition::DISPLAY_ORDER
                .get(*i as usize)
                .map(|&c| condition_axis_label(c).to_string())
                .unwrap_or_default(),
            _ => String::new(),
        };
        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh()
            .disable_y_mesh()
            .x_labels(Condition::DISPLAY_ORDER.len())
            .x_label_formatter(&x_formatter)
            .label_style((FONT, 30));
        if index == 0 {
            mesh.y_desc(outcome.axis_label());
        }
        mesh.draw().map_err(SurveyError::chart)?;

        for (position, bar) in panel.bars.iter().enumerate() {
            let Some(stat) = bar.stat else { continue };
            let (left, right) = bar_span(position);
            let color = condition_color(bar.condition);

            let mut rect = Rectangle::new([(left, 0.0), (right, stat.mean)], color.filled());
            rect.set_margin(0, 0, 18, 18);
            chart.draw_series(std::iter::once(rect)).map_err(SurveyError::chart)?;

            let ci = stat.ci95();
            if ci > 0.0 {
                chart
                    .draw_series(std::iter::once(ErrorBar::new_vertical(
                        SegmentValue::CenterOf(position as i32),
                        stat.mean - ci,
                        stat.mean,
                        stat.mean + ci,
                        BLACK.stroke_width(3),
                        24,
                    )))
                    .map_err(SurveyError::chart)?;
            }
        }

        chart
            .draw_series(LineSeries::new(
                vec![(SegmentValue::Exact(0), 0.0), (SegmentValue::Last, 0.0)],
                BLACK.stroke_width(1),
            ))
            .map_err(SurveyError::chart)?;
    }

    root.present().map_err(SurveyError::chart)?;
    info!("Saved {} chart to {:?}", outcome.name(), output_path);
    Ok(())
}

fn draw_equivalence_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    curve: &EquivalenceCurve,
    x_range: (f64, f64),
    with_legend: bool,
) -> Result<()> {
    let mut chart = ChartBuilder::on(area)
        .caption(curve.title, (FONT, 44))
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(90)
        .build_cartesian_2d(x_range.0..x_range.1, 0.0f64..1.0f64)
        .map_err(SurveyError::chart)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .label_style((FONT, 30))
        .draw()
        .map_err(SurveyError::chart)?;

    let lower = curve.points.iter().map(|p| (p.equivalence_bound, p.lower_bound));
    let upper = curve.points.iter().map(|p| (p.equivalence_bound, p.upper_bound));

    chart
        .draw_series(LineSeries::new(lower, TOST_LOWER_COLOR.stroke_width(3)))
        .map_err(SurveyError::chart)?
        .label("TOST Lower")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], TOST_LOWER_COLOR.stroke_width(3)));
    chart
        .draw_series(LineSeries::new(upper, TOST_UPPER_COLOR.stroke_width(3)))
        .map_err(SurveyError::chart)?
        .label("TOST Upper")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], TOST_UPPER_COLOR.stroke_width(3)));

    chart
        .draw_series(DashedLineSeries::new(
            vec![(x_range.0, SIGNIFICANCE_LEVEL), (x_range.1, SIGNIFICANCE_LEVEL)],
            12,
            8,
            BLACK.stroke_width(1),
        ))
        .map_err(SurveyError::chart)?;

    if with_legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font((FONT, 30))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(SurveyError::chart)?;
    }
    Ok(())
}

/// Two side-by-side TOST curves sharing axis titles and one legend.
pub fn render_equivalence_chart(
    left: &EquivalenceCurve,
    right: &EquivalenceCurve,
    output_path: &Path,
) -> Result<()> {
    let x_range = match (left.bound_range(), right.bound_range()) {
        (Some(a), Some(b)) => (a.0.min(b.0), a.1.max(b.1)),
        (Some(r), None) | (None, Some(r)) => r,
        (None, None) => {
            return Err(SurveyError::Chart("equivalence curves are empty".to_string()));
        }
    };
    let x_range = if x_range.1 > x_range.0 {
        x_range
    } else {
        (x_range.0 - 0.5, x_range.1 + 0.5)
    };

    let root = BitMapBackend::new(output_path, EQUIVALENCE_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(SurveyError::chart)?;

    let (width, height) = EQUIVALENCE_CHART_SIZE;
    root.draw(&Text::new(
        "Equivalence Bound",
        (width as i32 / 2, height as i32 - 30),
        TextStyle::from((FONT, 40).into_font()).pos(Pos::new(HPos::Center, VPos::Center)),
    ))
    .map_err(SurveyError::chart)?;
    root.draw(&Text::new(
        "t-test Significance",
        (30, height as i32 / 2),
        TextStyle::from((FONT, 40).into_font().transform(FontTransform::Rotate270))
            .pos(Pos::new(HPos::Center, VPos::Center)),
    ))
    .map_err(SurveyError::chart)?;

    let plot_area = root.margin(10, 70, 70, 10);
    let panels = plot_area.split_evenly((1, 2));
    draw_equivalence_panel(&panels[0], left, x_range, false)?;
    draw_equivalence_panel(&panels[1], right, x_range, true)?;

    root.present().map_err(SurveyError::chart)?;
    info!("Saved equivalence chart to {:?}", output_path);
    Ok(())
}
