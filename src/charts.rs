use plotters::prelude::*;

use crate::models::{DashboardData, FormattedPageVisit, FormattedVideoWatch};
use crate::stats::{self, CHART_PAGE_LABEL, CHART_VIDEO_LABEL};

/// Shown in place of a chart that has nothing to draw
pub const NO_DATA: &str = "Aucune donnée disponible pour le graphique";

/// How many pages or videos the ranking charts show
pub const TOP_N: usize = 10;

/// Chart shapes supported by the dashboard
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartType {
    /// One vertical bar per category
    Bar,

    /// Values joined by a line, categories in order
    Line,
}

/// Configuration options for chart generation
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the value axis
    pub y_label: String,

    /// Width of the SVG in pixels
    pub width: u32,

    /// Height of the SVG in pixels
    pub height: u32,

    pub chart_type: ChartType,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            y_label: String::new(),
            width: 800,
            height: 400,
            chart_type: ChartType::Bar,
        }
    }
}

type ChartResult = Result<Option<String>, Box<dyn std::error::Error>>;

/// Renders labelled values as an SVG document
///
/// # Arguments
/// * `data` - `(label, value)` pairs in display order
/// * `options` - Chart styling and type options
///
/// # Returns
/// * `Ok(None)` when `data` is empty, else the SVG markup
pub fn render(data: &[(String, f64)], options: &ChartOptions) -> ChartResult {
    if data.is_empty() {
        return Ok(None);
    }

    let count = data.len() as u32;
    let max_y = data
        .iter()
        .map(|(_, value)| *value)
        .fold(0.0_f64, f64::max)
        .max(1.0);
    let labels: Vec<&str> = data.iter().map(|(label, _)| label.as_str()).collect();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 22).into_font())
            .margin(12)
            .x_label_area_size(70)
            .y_label_area_size(50)
            .build_cartesian_2d((0..count).into_segmented(), 0.0..max_y * 1.1)?;

        let label_of = |value: &SegmentValue<u32>| match value {
            SegmentValue::CenterOf(index) => labels
                .get(*index as usize)
                .map(|label| label.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(data.len())
            .x_label_formatter(&label_of)
            .x_label_style(("sans-serif", 11).into_font().transform(FontTransform::Rotate90))
            .y_desc(&options.y_label)
            .draw()?;

        let blue = RGBColor(0, 63, 155);
        match options.chart_type {
            ChartType::Bar => {
                chart.draw_series(
                    Histogram::vertical(&chart)
                        .style(blue.filled())
                        .margin(8)
                        .data(data.iter().enumerate().map(|(i, (_, value))| (i as u32, *value))),
                )?;
            }
            ChartType::Line => {
                let points: Vec<(SegmentValue<u32>, f64)> = data
                    .iter()
                    .enumerate()
                    .map(|(i, (_, value))| (SegmentValue::CenterOf(i as u32), *value))
                    .collect();
                chart.draw_series(LineSeries::new(points.clone(), blue.stroke_width(2)))?;
                chart.draw_series(
                    points
                        .into_iter()
                        .map(|point| Circle::new(point, 3, blue.filled())),
                )?;
            }
        }

        root.present()?;
    }

    Ok(Some(svg))
}

/// "Pages les plus visitées": top pages by visit count
pub fn page_visits_chart(visits: &[FormattedPageVisit]) -> ChartResult {
    let data: Vec<(String, f64)> = stats::top_pages(visits, TOP_N)
        .iter()
        .map(|ranked| (ranked.label(CHART_PAGE_LABEL), ranked.count as f64))
        .collect();

    render(
        &data,
        &ChartOptions {
            title: "Pages les plus visitées".to_string(),
            y_label: "Nombre de visites".to_string(),
            ..Default::default()
        },
    )
}

/// "Vidéos les plus regardées": top videos by watch count
pub fn video_watches_chart(watches: &[FormattedVideoWatch]) -> ChartResult {
    let data: Vec<(String, f64)> = stats::top_videos(watches, TOP_N)
        .iter()
        .map(|ranked| (ranked.label(CHART_VIDEO_LABEL), ranked.count as f64))
        .collect();

    render(
        &data,
        &ChartOptions {
            title: "Vidéos les plus regardées".to_string(),
            y_label: "Nombre de visualisations".to_string(),
            ..Default::default()
        },
    )
}

/// Monthly page views from the dashboard's temporal data
pub fn activity_chart(dashboard: &DashboardData) -> ChartResult {
    render(
        &dashboard.monthly_page_views(),
        &ChartOptions {
            title: "Activité des Utilisateurs".to_string(),
            y_label: "Pages vues".to_string(),
            chart_type: ChartType::Line,
            ..Default::default()
        },
    )
}

/// Users per country, largest first
pub fn geo_chart(dashboard: &DashboardData) -> ChartResult {
    let mut data: Vec<(String, f64)> = dashboard
        .geo_data
        .iter()
        .filter(|geo| !geo.country.is_empty())
        .map(|geo| (geo.country.clone(), geo.users))
        .collect();
    data.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    data.truncate(TOP_N);

    render(
        &data,
        &ChartOptions {
            title: "Distribution Géographique".to_string(),
            y_label: "Utilisateurs".to_string(),
            ..Default::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_data_draws_nothing() {
        assert!(render(&[], &ChartOptions::default()).unwrap().is_none());
        assert!(page_visits_chart(&[]).unwrap().is_none());
        assert!(geo_chart(&DashboardData::default()).unwrap().is_none());
    }

    #[test]
    fn bar_chart_is_svg() {
        let data = vec![("/programme".to_string(), 4.0), ("/videos".to_string(), 2.0)];
        let svg = render(&data, &ChartOptions { title: "Test".into(), ..Default::default() })
            .unwrap()
            .unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("/programme"));
    }

    #[test]
    fn line_chart_from_dashboard() {
        let dashboard: DashboardData = serde_json::from_value(json!({
            "temporalData": {"pageViews": [{"date": "2025-01-04", "count": 3}, {"date": "2025-02-01", "count": 5}]}
        }))
        .unwrap();
        let svg = activity_chart(&dashboard).unwrap().unwrap();
        assert!(svg.contains("2025-02"));
    }
}
