use crate::error::AppError;
use crate::models::{CellValue, RowRecord};
use serde::{Deserialize, Serialize};

pub const HISTOGRAM_BINS: usize = 10;
const ANIMATION_DURATION_MS: u32 = 1000;
const MIN_RADAR_AXES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Area,
    Pie,
    Scatter,
    Radar,
    Bubble,
    Histogram,
    #[serde(rename = "3d-bar")]
    Bar3d,
    #[serde(rename = "3d-scatter")]
    Scatter3d,
    #[serde(rename = "3d-line")]
    Line3d,
    #[serde(rename = "3d-pie")]
    Pie3d,
    #[serde(rename = "3d-surface")]
    Surface3d,
}

/// Presentation toggles passed through to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayOptions {
    pub show_grid: bool,
    pub show_legend: bool,
    pub enable_animation: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_grid: true,
            show_legend: true,
            enable_animation: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    pub chart_type: ChartType,
    #[serde(default)]
    pub x_axis: Option<String>,
    #[serde(default)]
    pub y_axis: Option<String>,
    #[serde(default)]
    pub selected_columns: Option<Vec<String>>,
    #[serde(default)]
    pub display: DisplayOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub name: String,
    pub value: f64,
    pub fields: RowRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarAxis {
    pub axis: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubblePoint {
    pub name: String,
    pub value: f64,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub bin: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartSeries {
    Series {
        points: Vec<SeriesPoint>,
    },
    Radar {
        axes: Vec<RadarAxis>,
        #[serde(rename = "domainMax")]
        domain_max: f64,
    },
    Bubble {
        #[serde(rename = "sizeKey")]
        size_key: String,
        points: Vec<BubblePoint>,
    },
    Histogram {
        column: String,
        bins: Vec<HistogramBin>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub chart_type: ChartType,
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
    pub display: DisplayOptions,
    pub animation_duration_ms: u32,
    pub data: ChartSeries,
}

pub struct ChartProcessor;

impl ChartProcessor {
    pub fn prepare(&self, dataset: &[RowRecord], request: &ChartRequest) -> Result<ChartData, AppError> {
        let first_row = dataset.first()
            .ok_or_else(|| AppError::InvalidInput("No data available".to_string()))?;

        let selected: Vec<String> = match &request.selected_columns {
            Some(columns) => columns.clone(),
            None => first_row.columns().map(str::to_string).collect(),
        };

        tracing::debug!(
            "Preparing {:?} chart over {} rows with {} selected columns",
            request.chart_type,
            dataset.len(),
            selected.len()
        );

        let data = match request.chart_type {
            ChartType::Radar => self.radar(first_row, &selected)?,
            ChartType::Bubble => self.bubble(dataset, request, &selected)?,
            ChartType::Histogram => self.histogram(dataset, request, &selected)?,
            ChartType::Bar
            | ChartType::Line
            | ChartType::Area
            | ChartType::Pie
            | ChartType::Scatter
            | ChartType::Bar3d
            | ChartType::Scatter3d
            | ChartType::Line3d
            | ChartType::Pie3d
            | ChartType::Surface3d => self.series(dataset, request, &selected)?,
        };

        Ok(ChartData {
            chart_type: request.chart_type,
            x_axis: request.x_axis.clone(),
            y_axis: request.y_axis.clone(),
            display: request.display,
            animation_duration_ms: if request.display.enable_animation { ANIMATION_DURATION_MS } else { 0 },
            data,
        })
    }

    fn require_axes<'r>(&self, request: &'r ChartRequest) -> Result<(&'r str, &'r str), AppError> {
        match (request.x_axis.as_deref(), request.y_axis.as_deref()) {
            (Some(x), Some(y)) if !x.is_empty() && !y.is_empty() => Ok((x, y)),
            _ => Err(AppError::InvalidInput("Missing required parameters".to_string())),
        }
    }

    fn series(&self, dataset: &[RowRecord], request: &ChartRequest, selected: &[String]) -> Result<ChartSeries, AppError> {
        let (x_axis, y_axis) = self.require_axes(request)?;

        let points = dataset.iter()
            .map(|row| SeriesPoint {
                name: row.get(x_axis).label(),
                value: finite_or_zero(row.get(y_axis).coerce_number()),
                fields: selected.iter()
                    .filter_map(|column| match row.get(column) {
                        CellValue::Missing => None,
                        value => Some((column.as_str(), value.clone())),
                    })
                    .collect(),
            })
            .collect();

        Ok(ChartSeries::Series { points })
    }

    fn radar(&self, first_row: &RowRecord, selected: &[String]) -> Result<ChartSeries, AppError> {
        if selected.len() < MIN_RADAR_AXES {
            return Err(AppError::InvalidInput(format!(
                "Radar charts need at least {} selected columns",
                MIN_RADAR_AXES
            )));
        }

        let axes: Vec<RadarAxis> = selected.iter()
            .map(|column| RadarAxis {
                axis: column.clone(),
                value: finite_or_zero(first_row.get(column).coerce_number()),
            })
            .collect();
        let domain_max = axes.iter().map(|a| a.value).fold(1.0, f64::max);

        Ok(ChartSeries::Radar { axes, domain_max })
    }

    fn bubble(&self, dataset: &[RowRecord], request: &ChartRequest, selected: &[String]) -> Result<ChartSeries, AppError> {
        let (x_axis, y_axis) = self.require_axes(request)?;

        let size_key = selected.iter()
            .find(|column| {
                column.as_str() != x_axis
                    && column.as_str() != y_axis
                    && matches!(dataset[0].get(column), CellValue::Number(_))
            })
            .ok_or_else(|| AppError::InvalidInput(
                "Bubble charts need a numeric column for bubble size".to_string()
            ))?;

        let points = dataset.iter()
            .map(|row| BubblePoint {
                name: row.get(x_axis).label(),
                value: finite_or_zero(row.get(y_axis).coerce_number()),
                size: finite_or_zero(row.get(size_key).coerce_number()),
            })
            .collect();

        Ok(ChartSeries::Bubble { size_key: size_key.clone(), points })
    }

    fn histogram(&self, dataset: &[RowRecord], request: &ChartRequest, selected: &[String]) -> Result<ChartSeries, AppError> {
        let column = request.y_axis.as_deref()
            .filter(|y| !y.is_empty())
            .or_else(|| selected.iter()
                .map(String::as_str)
                .find(|column| matches!(dataset[0].get(column), CellValue::Number(_))))
            .ok_or_else(|| AppError::InvalidInput("Histogram needs a numeric column".to_string()))?;

        let values: Vec<f64> = dataset.iter()
            .filter_map(|row| row.get(column).as_finite_number())
            .collect();

        if values.is_empty() {
            return Err(AppError::InvalidInput(format!("Column {} has no numeric values", column)));
        }

        Ok(ChartSeries::Histogram {
            column: column.to_string(),
            bins: histogram_bins(&values),
        })
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Ten equal-width bins spanning min..max; the maximum lands in the last bin.
pub fn histogram_bins(values: &[f64]) -> Vec<HistogramBin> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let width = (max - min) / HISTOGRAM_BINS as f64;
    let bin_size = if width == 0.0 || width.is_nan() { 1.0 } else { width };

    let mut bins: Vec<HistogramBin> = (0..HISTOGRAM_BINS)
        .map(|i| HistogramBin {
            bin: format!(
                "{:.1} - {:.1}",
                min + i as f64 * bin_size,
                min + (i + 1) as f64 * bin_size
            ),
            count: 0,
        })
        .collect();

    for value in values {
        let index = (((value - min) / bin_size).floor() as usize).min(HISTOGRAM_BINS - 1);
        bins[index].count += 1;
    }

    bins
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Vec<RowRecord> {
        serde_json::from_str(
            r#"[
                {"month":"Jan","sales":120,"cost":80,"region":"North"},
                {"month":"Feb","sales":"95","cost":70,"region":"South"},
                {"month":"Mar","sales":null,"cost":65},
                {"month":"Apr","sales":"n/a","cost":90,"region":"East"}
            ]"#,
        )
        .unwrap()
    }

    fn request(json: &str) -> ChartRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_series_points_coerce_values() {
        let chart = ChartProcessor
            .prepare(&dataset(), &request(r#"{"chartType":"bar","xAxis":"month","yAxis":"sales"}"#))
            .unwrap();

        assert_eq!(chart.display, DisplayOptions::default());
        assert_eq!(chart.animation_duration_ms, 1000);
        let ChartSeries::Series { points } = chart.data else {
            panic!("expected series data");
        };
        let values: Vec<(&str, f64)> = points.iter().map(|p| (p.name.as_str(), p.value)).collect();
        assert_eq!(values, vec![("Jan", 120.0), ("Feb", 95.0), ("Mar", 0.0), ("Apr", 0.0)]);
        // Selection defaults to the first row's columns; absent keys are left out.
        assert_eq!(points[2].fields.columns().collect::<Vec<_>>(), vec!["month", "sales", "cost"]);
    }

    #[test]
    fn test_series_respects_selected_columns_and_display() {
        let chart = ChartProcessor
            .prepare(
                &dataset(),
                &request(
                    r#"{"chartType":"3d-line","xAxis":"month","yAxis":"cost",
                        "selectedColumns":["cost","month"],
                        "display":{"enableAnimation":false,"showGrid":false}}"#,
                ),
            )
            .unwrap();

        assert_eq!(chart.chart_type, ChartType::Line3d);
        assert_eq!(chart.animation_duration_ms, 0);
        assert!(!chart.display.show_grid);
        assert!(chart.display.show_legend);
        let ChartSeries::Series { points } = chart.data else {
            panic!("expected series data");
        };
        assert_eq!(points[0].fields.columns().collect::<Vec<_>>(), vec!["cost", "month"]);
    }

    #[test]
    fn test_series_requires_both_axes() {
        let err = ChartProcessor
            .prepare(&dataset(), &request(r#"{"chartType":"pie","xAxis":"month"}"#))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: Missing required parameters");
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let err = ChartProcessor
            .prepare(&[], &request(r#"{"chartType":"bar","xAxis":"a","yAxis":"b"}"#))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_radar_reads_first_row() {
        let chart = ChartProcessor
            .prepare(
                &dataset(),
                &request(r#"{"chartType":"radar","selectedColumns":["sales","cost","region"]}"#),
            )
            .unwrap();
        assert_eq!(
            chart.data,
            ChartSeries::Radar {
                axes: vec![
                    RadarAxis { axis: "sales".into(), value: 120.0 },
                    RadarAxis { axis: "cost".into(), value: 80.0 },
                    RadarAxis { axis: "region".into(), value: 0.0 },
                ],
                domain_max: 120.0,
            }
        );

        let too_few = ChartProcessor
            .prepare(&dataset(), &request(r#"{"chartType":"radar","selectedColumns":["sales","cost"]}"#));
        assert!(too_few.is_err());
    }

    #[test]
    fn test_bubble_picks_numeric_size_column() {
        let chart = ChartProcessor
            .prepare(&dataset(), &request(r#"{"chartType":"bubble","xAxis":"month","yAxis":"sales"}"#))
            .unwrap();
        let ChartSeries::Bubble { size_key, points } = chart.data else {
            panic!("expected bubble data");
        };
        assert_eq!(size_key, "cost");
        assert_eq!(points[1], BubblePoint { name: "Feb".into(), value: 95.0, size: 70.0 });

        let no_size = ChartProcessor.prepare(
            &dataset(),
            &request(r#"{"chartType":"bubble","xAxis":"month","yAxis":"cost","selectedColumns":["month","cost","region"]}"#),
        );
        assert!(no_size.is_err());
    }

    #[test]
    fn test_histogram_falls_back_to_first_numeric_column() {
        let chart = ChartProcessor
            .prepare(&dataset(), &request(r#"{"chartType":"histogram"}"#))
            .unwrap();
        let ChartSeries::Histogram { column, bins } = chart.data else {
            panic!("expected histogram data");
        };
        // "sales" only holds one real number; the first row decides the column.
        assert_eq!(column, "sales");
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 1);
    }

    #[test]
    fn test_histogram_bins() {
        let values: Vec<f64> = (0..=20).map(f64::from).collect();
        let bins = histogram_bins(&values);
        assert_eq!(bins.len(), HISTOGRAM_BINS);
        assert_eq!(bins[0].bin, "0.0 - 2.0");
        assert_eq!(bins[9].bin, "18.0 - 20.0");
        assert_eq!(bins[0].count, 2);
        // 18, 19 and the maximum 20 share the last bin.
        assert_eq!(bins[9].count, 3);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
    }

    #[test]
    fn test_histogram_of_constant_values_uses_unit_bins() {
        let bins = histogram_bins(&[5.0, 5.0, 5.0]);
        assert_eq!(bins[0].bin, "5.0 - 6.0");
        assert_eq!(bins[0].count, 3);
    }

    #[test]
    fn test_chart_types_parse_from_wire_names() {
        let parsed: Vec<ChartType> =
            serde_json::from_str(r#"["area","scatter","3d-bar","3d-surface","3d-pie"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![ChartType::Area, ChartType::Scatter, ChartType::Bar3d, ChartType::Surface3d, ChartType::Pie3d]
        );
        assert!(serde_json::from_str::<ChartType>(r#""donut""#).is_err());
    }
}
