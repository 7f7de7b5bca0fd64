use serde::Serialize;
use smallvec::SmallVec;

pub const MAX_CHART_RECOMMENDATIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pattern {
    Consistent,
    Volatile,
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub column: String,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub median: f64,
    pub std_dev: f64,
    pub trend: Trend,
    pub trend_strength: f64,
    pub pattern: Option<Pattern>,
    pub outliers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Warning,
    Info,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub message: String,
}

impl Recommendation {
    pub fn missing_data(completeness: u32) -> Self {
        Self {
            kind: RecommendationKind::Warning,
            message: format!("{}% of data has missing values", 100 - completeness),
        }
    }

    pub fn correlation_analysis() -> Self {
        Self {
            kind: RecommendationKind::Info,
            message: "Multiple numeric columns detected - consider correlation analysis".to_string(),
        }
    }

    pub fn statistical_analysis() -> Self {
        Self {
            kind: RecommendationKind::Success,
            message: "Large dataset - statistical analysis recommended".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartRecommendation {
    #[serde(rename = "Histogram or Box Plot")]
    HistogramOrBoxPlot,
    #[serde(rename = "Scatter Plot or Line Chart")]
    ScatterOrLine,
    #[serde(rename = "Bar Chart or Pie Chart")]
    BarOrPie,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub total_rows: usize,
    pub total_columns: usize,
    pub numeric_columns: usize,
    pub completeness: u32,
    pub missing_data: usize,
    pub duplicate_rows: usize,
    pub insights: Vec<ColumnProfile>,
    pub recommendations: Vec<Recommendation>,
    pub chart_recommendations: SmallVec<[ChartRecommendation; MAX_CHART_RECOMMENDATIONS]>,
}

/// Result of profiling: an empty dataset is reported, not summarised.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProfileOutcome {
    Empty,
    Ready { summary: DatasetSummary },
}
