use super::types::*;
use super::utils::*;
use crate::models::{CellValue, RowRecord};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::HashSet;

const COMPLETENESS_WARNING_BELOW: u32 = 90;
const LARGE_DATASET_ROWS: usize = 100;
const SMALL_DATASET_ROWS: usize = 20;

pub struct DataProfiler;

/// Hashable view of a cell used to spot repeated rows.
#[derive(PartialEq, Eq, Hash)]
enum CellKey<'a> {
    Number(u64),
    Text(&'a str),
    Boolean(bool),
    Null,
}

impl<'a> CellKey<'a> {
    fn of(value: &'a CellValue) -> Option<Self> {
        match value {
            // -0 and 0 print the same, so they compare the same.
            CellValue::Number(n) if *n == 0.0 => Some(CellKey::Number(0f64.to_bits())),
            CellValue::Number(n) => Some(CellKey::Number(n.to_bits())),
            CellValue::String(s) => Some(CellKey::Text(s)),
            CellValue::Boolean(b) => Some(CellKey::Boolean(*b)),
            CellValue::Null => Some(CellKey::Null),
            CellValue::Missing => None,
        }
    }
}

impl DataProfiler {
    pub fn profile(&self, dataset: &[RowRecord]) -> ProfileOutcome {
        let start = std::time::Instant::now();

        let Some(first_row) = dataset.first() else {
            tracing::info!("Profiling skipped: dataset has no rows");
            return ProfileOutcome::Empty;
        };

        let columns: Vec<&str> = first_row.columns().collect();
        self.log_schema_drift(dataset, first_row);

        let numeric_columns: Vec<&str> = columns.iter()
            .copied()
            .filter(|column| dataset.iter().any(|row| row.get(column).as_finite_number().is_some()))
            .collect();

        // Columns are independent; collect keeps first-seen order.
        let insights: Vec<ColumnProfile> = numeric_columns.par_iter()
            .filter_map(|column| self.profile_column(dataset, column))
            .collect();

        let missing_data = dataset.par_iter()
            .filter(|row| columns.iter().any(|column| row.get(column).is_missing()))
            .count();

        let total_rows = dataset.len();
        let completeness = completeness_percent(total_rows, missing_data);

        let summary = DatasetSummary {
            total_rows,
            total_columns: columns.len(),
            numeric_columns: numeric_columns.len(),
            completeness,
            missing_data,
            duplicate_rows: self.count_duplicate_rows(dataset),
            insights,
            recommendations: self.recommendations(total_rows, numeric_columns.len(), completeness),
            chart_recommendations: self.chart_recommendations(total_rows, numeric_columns.len()),
        };

        tracing::info!(
            "Profiled {} rows, {} columns ({} numeric) in {:?}",
            summary.total_rows,
            summary.total_columns,
            summary.numeric_columns,
            start.elapsed()
        );

        ProfileOutcome::Ready { summary }
    }

    fn profile_column(&self, dataset: &[RowRecord], column: &str) -> Option<ColumnProfile> {
        let values: Vec<f64> = dataset.iter()
            .filter_map(|row| row.get(column).as_finite_number())
            .collect();

        if values.is_empty() {
            return None;
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = mean(&values);
        let median = upper_median(&values);
        let std_dev = population_std_dev(&values, avg);

        let (trend, trend_strength, pattern) = if values.len() > 1 {
            let slope = index_slope(&values);
            (classify_trend(slope), slope.abs(), Some(classify_pattern(std_dev, avg)))
        } else {
            (Trend::Neutral, 0.0, None)
        };

        Some(ColumnProfile {
            column: column.to_string(),
            count: values.len(),
            min,
            max,
            avg,
            median,
            std_dev,
            trend,
            trend_strength,
            pattern,
            outliers: count_outliers(&values, avg, std_dev),
        })
    }

    fn count_duplicate_rows(&self, dataset: &[RowRecord]) -> usize {
        let mut seen = HashSet::with_capacity(dataset.len());
        let mut duplicates = 0;
        for row in dataset {
            let fingerprint: Vec<(&str, CellKey)> = row.iter()
                .filter_map(|(column, value)| CellKey::of(value).map(|key| (column, key)))
                .collect();
            if !seen.insert(fingerprint) {
                duplicates += 1;
            }
        }
        duplicates
    }

    fn recommendations(
        &self,
        total_rows: usize,
        numeric_columns: usize,
        completeness: u32,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        if completeness < COMPLETENESS_WARNING_BELOW {
            recommendations.push(Recommendation::missing_data(completeness));
        }
        if numeric_columns >= 2 {
            recommendations.push(Recommendation::correlation_analysis());
        }
        if total_rows > LARGE_DATASET_ROWS {
            recommendations.push(Recommendation::statistical_analysis());
        }

        recommendations
    }

    fn chart_recommendations(
        &self,
        total_rows: usize,
        numeric_columns: usize,
    ) -> SmallVec<[ChartRecommendation; MAX_CHART_RECOMMENDATIONS]> {
        let mut charts = SmallVec::new();

        if numeric_columns == 1 {
            charts.push(ChartRecommendation::HistogramOrBoxPlot);
        }
        if numeric_columns >= 2 {
            charts.push(ChartRecommendation::ScatterOrLine);
        }
        if total_rows <= SMALL_DATASET_ROWS {
            charts.push(ChartRecommendation::BarOrPie);
        }

        charts
    }

    // The first row defines the schema; later keys outside it are ignored.
    fn log_schema_drift(&self, dataset: &[RowRecord], first_row: &RowRecord) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }

        let drifted = dataset.iter()
            .skip(1)
            .filter(|row| row.columns().any(|column| !first_row.contains_column(column)))
            .count();

        if drifted > 0 {
            tracing::debug!(
                "{} rows carry columns outside the first-row schema of {} columns",
                drifted,
                first_row.columns().count()
            );
        }
    }
}
