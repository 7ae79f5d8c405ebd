//! PNG figures.
//!
//! Bars are drawn on a numeric x axis with utilities at integer positions and
//! their names supplied by the label formatter.

use crate::{
    export::ExportError,
    frame::{f64_values, i64_values, string_values},
};
use plotters::prelude::*;
use polars::prelude::DataFrame;
use ratecase_data::{Utility, UtilityYearRecord};
use ratecase_revenue::{BillImpact, RevenueRequirementRow};
use ratecase_stats::cagr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Chart size in pixels.
pub const CHART_SIZE: (u32, u32) = (1000, 600);

/// Errors raised while drawing charts.
#[derive(Debug, Error)]
pub enum ChartError {
    /// Backend or layout failure
    #[error("Drawing error: {0}")]
    Drawing(String),

    /// Nothing to plot
    #[error("No data for chart {0}")]
    NoData(&'static str),

    /// Failure reading chart inputs
    #[error(transparent)]
    Input(#[from] ExportError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for charts.
pub type Result<T> = std::result::Result<T, ChartError>;

fn drawing<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Drawing(e.to_string())
}

/// Plot color of a utility.
pub fn utility_color(name: &str) -> RGBColor {
    match Utility::from_name(name) {
        Some(Utility::PacificGasElectric) => RGBColor(0x1f, 0x77, 0xb4),
        Some(Utility::SouthernCaliforniaEdison) => RGBColor(0xff, 0x7f, 0x0e),
        Some(Utility::SanDiegoGasElectric) => RGBColor(0x2c, 0xa0, 0x2c),
        None => RGBColor(0x7f, 0x7f, 0x7f),
    }
}

const CURRENT: RGBColor = RGBColor(0x4c, 0x72, 0xb0);
const PROPOSED: RGBColor = RGBColor(0xc4, 0x4e, 0x52);
const OVER_COLLECTING: RGBColor = RGBColor(0x2c, 0xa0, 0x2c);
const UNDER_COLLECTING: RGBColor = RGBColor(0xd6, 0x27, 0x28);

fn padded_range(lo: f64, hi: f64) -> std::ops::Range<f64> {
    let lo = lo.min(0.0);
    let hi = hi.max(0.0);
    let pad = ((hi - lo) * 0.15).max(1e-9);
    (lo - if lo < 0.0 { pad } else { 0.0 })..(hi + pad)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn utility_names(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out.sort_by_key(|n| {
        Utility::ALL
            .iter()
            .position(|u| u.name() == n)
            .unwrap_or(usize::MAX)
    });
    out
}

/// Total O&M by year for each utility, with each utility's CAGR in the
/// legend.
pub fn plot_om_trend(records: &[UtilityYearRecord], path: &Path) -> Result<()> {
    let points: Vec<(&str, i64, f64)> = records
        .iter()
        .filter_map(|r| r.om_total.map(|v| (r.utility_name.as_str(), r.report_year, v / 1e9)))
        .collect();
    if points.is_empty() {
        return Err(ChartError::NoData("om_trend"));
    }
    let min_year = points.iter().map(|p| p.1).min().unwrap_or_default();
    let max_year = points.iter().map(|p| p.1).max().unwrap_or_default();
    let max_om = points.iter().map(|p| p.2).fold(0.0, f64::max);

    ensure_parent(path)?;
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(drawing)?;
    let root = root
        .titled(
            &format!("O&M Expense Trend ({min_year}-{max_year})"),
            ("sans-serif", 28),
        )
        .map_err(drawing)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(min_year..max_year.max(min_year + 1), 0.0..max_om * 1.15)
        .map_err(drawing)?;
    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("O&M Total ($ Billions)")
        .x_labels((max_year - min_year + 1) as usize)
        .y_label_formatter(&|v| format!("${v:.1}B"))
        .draw()
        .map_err(drawing)?;

    for name in utility_names(points.iter().map(|p| p.0.to_string())) {
        let mut series: Vec<(i64, f64)> = points
            .iter()
            .filter(|p| p.0 == name)
            .map(|p| (p.1, p.2))
            .collect();
        series.sort_by_key(|p| p.0);
        let growth = match (series.first(), series.last()) {
            (Some(a), Some(b)) => cagr(a.1, b.1, (b.0 - a.0) as f64),
            _ => None,
        };
        let label = growth.map_or_else(
            || name.clone(),
            |g| format!("{name} (CAGR {g:.1}%)"),
        );
        let color = utility_color(&name);

        chart
            .draw_series(LineSeries::new(series.iter().copied(), color.stroke_width(3)))
            .map_err(drawing)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3)));
        chart
            .draw_series(series.iter().map(|&p| Circle::new(p, 5, color.filled())))
            .map_err(drawing)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(drawing)?;
    root.present().map_err(drawing)?;
    info!(path = %path.display(), "Saved chart");
    Ok(())
}

/// O&M per customer of each utility in `year` against the peer average.
pub fn plot_peer_comparison(records: &[UtilityYearRecord], year: i64, path: &Path) -> Result<()> {
    let mut bars: Vec<(String, f64)> = records
        .iter()
        .filter(|r| r.report_year == year)
        .filter_map(|r| r.om_per_customer.map(|v| (r.utility_name.clone(), v)))
        .collect();
    if bars.is_empty() {
        return Err(ChartError::NoData("peer_comparison"));
    }
    bars.sort_by(|a, b| a.1.total_cmp(&b.1));
    let peer_avg = bars.iter().map(|b| b.1).sum::<f64>() / bars.len() as f64;
    let max_value = bars.iter().map(|b| b.1).fold(0.0, f64::max);

    let subtitle = bars
        .last()
        .filter(|_| peer_avg != 0.0)
        .map(|(name, v)| {
            format!(
                "{name} spends {:.0}% above peer average",
                (v - peer_avg) / peer_avg * 100.0
            )
        })
        .unwrap_or_default();

    ensure_parent(path)?;
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(drawing)?;
    let root = root
        .titled(&format!("O&M Cost per Customer ({year})"), ("sans-serif", 28))
        .map_err(drawing)?;

    let n = bars.len() as f64;
    let names: Vec<String> = bars.iter().map(|b| b.0.clone()).collect();
    let mut chart = ChartBuilder::on(&root)
        .caption(subtitle, ("sans-serif", 16).into_font().color(&RGBColor(0x80, 0x80, 0x80)))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5..n - 0.5, 0.0..max_value * 1.3)
        .map_err(drawing)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len())
        .x_label_formatter(&|x| {
            let i = x.round();
            if (x - i).abs() < 1e-6 && i >= 0.0 {
                names.get(i as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .y_desc("O&M per Customer ($)")
        .draw()
        .map_err(drawing)?;

    chart
        .draw_series(bars.iter().enumerate().map(|(i, (name, v))| {
            let x = i as f64;
            Rectangle::new([(x - 0.3, 0.0), (x + 0.3, *v)], utility_color(name).filled())
        }))
        .map_err(drawing)?;
    chart
        .draw_series(bars.iter().enumerate().map(|(i, (_, v))| {
            let pct = if peer_avg != 0.0 { (v - peer_avg) / peer_avg * 100.0 } else { 0.0 };
            Text::new(
                format!("${v:.0} ({pct:+.0}%)"),
                (i as f64 - 0.25, v + max_value * 0.03),
                ("sans-serif", 16),
            )
        }))
        .map_err(drawing)?;
    chart
        .draw_series(LineSeries::new(
            [(-0.5, peer_avg), (n - 0.5, peer_avg)],
            RED.stroke_width(2),
        ))
        .map_err(drawing)?
        .label(format!("Peer Avg: ${peer_avg:.0}"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(drawing)?;
    root.present().map_err(drawing)?;
    info!(path = %path.display(), "Saved chart");
    Ok(())
}

/// Revenue gap of one utility-year.
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueGapPoint {
    /// Utility name
    pub utility_name: String,
    /// Report year
    pub report_year: i64,
    /// Revenue requirement minus actual revenue
    pub revenue_gap: f64,
    /// Gap in percent of actual revenue
    pub revenue_gap_pct: Option<f64>,
}

impl RevenueGapPoint {
    /// Points of rows with a computed gap.
    pub fn from_rows(rows: &[RevenueRequirementRow]) -> Vec<Self> {
        rows.iter()
            .filter_map(|r| {
                r.revenue_gap.map(|gap| Self {
                    utility_name: r.record.utility_name.clone(),
                    report_year: r.record.report_year,
                    revenue_gap: gap,
                    revenue_gap_pct: r.revenue_gap_pct,
                })
            })
            .collect()
    }

    /// Points of a revenue requirement table read back from parquet.
    pub fn from_frame(df: &DataFrame) -> std::result::Result<Vec<Self>, ExportError> {
        let names = string_values(df, "utility_name")?;
        let years = i64_values(df, "report_year")?;
        let gaps = f64_values(df, "revenue_gap")?;
        let pcts = f64_values(df, "revenue_gap_pct")?;
        Ok(names
            .into_iter()
            .zip(years)
            .zip(gaps.into_iter().zip(pcts))
            .filter_map(|((utility_name, year), (gap, pct))| {
                Some(Self {
                    utility_name,
                    report_year: year?,
                    revenue_gap: gap?,
                    revenue_gap_pct: pct,
                })
            })
            .collect())
    }
}

/// Revenue requirement minus actual revenue by utility for `year`.
pub fn plot_revenue_gap(points: &[RevenueGapPoint], year: i64, path: &Path) -> Result<()> {
    let mut bars: Vec<&RevenueGapPoint> = points.iter().filter(|p| p.report_year == year).collect();
    if bars.is_empty() {
        return Err(ChartError::NoData("revenue_gap"));
    }
    bars.sort_by(|a, b| a.utility_name.cmp(&b.utility_name));
    let gaps: Vec<f64> = bars.iter().map(|p| p.revenue_gap / 1e9).collect();
    let lo = gaps.iter().copied().fold(0.0, f64::min);
    let hi = gaps.iter().copied().fold(0.0, f64::max);
    let names: Vec<String> = bars.iter().map(|p| p.utility_name.clone()).collect();
    let n = bars.len() as f64;

    ensure_parent(path)?;
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(drawing)?;
    let root = root
        .titled(
            &format!("Revenue Gap: Calculated RR vs Actual Revenue ({year})"),
            ("sans-serif", 26),
        )
        .map_err(drawing)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Negative = utility collecting more than calculated RR",
            ("sans-serif", 16).into_font().color(&RGBColor(0x80, 0x80, 0x80)),
        )
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5..n - 0.5, padded_range(lo, hi))
        .map_err(drawing)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len())
        .x_label_formatter(&|x| {
            let i = x.round();
            if (x - i).abs() < 1e-6 && i >= 0.0 {
                names.get(i as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .y_desc("Revenue Gap ($ Billions)")
        .y_label_formatter(&|v| format!("${v:+.1}B"))
        .draw()
        .map_err(drawing)?;

    chart
        .draw_series(gaps.iter().enumerate().map(|(i, &g)| {
            let x = i as f64;
            let color = if g < 0.0 { OVER_COLLECTING } else { UNDER_COLLECTING };
            Rectangle::new([(x - 0.3, 0.0), (x + 0.3, g)], color.filled())
        }))
        .map_err(drawing)?;
    chart
        .draw_series(bars.iter().zip(&gaps).enumerate().filter_map(|(i, (p, &g))| {
            p.revenue_gap_pct.map(|pct| {
                Text::new(format!("{pct:+.1}%"), (i as f64 - 0.1, g), ("sans-serif", 18))
            })
        }))
        .map_err(drawing)?;
    chart
        .draw_series(LineSeries::new([(-0.5, 0.0), (n - 0.5, 0.0)], BLACK.stroke_width(1)))
        .map_err(drawing)?;

    root.present().map_err(drawing)?;
    info!(path = %path.display(), "Saved chart");
    Ok(())
}

/// Current and proposed bill of one utility.
#[derive(Debug, Clone, PartialEq)]
pub struct BillPoint {
    /// Utility name
    pub utility_name: String,
    /// Current monthly bill
    pub current_monthly_bill: f64,
    /// Proposed monthly bill
    pub proposed_monthly_bill: f64,
    /// Monthly change in percent
    pub monthly_change_pct: f64,
}

impl From<&BillImpact> for BillPoint {
    fn from(b: &BillImpact) -> Self {
        Self {
            utility_name: b.utility_name.clone(),
            current_monthly_bill: b.current_monthly_bill,
            proposed_monthly_bill: b.proposed_monthly_bill,
            monthly_change_pct: b.monthly_change_pct,
        }
    }
}

impl BillPoint {
    /// Points of a bill impact table read back from parquet.
    pub fn from_frame(df: &DataFrame) -> std::result::Result<Vec<Self>, ExportError> {
        let names = string_values(df, "utility_name")?;
        let current = f64_values(df, "current_monthly_bill")?;
        let proposed = f64_values(df, "proposed_monthly_bill")?;
        let change = f64_values(df, "monthly_change_pct")?;
        Ok(names
            .into_iter()
            .zip(current)
            .zip(proposed.into_iter().zip(change))
            .filter_map(|((utility_name, c), (p, pct))| {
                Some(Self {
                    utility_name,
                    current_monthly_bill: c?,
                    proposed_monthly_bill: p?,
                    monthly_change_pct: pct.unwrap_or(0.0),
                })
            })
            .collect())
    }
}

/// Current versus proposed monthly residential bill by utility.
pub fn plot_bill_impact(points: &[BillPoint], subtitle: &str, path: &Path) -> Result<()> {
    if points.is_empty() {
        return Err(ChartError::NoData("bill_impact"));
    }
    let mut bars: Vec<&BillPoint> = points.iter().collect();
    bars.sort_by(|a, b| a.utility_name.cmp(&b.utility_name));
    let names: Vec<String> = bars.iter().map(|p| p.utility_name.clone()).collect();
    let n = bars.len() as f64;
    let max_bill = bars
        .iter()
        .map(|p| p.proposed_monthly_bill.max(p.current_monthly_bill))
        .fold(0.0, f64::max);

    ensure_parent(path)?;
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(drawing)?;
    let root = root
        .titled("Residential Bill Impact: Current vs Projected", ("sans-serif", 26))
        .map_err(drawing)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(subtitle, ("sans-serif", 16).into_font().color(&RGBColor(0x80, 0x80, 0x80)))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5..n - 0.5, 0.0..max_bill.max(1.0) * 1.25)
        .map_err(drawing)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len())
        .x_label_formatter(&|x| {
            let i = x.round();
            if (x - i).abs() < 1e-6 && i >= 0.0 {
                names.get(i as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .y_desc("Monthly Bill ($)")
        .draw()
        .map_err(drawing)?;

    let width = 0.35;
    chart
        .draw_series(bars.iter().enumerate().map(|(i, p)| {
            let x = i as f64;
            Rectangle::new([(x - width, 0.0), (x, p.current_monthly_bill)], CURRENT.filled())
        }))
        .map_err(drawing)?
        .label("Current")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], CURRENT.filled()));
    chart
        .draw_series(bars.iter().enumerate().map(|(i, p)| {
            let x = i as f64;
            Rectangle::new([(x, 0.0), (x + width, p.proposed_monthly_bill)], PROPOSED.filled())
        }))
        .map_err(drawing)?
        .label("Proposed")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], PROPOSED.filled()));
    chart
        .draw_series(bars.iter().enumerate().map(|(i, p)| {
            Text::new(
                format!(
                    "${:.0} -> ${:.0} ({:+.1}%)",
                    p.current_monthly_bill, p.proposed_monthly_bill, p.monthly_change_pct
                ),
                (i as f64 - 0.3, p.proposed_monthly_bill + max_bill * 0.05),
                ("sans-serif", 15),
            )
        }))
        .map_err(drawing)?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(drawing)?;
    root.present().map_err(drawing)?;
    info!(path = %path.display(), "Saved chart");
    Ok(())
}

/// Inputs for the full figure set.
#[derive(Debug, Clone, Copy)]
pub struct ChartInputs<'a> {
    /// Analysis-ready records
    pub records: &'a [UtilityYearRecord],
    /// Revenue gaps
    pub revenue_gaps: &'a [RevenueGapPoint],
    /// Residential bills
    pub bills: &'a [BillPoint],
    /// Year for the single-year charts
    pub year: i64,
}

/// File names of the figure set.
pub const OM_TREND_FILE: &str = "om_trend.png";
/// Peer comparison figure.
pub const PEER_COMPARISON_FILE: &str = "peer_comparison_cost_per_customer.png";
/// Revenue gap figure.
pub const REVENUE_GAP_FILE: &str = "revenue_gap.png";
/// Bill impact figure.
pub const BILL_IMPACT_FILE: &str = "bill_impact.png";

/// Draw every figure into `figures_dir` and return the written paths.
pub fn render_all(inputs: &ChartInputs<'_>, figures_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(figures_dir)?;
    let om_trend = figures_dir.join(OM_TREND_FILE);
    plot_om_trend(inputs.records, &om_trend)?;
    let peer = figures_dir.join(PEER_COMPARISON_FILE);
    plot_peer_comparison(inputs.records, inputs.year, &peer)?;
    let gap = figures_dir.join(REVENUE_GAP_FILE);
    plot_revenue_gap(inputs.revenue_gaps, inputs.year, &gap)?;
    let bill = figures_dir.join(BILL_IMPACT_FILE);
    plot_bill_impact(
        inputs.bills,
        "Based on 500 kWh/month usage, 3% O&M escalation, 4% rate base growth",
        &bill,
    )?;
    Ok(vec![om_trend, peer, gap, bill])
}
