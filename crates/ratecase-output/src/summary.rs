//! Plain-text summary of revenue requirement and bill impact results.

use ratecase_revenue::{BillImpact, RevenueRequirementRow, TestYearForecast};
use std::fmt;

const BILLION: f64 = 1e9;

fn billions(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |x| format!("${:.2}B", x / BILLION))
}

fn signed_pct(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |x| format!("{x:+.1}%"))
}

/// Revenue requirement, forecast and bill impact summary for one year.
#[derive(Debug, Clone, Copy)]
pub struct RevenueSummary<'a> {
    /// Year summarized
    pub year: i64,
    /// Revenue requirement dataset
    pub rows: &'a [RevenueRequirementRow],
    /// Test-year forecasts
    pub forecasts: &'a [TestYearForecast],
    /// Residential bill impacts
    pub bill_impacts: &'a [BillImpact],
}

impl fmt::Display for RevenueSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(80);
        let thin = "-".repeat(60);
        let year_rows: Vec<&RevenueRequirementRow> = self
            .rows
            .iter()
            .filter(|r| r.record.report_year == self.year)
            .collect();

        writeln!(f, "{rule}")?;
        writeln!(f, "REVENUE REQUIREMENT AND BILL IMPACT SUMMARY")?;
        writeln!(f, "{rule}")?;

        writeln!(f, "\n1. UTILITY REVENUE REQUIREMENT ({})", self.year)?;
        writeln!(f, "{thin}")?;
        for r in &year_rows {
            writeln!(f, "   {:10}: {}", r.record.utility_name, billions(r.revenue_requirement))?;
        }

        writeln!(f, "\n2. GRC-COMPARABLE REVENUE REQUIREMENT ({})", self.year)?;
        writeln!(f, "   (Dist + Cust Svc + A&G x 70% + Depreciation + Return + 15% tax)")?;
        writeln!(f, "{thin}")?;
        for r in &year_rows {
            let share = r
                .revenue_requirement_grc
                .zip(r.revenue_requirement)
                .filter(|(_, total)| *total > 0.0)
                .map_or(0.0, |(grc, total)| grc / total * 100.0);
            writeln!(
                f,
                "   {:10}: {} ({share:.0}% of total)",
                r.record.utility_name,
                billions(r.revenue_requirement_grc)
            )?;
        }

        writeln!(f, "\n3. GRC O&M BREAKDOWN ({})", self.year)?;
        writeln!(f, "{thin}")?;
        for r in &year_rows {
            writeln!(f, "   {}:", r.record.utility_name)?;
            writeln!(f, "      Distribution:     {}", billions(r.record.om_distribution))?;
            writeln!(f, "      Customer Service: {}", billions(r.record.om_customer_service))?;
            writeln!(f, "      A&G (electric):   {}", billions(r.om_ag_electric))?;
            writeln!(f, "      GRC O&M Total:    {}", billions(r.om_grc))?;
        }

        writeln!(f, "\n4. REVENUE GAP (Total RR vs Actual Revenue)")?;
        writeln!(f, "{thin}")?;
        for r in &year_rows {
            writeln!(
                f,
                "   {:10}: {} ({})",
                r.record.utility_name,
                billions(r.revenue_gap),
                signed_pct(r.revenue_gap_pct)
            )?;
        }

        if let Some(first) = self.forecasts.first() {
            writeln!(
                f,
                "\n5. PROJECTED RR CHANGE ({} -> {})",
                first.base_year, first.forecast_year
            )?;
            writeln!(f, "{thin}")?;
            for fc in self.forecasts {
                writeln!(
                    f,
                    "   {:10}: {} -> {} ({})",
                    fc.utility_name,
                    billions(Some(fc.base_year_rr)),
                    billions(Some(fc.forecast_year_rr)),
                    signed_pct(fc.rr_change_pct)
                )?;
            }
        }

        writeln!(f, "\n6. RESIDENTIAL BILL IMPACT")?;
        writeln!(f, "{thin}")?;
        for b in self.bill_impacts {
            writeln!(
                f,
                "   {:10}: ${:.2} -> ${:.2} ({:+.1}%, ${:+.2}/yr)",
                b.utility_name,
                b.current_monthly_bill,
                b.proposed_monthly_bill,
                b.monthly_change_pct,
                b.annual_change_dollars
            )?;
        }

        writeln!(f, "\n{rule}")?;
        writeln!(f, "METHODOLOGY NOTES:")?;
        writeln!(f, "  Total RR: O&M less pass-through + Depreciation + Return + 27% tax gross-up")?;
        writeln!(f, "  GRC RR:   Dist + Cust Svc + (A&G x 70%) + Depreciation + Return + 15% tax")?;
        writeln!(f, "  Excluded from GRC: Production, Transmission, 30% of A&G")?;
        write!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratecase_data::{Utility, UtilityYearRecord};
    use ratecase_revenue::apply_rr_to_dataset;

    #[test]
    fn test_summary_lists_year_rows_only() {
        let mut current = UtilityYearRecord::new(Utility::SanDiegoGasElectric, 2023);
        current.om_total = Some(2e9);
        current.rate_base = Some(1e10);
        let older = UtilityYearRecord::new(Utility::PacificGasElectric, 2022);
        let rows = apply_rr_to_dataset(&[current, older]).unwrap();

        let text = RevenueSummary {
            year: 2023,
            rows: &rows,
            forecasts: &[],
            bill_impacts: &[],
        }
        .to_string();
        assert!(text.contains("SDG&E"));
        assert!(!text.contains("PG&E"));
        assert!(text.contains("UTILITY REVENUE REQUIREMENT (2023)"));
        assert!(!text.contains("PROJECTED RR CHANGE"));
    }
}
