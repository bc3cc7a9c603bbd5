#![allow(clippy::format_push_string)]

use crate::margin::InterestEstimate;
use crate::performance::PerformanceReport;

const RULE: &str = "═══════════════════════════════════════════════════════════════\n";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────\n";

pub struct ReportFormatter;

impl ReportFormatter {
    #[must_use]
    pub fn performance(report: &PerformanceReport) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str(RULE);
        output.push_str("                  ACCOUNT PERFORMANCE (TWR)                    \n");
        output.push_str(RULE);
        output.push('\n');

        output.push_str("Time Period\n");
        output.push_str(THIN_RULE);
        output.push_str(&format!("Start:                 {}\n", report.start_date));
        output.push_str(&format!("End:                   {}\n", report.end_date));
        output.push_str(&format!("Return Days:           {}\n", report.return_days));
        output.push('\n');

        output.push_str("Equity & Cash Flows\n");
        output.push_str(THIN_RULE);
        output.push_str(&format!("Start Equity:          ${:.2}\n", report.start_equity));
        output.push_str(&format!("End Equity:            ${:.2}\n", report.end_equity));
        output.push_str(&format!("Deposits:              ${:.2}\n", report.total_deposits));
        output.push_str(&format!("Withdrawals:           ${:.2}\n", report.total_withdrawals));
        output.push_str(&format!("Profit:                ${:.2}\n", report.profit));
        output.push('\n');

        output.push_str("Returns & Risk\n");
        output.push_str(THIN_RULE);
        output.push_str(&format!(
            "Cumulative Return:     {:.2}%\n",
            report.cumulative_return * 100.0
        ));
        output.push_str(&format!(
            "Annualized Return:     {:.2}%\n",
            report.annualized_return * 100.0
        ));
        output.push_str(&format!(
            "Annualized Volatility: {:.2}%\n",
            report.annualized_volatility * 100.0
        ));
        match report.sharpe_ratio {
            Some(sharpe) => output.push_str(&format!("Sharpe Ratio:          {sharpe:.4}\n")),
            None => output.push_str("Sharpe Ratio:          N/A\n"),
        }
        output.push_str(&format!(
            "Max Drawdown:          {:.2}%\n",
            report.drawdown.max_drawdown * 100.0
        ));
        if let (Some(peak), Some(trough)) = (report.drawdown.peak_date, report.drawdown.trough_date) {
            output.push_str(&format!("Drawdown Window:       {peak} -> {trough}\n"));
        }
        output.push_str(&format!(
            "Current Drawdown:      {:.2}%\n",
            report.drawdown.current_drawdown * 100.0
        ));

        if !report.monthly_returns.is_empty() {
            output.push('\n');
            output.push_str("Monthly Returns\n");
            output.push_str(THIN_RULE);
            for month in &report.monthly_returns {
                output.push_str(&format!(
                    "{}:               {:>7.2}%\n",
                    month.month,
                    month.return_pct * 100.0
                ));
            }
        }

        output.push('\n');
        output.push_str(RULE);
        output
    }

    #[must_use]
    pub fn interest(estimate: &InterestEstimate) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str(RULE);
        output.push_str("                  MARGIN INTEREST ESTIMATE                     \n");
        output.push_str(RULE);
        output.push_str(&format!("Loan:                  ${:.2}\n", estimate.loan));
        output.push_str(&format!(
            "Period:                {} -> {} ({} days)\n",
            estimate.start, estimate.end, estimate.days
        ));
        output.push_str(&format!("Average Rate:          {:.3}%\n", estimate.average_rate));
        output.push_str(THIN_RULE);
        for month in &estimate.by_month {
            output.push_str(&format!(
                "{}  {:>3} days @ {:.3}%   ${:.2}\n",
                month.month, month.days, month.rate, month.interest
            ));
        }
        output.push_str(THIN_RULE);
        output.push_str(&format!("Total Interest:        ${:.2}\n", estimate.total));
        output.push_str(RULE);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::performance::{time_weighted_return, EquityPoint, PerformanceParams};
    use chrono::NaiveDate;

    #[test]
    fn test_performance_report_contains_key_lines() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let report = time_weighted_return(
            &[
                EquityPoint {
                    date: d(2),
                    equity: 100.0,
                },
                EquityPoint {
                    date: d(3),
                    equity: 110.0,
                },
            ],
            &[],
            PerformanceParams::default(),
        )
        .unwrap();

        let text = ReportFormatter::performance(&report);
        assert!(text.contains("Cumulative Return:     10.00%"));
        assert!(text.contains("Sharpe Ratio:          N/A"));
        assert!(text.contains("2024-01"));
    }
}
