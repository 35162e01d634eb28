//! Report command implementations (dashboard, trend, anomalies, insights, summary, budget)

use anyhow::Result;
use sift_core::analytics::{self, AdvancedReport, NarrativeWriter, WastefulSignal};
use sift_core::Database;

use super::{print_json, truncate};

pub fn cmd_dashboard(db: &Database, owner: &str, month: &str, json: bool) -> Result<()> {
    let summary = analytics::dashboard_summary(db, owner, month)?;

    if json {
        return print_json(&summary);
    }

    println!();
    println!("╭─────────────────────────────────────────╮");
    println!("│           💰 Sift Dashboard             │");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Month:           {}", summary.month);
    println!("  Total spend:     {:.2}", summary.total_spend);
    match &summary.top_category {
        Some(category) => println!(
            "  Top category:    {} ({:.2})",
            category, summary.top_category_spend
        ),
        None => println!("  Top category:    -"),
    }
    match summary.avg_confidence {
        Some(conf) => println!("  Avg confidence:  {:.2}", conf),
        None => println!("  Avg confidence:  -"),
    }
    println!();

    Ok(())
}

pub fn cmd_trend(db: &Database, owner: &str, json: bool) -> Result<()> {
    let points = analytics::trend(db, owner)?;

    if json {
        return print_json(&points);
    }

    if points.is_empty() {
        println!("No transactions yet.");
        return Ok(());
    }

    let max = points
        .iter()
        .map(|p| p.total_spend.abs())
        .fold(0.0_f64, f64::max);

    println!();
    println!("📈 Monthly Spend");
    println!("   ─────────────────────────────────────────────────────────────");
    for point in &points {
        let width = if max > 0.0 {
            ((point.total_spend.abs() / max) * 30.0).round() as usize
        } else {
            0
        };
        println!(
            "   {} │ {:>12.2} │ {}",
            point.month,
            point.total_spend,
            "█".repeat(width)
        );
    }

    Ok(())
}

pub fn cmd_anomalies(db: &Database, owner: &str, month: &str, json: bool) -> Result<()> {
    let anomalies = analytics::detect_anomalies(db, owner, month)?;

    if json {
        return print_json(&anomalies);
    }

    if anomalies.is_empty() {
        println!("✅ No unusual transactions in {}.", month);
        return Ok(());
    }

    println!();
    println!("⚠️  Unusual transactions in {}", month);
    println!("   ─────────────────────────────────────────────────────────────");
    for a in &anomalies {
        println!(
            "   {} │ {:>10.2} │ z={:>5.2} │ {}",
            a.date.format("%Y-%m-%d"),
            a.amount,
            a.zscore,
            truncate(&a.description, 40)
        );
    }

    Ok(())
}

pub async fn cmd_insights(
    db: &Database,
    narratives: &NarrativeWriter,
    owner: &str,
    month: &str,
    json: bool,
) -> Result<()> {
    let report = analytics::advanced_report(db, narratives, owner, month).await?;

    if json {
        return print_json(&report);
    }

    print_insights(&report);
    Ok(())
}

fn print_insights(report: &AdvancedReport) {
    let totals = &report.totals;

    println!();
    println!("🔎 Insights for {}", report.month);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Income:   {:>12.2}", totals.income);
    println!("   Expense:  {:>12.2}", totals.expense);
    println!("   Savings:  {:>12.2}", totals.savings);
    if let Some(rate) = totals.savings_rate {
        println!("   Savings rate: {:.1}%", rate);
    }

    println!();
    match report.budget.budget {
        Some(amount) => {
            println!(
                "   Budget: {:.2} │ spent {:.2} │ {}",
                amount, report.budget.spent, report.budget.status
            );
            if let Some(pct) = report.budget.used_pct {
                println!("   Used: {:.1}%", pct);
            }
        }
        None => println!("   Budget: not set (sift budget set <amount>)"),
    }
    println!("   Health score: {}/100", report.health_score);

    if !report.wasteful_signals.is_empty() {
        println!();
        println!("   Spending signals:");
        for signal in &report.wasteful_signals {
            match signal {
                WastefulSignal::CategorySpike {
                    category,
                    previous,
                    current,
                    increase_pct,
                } => println!(
                    "   📈 {} up {:.0}% ({:.2} → {:.2})",
                    category, increase_pct, previous, current
                ),
                WastefulSignal::Recurring {
                    prefix,
                    count,
                    total,
                } => println!("   🔁 \"{}\" charged {} times ({:.2})", prefix, count, total),
            }
        }
    }

    println!();
    match report.prediction.predicted_expense {
        Some(predicted) => println!(
            "   Next month (est.): {:.2} ({})",
            predicted, report.prediction.basis
        ),
        None => println!("   Next month (est.): {}", report.prediction.basis),
    }

    let yearly = &report.yearly;
    println!();
    println!(
        "   {}: income {:.2} │ expense {:.2} │ savings {:.2}",
        yearly.year, yearly.income, yearly.expense, yearly.savings
    );
    for category in &yearly.top_categories {
        println!("     {:<20} {:>12.2}", truncate(&category.category, 20), category.total);
    }

    println!();
    println!(
        "   {} {}",
        if report.narrative.ai_generated { "🤖" } else { "📝" },
        report.narrative.text
    );
    println!();
}

pub async fn cmd_summary(
    db: &Database,
    narratives: &NarrativeWriter,
    owner: &str,
    month: &str,
    json: bool,
) -> Result<()> {
    let summary = analytics::monthly_summary(db, narratives, owner, month).await?;

    if json {
        return print_json(&summary);
    }

    println!();
    println!("🧾 Summary for {}", summary.month);
    println!("   ─────────────────────────────────────────────────────────────");
    for row in &summary.breakdown {
        println!("   {:<20} {:>12.2}", truncate(&row.category, 20), row.total);
    }
    println!("   {:<20} {:>12.2}", "Total", summary.total_spend);
    println!();
    println!("   {}", summary.summary);
    println!();

    Ok(())
}

pub fn cmd_budget_show(db: &Database, owner: &str) -> Result<()> {
    match db.get_budget(owner)? {
        Some(amount) => println!("💰 Monthly budget for {}: {:.2}", owner, amount),
        None => println!("No budget set. Set one with: sift budget set <amount>"),
    }
    Ok(())
}

pub fn cmd_budget_set(db: &Database, owner: &str, amount: f64) -> Result<()> {
    db.set_budget(owner, amount)?;
    println!("✅ Monthly budget for {} set to {:.2}", owner, amount);
    Ok(())
}

pub fn cmd_budget_clear(db: &Database, owner: &str) -> Result<()> {
    if db.clear_budget(owner)? {
        println!("✅ Budget cleared for {}", owner);
    } else {
        println!("No budget was set for {}", owner);
    }
    Ok(())
}
