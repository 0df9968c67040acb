//! Report rendering.
//!
//! Text output is for a human at a terminal; JSON output is for piping
//! into other tooling. Both carry the same facts: weights, annualized
//! performance, the volatility target, whether the fallback produced the
//! weights, and any data-quality notes from the estimators.

use meridian::Allocation;
use serde_json::{Value, json};

pub(crate) fn print_allocation_text(allocation: &Allocation, investment: Option<f64>) {
    println!("\n════════════════════════════════════════════════════");
    println!("  PORTFOLIO ALLOCATION");
    println!("════════════════════════════════════════════════════\n");

    match investment {
        Some(amount) => {
            println!("{:<12} {:>10} {:>16}", "Asset", "Weight", "Allocation");
            println!("────────────────────────────────────────────────────");
            for (asset, weight) in allocation.weights() {
                println!(
                    "{:<12} {:>9.2}% {:>16.2}",
                    asset,
                    weight * 100.0,
                    weight * amount
                );
            }
            println!("────────────────────────────────────────────────────");
            println!("{:<12} {:>9.2}% {:>16.2}", "Total", 100.0, amount);
        }
        None => {
            println!("{:<12} {:>10}", "Asset", "Weight");
            println!("──────────────────────────");
            for (asset, weight) in allocation.weights() {
                println!("{:<12} {:>9.2}%", asset, weight * 100.0);
            }
        }
    }

    println!("\nTarget Volatility:   {:>8.2}%", allocation.target_volatility * 100.0);
    println!(
        "Expected Return:     {:>8.2}%",
        allocation.performance.expected_return * 100.0
    );
    println!(
        "Volatility:          {:>8.2}%",
        allocation.performance.volatility * 100.0
    );
    println!("Sharpe Ratio:        {:>8.2}", allocation.performance.sharpe);

    if allocation.fallback {
        println!("\nNote: the volatility target was unreachable within the");
        println!("      weight bounds; showing the max-Sharpe portfolio instead.");
    }

    print_diagnostics(allocation);
    println!();
}

pub(crate) fn print_allocation_json(
    allocation: &Allocation,
    investment: Option<f64>,
) -> Result<(), serde_json::Error> {
    let mut output = allocation_value(allocation);
    if let Some(amount) = investment {
        output["investment"] = json!(amount);
        output["allocations"] = allocation
            .weights()
            .map(|(asset, weight)| json!({ "asset": asset, "amount": weight * amount }))
            .collect();
    }
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub(crate) fn print_frontier_text(rows: &[(u8, Allocation)]) {
    println!("\n════════════════════════════════════════════════════════════");
    println!("  RISK FRONTIER (scores 1-10)");
    println!("════════════════════════════════════════════════════════════\n");

    println!(
        "{:>5} {:>10} {:>10} {:>10} {:>8} {:>9}",
        "Score", "Target", "Vol", "Return", "Sharpe", "Fallback"
    );
    println!("────────────────────────────────────────────────────────────");
    for (score, allocation) in rows {
        println!(
            "{:>5} {:>9.2}% {:>9.2}% {:>9.2}% {:>8.2} {:>9}",
            score,
            allocation.target_volatility * 100.0,
            allocation.performance.volatility * 100.0,
            allocation.performance.expected_return * 100.0,
            allocation.performance.sharpe,
            if allocation.fallback { "yes" } else { "" }
        );
    }

    if let Some((_, first)) = rows.first() {
        print_diagnostics(first);
    }
    println!();
}

pub(crate) fn print_frontier_json(rows: &[(u8, Allocation)]) -> Result<(), serde_json::Error> {
    let points: Vec<Value> = rows
        .iter()
        .map(|(score, allocation)| {
            let mut value = allocation_value(allocation);
            value["risk_score"] = json!(score);
            value
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&json!({ "frontier": points }))?);
    Ok(())
}

fn allocation_value(allocation: &Allocation) -> Value {
    json!({
        "weights": allocation
            .weights()
            .map(|(asset, weight)| json!({ "asset": asset, "weight": weight }))
            .collect::<Vec<_>>(),
        "target_volatility": allocation.target_volatility,
        "performance": allocation.performance,
        "fallback": allocation.fallback,
        "diagnostics": allocation.diagnostics,
    })
}

fn print_diagnostics(allocation: &Allocation) {
    if allocation.diagnostics.is_clean() {
        return;
    }
    println!("\nData quality:");
    for item in allocation.diagnostics.items() {
        println!("  - {item}");
    }
}
