//! Tier and top-bracket tables.

use std::fmt::Write as _;

use serde::Serialize;

use crate::distribution::RatingDistribution;

/// Ranked tiers and the rating at which each starts.
pub const TIERS: [(&str, i64); 6] = [
    ("Tin", 0),
    ("Bronze", 910),
    ("Silver", 1130),
    ("Gold", 1390),
    ("Plat", 1680),
    ("Diamond", 2000),
];

/// Top-percent brackets reported by [`bracket_table`].
pub const BRACKETS: [f64; 5] = [0.01, 0.1, 1.0, 10.0, 50.0];

/// Share of players at or above a tier's threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierRow {
    pub tier: &'static str,
    pub threshold: i64,
    pub top_pct: f64,
}

/// Minimum rating to be within a top-percent bracket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketRow {
    pub top_pct: f64,
    pub rating: i64,
}

/// Computes the [`TIERS`] table.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn tier_table(dist: &RatingDistribution) -> Vec<TierRow> {
    TIERS
        .iter()
        .map(|&(tier, threshold)| TierRow {
            tier,
            threshold,
            top_pct: 100.0 - dist.pct_below(threshold as f64),
        })
        .collect()
}

/// Computes the [`BRACKETS`] table.
#[must_use]
pub fn bracket_table(dist: &RatingDistribution) -> Vec<BracketRow> {
    BRACKETS
        .iter()
        .map(|&top_pct| BracketRow {
            top_pct,
            rating: dist.rating_for_top(top_pct),
        })
        .collect()
}

/// Formats a percentage with two decimals below 1 % and one otherwise.
#[must_use]
pub fn fmt_pct(pct: f64) -> String {
    if pct < 1.0 {
        format!("{pct:.2} %")
    } else {
        format!("{pct:.1} %")
    }
}

/// Renders both tables as aligned text.
#[must_use]
pub fn render_tables(tiers: &[TierRow], brackets: &[BracketRow]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Tier -> Percentile");
    let _ = writeln!(out, "──────────────────");
    let names: Vec<String> = tiers.iter().map(|t| format!("{:^8}", t.tier)).collect();
    let pcts: Vec<String> = tiers
        .iter()
        .map(|t| format!("{:^8}", fmt_pct(t.top_pct)))
        .collect();
    let _ = writeln!(out, "{}", names.join(" | "));
    let _ = writeln!(out, "{}", pcts.join(" | "));
    out.push('\n');

    let _ = writeln!(out, "Percentile -> Rating");
    let _ = writeln!(out, "────────────────────");
    let labels: Vec<String> = brackets
        .iter()
        .map(|b| format!("{:>8}", format!("Top {}%", b.top_pct)))
        .collect();
    let ratings: Vec<String> = brackets.iter().map(|b| format!("{:>8}", b.rating)).collect();
    let _ = writeln!(out, "{}", labels.join(" | "));
    let _ = writeln!(out, "{}", ratings.join(" | "));

    out
}
