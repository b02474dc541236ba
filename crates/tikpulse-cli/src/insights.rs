//! Read-only queries over stored analyses.

use tikpulse_core::AppConfig;
use tikpulse_extract::Niche;
use tikpulse_store::{AggregateStats, AnalysisStore, NicheInsights};

fn parse_niche(raw: &str) -> anyhow::Result<Niche> {
    Niche::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = Niche::ALL.iter().map(|n| n.slug()).collect();
        anyhow::anyhow!("unknown niche '{raw}'; expected one of {}", known.join(", "))
    })
}

fn print_insights(insights: &NicheInsights) {
    println!("{} ({})", insights.niche.label(), insights.niche.slug());

    if let Some(playbook) = &insights.playbook {
        let (min, max) = playbook.optimal_duration_secs;
        println!();
        println!("PLAYBOOK");
        println!("  triggers: {}", playbook.viral_triggers.join(", "));
        println!("  duration: {min}-{max}s");
        println!("  post at:  {}", playbook.best_posting_times.join(", "));
    }

    match &insights.recent_trends {
        Some(trends) => {
            println!();
            println!(
                "TRENDS  {} analyses, avg engagement {:.2}%, viral above {:.2}%",
                trends.sample_size, trends.avg_engagement, trends.viral_threshold
            );
            for tag in &trends.top_hashtags {
                println!("  {:<24}{}", tag.tag, tag.count);
            }
        }
        None => println!("\nno trends yet; patterns need more stored analyses"),
    }

    if !insights.top_performers.is_empty() {
        println!();
        println!("{:<24}{:>12}{:>12}", "TOP PERFORMER", "VIEWS", "ENGAGEMENT");
        for p in &insights.top_performers {
            println!("{:<24}{:>12}{:>11.2}%", p.username, p.views, p.engagement);
        }
    }

    for rec in &insights.recommendations {
        println!("[{:?}] {}", rec.priority, rec.message);
    }
}

/// Print stored insights for `niche`, plus the `recent` latest analyses.
///
/// # Errors
///
/// Returns an error for unknown niches or store failures.
pub(crate) async fn run_insights(
    config: &AppConfig,
    niche: &str,
    recent: Option<usize>,
) -> anyhow::Result<()> {
    let niche = parse_niche(niche)?;
    let store = AnalysisStore::from_config(config)?;
    if store.kv().backend_name() == "memory" {
        println!("note: memory store is empty in a fresh process; set TIKPULSE_STORE_BACKEND=file or rest");
    }

    let insights = store.niche_insights(niche).await?;
    print_insights(&insights);

    if let Some(limit) = recent {
        let analyses = store.get_analyses_by_niche(niche, limit).await?;
        let agg = AggregateStats::from_records(&analyses);
        println!();
        println!(
            "RECENT  {} analyses, {} views, avg engagement {:.2}%",
            agg.count, agg.total_views, agg.avg_engagement
        );
        for a in &analyses {
            println!(
                "  {}  @{:<20}{:>12}{:>9.2}%",
                a.timestamp.format("%Y-%m-%d %H:%M"),
                a.username,
                a.stats.views,
                a.metrics.engagement_rate
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_niche_accepts_slug_and_label() {
        assert_eq!(parse_niche("cuisine").unwrap(), Niche::Cuisine);
        assert_eq!(parse_niche("Beauté/Mode").unwrap(), Niche::Beauty);
    }

    #[test]
    fn parse_niche_lists_known_slugs_on_error() {
        let err = parse_niche("knitting").unwrap_err().to_string();
        assert!(err.contains("knitting"));
        assert!(err.contains("humour"));
    }
}
