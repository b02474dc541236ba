//! Live video and account analysis.

use tikpulse_advice::{
    heuristic_account_advice, heuristic_video_advice, AccountContext, AccountSignals,
    AdviceGenerator, AdviceItem, VideoContext,
};
use tikpulse_core::AppConfig;
use tikpulse_extract::{
    benchmark_for, derive_account_metrics, derive_rates, extract_with_trace,
    infer_niche_or_default, parse_profile, PerformanceThresholds, Strategy, DEFAULT_SAMPLE_SIZE,
};
use tikpulse_fetch::{
    profile_url, username_from_video_url, validate_page_url, validate_username, FetchMode,
    PageFetcher,
};

/// The LLM generator when `--ai` was requested and one is configured.
fn advice_generator(config: &AppConfig, ai: bool) -> anyhow::Result<Option<AdviceGenerator>> {
    if !ai {
        return Ok(None);
    }
    let generator = AdviceGenerator::from_config(config)?;
    if generator.is_none() {
        println!("note: --ai ignored; set OPENAI_API_KEY and TIKPULSE_AI_ENABLED to enable it");
    }
    Ok(generator)
}

fn print_advice(source: &str, items: &[AdviceItem]) {
    println!();
    println!("ADVICE ({source})");
    for item in items {
        println!("  - {}: {}", item.title, item.details);
    }
}

/// Fetch a video page, run the cascade and print a summary.
///
/// # Errors
///
/// Returns an error for invalid URLs, fetch failures, or pages with no
/// recoverable view count.
pub(crate) async fn run_analyze(
    config: &AppConfig,
    url: &str,
    proxy: bool,
    ai: bool,
) -> anyhow::Result<()> {
    let url = validate_page_url(url)?.to_string();
    let fetcher = PageFetcher::from_config(config)?;
    let mode = if proxy || config.use_proxy {
        FetchMode::Proxy
    } else {
        FetchMode::Direct
    };

    let page = fetcher.fetch(&url, mode).await?;
    let (result, trace) = extract_with_trace(&page.html);
    if result.has_no_views() {
        anyhow::bail!(
            "no view count found on {url}; the video may be private or the site layout changed"
        );
    }

    let username = username_from_video_url(&url);
    let rates = derive_rates(&result.counts, result.duration_seconds);
    let niche = infer_niche_or_default(&format!(
        "{} {}",
        result.description,
        result.hashtags.as_slice().join(" ")
    ));
    let performance = rates.performance_level();
    let bench = benchmark_for(niche);

    println!("@{username}  [{niche}]  via {:?}", page.method);
    if !result.description.is_empty() {
        println!("{}", result.description);
    }
    println!();
    println!("{:<14}{:>12}", "VIEWS", result.counts.views);
    println!("{:<14}{:>12}", "LIKES", result.counts.likes);
    println!("{:<14}{:>12}", "COMMENTS", result.counts.comments);
    println!("{:<14}{:>12}", "SHARES", result.counts.shares);
    println!("{:<14}{:>12}", "SAVES", result.counts.saves);
    println!();
    println!(
        "engagement {:.2}% (niche {:.1}%) -> {performance}",
        rates.engagement_rate, bench.engagement
    );
    let strategies: Vec<&str> = trace.contributors().into_iter().map(Strategy::as_str).collect();
    println!("strategies: {}", strategies.join(", "));

    if let Some(generator) = advice_generator(config, ai)? {
        let ctx = VideoContext {
            username: &username,
            result: &result,
            rates: &rates,
            niche,
            performance,
        };
        match generator.video_advice(&ctx).await {
            Ok(report) => {
                print_advice("llm", &report.advice);
                return Ok(());
            }
            Err(e) => tracing::warn!(error = %e, "LLM advice failed; using heuristics"),
        }
    }
    print_advice("heuristic", &heuristic_video_advice(&result, &rates, niche));
    Ok(())
}

/// Fetch a profile page, derive account metrics and print a summary.
///
/// # Errors
///
/// Returns an error for invalid usernames, fetch failures, or profile
/// pages that yield no data.
pub(crate) async fn run_account(config: &AppConfig, input: &str, ai: bool) -> anyhow::Result<()> {
    let username = validate_username(input)?;
    let fetcher = PageFetcher::from_config(config)?;
    let url = profile_url(&config.profile_base_url, &username);

    let page = fetcher.fetch(&url, FetchMode::DirectThenProxy).await?;
    let snapshot = parse_profile(&page.html);
    if snapshot.is_empty() {
        anyhow::bail!("no profile data found for @{username}; the account may be private");
    }

    let metrics = derive_account_metrics(&snapshot, DEFAULT_SAMPLE_SIZE);
    let niche = infer_niche_or_default(&snapshot.niche_text());
    let performance = PerformanceThresholds::default().classify(metrics.avg_engagement_rate);

    println!("@{username}  {}  [{niche}]", snapshot.user.nickname);
    println!();
    println!("{:<22}{:>12}", "FOLLOWERS", snapshot.stats.follower_count);
    println!("{:<22}{:>12}", "FOLLOWING", snapshot.stats.following_count);
    println!("{:<22}{:>12}", "LIKES", snapshot.stats.like_count);
    println!("{:<22}{:>12}", "VIDEOS", snapshot.stats.video_count);
    println!("{:<22}{:>12}", "SAMPLED", metrics.sample_count);
    println!("{:<22}{:>12.0}", "AVG VIEWS", metrics.avg_views);
    println!(
        "{:<22}{:>11.2}%",
        "AVG ENGAGEMENT", metrics.avg_engagement_rate
    );
    if let Some(ppw) = metrics.posts_per_week {
        println!("{:<22}{:>12.1}", "POSTS / WEEK", ppw);
    }
    println!("performance: {performance}");
    if !metrics.top_hashtags.is_empty() {
        println!("top hashtags: {}", metrics.top_hashtags.join(" "));
    }

    if let Some(generator) = advice_generator(config, ai)? {
        let ctx = AccountContext {
            username: &username,
            snapshot: &snapshot,
            metrics: &metrics,
            niche,
        };
        match generator.account_advice(&ctx).await {
            Ok(report) => {
                print_advice("llm", &report.advice);
                return Ok(());
            }
            Err(e) => tracing::warn!(error = %e, "LLM advice failed; using heuristics"),
        }
    }
    print_advice(
        "heuristic",
        &heuristic_account_advice(&AccountSignals {
            follower_to_following_ratio: metrics.follower_to_following_ratio,
            avg_engagement_rate: metrics.avg_engagement_rate,
            posts_per_week: metrics.posts_per_week,
            unique_hashtags_count: metrics.unique_hashtags_count,
            niche,
        }),
    );
    Ok(())
}
