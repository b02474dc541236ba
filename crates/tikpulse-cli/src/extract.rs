//! Offline extraction from a saved page.

use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tikpulse_extract::{
    benchmark_for, derive_rates, infer_niche_or_default, Cascade, CascadePolicy, ExtractionResult,
    ExtractionTrace, Niche, PerformanceLevel, RateSet,
};

#[derive(Debug, Serialize)]
pub(crate) struct ExtractionReport {
    pub result: ExtractionResult,
    pub rates: RateSet,
    pub performance_level: PerformanceLevel,
    pub niche: Niche,
    pub niche_engagement_benchmark: f64,
    pub trace: ExtractionTrace,
}

pub(crate) fn extraction_report(html: &str, policy: CascadePolicy) -> ExtractionReport {
    let (result, trace) = Cascade::new(policy).extract_with_trace(html);
    let rates = derive_rates(&result.counts, result.duration_seconds);
    let niche = infer_niche_or_default(&format!(
        "{} {}",
        result.description,
        result.hashtags.as_slice().join(" ")
    ));
    ExtractionReport {
        performance_level: rates.performance_level(),
        niche_engagement_benchmark: benchmark_for(niche).engagement,
        result,
        rates,
        niche,
        trace,
    }
}

/// Print the extraction report for `file` as pretty JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub(crate) fn run_extract(file: &Path, views_only: bool) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let policy = if views_only {
        CascadePolicy::ViewsOnly
    } else {
        CascadePolicy::RequireComplete
    };

    let report = extraction_report(&html, policy);
    if report.result.has_no_views() {
        tracing::warn!(file = %file.display(), "no view count recovered");
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PAGE: &str = r#"<html><head>
      <meta property="og:description" content="Leg day #gym #fitness">
      <meta property="og:image" content="https://p16.example/og.jpeg">
    </head><body>
      <script type="application/ld+json">
        {"@type":"VideoObject","description":"Leg day #gym #fitness","thumbnailUrl":"https://p16.example/ld.jpeg",
         "interactionStatistic":[
           {"interactionType":"http://schema.org/WatchAction","userInteractionCount":"10000"},
           {"interactionType":"http://schema.org/LikeAction","userInteractionCount":"900"}]}
      </script>
    </body></html>"#;

    #[test]
    fn report_carries_rates_niche_and_trace() {
        let report = extraction_report(PAGE, CascadePolicy::RequireComplete);

        assert_eq!(report.result.counts.views, 10_000);
        assert_eq!(report.result.counts.likes, 900);
        assert_eq!(report.niche, Niche::Fitness);
        assert!((report.rates.like_rate - 9.0).abs() < f64::EPSILON);
        assert!(!report.trace.steps.is_empty());
    }

    #[test]
    fn run_extract_reads_saved_page() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PAGE.as_bytes()).unwrap();
        run_extract(file.path(), true).unwrap();
    }

    #[test]
    fn run_extract_reports_missing_file() {
        let err = run_extract(Path::new("/definitely/not/here.html"), false).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
