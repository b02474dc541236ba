use std::fmt::Write;

use tikpulse_extract::benchmark_for;

use crate::generator::{AccountContext, VideoContext};

pub(crate) const SYSTEM_PROMPT: &str =
    "Tu es un expert TikTok. Réponds UNIQUEMENT en JSON valide.";

/// Captions longer than this are cut before being sent to the model.
const MAX_CAPTION_CHARS: usize = 500;

fn caption(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "(vide)".to_string();
    }
    trimmed.chars().take(MAX_CAPTION_CHARS).collect()
}

fn or_na(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "NA".to_string(), |v| format!("{v:.decimals$}"))
}

pub(crate) fn video_prompt(ctx: &VideoContext<'_>) -> String {
    let bench = benchmark_for(ctx.niche);
    let counts = &ctx.result.counts;
    let rates = ctx.rates;

    let mut prompt = String::from(
        "Tu es consultant TikTok expert. Analyse une VIDÉO à partir des données ci-dessous et retourne un JSON.\n",
    );
    let _ = writeln!(prompt, "Compte: @{}", ctx.username);
    let _ = writeln!(prompt, "Légende: {}", caption(&ctx.result.description));
    let _ = writeln!(
        prompt,
        "Hashtags: {}",
        ctx.result.hashtags.as_slice().join(" ")
    );
    let _ = writeln!(prompt, "Durée: {} s", ctx.result.duration_seconds);
    let _ = writeln!(
        prompt,
        "Vues: {} | Likes: {} | Commentaires: {} | Partages: {} | Enregistrements: {}",
        counts.views, counts.likes, counts.comments, counts.shares, counts.saves
    );
    let _ = writeln!(
        prompt,
        "Engagement: {:.2}% | Like: {:.2}% | Commentaire: {:.2}% | Partage: {:.2}% | Enregistrement: {:.2}%",
        rates.engagement_rate, rates.like_rate, rates.comment_rate, rates.share_rate, rates.save_rate
    );
    let _ = writeln!(prompt, "Niveau de performance: {}", ctx.performance);
    let _ = writeln!(prompt, "Niche détectée: {}", ctx.niche.label());
    let _ = writeln!(prompt, "Benchmark niche (ER): {}%", bench.engagement);
    let _ = write!(
        prompt,
        r#"
Retourne UNIQUEMENT ce JSON:
{{
  "analysis": {{
    "hook": "évaluation de l'accroche",
    "strengths": ["force 1", "force 2"],
    "weaknesses": ["faiblesse 1", "faiblesse 2"],
    "audience": "audience probable"
  }},
  "advice": [
    {{"title": "Conseil prioritaire 1", "details": "détail"}},
    {{"title": "Conseil 2", "details": "détail"}},
    {{"title": "Conseil 3", "details": "détail"}}
  ],
  "predictions": {{
    "targetER": "{:.1}%",
    "nextVideoIdeas": ["idée 1", "idée 2"]
  }}
}}"#,
        bench.engagement * 1.1
    );
    prompt
}

pub(crate) fn account_prompt(ctx: &AccountContext<'_>) -> String {
    let bench = benchmark_for(ctx.niche);
    let snapshot = ctx.snapshot;
    let metrics = ctx.metrics;
    let handle = if snapshot.user.unique_id.is_empty() {
        ctx.username
    } else {
        snapshot.user.unique_id.as_str()
    };

    let mut prompt = String::from(
        "Tu es consultant TikTok expert. Analyse un COMPTE à partir des données ci-dessous et retourne un JSON.\n",
    );
    let _ = writeln!(prompt, "Compte: @{handle}");
    let _ = writeln!(prompt, "Bio: {}", caption(&snapshot.user.bio));
    let _ = writeln!(prompt, "Followers: {}", snapshot.stats.follower_count);
    let _ = writeln!(prompt, "Following: {}", snapshot.stats.following_count);
    let _ = writeln!(
        prompt,
        "Ratio F/F: {}",
        or_na(metrics.follower_to_following_ratio, 2)
    );
    let _ = writeln!(prompt, "Vidéos échantillon: {}", metrics.sample_count);
    let _ = writeln!(prompt, "Vues moyennes (échant.): {:.0}", metrics.avg_views);
    let _ = writeln!(
        prompt,
        "Engagement moyen (échant.): {:.1}%",
        metrics.avg_engagement_rate
    );
    let _ = writeln!(
        prompt,
        "Posts/semaine (estim.): {}",
        or_na(metrics.posts_per_week, 1)
    );
    let _ = writeln!(prompt, "Top hashtags: {}", metrics.top_hashtags.join(" "));
    let _ = writeln!(prompt, "Niche détectée: {}", ctx.niche.label());
    let _ = writeln!(prompt, "Benchmark niche (ER): {}%", bench.engagement);
    let _ = write!(
        prompt,
        r#"
Retourne UNIQUEMENT ce JSON:
{{
  "analysis": {{
    "positioning": "positionnement clair",
    "contentPillars": ["pilier 1", "pilier 2", "pilier 3"],
    "hookPatterns": ["pattern 1", "pattern 2"],
    "editingPatterns": ["cut rapide", "sous-titres", "emoji"],
    "growthLevers": ["levier 1", "levier 2"]
  }},
  "advice": [
    {{"title": "Conseil prioritaire 1", "details": "détail"}},
    {{"title": "Conseil 2", "details": "détail"}},
    {{"title": "Conseil 3", "details": "détail"}},
    {{"title": "Conseil 4", "details": "détail"}},
    {{"title": "Conseil 5", "details": "détail"}}
  ],
  "predictions": {{
    "targetER": "{:.1}%",
    "targetPostsPerWeek": "3-5",
    "milestones90d": ["objectif 1", "objectif 2"]
  }}
}}"#,
        bench.engagement * 1.1
    );
    prompt
}
