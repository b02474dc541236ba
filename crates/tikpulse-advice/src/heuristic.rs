//! Rule-based advice. No network, fully deterministic.

use tikpulse_extract::{benchmark_for, ExtractionResult, Niche, RateSet};

use crate::report::AdviceItem;

/// Fraction of the niche benchmark below which engagement is flagged.
const WEAK_ENGAGEMENT_FACTOR: f64 = 0.6;
const MIN_POSTS_PER_WEEK: f64 = 2.0;
const MIN_UNIQUE_HASHTAGS: usize = 5;
const MIN_VIDEO_HASHTAGS: usize = 3;
const MAX_VIDEO_HASHTAGS: usize = 10;
const LONG_VIDEO_SECS: u64 = 60;
const LOW_COMPLETION_RATE: f64 = 50.0;
const LOW_SAVE_RATE: f64 = 0.5;

/// Tips for a single video, compared against its niche benchmark.
#[must_use]
pub fn heuristic_video_advice(
    result: &ExtractionResult,
    rates: &RateSet,
    niche: Niche,
) -> Vec<AdviceItem> {
    let bench = benchmark_for(niche);
    let mut tips = Vec::new();

    if rates.engagement_rate < bench.engagement * WEAK_ENGAGEMENT_FACTOR {
        tips.push(AdviceItem::new(
            "Hook",
            format!(
                "Engagement sous la moyenne de la niche ({:.1}% < {}%). Accroche plus forte dans les 2 premières secondes.",
                rates.engagement_rate, bench.engagement
            ),
        ));
    }
    if rates.comment_rate < bench.comments {
        tips.push(AdviceItem::new(
            "Commentaires",
            "Termine par une question ouverte pour déclencher les commentaires.",
        ));
    }
    if rates.share_rate < bench.shares {
        tips.push(AdviceItem::new(
            "Partages",
            "Ajoute un moment « à envoyer à un ami » : astuce, chute ou réaction.",
        ));
    }
    if rates.save_rate < LOW_SAVE_RATE {
        tips.push(AdviceItem::new(
            "Enregistrements",
            "Donne une info réutilisable (liste, étapes, ressource) pour inciter à enregistrer.",
        ));
    }
    if result.duration_seconds > LONG_VIDEO_SECS
        && rates.estimated_completion_rate < LOW_COMPLETION_RATE
    {
        tips.push(AdviceItem::new(
            "Durée",
            format!(
                "Vidéo de {} s avec une rétention estimée faible : vise 15 à 45 s.",
                result.duration_seconds
            ),
        ));
    }
    if result.description.trim().is_empty() {
        tips.push(AdviceItem::new(
            "Légende",
            "Ajoute une légende qui annonce la promesse de la vidéo.",
        ));
    }
    if result.hashtags.len() < MIN_VIDEO_HASHTAGS {
        tips.push(AdviceItem::new(
            "Hashtags",
            format!("Utilise 3 à 5 hashtags ciblés de la niche {}.", niche.label()),
        ));
    } else if result.hashtags.len() > MAX_VIDEO_HASHTAGS {
        tips.push(AdviceItem::new(
            "Hashtags",
            "Trop de hashtags dilue le signal : garde les 5 plus pertinents.",
        ));
    }

    if tips.is_empty() {
        tips.push(AdviceItem::new(
            "Continuer",
            "Bonne performance : décline ce format en série et teste 3 variantes de hook.",
        ));
    }
    tips
}

/// Inputs for account-level heuristics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountSignals {
    pub follower_to_following_ratio: Option<f64>,
    pub avg_engagement_rate: f64,
    pub posts_per_week: Option<f64>,
    pub unique_hashtags_count: usize,
    pub niche: Niche,
}

/// Tips for an account, from its sampled metrics.
#[must_use]
pub fn heuristic_account_advice(signals: &AccountSignals) -> Vec<AdviceItem> {
    let bench = benchmark_for(signals.niche);
    let mut tips = Vec::new();

    if signals.follower_to_following_ratio.is_some_and(|r| r < 1.0) {
        tips.push(AdviceItem::new(
            "Ratio",
            "Le ratio abonnés/suivis est faible : nettoie tes abonnements et renforce l'autorité de niche.",
        ));
    }
    if signals.avg_engagement_rate < bench.engagement * WEAK_ENGAGEMENT_FACTOR {
        tips.push(AdviceItem::new(
            "Engagement",
            format!(
                "Engagement moyen inférieur à la niche ({:.1}% < {}%). Renforce le hook et clarifie la promesse de chaque contenu.",
                signals.avg_engagement_rate, bench.engagement
            ),
        ));
    }
    if signals.posts_per_week.is_none_or(|p| p < MIN_POSTS_PER_WEEK) {
        tips.push(AdviceItem::new(
            "Fréquence",
            "Fréquence basse : vise 3 à 5 publications par semaine pour créer des signaux réguliers.",
        ));
    }
    if signals.unique_hashtags_count < MIN_UNIQUE_HASHTAGS {
        tips.push(AdviceItem::new(
            "Hashtags",
            "Hashtags trop génériques : cible 5 à 10 hashtags de sous-niche réellement recherchés.",
        ));
    }

    if tips.is_empty() {
        tips.push(AdviceItem::new(
            "Continuer",
            "Bon cap : garde le rythme et lance un test A/B sur les hooks (3 variantes).",
        ));
    }
    tips
}
