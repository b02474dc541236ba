use tikpulse_extract::Niche;

use crate::record::NichePlaybook;

/// Curated playbooks. Niches without one rely on computed patterns only.
#[must_use]
pub fn playbook_for(niche: Niche) -> Option<NichePlaybook> {
    match niche {
        Niche::Humour => Some(NichePlaybook {
            viral_triggers: &[
                "unexpected twist",
                "relatable situation",
                "perfect timing",
                "facial expressions",
            ],
            optimal_duration_secs: (15, 30),
            best_posting_times: &["12:00-14:00", "19:00-21:00"],
            reference_creators: &["@khaby.lame", "@zachking", "@brittany_broski"],
        }),
        Niche::Dance => Some(NichePlaybook {
            viral_triggers: &[
                "trending audio",
                "unique moves",
                "tutorial format",
                "duet potential",
            ],
            optimal_duration_secs: (15, 45),
            best_posting_times: &["16:00-18:00", "20:00-22:00"],
            reference_creators: &["@charlidamelio", "@michael.le", "@jalaiah"],
        }),
        Niche::Education => Some(NichePlaybook {
            viral_triggers: &[
                "quick tips",
                "visual demonstrations",
                "problem-solving",
                "life hacks",
            ],
            optimal_duration_secs: (30, 60),
            best_posting_times: &["08:00-10:00", "15:00-17:00"],
            reference_creators: &["@onlyjayus", "@bentellect", "@cost_n_mayor"],
        }),
        _ => None,
    }
}
