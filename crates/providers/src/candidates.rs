//! Candidate selection.
//!
//! The upstream may return several candidates, each with safety ratings.
//! The one whose highest safety probability is largest wins; ties go to the
//! earliest candidate.

use cg_domain::trace::TraceEvent;

use crate::types::Candidate;

/// The candidate picked for the reply.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedCandidate {
    /// Position in the upstream `candidates` list.
    pub index: usize,
    pub text: String,
    pub safety_score: Option<f64>,
}

/// Pick the candidate with the maximum safety score.
///
/// A candidate without ratings ranks below any rated one.  Returns `None`
/// when the list is empty or the winner carries no text content.
pub fn select_candidate(candidates: &[Candidate]) -> Option<SelectedCandidate> {
    let mut best: Option<(usize, Option<f64>)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let score = candidate.safety_score();
        match best {
            Some((_, best_score)) if !outranks(score, best_score) => {}
            _ => best = Some((i, score)),
        }
    }

    let (index, safety_score) = best?;
    let text = candidates[index]
        .content
        .as_ref()
        .and_then(|c| c.joined_text())?;

    TraceEvent::CandidateSelected {
        index,
        candidates: candidates.len(),
        safety_score,
    }
    .emit();

    Some(SelectedCandidate {
        index,
        text,
        safety_score,
    })
}

/// Strictly greater; `None` is below every score.
fn outranks(score: Option<f64>, current: Option<f64>) -> bool {
    match (score, current) {
        (Some(s), Some(c)) => s > c,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Content, Probability, SafetyRating};

    fn candidate(text: Option<&str>, scores: &[f64]) -> Candidate {
        Candidate {
            content: text.map(|t| Content::text("model", t)),
            safety_ratings: scores
                .iter()
                .map(|s| SafetyRating {
                    category: "HARM_CATEGORY_HARASSMENT".into(),
                    probability: Probability::Score(*s),
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_list_selects_nothing() {
        assert_eq!(select_candidate(&[]), None);
    }

    #[test]
    fn highest_score_wins_first_on_tie() {
        let candidates = vec![
            candidate(Some("a"), &[0.2]),
            candidate(Some("b"), &[0.9]),
            candidate(Some("c"), &[0.9]),
        ];
        let selected = select_candidate(&candidates).unwrap();
        assert_eq!(selected.index, 1);
        assert_eq!(selected.text, "b");
        assert_eq!(selected.safety_score, Some(0.9));
    }

    #[test]
    fn candidate_score_is_its_max_rating() {
        let candidates = vec![
            candidate(Some("a"), &[0.1, 0.8]),
            candidate(Some("b"), &[0.5, 0.6]),
        ];
        assert_eq!(select_candidate(&candidates).unwrap().index, 0);
    }

    #[test]
    fn unrated_candidates_rank_lowest() {
        let candidates = vec![candidate(Some("a"), &[]), candidate(Some("b"), &[0.0])];
        assert_eq!(select_candidate(&candidates).unwrap().index, 1);

        let only_unrated = vec![candidate(Some("a"), &[]), candidate(Some("b"), &[])];
        let selected = select_candidate(&only_unrated).unwrap();
        assert_eq!(selected.index, 0);
        assert_eq!(selected.safety_score, None);
    }

    #[test]
    fn winner_without_text_selects_nothing() {
        let candidates = vec![candidate(Some("a"), &[0.1]), candidate(None, &[0.9])];
        assert_eq!(select_candidate(&candidates), None);
    }

    #[test]
    fn level_probabilities_rank_by_severity() {
        let rated = |text: &str, level: &str| Candidate {
            content: Some(Content::text("model", text)),
            safety_ratings: vec![SafetyRating {
                category: "HARM_CATEGORY_HATE_SPEECH".into(),
                probability: Probability::Level(level.into()),
            }],
            ..Default::default()
        };
        let candidates = vec![rated("a", "NEGLIGIBLE"), rated("b", "MEDIUM"), rated("c", "LOW")];
        assert_eq!(select_candidate(&candidates).unwrap().text, "b");
    }
}
