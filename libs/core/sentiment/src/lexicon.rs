// [libs/core/sentiment/src/lexicon.rs]
/*!
 * Nivel 3 de la cascada: clasificador léxico determinista sobre un
 * vocabulario italiano (§4.3). Es el piso garantizado: no depende de
 * red y siempre produce un resultado.
 */

use std::collections::HashMap;

const JOY: &[&str] = &["felice", "contento", "ottimo", "grazie", "perfetto", "soddisfatto"];
const ANGER: &[&str] = &["arrabbiato", "inaccettabile", "vergogna", "pessimo", "furioso", "scandaloso"];
const FEAR: &[&str] = &["preoccupato", "paura", "rischio", "incerto"];
const SADNESS: &[&str] = &["deluso", "triste", "peccato", "dispiaciuto"];
const SURPRISE: &[&str] = &["sorpreso", "incredibile", "inaspettato"];

/// Tokens que por sí solos disparan `requires_escalation` (§4.3 paso 5).
pub const LEGAL_THREAT_TOKENS: &[&str] = &["avvocato", "denuncia", "causa legale", "tribunale"];
pub const MANAGER_REQUEST_PHRASES: &[&str] = &["parlare con il responsabile", "parlare con un supervisore"];

pub struct KeywordOutcome {
    pub emotions: HashMap<String, f32>,
    pub dominant_emotion: String,
    pub score: f32,
    pub has_legal_threat: bool,
    pub has_manager_request: bool,
}

fn count_matches(lowered: &str, vocabulary: &[&str]) -> u32 {
    vocabulary.iter().filter(|word| lowered.contains(*word)).count() as u32
}

/// Clasifica `text` contra el lexicón fijo. Determinista: mismo texto,
/// mismo resultado, siempre.
pub fn classify(text: &str) -> KeywordOutcome {
    let lowered = text.to_lowercase();

    let counts = [
        ("joy", count_matches(&lowered, JOY)),
        ("anger", count_matches(&lowered, ANGER)),
        ("fear", count_matches(&lowered, FEAR)),
        ("sadness", count_matches(&lowered, SADNESS)),
        ("surprise", count_matches(&lowered, SURPRISE)),
    ];

    let total: u32 = counts.iter().map(|(_, count)| count).sum();
    let mut emotions = HashMap::new();
    for (label, count) in &counts {
        let intensity = if total == 0 { 0.0 } else { *count as f32 / total as f32 };
        emotions.insert(label.to_string(), intensity);
    }

    let dominant_emotion = if total == 0 {
        "neutral".to_string()
    } else {
        broker_domain_models::sentiment::SentimentRecord::dominant_from(&emotions)
    };

    let joy_share = emotions.get("joy").copied().unwrap_or(0.0);
    let negative_share = emotions.get("anger").copied().unwrap_or(0.0)
        + emotions.get("fear").copied().unwrap_or(0.0)
        + emotions.get("sadness").copied().unwrap_or(0.0);
    let score = if total == 0 { 0.0 } else { (joy_share - negative_share).clamp(-1.0, 1.0) };

    let has_legal_threat = LEGAL_THREAT_TOKENS.iter().any(|token| lowered.contains(token));
    let has_manager_request = MANAGER_REQUEST_PHRASES.iter().any(|phrase| lowered.contains(phrase));

    KeywordOutcome { emotions, dominant_emotion, score, has_legal_threat, has_manager_request }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_anger_and_legal_threat() {
        let outcome = classify("Voglio parlare con un avvocato, è inaccettabile");
        assert!(outcome.has_legal_threat);
        assert_eq!(outcome.dominant_emotion, "anger");
        assert!(outcome.score <= -0.5);
    }

    #[test]
    fn neutral_text_has_zero_score() {
        let outcome = classify("Il pacco arriva domani");
        assert_eq!(outcome.score, 0.0);
        assert_eq!(outcome.dominant_emotion, "neutral");
    }
}
