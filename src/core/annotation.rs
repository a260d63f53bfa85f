//! Annotation interpreter
//!
//! Stock counters write short notes next to a product line ("falta 6",
//! "passando 20 investigar", "2 caixas molhadas"). This module turns such a
//! note plus the expected system quantity into a physical count, a signed
//! difference and a status.
//!
//! Rules are tried in a fixed order and the first hit wins:
//!
//! 1. shortage verb at the start of the note (`falta 6 ...`, `f. 6 ...`)
//! 2. surplus verb at the start of the note (`sobra 3 ...`, `passou 8 ...`)
//! 3. shortage verb followed by a number anywhere in the note
//! 4. surplus verb followed by a number anywhere in the note
//! 5. a damage keyword anywhere in the note
//!
//! Anything else is kept as a plain observation with no quantity effect.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::text::{fold, is_placeholder, map_folded_offset, normalize_note};

/// Reconciliation status of a product line
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Ok,
    Short,
    Over,
    Damaged,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Short => "short",
            Status::Over => "over",
            Status::Damaged => "damaged",
        }
    }

    /// Any status other than `ok` counts as a divergence
    pub fn is_divergent(&self) -> bool {
        *self != Status::Ok
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ok" => Ok(Status::Ok),
            "short" => Ok(Status::Short),
            "over" => Ok(Status::Over),
            "damaged" => Ok(Status::Damaged),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// What a note says, before it is applied to a quantity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Short { units: i64, observation: String },
    Over { units: i64, observation: String },
    Damaged { observation: String },
    Ok { observation: String },
}

impl ParseOutcome {
    pub fn status(&self) -> Status {
        match self {
            ParseOutcome::Short { .. } => Status::Short,
            ParseOutcome::Over { .. } => Status::Over,
            ParseOutcome::Damaged { .. } => Status::Damaged,
            ParseOutcome::Ok { .. } => Status::Ok,
        }
    }

    /// Signed adjustment to apply to the system quantity
    pub fn delta(&self) -> i64 {
        match self {
            ParseOutcome::Short { units, .. } => -units,
            ParseOutcome::Over { units, .. } => *units,
            ParseOutcome::Damaged { .. } | ParseOutcome::Ok { .. } => 0,
        }
    }

    pub fn into_observation(self) -> String {
        match self {
            ParseOutcome::Short { observation, .. }
            | ParseOutcome::Over { observation, .. }
            | ParseOutcome::Damaged { observation }
            | ParseOutcome::Ok { observation } => observation,
        }
    }
}

/// Result of applying a note to a system quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interpretation {
    pub physical_quantity: i64,
    pub difference: i64,
    pub observation: String,
    pub status: Status,
}

impl Interpretation {
    fn from_outcome(outcome: ParseOutcome, system_quantity: i64) -> Self {
        let status = outcome.status();
        let difference = outcome.delta();
        Self {
            // rules reject overflowing quantities before this point
            physical_quantity: system_quantity.saturating_add(difference),
            difference,
            observation: outcome.into_observation(),
            status,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Adjustment {
    Short,
    Over,
}

/// Which text becomes the observation when a quantity rule matches
#[derive(Debug, Clone, Copy)]
enum Observation {
    /// Text after the number
    Remainder,
    /// The whole trimmed note, for numbers buried mid-sentence
    WholeNote,
}

struct QuantityRule {
    adjustment: Adjustment,
    observation: Observation,
    pattern: Regex,
}

impl QuantityRule {
    fn new(adjustment: Adjustment, observation: Observation, pattern: &str) -> Self {
        Self {
            adjustment,
            observation,
            pattern: Regex::new(pattern).expect("annotation pattern must compile"),
        }
    }

    /// Try this rule against a prepared note
    ///
    /// With a system quantity, a match whose adjustment would overflow it is
    /// rejected so the note falls through to the next rule.
    fn apply(&self, note: &PreparedNote<'_>, system_quantity: Option<i64>) -> Option<ParseOutcome> {
        let caps = self.pattern.captures(&note.folded)?;
        let units: i64 = caps.get(1)?.as_str().parse().ok()?;
        if let Some(sq) = system_quantity {
            let adjusted = match self.adjustment {
                Adjustment::Short => sq.checked_sub(units),
                Adjustment::Over => sq.checked_add(units),
            };
            adjusted?;
        }

        let observation = match self.observation {
            Observation::Remainder => match caps.get(2) {
                Some(rest) => {
                    let start = map_folded_offset(&note.lower, &note.folded, rest.start());
                    note.lower[start..].trim().to_string()
                }
                None => String::new(),
            },
            Observation::WholeNote => note.original.to_string(),
        };

        Some(match self.adjustment {
            Adjustment::Short => ParseOutcome::Short { units, observation },
            Adjustment::Over => ParseOutcome::Over { units, observation },
        })
    }
}

const SHORT_ANCHORED: &str =
    r"^(?:falt(?:aram|ando|am|ou|a)?\.?|f\.?)(?:\s+(?:de|do|da))?\s+([0-9]+)\s*(.*)$";
const OVER_ANCHORED: &str = r"^(?:sobr(?:aram|ando|am|ou|a)?\.?|pass(?:aram|ando|ou|a)?\.?|s\.?)(?:\s+(?:de|do|da))?\s+([0-9]+)\s*(.*)$";
const SHORT_ANYWHERE: &str = r"falt\w*\s+(?:de\s+)?([0-9]+)";
const OVER_ANYWHERE: &str = r"(?:sobr|pass)\w*\s+(?:de\s+)?([0-9]+)";

static QUANTITY_RULES: LazyLock<Vec<QuantityRule>> = LazyLock::new(|| {
    vec![
        QuantityRule::new(Adjustment::Short, Observation::Remainder, SHORT_ANCHORED),
        QuantityRule::new(Adjustment::Over, Observation::Remainder, OVER_ANCHORED),
        QuantityRule::new(Adjustment::Short, Observation::WholeNote, SHORT_ANYWHERE),
        QuantityRule::new(Adjustment::Over, Observation::WholeNote, OVER_ANYWHERE),
    ]
});

/// Word stems that mark a product as physically damaged, matched as
/// substrings so inflections ("quebrado", "quebradas") are covered
const DAMAGE_STEMS: &[&str] = &[
    "danificad",
    "avaria",
    "quebrad",
    "defeito",
    "vencid",
    "impropri",
    "vazand",
    "estraga",
    "molhad",
    "rasgad",
    "furad",
    "amassad",
    "contaminad",
];

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("number pattern must compile"));

/// A note in the three shapes the rules need
struct PreparedNote<'a> {
    /// Trimmed, otherwise untouched
    original: &'a str,
    /// Lowercase with whitespace collapsed
    lower: String,
    /// `lower` with accents folded; same char count as `lower`
    folded: String,
}

impl<'a> PreparedNote<'a> {
    fn new(note: &'a str) -> Self {
        let original = note.trim();
        let lower = normalize_note(original);
        let folded = fold(&lower);
        Self {
            original,
            lower,
            folded,
        }
    }
}

/// Classify a note without applying it to a quantity
pub fn parse(note: &str) -> ParseOutcome {
    parse_against(note, None)
}

fn parse_against(note: &str, system_quantity: Option<i64>) -> ParseOutcome {
    if is_placeholder(note) {
        return ParseOutcome::Ok {
            observation: String::new(),
        };
    }

    let prepared = PreparedNote::new(note);

    if let Some(outcome) = QUANTITY_RULES
        .iter()
        .find_map(|rule| rule.apply(&prepared, system_quantity)) {
        return outcome;
    }

    if DAMAGE_STEMS.iter().any(|stem| prepared.folded.contains(stem)) {
        return ParseOutcome::Damaged {
            observation: prepared.original.to_string(),
        };
    }

    ParseOutcome::Ok {
        observation: prepared.original.to_string(),
    }
}

/// Interpret a counter's note against the expected system quantity
///
/// Total for any input: an unrecognized note is kept as an observation and
/// leaves the quantity untouched. A shortage larger than the system quantity
/// yields a negative physical quantity.
pub fn interpret(note: &str, system_quantity: i64) -> Interpretation {
    Interpretation::from_outcome(parse_against(note, Some(system_quantity)), system_quantity)
}

/// Number of damaged units mentioned in a note, for display only
///
/// This is the first digit run in the note and is never checked against the
/// system quantity.
pub fn damaged_units(note: &str) -> Option<u64> {
    FIRST_NUMBER
        .find(note)
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(i: Interpretation) -> (i64, i64, String, Status) {
        (i.physical_quantity, i.difference, i.observation, i.status)
    }

    #[test]
    fn test_shortage_with_name() {
        assert_eq!(
            tuple(interpret("falta 6 serginho", 50)),
            (44, -6, "serginho".to_string(), Status::Short)
        );
    }

    #[test]
    fn test_surplus_with_remark() {
        assert_eq!(
            tuple(interpret("passando 20 investigar", 100)),
            (120, 20, "investigar".to_string(), Status::Over)
        );
    }

    #[test]
    fn test_empty_note() {
        assert_eq!(tuple(interpret("", 10)), (10, 0, String::new(), Status::Ok));
        assert_eq!(tuple(interpret("   ", 10)), (10, 0, String::new(), Status::Ok));
        assert_eq!(tuple(interpret("NaN", 10)), (10, 0, String::new(), Status::Ok));
        assert_eq!(tuple(interpret("None", 10)), (10, 0, String::new(), Status::Ok));
    }

    #[test]
    fn test_damage_keeps_quantity_and_note() {
        assert_eq!(
            tuple(interpret("produto danificado vazando", 30)),
            (30, 0, "produto danificado vazando".to_string(), Status::Damaged)
        );
    }

    #[test]
    fn test_shortage_verb_forms() {
        for note in [
            "falta 3",
            "faltando 3",
            "faltam 3",
            "faltou 3",
            "faltaram 3",
            "falta de 3",
            "faltou do 3",
            "f. 3",
            "f 3",
            "FALTA 3",
            "Faltá 3",
        ] {
            let i = interpret(note, 10);
            assert_eq!(i.status, Status::Short, "note: {note}");
            assert_eq!(i.difference, -3, "note: {note}");
            assert_eq!(i.physical_quantity, 7, "note: {note}");
        }
    }

    #[test]
    fn test_surplus_verb_forms() {
        for note in [
            "sobra 4",
            "sobrando 4",
            "sobram 4",
            "sobrou 4",
            "sobraram 4",
            "passa 4",
            "passaram 4",
            "passou 4",
            "s. 4",
            "S 4",
        ] {
            let i = interpret(note, 10);
            assert_eq!(i.status, Status::Over, "note: {note}");
            assert_eq!(i.difference, 4, "note: {note}");
            assert_eq!(i.physical_quantity, 14, "note: {note}");
        }
    }

    #[test]
    fn test_remainder_is_lowercased_and_collapsed() {
        let i = interpret("  FALTA 2   Caixa   Aberta ", 5);
        assert_eq!(i.observation, "caixa aberta");
    }

    #[test]
    fn test_remainder_keeps_accents() {
        let i = interpret("faltou 2 não achei", 5);
        assert_eq!(i.observation, "não achei");
    }

    #[test]
    fn test_first_number_wins() {
        let i = interpret("falta 6 de 12 caixas", 50);
        assert_eq!(i.difference, -6);
        assert_eq!(i.observation, "de 12 caixas");
    }

    #[test]
    fn test_buried_shortage_keeps_whole_note() {
        let i = interpret("conferido ontem, faltam 4 unidades", 20);
        assert_eq!(
            tuple(i),
            (16, -4, "conferido ontem, faltam 4 unidades".to_string(), Status::Short)
        );
    }

    #[test]
    fn test_buried_surplus_keeps_whole_note() {
        let i = interpret("Contagem: sobrou 7 no deposito", 20);
        assert_eq!(
            tuple(i),
            (27, 7, "Contagem: sobrou 7 no deposito".to_string(), Status::Over)
        );
    }

    #[test]
    fn test_shortage_beats_damage() {
        let i = interpret("falta 2 e 1 danificado", 10);
        assert_eq!(i.status, Status::Short);
        assert_eq!(i.difference, -2);

        let i = interpret("caixa molhada, faltou 3", 10);
        assert_eq!(i.status, Status::Short);
        assert_eq!(i.difference, -3);
    }

    #[test]
    fn test_anchored_surplus_beats_buried_shortage() {
        let i = interpret("sobra 5 mas faltou 2 ontem", 10);
        assert_eq!(i.status, Status::Over);
        assert_eq!(i.difference, 5);
    }

    #[test]
    fn test_shortage_may_exceed_system_quantity() {
        let i = interpret("falta 15", 10);
        assert_eq!(i.physical_quantity, -5);
        assert_eq!(i.difference, -15);
    }

    #[test]
    fn test_unrecognized_note_is_preserved() {
        assert_eq!(
            tuple(interpret("  ver com o gerente ", 8)),
            (8, 0, "ver com o gerente".to_string(), Status::Ok)
        );
    }

    #[test]
    fn test_verb_without_number_is_not_adjustment() {
        let i = interpret("falta conferir", 8);
        assert_eq!(i.status, Status::Ok);
        assert_eq!(i.difference, 0);
    }

    #[test]
    fn test_damage_stems_match_inflections() {
        for note in ["2 quebradas", "VENCIDO", "embalagem rasgada", "avariado", "amassadas"] {
            assert_eq!(interpret(note, 1).status, Status::Damaged, "note: {note}");
        }
    }

    #[test]
    fn test_overflowing_number_falls_through() {
        let i = interpret("falta 99999999999999999999999", 10);
        assert_eq!(i.difference, 0);
        assert_eq!(i.status, Status::Ok);
    }

    #[test]
    fn test_adjustment_past_i64_falls_through() {
        let i = interpret("sobra 9223372036854775807", 10);
        assert_eq!(i.physical_quantity, 10);
        assert_eq!(i.difference, 0);
        assert_eq!(i.status, Status::Ok);
        assert_eq!(i.observation, "sobra 9223372036854775807");

        let i = interpret("falta 9223372036854775807", -10);
        assert_eq!(i.physical_quantity, -10);
        assert_eq!(i.status, Status::Ok);

        // still fits, so the shortage applies
        let i = interpret("falta 9223372036854775807", 10);
        assert_eq!(i.difference, -9223372036854775807);
        assert_eq!(i.physical_quantity, 10 - 9223372036854775807);

        // parse alone knows no quantity and keeps the match
        assert_eq!(parse("sobra 9223372036854775807").status(), Status::Over);
    }

    #[test]
    fn test_difference_invariant() {
        for (note, sq) in [
            ("falta 6 serginho", 50),
            ("passa 8", 3),
            ("danificado", 9),
            ("", 0),
            ("faltaram 100", 1),
            ("lixo qualquer", 42),
        ] {
            let i = interpret(note, sq);
            assert_eq!(i.difference, i.physical_quantity - sq, "note: {note}");
        }
    }

    #[test]
    fn test_cleaned_observation_does_not_retrigger() {
        let first = interpret("falta 6 serginho", 50);
        let again = interpret(&first.observation, 44);
        assert_eq!(again.status, Status::Ok);
        assert_eq!(again.difference, 0);

        let first = interpret("passando 20 investigar", 100);
        let again = interpret(&first.observation, 120);
        assert_eq!(again.difference, 0);
    }

    #[test]
    fn test_parse_outcome_variant() {
        assert_eq!(
            parse("falta 6 serginho"),
            ParseOutcome::Short {
                units: 6,
                observation: "serginho".to_string()
            }
        );
        assert_eq!(parse("molhado").status(), Status::Damaged);
    }

    #[test]
    fn test_damaged_units() {
        assert_eq!(damaged_units("avaria 5 de 200"), Some(5));
        assert_eq!(damaged_units("2 caixas molhadas"), Some(2));
        assert_eq!(damaged_units("vazando"), None);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Short".parse::<Status>().unwrap(), Status::Short);
        assert!("lost".parse::<Status>().is_err());
        assert!(Status::Damaged.is_divergent());
        assert!(!Status::Ok.is_divergent());
    }
}
