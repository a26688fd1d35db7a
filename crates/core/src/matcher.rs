//! Keyword matcher deciding which checklist details an utterance satisfies.
//!
//! This is an intentionally crude heuristic, not a language model: a detail
//! counts as identified when any whitespace-separated word of its description
//! longer than three characters appears, case-insensitively, as a substring
//! of the utterance. Synonyms and paraphrases are not recognized. A
//! replacement scoring function may be swapped in as long as it stays
//! monotonic (identified details never revert) and deterministic (same input
//! yields the same output set).

use crate::model::{Checklist, DetailId};

const MIN_KEYWORD_LEN: usize = 4;

/// Marks every pending detail the utterance satisfies.
///
/// Details are evaluated in checklist order; items already identified are
/// skipped and never re-evaluated. Returns the ids that transitioned to
/// identified, in checklist order.
pub fn identify(checklist: &mut Checklist, utterance: &str) -> Vec<DetailId> {
    let utterance = utterance.to_lowercase();
    let mut newly = Vec::new();

    for item in checklist.items_mut() {
        if item.is_identified() {
            continue;
        }
        let description = item.text().to_lowercase();
        let matched = description
            .split_whitespace()
            .any(|word| word.chars().count() >= MIN_KEYWORD_LEN && utterance.contains(word));
        if matched {
            item.mark_identified();
            newly.push(item.id());
        }
    }

    newly
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn checklist(details: &[&str]) -> Checklist {
        Checklist::new(details.iter().map(|d| (*d).to_string()))
    }

    #[test]
    fn long_keyword_match_identifies_item() {
        let mut list = checklist(&["Shadows and highlights"]);
        let newly = identify(&mut list, "look at the shadows and highlights");
        assert_eq!(newly.len(), 1);
        assert!(list.items()[0].is_identified());
    }

    #[test]
    fn no_semantic_matching() {
        // "red" does not map to "coloring" under substring matching; this
        // locks in the heuristic's known limitation.
        let mut list = checklist(&["Animal type", "Animal coloring"]);
        let newly = identify(&mut list, "I see a big red dog");
        assert!(newly.is_empty());
        assert!(list.items().iter().all(|item| !item.is_identified()));
    }

    #[test]
    fn short_words_are_ignored() {
        // every word of "Sky hue" is 3 characters or fewer
        let mut list = checklist(&["Sky hue"]);
        let newly = identify(&mut list, "the sky has a nice hue");
        assert!(newly.is_empty());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let mut list = checklist(&["Animal TYPE"]);
        let newly = identify(&mut list, "what tYpE of animal is that");
        assert_eq!(newly.len(), 1);
    }

    #[test]
    fn identified_items_stay_identified() {
        let mut list = checklist(&["Background color", "Main subject"]);
        let first = identify(&mut list, "the background is blue");
        assert_eq!(first.len(), 1);

        // an unrelated follow-up never reverts the earlier match
        for utterance in ["nothing here", "", "zzz"] {
            let newly = identify(&mut list, utterance);
            assert!(newly.is_empty());
            assert!(list.items()[0].is_identified());
        }
    }

    #[test]
    fn repeated_utterance_yields_no_new_ids() {
        let mut list = checklist(&["Background color", "Main subject"]);
        let first = identify(&mut list, "the background has a subject");
        assert_eq!(first.len(), 2);
        let second = identify(&mut list, "the background has a subject");
        assert!(second.is_empty());
    }

    #[test]
    fn one_utterance_can_identify_several_items() {
        let mut list = checklist(&["Lighting effects", "Color scheme", "Texture patterns"]);
        let newly = identify(&mut list, "soft lighting and a warm color scheme");
        assert_eq!(newly.len(), 2);
        let ids: Vec<u32> = newly.iter().map(DetailId::value).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn empty_inputs_degrade_gracefully() {
        let mut empty = Checklist::default();
        assert!(identify(&mut empty, "anything").is_empty());

        let mut list = checklist(&["Main subject"]);
        assert!(identify(&mut list, "").is_empty());
    }

    #[test]
    fn first_matching_keyword_wins_per_item() {
        // both words could match; the item is still identified exactly once
        let mut list = checklist(&["Weather conditions"]);
        let newly = identify(&mut list, "stormy weather conditions today");
        assert_eq!(newly.len(), 1);
    }
}
