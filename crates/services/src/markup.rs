//! Codec for the gateway's semi-structured checklist and progress markup.
//!
//! The markup is a serialization boundary: decoding is strict, and markup
//! without a recognizable checklist shape is rejected rather than read as an
//! empty list.

use regex::Regex;
use std::fmt::Write as _;
use std::sync::OnceLock;

use pictalk_core::model::{Checklist, Progress};

use crate::error::MarkupError;

const CONTAINER_MARK: &str = "checklist-container";

fn item_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"<div class="checklist-item ([^"]+)">\s*<span class="checkmark">[^<]*</span>\s*<span>([^<]+)</span>\s*</div>"#,
        )
        .expect("checklist item pattern compiles")
    })
}

/// Decodes checklist markup into an ordered checklist.
///
/// Each item block carries an `identified` or `not-identified` class next to
/// a checkmark symbol and a text label; items are read in document order and
/// given sequential ids. The class list is split into tokens before the
/// check, since `identified` is a substring of `not-identified`.
///
/// # Errors
///
/// Returns `MarkupError::MissingContainer` when the markup has no checklist
/// container, and `MarkupError::NoItems` when a container is present but no
/// item block could be read.
pub fn decode_checklist(markup: &str) -> Result<Checklist, MarkupError> {
    if !markup.contains(CONTAINER_MARK) {
        return Err(MarkupError::MissingContainer);
    }

    let mut states = Vec::new();
    for captures in item_pattern().captures_iter(markup) {
        let identified = captures[1]
            .split_whitespace()
            .any(|class| class == "identified");
        states.push((captures[2].trim().to_owned(), identified));
    }

    if states.is_empty() {
        return Err(MarkupError::NoItems);
    }
    Ok(Checklist::from_states(states))
}

/// Renders a checklist to the same markup shape the gateway serves, so the
/// local simulation can answer markup requests interchangeably.
#[must_use]
pub fn render_checklist(checklist: &Checklist) -> String {
    let mut markup = String::from(r#"<div id="checklist-container">"#);
    for item in checklist.items() {
        let class = if item.is_identified() {
            "identified"
        } else {
            "not-identified"
        };
        let checkmark = if item.is_identified() { "✅" } else { "❌" };
        let _ = write!(
            markup,
            r#"<div class="checklist-item {class}"><span class="checkmark">{checkmark}</span><span>{text}</span></div>"#,
            text = item.text(),
        );
    }
    markup.push_str("</div>");
    markup
}

/// Renders the one-line progress panel.
#[must_use]
pub fn render_progress(progress: &Progress) -> String {
    format!(r#"<div id="progress-container">Progress: {progress}</div>"#)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = concat!(
        r#"<div id="checklist-container"><style>.checklist-item {}</style>"#,
        "\n",
        r#"<div class="checklist-item identified">"#,
        r#"<span class="checkmark">✅</span> <span>Main subject</span></div>"#,
        "\n",
        r#"<div class="checklist-item not-identified">"#,
        r#"<span class="checkmark">❌</span> <span>Background color</span></div>"#,
        "</div>",
    );

    #[test]
    fn decode_reads_items_in_document_order() {
        let checklist = decode_checklist(SAMPLE).unwrap();
        assert_eq!(checklist.len(), 2);

        let first = &checklist.items()[0];
        assert_eq!(first.id().value(), 0);
        assert_eq!(first.text(), "Main subject");
        assert!(first.is_identified());

        let second = &checklist.items()[1];
        assert_eq!(second.id().value(), 1);
        assert_eq!(second.text(), "Background color");
        assert!(!second.is_identified());
    }

    #[test]
    fn decode_distinguishes_not_identified() {
        // "identified" is a substring of "not-identified"; the decoder must
        // compare whole class tokens, not substrings
        let checklist = decode_checklist(SAMPLE).unwrap();
        assert_eq!(checklist.identified_count(), 1);
    }

    #[test]
    fn decode_rejects_markup_without_container() {
        let err = decode_checklist("<div>something else entirely</div>").unwrap_err();
        assert_eq!(err, MarkupError::MissingContainer);

        let err = decode_checklist("").unwrap_err();
        assert_eq!(err, MarkupError::MissingContainer);
    }

    #[test]
    fn decode_rejects_container_without_items() {
        let err = decode_checklist(r#"<div id="checklist-container"></div>"#).unwrap_err();
        assert_eq!(err, MarkupError::NoItems);
    }

    #[test]
    fn rendered_markup_decodes_back() {
        let original = Checklist::from_states(vec![
            ("Animal type".to_owned(), true),
            ("Habitat elements".to_owned(), false),
        ]);

        let decoded = decode_checklist(&render_checklist(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn progress_panel_shows_one_decimal() {
        let progress = Progress {
            identified: 1,
            total: 3,
        };
        assert_eq!(
            render_progress(&progress),
            r#"<div id="progress-container">Progress: 1/3 details (33.3%)</div>"#
        );
    }
}
