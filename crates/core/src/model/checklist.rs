use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::DetailId;

//
// ─── DETAIL ITEM ───────────────────────────────────────────────────────────────
//

/// One expected detail for the current image.
///
/// The identified flag only ever moves false to true; it resets by the item
/// being destroyed when a new checklist replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailItem {
    id: DetailId,
    text: String,
    identified: bool,
}

impl DetailItem {
    #[must_use]
    pub fn id(&self) -> DetailId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_identified(&self) -> bool {
        self.identified
    }

    pub(crate) fn mark_identified(&mut self) {
        self.identified = true;
    }
}

//
// ─── CHECKLIST ─────────────────────────────────────────────────────────────────
//

/// Ordered list of expected details for the current image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    items: Vec<DetailItem>,
}

impl Checklist {
    /// Builds a checklist from detail descriptions, assigning sequential ids
    /// in iteration order.
    #[must_use]
    pub fn new(texts: impl IntoIterator<Item = String>) -> Self {
        Self::from_states(texts.into_iter().map(|text| (text, false)))
    }

    /// Rehydrates a checklist from `(text, identified)` pairs in document
    /// order, assigning sequential ids.
    #[must_use]
    pub fn from_states(states: impl IntoIterator<Item = (String, bool)>) -> Self {
        let items = states
            .into_iter()
            .enumerate()
            .map(|(index, (text, identified))| DetailItem {
                id: DetailId::new(u32::try_from(index).unwrap_or(u32::MAX)),
                text,
                identified,
            })
            .collect();
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[DetailItem] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> impl Iterator<Item = &mut DetailItem> {
        self.items.iter_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: DetailId) -> Option<&DetailItem> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn identified_count(&self) -> usize {
        self.items.iter().filter(|item| item.identified).count()
    }

    /// True when every item is identified (vacuously true for an empty list).
    #[must_use]
    pub fn all_identified(&self) -> bool {
        self.items.iter().all(|item| item.identified)
    }

    /// Items still waiting to be identified, in checklist order.
    pub fn pending(&self) -> impl Iterator<Item = &DetailItem> {
        self.items.iter().filter(|item| !item.identified)
    }

    /// Snapshot of identification progress.
    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            identified: self.identified_count(),
            total: self.items.len(),
        }
    }

    /// Merges an authoritative snapshot of this checklist, or replaces the
    /// list wholesale when its shape (length or texts) changed.
    ///
    /// On a merge, identified flags only flow false to true; a snapshot that
    /// claims an identified item is pending is ignored. Returns the ids that
    /// transitioned to identified, in checklist order (empty on replacement,
    /// which represents a brand-new checklist rather than a transition).
    pub fn adopt(&mut self, incoming: Checklist) -> Vec<DetailId> {
        let same_shape = self.items.len() == incoming.items.len()
            && self
                .items
                .iter()
                .zip(incoming.items.iter())
                .all(|(ours, theirs)| ours.text == theirs.text);
        if !same_shape {
            self.items = incoming.items;
            return Vec::new();
        }

        let mut newly = Vec::new();
        for (ours, theirs) in self.items.iter_mut().zip(incoming.items.iter()) {
            if theirs.identified && !ours.identified {
                ours.mark_identified();
                newly.push(ours.id);
            }
        }
        newly
    }
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Aggregated identification progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub identified: usize,
    pub total: usize,
}

impl Progress {
    /// Full-precision completion percentage.
    ///
    /// An empty checklist reports 0 ("no data"), not a division error.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.identified as f64 / self.total as f64 * 100.0
    }

    /// Compares against a threshold percentage at full precision.
    #[must_use]
    pub fn meets(&self, threshold: f64) -> bool {
        self.percentage() >= threshold
    }
}

impl fmt::Display for Progress {
    /// Rounds to one decimal place for display only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} details ({:.1}%)",
            self.identified,
            self.total,
            self.percentage()
        )
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
