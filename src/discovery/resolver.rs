//! Which biases to search for, given the source article's bias.

use crate::models::BiasLabel;
use std::collections::BTreeSet;

/// The two labels other than `original`.
pub fn alternates(original: BiasLabel) -> BTreeSet<BiasLabel> {
    BiasLabel::ALL
        .into_iter()
        .filter(|&label| label != original)
        .collect()
}

/// Like [`alternates`] for an unparsed label; an unrecognized label falls back to `{Center}`.
pub fn alternates_for(raw: &str) -> BTreeSet<BiasLabel> {
    match raw.parse::<BiasLabel>() {
        Ok(label) => alternates(label),
        Err(_) => BTreeSet::from([BiasLabel::Center]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternates() {
        assert_eq!(
            alternates(BiasLabel::Left),
            BTreeSet::from([BiasLabel::Center, BiasLabel::Right])
        );
        assert_eq!(
            alternates(BiasLabel::Center),
            BTreeSet::from([BiasLabel::Left, BiasLabel::Right])
        );
        assert_eq!(
            alternates(BiasLabel::Right),
            BTreeSet::from([BiasLabel::Center, BiasLabel::Left])
        );
    }

    #[test]
    fn test_unrecognized_label_falls_back_to_center() {
        assert_eq!(alternates_for("mixed"), BTreeSet::from([BiasLabel::Center]));
        assert_eq!(
            alternates_for("LEFT"),
            BTreeSet::from([BiasLabel::Center, BiasLabel::Right])
        );
    }
}
