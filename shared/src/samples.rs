use crate::model::{Drip, DripId, MediaKind};

/// Drips compiled into the app as the last fallback tier. Ids are fixed
/// literals so repeat installs dedup cleanly against cached copies.
pub fn bundled_drips() -> Vec<Drip> {
    let entries: &[(&str, &str, &str, &str, MediaKind)] = &[
        (
            "sample-flamboyance",
            "A group of flamingos is called a flamboyance.",
            "Me and the squad pulling up",
            "asset://samples/flamboyance.jpg",
            MediaKind::Image,
        ),
        (
            "sample-honey",
            "Honey found in Egyptian tombs over 3,000 years old is still edible.",
            "Best before: heat death of the universe",
            "asset://samples/honey.jpg",
            MediaKind::Image,
        ),
        (
            "sample-octopus",
            "Octopuses have three hearts, and two of them stop beating when they swim.",
            "Cardio really is the enemy",
            "asset://samples/octopus.mp4",
            MediaKind::Video,
        ),
        (
            "sample-eiffel",
            "The Eiffel Tower grows about 15 cm taller in summer as the iron expands.",
            "Just a tower hitting its summer arc",
            "asset://samples/eiffel.jpg",
            MediaKind::Image,
        ),
    ];

    entries
        .iter()
        .map(|(id, fact, caption, media_url, media_kind)| Drip {
            id: DripId::new(*id),
            fact: (*fact).to_string(),
            caption: (*caption).to_string(),
            media_url: (*media_url).to_string(),
            media_kind: *media_kind,
            is_user_generated: false,
            author: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn bundled_set_is_non_empty_with_unique_fixed_ids() {
        let drips = bundled_drips();
        assert!(!drips.is_empty());
        let ids: HashSet<_> = drips.iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids.len(), drips.len());
        assert!(drips.iter().all(|d| d.id.as_str().starts_with("sample-")));
    }
}
