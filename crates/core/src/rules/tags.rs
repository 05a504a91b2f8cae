//! Tag aggregation.

use std::collections::HashMap;

use serde::Serialize;

/// A tag and the number of listings carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Count tag occurrences across listings.
///
/// Sorted by count, highest first; equal counts are ordered by tag name so the
/// output is stable.
#[must_use]
pub fn tag_list<I, T, S>(tag_sets: I) -> Vec<TagCount>
where
    I: IntoIterator<Item = T>,
    T: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for tags in tag_sets {
        for tag in tags {
            *counts.entry(tag.as_ref().to_owned()).or_insert(0) += 1;
        }
    }

    let mut list: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect();
    list.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tc(tag: &str, count: usize) -> TagCount {
        TagCount {
            tag: tag.to_owned(),
            count,
        }
    }

    #[test]
    fn test_counts_and_orders() {
        let sets = vec![
            vec!["Wifi", "Open Late"],
            vec!["Wifi"],
            vec!["Family Friendly", "Wifi", "Open Late"],
        ];
        assert_eq!(
            tag_list(sets),
            vec![tc("Wifi", 3), tc("Open Late", 2), tc("Family Friendly", 1)]
        );
    }

    #[test]
    fn test_ties_break_alphabetically() {
        let sets = vec![vec!["b"], vec!["a"], vec!["c"]];
        assert_eq!(tag_list(sets), vec![tc("a", 1), tc("b", 1), tc("c", 1)]);
    }

    #[test]
    fn test_empty() {
        assert!(tag_list(Vec::<Vec<String>>::new()).is_empty());
        assert!(tag_list(vec![Vec::<String>::new()]).is_empty());
    }
}
