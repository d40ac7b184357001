//! Source header cleanup: raw first rows arrive with blank and duplicate
//! labels, structured row access needs unique field names.

use std::collections::{HashMap, HashSet};

pub const EMPTY_HEADER_PLACEHOLDER: &str = "pusta_kolumna";

/// Normalize a raw header row into unique field names, same length and
/// order as the input. A blank label becomes the placeholder name; the Nth
/// repeat of a label gets a `_N` suffix, the first occurrence keeps the
/// bare name.
pub fn normalize(raw: &[String]) -> Vec<String> {
    let mut repeats: HashMap<String, usize> = HashMap::new();
    let mut used: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());

    for label in raw {
        let base = label.trim();
        let base = if base.is_empty() {
            EMPTY_HEADER_PLACEHOLDER
        } else {
            base
        };

        let mut n = repeats.get(base).copied().unwrap_or(0);
        let mut name = if n == 0 {
            base.to_string()
        } else {
            format!("{}_{}", base, n)
        };
        // A later bare label can collide with an already-suffixed one
        while used.contains(&name) {
            n += 1;
            name = format!("{}_{}", base, n);
        }

        repeats.insert(base.to_string(), n + 1);
        used.insert(name.clone());
        out.push(name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn blank_and_repeated_labels() {
        assert_eq!(
            normalize(&raw(&["Text", "", "Text"])),
            vec!["Text", "pusta_kolumna", "Text_1"]
        );
    }

    #[test]
    fn first_occurrence_keeps_bare_name() {
        let got = normalize(&raw(&["Created", "From", "Text", "Tweet_link", "add_link"]));
        assert_eq!(got, vec!["Created", "From", "Text", "Tweet_link", "add_link"]);
    }

    #[test]
    fn repeated_placeholder_is_suffixed() {
        assert_eq!(
            normalize(&raw(&["", "  ", ""])),
            vec!["pusta_kolumna", "pusta_kolumna_1", "pusta_kolumna_2"]
        );
    }

    #[test]
    fn output_names_are_pairwise_distinct() {
        let got = normalize(&raw(&["Text", "Text", "Text_1", "Text", ""]));
        assert_eq!(got.len(), 5);
        let unique: std::collections::HashSet<&String> = got.iter().collect();
        assert_eq!(unique.len(), got.len());
        assert_eq!(got[0], "Text");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(normalize(&[]).is_empty());
    }
}
