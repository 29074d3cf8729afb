// ABOUTME: Collapses a raw batch to at most one record per identity before it touches the store.
// ABOUTME: Later records win; output keeps the position where each identity first appeared.

use std::collections::HashMap;

use crate::identity::resolve_identity;
use crate::record::RawRecord;

/// A raw record paired with its resolved identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyed {
    pub identity: String,
    pub record: RawRecord,
}

/// Deduplicate a batch by identity, keeping the last occurrence of each.
pub fn dedupe(records: Vec<RawRecord>) -> Vec<Keyed> {
    let incoming = records.len();
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(incoming);
    let mut out: Vec<Keyed> = Vec::with_capacity(incoming);

    for record in records {
        let identity = resolve_identity(&record);
        match slots.get(&identity) {
            Some(&slot) => out[slot].record = record,
            None => {
                slots.insert(identity.clone(), out.len());
                out.push(Keyed { identity, record });
            }
        }
    }

    if out.len() < incoming {
        tracing::debug!(
            "collapsed {} raw records into {} identities",
            incoming,
            out.len()
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(platform: &str, link: Option<&str>, name: &str) -> RawRecord {
        RawRecord {
            platform: Some(platform.to_string()),
            link: link.map(str::to_string),
            name: Some(name.to_string()),
            ..RawRecord::default()
        }
    }

    #[test]
    fn last_record_wins_within_batch() {
        let batch = vec![raw("X", Some("L"), "A"), raw("X", Some("L"), "B")];

        let out = dedupe(batch);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].identity, "X::L");
        assert_eq!(out[0].record.name.as_deref(), Some("B"));
    }

    #[test]
    fn distinct_identities_are_kept_in_first_seen_order() {
        let batch = vec![
            raw("X", Some("1"), "first"),
            raw("X", Some("2"), "second"),
            raw("X", Some("1"), "first again"),
            raw("Y", None, "third"),
        ];

        let out = dedupe(batch);

        let names: Vec<_> = out
            .iter()
            .map(|k| k.record.name.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec!["first again", "second", "third"]);
    }

    #[test]
    fn empty_batch_stays_empty() {
        assert!(dedupe(Vec::new()).is_empty());
    }
}
