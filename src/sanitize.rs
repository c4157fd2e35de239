//! Field sanitation applied to every record before it reaches storage.

use crate::models::{Entry, RawRecord};

/// Per-field storage limits in characters, in column order.
pub const DATA_FIELDS: [(&str, Option<usize>); 6] = [
    ("uri", Some(127)),
    ("name", Some(127)),
    ("src", Some(20)),
    ("description", None),
    ("keywords", None),
    ("body", None),
];

/// Strip NUL characters and cut the value to at most `limit` characters.
///
/// No ellipsis is added; display truncation happens at query time.
pub fn clean(value: &str, limit: Option<usize>) -> String {
    let mut cleaned: String = value.chars().filter(|&c| c != '\0').collect();
    if let Some(limit) = limit {
        if let Some((idx, _)) = cleaned.char_indices().nth(limit) {
            cleaned.truncate(idx);
        }
    }
    cleaned
}

/// Build a sanitized [`Entry`] from a raw page record.
///
/// Returns `None` when the record is not an object, or when `uri` or `name`
/// is missing or not a string. The other fields fall back to an empty string.
pub fn entry_from_record(record: &RawRecord) -> Option<Entry> {
    let object = record.as_object()?;
    let field = |name: &str| object.get(name).and_then(|v| v.as_str());
    let [uri, name, src, description, keywords, body] =
        DATA_FIELDS.map(|(f, limit)| field(f).map(|v| clean(v, limit)));

    Some(Entry {
        uri: uri?,
        name: name?,
        src: src.unwrap_or_default(),
        description: description.unwrap_or_default(),
        keywords: keywords.unwrap_or_default(),
        body: body.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn removes_nul_characters() {
        assert_eq!(clean("a\0b\0c", None), "abc");
        assert_eq!(clean("\0", Some(5)), "");
    }

    #[test]
    fn truncates_to_exact_limit() {
        assert_eq!(clean("abcdef", Some(3)), "abc");
        assert_eq!(clean("abc", Some(3)), "abc");
        assert_eq!(clean("ab", Some(3)), "ab");
        assert_eq!(clean("abc", None), "abc");
    }

    #[test]
    fn truncation_counts_characters_after_stripping() {
        assert_eq!(clean("a\0b\0cd", Some(3)), "abc");
        assert_eq!(clean("héllo wörld", Some(4)), "héll");
    }

    #[test]
    fn entry_applies_field_limits() {
        let long_src = "x".repeat(40);
        let e = entry_from_record(&json!({
            "uri": "/a", "name": "n\0ame", "src": long_src,
            "description": "d", "keywords": "k", "body": "b"
        }))
        .unwrap();
        assert_eq!(e.name, "name");
        assert_eq!(e.src.len(), 20);
        assert_eq!(e.body, "b");
    }

    #[test]
    fn entry_requires_uri_and_name() {
        assert!(entry_from_record(&json!({ "name": "n" })).is_none());
        assert!(entry_from_record(&json!({ "uri": "/a" })).is_none());
        assert!(entry_from_record(&json!({ "uri": 3, "name": "n" })).is_none());
        assert!(entry_from_record(&json!(["/a", "n"])).is_none());
    }

    #[test]
    fn optional_fields_default_to_empty() {
        let e = entry_from_record(&json!({ "uri": "/a", "name": "n" })).unwrap();
        assert_eq!(e.src, "");
        assert_eq!(e.description, "");
        assert_eq!(e.keywords, "");
        assert_eq!(e.body, "");
    }
}
