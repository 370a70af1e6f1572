// @zen-component: TOOL-IdCodec
//
//! Tool identifier codec.
//!
//! A tool identifier is `METHOD::encodedPath`: the upper-cased HTTP verb,
//! the `::` separator, and the path with every `/` written as `__` and every
//! `{param}` placeholder written as `---param`.
//!
//! The codec canonicalizes. Characters outside `[A-Za-z0-9_.-]` are dropped,
//! separator runs collapse, and underscore runs inside a segment collapse to
//! one, so `__` only ever appears as a separator. Decoding returns the
//! canonical path, which differs from the original when the original held
//! dropped characters. Two paths that canonicalize identically share an
//! identifier; the compiler reports that as a collision.

/// Separator between the method and the encoded path.
pub const METHOD_SEPARATOR: &str = "::";

/// Replacement for a single `/` between path segments.
pub const SEGMENT_MARKER: &str = "__";

/// Prefix written in place of a `{param}` placeholder.
pub const PARAM_MARKER: &str = "---";

/// Method and canonical path recovered from a tool identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToolId {
    pub method: String,
    pub path: String,
}

// @zen-impl: TOOL-IdCodec encode
/// Encode an HTTP method and path template into a tool identifier.
pub fn encode(method: &str, path: &str) -> String {
    let method: String = method
        .chars()
        .filter(char::is_ascii_alphabetic)
        .collect::<String>()
        .to_ascii_uppercase();
    format!("{method}{METHOD_SEPARATOR}{}", encode_path(path))
}

// @zen-impl: TOOL-IdCodec decode
/// Decode a tool identifier. Returns `None` when `::` is absent.
///
/// Only the first `::` separates the method; later occurrences stay in the
/// path verbatim.
pub fn decode(tool_id: &str) -> Option<DecodedToolId> {
    let (method, encoded) = tool_id.split_once(METHOD_SEPARATOR)?;
    Some(DecodedToolId {
        method: method.to_string(),
        path: format!("/{}", encoded.replace(SEGMENT_MARKER, "/")),
    })
}

/// Canonical form of `path`, as recovered by `decode(encode(_, path))`.
pub fn canonical_path(path: &str) -> String {
    format!("/{}", encode_path(path).replace(SEGMENT_MARKER, "/"))
}

fn encode_path(path: &str) -> String {
    let segments: Vec<String> = path.split('/').filter_map(clean_segment).collect();
    trim_edges(&segments.join(SEGMENT_MARKER)).to_string()
}

/// Canonicalize one path segment; `None` when nothing survives.
fn clean_segment(raw: &str) -> Option<String> {
    let marked = mark_placeholders(raw);

    let mut out = String::with_capacity(marked.len());
    for c in marked.chars().filter(|c| is_allowed(*c)) {
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let out = collapse_hyphens(out.trim_matches('_'));
    (!out.is_empty()).then_some(out)
}

/// Rewrite `{name}` as `---name`. Unbalanced braces are left for the
/// character filter to drop.
fn mark_placeholders(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    let mut rest = raw;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        out.push_str(&rest[..open]);
        out.push_str(PARAM_MARKER);
        out.push_str(&rest[open + 1..open + close]);
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Collapse runs of four or more hyphens to exactly three.
fn collapse_hyphens(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut run = 0usize;
    for c in s.chars() {
        if c == '-' {
            run += 1;
            if run > 3 {
                continue;
            }
        } else {
            run = 0;
        }
        out.push(c);
    }
    out
}

/// Trim stray hyphens and separator underscores from both ends, keeping a
/// leading parameter marker intact.
fn trim_edges(s: &str) -> &str {
    let mut s = s.trim_end_matches(['-', '_']);
    while !starts_with_param_marker(s) {
        match s.strip_prefix(['-', '_']) {
            Some(rest) => s = rest,
            None => break,
        }
    }
    s
}

fn starts_with_param_marker(s: &str) -> bool {
    s.strip_prefix(PARAM_MARKER)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c != '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_simple_collection() {
        assert_eq!(encode("get", "/users"), "GET::users");
    }

    #[test]
    fn encodes_nested_path_with_parameters() {
        assert_eq!(
            encode("delete", "/users/{userId}/posts/{postId}"),
            "DELETE::users__---userId__posts__---postId"
        );
    }

    #[test]
    fn root_path_round_trips() {
        let id = encode("GET", "/");
        assert_eq!(id, "GET::");
        assert_eq!(decode(&id).map(|d| d.path).as_deref(), Some("/"));
    }

    #[test]
    fn collapses_repeated_separators_and_strips_edges() {
        assert_eq!(encode("GET", "//api///v1/items/"), "GET::api__v1__items");
    }

    #[test]
    fn strips_disallowed_characters() {
        assert_eq!(encode("GET", "/caf\u{e9}s/m\u{fc}nchen!"), "GET::cafs__mnchen");
        assert_eq!(encode("GET", "/a b/c?d"), "GET::ab__cd");
    }

    #[test]
    fn keeps_dots_and_short_hyphen_runs() {
        assert_eq!(encode("GET", "/v1.2/my--res---name"), "GET::v1.2__my--res---name");
    }

    #[test]
    fn collapses_long_hyphen_runs() {
        assert_eq!(encode("GET", "/a------b"), "GET::a---b");
        assert_eq!(encode("GET", "/a-%%%%-b"), "GET::a--b");
    }

    #[test]
    fn in_segment_underscores_never_form_a_separator() {
        let id = encode("GET", "/user__name/_x_");
        assert_eq!(id, "GET::user_name__x");
        assert_eq!(decode(&id).map(|d| d.path).as_deref(), Some("/user_name/x"));
    }

    #[test]
    fn leading_parameter_marker_survives_trimming() {
        assert_eq!(encode("GET", "/{id}"), "GET::---id");
        assert_eq!(encode("GET", "/-/{id}"), "GET::---id");
        assert_eq!(encode("GET", "/-items-"), "GET::items");
    }

    #[test]
    fn decode_splits_on_first_separator_only() {
        let decoded = decode("GET::a::b__c").expect("decodes");
        assert_eq!(decoded.method, "GET");
        assert_eq!(decoded.path, "/a::b/c");
    }

    #[test]
    fn decode_rejects_identifier_without_separator() {
        assert_eq!(decode("GET-users"), None);
    }

    #[test]
    fn canonical_path_matches_decode() {
        let path = "/pets/{petId}/photos";
        let decoded = decode(&encode("post", path)).expect("decodes");
        assert_eq!(decoded.method, "POST");
        assert_eq!(decoded.path, canonical_path(path));
        assert_eq!(decoded.path, "/pets/---petId/photos");
    }

    fn segment() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-zA-Z0-9]([a-zA-Z0-9.]|-[a-zA-Z0-9]|_[a-zA-Z0-9]){0,8}",
            "[a-zA-Z][a-zA-Z0-9]{0,6}".prop_map(|p| format!("{{{p}}}")),
        ]
    }

    proptest! {
        #[test]
        fn round_trip_reproduces_canonical_path(
            method in "(get|put|post|delete|patch|head|options|trace)",
            segments in prop::collection::vec(segment(), 0..6),
        ) {
            let path = format!("/{}", segments.join("/"));
            let decoded = decode(&encode(&method, &path)).expect("decodes");
            prop_assert_eq!(decoded.method, method.to_ascii_uppercase());
            let expected = path.replace('{', PARAM_MARKER).replace('}', "");
            prop_assert_eq!(decoded.path, expected);
        }

        #[test]
        fn encoding_is_idempotent_on_canonical_paths(path in "[ -~]{0,40}") {
            let first = encode("GET", &path);
            let canonical = decode(&first).expect("decodes").path;
            prop_assert_eq!(encode("GET", &canonical), first);
        }
    }
}
