// @zen-component: TOOL-NameCompressor
//
//! Tool name compression.
//!
//! Turns verbose operation names (`getUserAccountConfigurationController`)
//! into short identifiers matching `^[a-z0-9]+(-[a-z0-9]+)*$`, bounded by a
//! maximum length. Long names keep a content-hash suffix so truncation never
//! merges two distinct names silently.

pub mod abbreviations;

use std::sync::Arc;

use sha2::{Digest, Sha256};

pub use abbreviations::AbbreviationTable;

/// Default maximum tool name length.
pub const DEFAULT_MAX_LENGTH: usize = 64;

/// Hex digits of the suffix appended to truncated names.
const SUFFIX_HASH_LEN: usize = 4;

/// Hex digits of the fallback name hash.
const FALLBACK_HASH_LEN: usize = 8;

/// Shortest length that still fits the `tool-xxxxxxxx` fallback.
const MIN_MAX_LENGTH: usize = 5 + FALLBACK_HASH_LEN;

/// Tokens shorter than this are never vowel-stripped.
const VOWEL_STRIP_MIN_LEN: usize = 6;

/// Compressor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressorOptions {
    pub max_length: usize,
    /// When false, stop words, abbreviations and vowel stripping are skipped.
    pub abbreviate: bool,
}

impl Default for CompressorOptions {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            abbreviate: true,
        }
    }
}

/// One word of a segmented name.
#[derive(Debug, Clone)]
struct Token {
    text: String,
    abbreviated: bool,
}

/// Deterministic operation-name compressor.
#[derive(Debug, Clone)]
pub struct NameCompressor {
    table: Arc<AbbreviationTable>,
    options: CompressorOptions,
}

impl NameCompressor {
    pub fn new(table: Arc<AbbreviationTable>, options: CompressorOptions) -> Self {
        Self {
            table,
            options: CompressorOptions {
                max_length: options.max_length.max(MIN_MAX_LENGTH),
                ..options
            },
        }
    }

    pub fn max_length(&self) -> usize {
        self.options.max_length
    }

    // @zen-impl: TOOL-NameCompressor stop words, abbreviations, vowel stripping
    /// Compress `raw` into a valid tool name.
    pub fn compress(&self, raw: &str) -> String {
        let max = self.options.max_length;

        let sanitized = sanitize_words(raw);
        if sanitized.is_empty() {
            return fallback_name(raw);
        }

        let mut tokens: Vec<Token> = segment(&sanitized)
            .into_iter()
            .map(|text| Token {
                text,
                abbreviated: false,
            })
            .collect();

        if self.options.abbreviate {
            tokens = self.drop_stop_words(tokens);
            for token in &mut tokens {
                self.abbreviate(token);
            }
            if joined_len(&tokens) > max {
                for token in &mut tokens {
                    if token.text.len() >= VOWEL_STRIP_MIN_LEN && !token.abbreviated {
                        token.text = strip_vowels(&token.text);
                    }
                }
            }
        }

        let mut name = join(&tokens);
        if raw.len() > max || name.len() > max {
            name = with_hash_suffix(&name, raw, max);
        }

        let name = finalize(&name);
        if name.is_empty() {
            fallback_name(raw)
        } else {
            name
        }
    }

    /// Derive a different valid name from `name` by suffixing a hash of
    /// `seed`. Used to separate colliding tools.
    pub fn disambiguate(&self, name: &str, seed: &str) -> String {
        let name = with_hash_suffix(name, seed, self.options.max_length);
        let name = finalize(&name);
        if name.is_empty() {
            fallback_name(seed)
        } else {
            name
        }
    }

    fn drop_stop_words(&self, tokens: Vec<Token>) -> Vec<Token> {
        if tokens.iter().all(|t| self.table.is_stop_word(&t.text)) {
            return tokens;
        }
        tokens
            .into_iter()
            .filter(|t| !self.table.is_stop_word(&t.text))
            .collect()
    }

    fn abbreviate(&self, token: &mut Token) {
        if let Some(short) = self.table.lookup(&token.text) {
            token.text = match_case(&token.text, short);
            token.abbreviated = true;
        } else if self.table.is_abbreviation(&token.text) {
            token.abbreviated = true;
        }
    }
}

impl Default for NameCompressor {
    fn default() -> Self {
        Self::new(
            Arc::new(AbbreviationTable::default()),
            CompressorOptions::default(),
        )
    }
}

/// Hex prefix of the SHA-256 digest of `input`.
pub fn content_hash(input: &str, len: usize) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..len.min(hex.len())].to_string()
}

fn fallback_name(raw: &str) -> String {
    format!("tool-{}", content_hash(raw, FALLBACK_HASH_LEN))
}

/// Replace everything outside `[A-Za-z0-9_]` with `_`, collapse and trim.
fn sanitize_words(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '_' };
        if c == '_' && (out.is_empty() || out.ends_with('_')) {
            continue;
        }
        out.push(c);
    }
    out.trim_end_matches('_').to_string()
}

/// Split on underscores, camel-case humps, acronym ends and letter/digit
/// boundaries.
fn segment(sanitized: &str) -> Vec<String> {
    let mut words = Vec::new();
    for part in sanitized.split('_').filter(|p| !p.is_empty()) {
        let chars: Vec<char> = part.chars().collect();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            if i > 0 && is_boundary(chars[i - 1], c, chars.get(i + 1).copied()) {
                words.push(std::mem::take(&mut current));
            }
            current.push(c);
        }
        if !current.is_empty() {
            words.push(current);
        }
    }
    words
}

fn is_boundary(prev: char, cur: char, next: Option<char>) -> bool {
    let camel_hump = prev.is_ascii_lowercase() && cur.is_ascii_uppercase();
    let acronym_end = prev.is_ascii_uppercase()
        && cur.is_ascii_uppercase()
        && next.is_some_and(|n| n.is_ascii_lowercase());
    let digit_edge = (prev.is_ascii_alphabetic() && cur.is_ascii_digit())
        || (prev.is_ascii_digit() && cur.is_ascii_alphabetic());
    camel_hump || acronym_end || digit_edge
}

/// Render `short` in the case style of `original`.
fn match_case(original: &str, short: &str) -> String {
    let mut chars = original.chars();
    let first_upper = chars.next().is_some_and(|c| c.is_ascii_uppercase());
    let rest: Vec<char> = chars.collect();

    if first_upper && rest.iter().all(|c| !c.is_ascii_lowercase()) && !rest.is_empty() {
        short.to_ascii_uppercase()
    } else if first_upper && rest.iter().all(|c| !c.is_ascii_uppercase()) {
        let mut out = short.to_ascii_lowercase();
        if let Some(first) = out.get_mut(..1) {
            first.make_ascii_uppercase();
        }
        out
    } else {
        short.to_ascii_lowercase()
    }
}

/// Drop vowels after the first character.
fn strip_vowels(word: &str) -> String {
    let mut chars = word.chars();
    let mut out: String = chars.next().into_iter().collect();
    out.extend(chars.filter(|c| !matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')));
    out
}

fn join(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn joined_len(tokens: &[Token]) -> usize {
    join(tokens).len()
}

/// Truncate `name` to leave room for `-xxxx` and append a hash of `seed`.
fn with_hash_suffix(name: &str, seed: &str, max: usize) -> String {
    let hash = content_hash(seed, SUFFIX_HASH_LEN);
    let budget = max.saturating_sub(SUFFIX_HASH_LEN + 1);
    let cut = floor_char_boundary(name, budget);
    let base = name[..cut].trim_end_matches(['-', '_']);
    if base.is_empty() {
        format!("tool-{hash}")
    } else {
        format!("{base}-{hash}")
    }
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (0..=index).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

/// Lower-case and restrict to `[a-z0-9-]`, collapsing and trimming `-`.
fn finalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = c.to_ascii_lowercase();
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };
        if c == '-' && (out.is_empty() || out.ends_with('-')) {
            continue;
        }
        out.push(c);
    }
    out.trim_end_matches('-').to_string()
}
