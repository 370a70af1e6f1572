//! Abbreviation dictionary and stop-word list used by the name compressor.

use std::collections::{HashMap, HashSet};

/// Built-in word → abbreviation pairs (lower-case keys).
const DEFAULT_ABBREVIATIONS: &[(&str, &str)] = &[
    ("account", "acct"),
    ("accounts", "accts"),
    ("address", "addr"),
    ("addresses", "addrs"),
    ("administration", "admin"),
    ("administrator", "admin"),
    ("application", "app"),
    ("applications", "apps"),
    ("attribute", "attr"),
    ("attributes", "attrs"),
    ("authentication", "auth"),
    ("authorization", "authz"),
    ("categories", "cats"),
    ("category", "cat"),
    ("configuration", "config"),
    ("configurations", "configs"),
    ("database", "db"),
    ("definition", "def"),
    ("definitions", "defs"),
    ("description", "desc"),
    ("directories", "dirs"),
    ("directory", "dir"),
    ("document", "doc"),
    ("documents", "docs"),
    ("environment", "env"),
    ("environments", "envs"),
    ("group", "grp"),
    ("groups", "grps"),
    ("identifier", "id"),
    ("information", "info"),
    ("management", "mgmt"),
    ("message", "msg"),
    ("messages", "msgs"),
    ("notification", "notif"),
    ("notifications", "notifs"),
    ("number", "num"),
    ("organization", "org"),
    ("organizations", "orgs"),
    ("parameter", "param"),
    ("parameters", "params"),
    ("password", "pwd"),
    ("permission", "perm"),
    ("permissions", "perms"),
    ("project", "proj"),
    ("projects", "projs"),
    ("reference", "ref"),
    ("references", "refs"),
    ("repositories", "repos"),
    ("repository", "repo"),
    ("request", "req"),
    ("requests", "reqs"),
    ("resource", "res"),
    ("resources", "res"),
    ("response", "resp"),
    ("service", "svc"),
    ("services", "svcs"),
    ("specification", "spec"),
    ("statistics", "stats"),
    ("subscription", "sub"),
    ("subscriptions", "subs"),
    ("temporary", "tmp"),
    ("transaction", "txn"),
    ("transactions", "txns"),
    ("user", "usr"),
    ("users", "usrs"),
    ("version", "ver"),
    ("versions", "vers"),
];

/// Built-in naming boilerplate dropped from operation names.
const DEFAULT_STOP_WORDS: &[&str] = &[
    "a",
    "an",
    "api",
    "controller",
    "endpoint",
    "handler",
    "operation",
    "service",
    "the",
    "using",
];

/// Immutable word → abbreviation lookup.
///
/// Built once and shared (`Arc`) by every compressor that uses it.
#[derive(Debug, Clone)]
pub struct AbbreviationTable {
    entries: HashMap<String, String>,
    short_forms: HashSet<String>,
    stop_words: HashSet<String>,
}

impl AbbreviationTable {
    /// Build a table from word → abbreviation pairs and a stop-word list.
    /// Keys and stop words are matched case-insensitively.
    pub fn new<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
        stop_words: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let entries: HashMap<String, String> = pairs
            .into_iter()
            .map(|(word, short)| (word.to_ascii_lowercase(), short.to_string()))
            .collect();
        let short_forms = entries.values().map(|s| s.to_ascii_lowercase()).collect();
        let stop_words = stop_words
            .into_iter()
            .map(str::to_ascii_lowercase)
            .collect();
        Self {
            entries,
            short_forms,
            stop_words,
        }
    }

    /// A table with no abbreviations and no stop words.
    pub fn empty() -> Self {
        Self::new([], [])
    }

    /// Abbreviation for `word`, if any.
    pub fn lookup(&self, word: &str) -> Option<&str> {
        self.entries
            .get(&word.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether `word` is itself one of the table's short forms.
    pub fn is_abbreviation(&self, word: &str) -> bool {
        self.short_forms.contains(&word.to_ascii_lowercase())
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(&word.to_ascii_lowercase())
    }
}

impl Default for AbbreviationTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_ABBREVIATIONS.iter().copied(),
            DEFAULT_STOP_WORDS.iter().copied(),
        )
    }
}
