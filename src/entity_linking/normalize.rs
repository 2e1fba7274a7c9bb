//! Company name normalization for registry matching
//!
//! Two independently maintained name lists disagree mostly on legal suffixes
//! and punctuation ("Acme, Inc." vs "ACME INC"). Normalization removes that
//! noise before names are scored:
//! - Lowercase conversion
//! - Leading/trailing space trimming
//! - Exact-token removal of legal suffixes and filing boilerplate, unless
//!   nothing but suffixes would remain
//! - Comma removal, `.com` split into its own token
//! - Trailing space, period and `s` stripping
//! - Optional Unicode NFKC fold

use once_cell::sync::Lazy;
use unicode_normalization::UnicodeNormalization;

/// Legal-entity markers and boilerplate dropped during normalization.
///
/// Entries match whole tokens only. Multi-word entries match a run of
/// consecutive tokens.
pub const LEGAL_SUFFIXES: &[&str] = &[
    "inc.",
    "limited",
    "inc",
    "llc",
    "llc.",
    "l.l.c.",
    "(tiso)",
    "corp",
    "corp.",
    "ltd",
    "ltd.",
    "and other issuers",
    "et al.",
    "tiso",
    "l.p.",
    "lp",
    "company",
    "corporation",
];

static DEFAULT_NORMALIZER: Lazy<Normalizer> = Lazy::new(Normalizer::default);

/// Normalize a company name with the built-in suffix list.
///
/// # Examples
///
/// ```
/// use cik_merge::entity_linking::normalize::normalize;
///
/// assert_eq!(normalize("ACME, INC."), "acme");
/// assert_eq!(normalize("Beta, L.L.C."), "beta");
/// assert_eq!(normalize("Overstock.com Inc"), "overstock com");
/// ```
pub fn normalize(name: &str) -> String {
    DEFAULT_NORMALIZER.normalize(name)
}

/// Shared default normalizer
pub fn default_normalizer() -> &'static Normalizer {
    &DEFAULT_NORMALIZER
}

/// Configurable name normalizer
#[derive(Debug, Clone)]
pub struct Normalizer {
    /// Suffix entries pre-split into tokens, longest run first
    suffixes: Vec<Vec<String>>,
    /// Apply NFKC at the start of every pass
    unicode_fold: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::with_suffixes(LEGAL_SUFFIXES.iter().copied())
    }
}

impl Normalizer {
    /// Build a normalizer from an explicit suffix list
    pub fn with_suffixes<'a>(suffixes: impl IntoIterator<Item = &'a str>) -> Self {
        let mut normalizer = Self {
            suffixes: Vec::new(),
            unicode_fold: false,
        };
        normalizer.extend_suffixes(suffixes);
        normalizer
    }

    /// Add suffixes on top of the current list (e.g. from configuration)
    pub fn extend_suffixes<'a>(&mut self, suffixes: impl IntoIterator<Item = &'a str>) {
        for suffix in suffixes {
            let tokens: Vec<String> = suffix
                .to_lowercase()
                .split(' ')
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            if !tokens.is_empty() && !self.suffixes.contains(&tokens) {
                self.suffixes.push(tokens);
            }
        }
        self.suffixes.sort_by(|a, b| b.len().cmp(&a.len()));
    }

    /// Enable or disable NFKC folding (full-width forms, ligatures)
    pub fn unicode_fold(mut self, enabled: bool) -> Self {
        self.unicode_fold = enabled;
        self
    }

    /// Normalize a raw company name.
    ///
    /// Total: empty or whitespace-only input yields an empty string. The
    /// cleanup pass is repeated until the output stops changing, so the
    /// result is always a fixed point of `normalize`.
    pub fn normalize(&self, name: &str) -> String {
        let mut current = name.to_string();

        loop {
            let next = self.normalize_once(&current);
            if next == current {
                return next;
            }
            current = next;
        }
    }

    fn normalize_once(&self, name: &str) -> String {
        let lowered = if self.unicode_fold {
            name.nfkc().collect::<String>().to_lowercase()
        } else {
            name.to_lowercase()
        };
        let tokens: Vec<&str> = lowered.trim_matches(' ').split(' ').collect();

        let joined = self.strip_suffixes(&tokens).join(" ");

        joined
            .replace(',', "")
            .replace(".com", " com")
            .trim_end_matches(|c: char| matches!(c, ' ' | '.' | 's'))
            .to_string()
    }

    /// Drop every token run that exactly matches a suffix entry.
    ///
    /// A name made only of suffixes ("LP", "Corp") is returned unchanged.
    fn strip_suffixes<'t>(&self, tokens: &[&'t str]) -> Vec<&'t str> {
        let mut kept = Vec::with_capacity(tokens.len());
        let mut i = 0;

        while i < tokens.len() {
            match self.suffix_len_at(&tokens[i..]) {
                Some(len) => i += len,
                None => {
                    kept.push(tokens[i]);
                    i += 1;
                }
            }
        }

        if kept.iter().all(|t| t.is_empty()) {
            return tokens.to_vec();
        }
        kept
    }

    fn suffix_len_at(&self, tokens: &[&str]) -> Option<usize> {
        self.suffixes
            .iter()
            .find(|suffix| {
                suffix.len() <= tokens.len()
                    && suffix.iter().zip(tokens).all(|(s, t)| s.as_str() == *t)
            })
            .map(Vec::len)
    }

    /// Whether a single lowercase token is on the suffix list
    pub fn is_legal_suffix(&self, token: &str) -> bool {
        self.suffixes
            .iter()
            .any(|suffix| suffix.len() == 1 && suffix[0] == token)
    }
}
