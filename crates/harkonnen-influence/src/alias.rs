//! Lexical ticker resolution from company names and symbols.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::upstream::{ResolveError, ResolveFuture, TickerMatch, TickerResolver};

const CORPORATE_SUFFIXES: [&str; 5] = ["inc", "corp", "corporation", "co", "company"];

/// Longest capitalised phrase, in words, considered for a company name.
const MAX_PHRASE_WORDS: usize = 4;

/// One row of a company listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Company {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Ticker", alias = "symbol")]
    pub ticker: String,
}

/// Resolves tickers by matching names, short names, and symbols.
///
/// Aliases per company: the lower-cased name without punctuation, the same
/// name with trailing corporate suffixes removed, and the lower-cased symbol.
/// Candidates in text are `$TICKER` cashtags, all-caps words, and every
/// contiguous run of capitalised words (up to four long).
#[derive(Debug, Clone, Default)]
pub struct AliasTickerResolver {
    aliases: HashMap<String, String>,
}

impl AliasTickerResolver {
    pub fn from_companies<I>(companies: I) -> Self
    where
        I: IntoIterator<Item = Company>,
    {
        let mut aliases = HashMap::new();
        for company in companies {
            let ticker = company.ticker.trim().to_ascii_uppercase();
            if ticker.is_empty() {
                continue;
            }

            let clean_name = normalize(&company.name);
            if !clean_name.is_empty() {
                aliases.insert(clean_name.clone(), ticker.clone());
            }
            let short_name = strip_suffixes(&clean_name);
            if !short_name.is_empty() {
                aliases.insert(short_name, ticker.clone());
            }
            aliases.insert(ticker.to_ascii_lowercase(), ticker);
        }
        Self { aliases }
    }

    /// Loads a JSON array of `{"name": ..., "ticker": ...}` objects.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ResolveError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ResolveError::new(format!("failed to read '{}': {e}", path.display()))
        })?;
        let companies: Vec<Company> = serde_json::from_str(&json).map_err(|e| {
            ResolveError::new(format!("invalid company list '{}': {e}", path.display()))
        })?;
        Ok(Self::from_companies(companies))
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Synchronous core of [`TickerResolver::resolve_tickers`].
    pub fn resolve(&self, text: &str) -> Vec<TickerMatch> {
        let mut seen = HashSet::new();
        candidates(text)
            .into_iter()
            .filter_map(|candidate| self.aliases.get(&candidate))
            .filter(|ticker| seen.insert(*ticker))
            .map(|ticker| TickerMatch::exact(ticker.clone()))
            .collect()
    }
}

impl TickerResolver for AliasTickerResolver {
    fn resolve_tickers<'a>(&'a self, text: &'a str) -> ResolveFuture<'a> {
        Box::pin(async move { Ok(self.resolve(text)) })
    }
}

fn normalize(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_suffixes(clean_name: &str) -> String {
    clean_name
        .split_whitespace()
        .filter(|word| !CORPORATE_SUFFIXES.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_capitalised(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some(first) if first.is_uppercase())
}

/// Lower-cased lookup keys in order of first appearance.
fn candidates(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut run: Vec<String> = Vec::new();

    let flush = |run: &mut Vec<String>, out: &mut Vec<String>| {
        for start in 0..run.len() {
            for end in ((start + 1)..=run.len().min(start + MAX_PHRASE_WORDS)).rev() {
                out.push(run[start..end].join(" "));
            }
        }
        run.clear();
    };

    for raw in text.split_whitespace() {
        if let Some(tag) = raw.strip_prefix('$') {
            let symbol: String = tag
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
                .collect();
            let symbol = symbol.trim_end_matches(['.', '-']);
            if !symbol.is_empty() {
                flush(&mut run, &mut out);
                out.push(symbol.to_ascii_lowercase());
                continue;
            }
        }

        let word: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        let ends_clause = raw.ends_with(['.', ',', '!', '?', ';', ':']);

        if !word.is_empty() && is_capitalised(&word) {
            run.push(word.to_lowercase());
        } else {
            flush(&mut run, &mut out);
        }
        if ends_clause {
            flush(&mut run, &mut out);
        }
    }
    flush(&mut run, &mut out);
    out
}
