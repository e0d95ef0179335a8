use regex::Regex;
/// Line-oriented compilation of CNF grammar text
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt;

use tracing::debug;

use crate::grammar::Grammar;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// Raised when grammar text is not a strict CNF grammar: a rule without a
/// `->` separator, a left-hand side that isn't a nonterminal identifier, a
/// unit production between two nonterminals, or a right-hand side of arity
/// other than 1 (terminal) or 2 (known nonterminals).
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedGrammar {
  /// 1-based line in the grammar text, or 0 when no single line is at fault.
  pub line: usize,
  message: String,
}

impl MalformedGrammar {
  fn new(line: usize, message: impl Into<String>) -> Self {
    Self {
      line,
      message: message.into(),
    }
  }
}

impl fmt::Display for MalformedGrammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.line == 0 {
      write!(f, "malformed grammar: {}", self.message)
    } else {
      write!(f, "malformed grammar at line {}: {}", self.line, self.message)
    }
  }
}

impl Error for MalformedGrammar {}

fn strip_comment(line: &str) -> &str {
  match line.find("//") {
    Some(idx) => &line[..idx],
    None => line,
  }
}

/// Strips one matching pair of surrounding quote characters, if present.
fn strip_quotes(s: &str) -> &str {
  let b = s.as_bytes();
  if b.len() >= 2 && (b[0] == b'\'' || b[0] == b'"') && b[b.len() - 1] == b[0] {
    &s[1..s.len() - 1]
  } else {
    s
  }
}

fn push_unique(list: &mut Vec<String>, symbol: &str) {
  if !list.iter().any(|s| s == symbol) {
    list.push(symbol.to_string());
  }
}

/// Compiles grammar text into a [`Grammar`], one `LHS -> ALT | ALT | ...`
/// rule per non-empty line. Two passes: the first collects every left-hand
/// side so rules may forward-reference each other, the second indexes each
/// alternative as a unary terminal production or a binary nonterminal
/// production.
pub(crate) fn parse(src: &str) -> Result<Grammar, MalformedGrammar> {
  regex_static!(NONTERMINAL, r"^[A-Z][_A-Za-z0-9]*$");

  let lines = src
    .lines()
    .enumerate()
    .map(|(idx, line)| (idx + 1, strip_comment(line).trim()))
    .filter(|(_, line)| !line.is_empty());

  // pass 1: a symbol is a nonterminal iff it appears as some rule's LHS
  let mut nonterminals: HashSet<String> = HashSet::new();
  let mut rules = Vec::new();
  for (lineno, line) in lines {
    let Some((lhs, rhs)) = line.split_once("->") else {
      return Err(MalformedGrammar::new(lineno, "missing `->` separator"));
    };
    let lhs = lhs.trim();
    if !NONTERMINAL.is_match(lhs) {
      return Err(MalformedGrammar::new(
        lineno,
        format!("left-hand side `{}` is not a nonterminal identifier", lhs),
      ));
    }
    nonterminals.insert(lhs.to_string());
    rules.push((lineno, lhs, rhs));
  }

  if rules.is_empty() {
    return Err(MalformedGrammar::new(0, "empty grammar"));
  }

  // pass 2: index every alternative
  let mut unary: HashMap<String, Vec<String>> = HashMap::new();
  let mut binary: HashMap<String, HashMap<String, Vec<String>>> = HashMap::new();

  for (lineno, lhs, rhs) in rules {
    for alt in rhs.split('|') {
      let symbols: Vec<&str> = alt.split_whitespace().collect();
      match symbols.as_slice() {
        [single] => {
          let token = strip_quotes(single);
          if nonterminals.contains(token) {
            return Err(MalformedGrammar::new(
              lineno,
              format!("unit production `{} -> {}` is not CNF", lhs, token),
            ));
          }
          push_unique(unary.entry(token.to_string()).or_default(), lhs);
        }
        [s1, s2] if nonterminals.contains(*s1) && nonterminals.contains(*s2) => {
          push_unique(
            binary
              .entry((*s1).to_string())
              .or_default()
              .entry((*s2).to_string())
              .or_default(),
            lhs,
          );
        }
        _ => {
          return Err(MalformedGrammar::new(
            lineno,
            format!(
              "`{} -> {}` is not CNF: need one terminal or two known nonterminals",
              lhs,
              alt.trim()
            ),
          ));
        }
      }
    }
  }

  debug!(
    nonterminals = nonterminals.len(),
    terminals = unary.len(),
    "compiled grammar"
  );

  Ok(Grammar::new(nonterminals, unary, binary))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_compiles_valid_grammar() {
    let g: Grammar = r#"
      S -> NP VP
      NP -> Det N
      Det -> "As" | muita
      N -> verdades | gente
      VP -> V NP
      V -> incomodam
    "#
    .parse()
    .unwrap();

    assert!(g.is_nonterminal("S"));
    assert!(g.is_nonterminal("Det"));
    assert!(!g.is_nonterminal("verdades"));

    assert_eq!(g.unary_producers("As"), ["Det"]);
    assert_eq!(g.unary_producers("verdades"), ["N"]);
    assert_eq!(g.unary_producers("incomodam"), ["V"]);
    assert_eq!(g.binary_producers("Det", "N"), ["NP"]);
    assert_eq!(g.binary_producers("V", "NP"), ["VP"]);
    assert_eq!(g.binary_producers("NP", "VP"), ["S"]);
    assert!(g.binary_producers("VP", "NP").is_empty());
  }

  #[test]
  fn test_forward_references_are_legal() {
    assert!("S -> A B\nA -> 'x'\nB -> 'y'".parse::<Grammar>().is_ok());
  }

  #[test]
  fn test_missing_separator() {
    let err = "S NP VP".parse::<Grammar>().unwrap_err();
    assert_eq!(err.line, 1);
  }

  #[test]
  fn test_invalid_lhs() {
    assert!("s -> 'x'".parse::<Grammar>().is_err());
    assert!("2S -> 'x'".parse::<Grammar>().is_err());
  }

  #[test]
  fn test_unit_production_rejected() {
    let err = "S -> NP\nNP -> 'x'".parse::<Grammar>().unwrap_err();
    assert_eq!(err.line, 1);
    assert!(err.to_string().contains("unit production"));
  }

  #[test]
  fn test_quoted_unit_production_rejected() {
    // quotes don't shield a known nonterminal from the unit check
    assert!("A -> 'B'\nB -> 'x'".parse::<Grammar>().is_err());
  }

  #[test]
  fn test_arity_three_rejected() {
    let err = "S -> A A A\nA -> 'x'".parse::<Grammar>().unwrap_err();
    assert_eq!(err.line, 1);
  }

  #[test]
  fn test_binary_with_unknown_nonterminal_rejected() {
    assert!("S -> A B\nA -> 'x'".parse::<Grammar>().is_err());
  }

  #[test]
  fn test_empty_alternative_rejected() {
    assert!("S -> 'x' |".parse::<Grammar>().is_err());
  }

  #[test]
  fn test_empty_grammar_rejected() {
    let err = "".parse::<Grammar>().unwrap_err();
    assert_eq!(err.line, 0);
    let err = "\n  // only a comment\n".parse::<Grammar>().unwrap_err();
    assert_eq!(err.line, 0);
  }

  #[test]
  fn test_quote_stripping() {
    let g: Grammar = "S -> 'x' | \"y\" | z'".parse().unwrap();
    assert_eq!(g.unary_producers("x"), ["S"]);
    assert_eq!(g.unary_producers("y"), ["S"]);
    // mismatched quote is left alone
    assert_eq!(g.unary_producers("z'"), ["S"]);
  }

  #[test]
  fn test_comments_and_blank_lines() {
    let g: Grammar = r#"
      // sentence rules
      S -> A B  // binary

      A -> 'x'
      B -> 'y'
    "#
    .parse()
    .unwrap();
    assert_eq!(g.binary_producers("A", "B"), ["S"]);
  }

  #[test]
  fn test_duplicate_rules_deduplicated() {
    let g: Grammar = "S -> A B\nS -> A B\nA -> 'x' | 'x'\nB -> 'y'"
      .parse()
      .unwrap();
    assert_eq!(g.binary_producers("A", "B"), ["S"]);
    assert_eq!(g.unary_producers("x"), ["A"]);
  }
}
