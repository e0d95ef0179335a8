use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::Err;
use crate::parse_grammar::{self, MalformedGrammar};

/// Start symbol assumed when none is configured; see [`Grammar::with_start`].
pub const DEFAULT_START: &str = "S";

/// A compiled CNF grammar, immutable once built. `unary` maps a terminal
/// token to the nonterminals that produce it directly; `binary` maps an
/// ordered pair of nonterminals (keyed left-then-right) to the nonterminals
/// that produce that pair. Producer lists keep rule order and hold no
/// duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
  pub start: String,
  nonterminals: HashSet<String>,
  unary: HashMap<String, Vec<String>>,
  binary: HashMap<String, HashMap<String, Vec<String>>>,
}

impl Grammar {
  pub(crate) fn new(
    nonterminals: HashSet<String>,
    unary: HashMap<String, Vec<String>>,
    binary: HashMap<String, HashMap<String, Vec<String>>>,
  ) -> Self {
    Self {
      start: DEFAULT_START.to_string(),
      nonterminals,
      unary,
      binary,
    }
  }

  /// Replaces the conventional start symbol with an explicit choice.
  pub fn with_start(mut self, start: impl Into<String>) -> Self {
    self.start = start.into();
    self
  }

  pub fn is_nonterminal(&self, symbol: &str) -> bool {
    self.nonterminals.contains(symbol)
  }

  pub fn nonterminals(&self) -> impl Iterator<Item = &str> {
    self.nonterminals.iter().map(String::as_str)
  }

  /// Nonterminals with a unary production for exactly this token.
  pub fn unary_producers(&self, token: &str) -> &[String] {
    self.unary.get(token).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Nonterminals producing the ordered pair `left right`.
  pub fn binary_producers(&self, left: &str, right: &str) -> &[String] {
    self
      .binary
      .get(left)
      .and_then(|rights| rights.get(right))
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, Err> {
    let src = fs::read_to_string(path)?;
    Ok(src.parse()?)
  }
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "//** start: {}", self.start)?;
    write!(f, "//** nonterminals:")?;
    let mut nts: Vec<&str> = self.nonterminals().collect();
    nts.sort_unstable();
    for nt in nts {
      write!(f, " {}", nt)?;
    }
    writeln!(f)?;

    let mut productions = Vec::new();
    for (token, producers) in self.unary.iter() {
      for lhs in producers {
        productions.push(format!("{} -> '{}'", lhs, token));
      }
    }
    for (left, rights) in self.binary.iter() {
      for (right, producers) in rights.iter() {
        for lhs in producers {
          productions.push(format!("{} -> {} {}", lhs, left, right));
        }
      }
    }
    productions.sort_unstable();
    for p in productions {
      writeln!(f, "{}", p)?;
    }

    Ok(())
  }
}

impl FromStr for Grammar {
  type Err = MalformedGrammar;

  /// Compiles grammar text, one rule per non-empty line. The start symbol
  /// defaults to [`DEFAULT_START`].
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse_grammar::parse(s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_start() {
    let g: Grammar = "A -> 'x'".parse().unwrap();
    assert_eq!(g.start, DEFAULT_START);
    assert!(!g.accepts(&["x"]));
  }

  #[test]
  fn test_with_start() {
    let g: Grammar = "Expr -> Lit Lit\nLit -> 'x'".parse().unwrap();
    let g = g.with_start("Expr");
    assert!(g.accepts(&["x", "x"]));
    assert!(!g.accepts(&["x"]));
  }

  #[test]
  fn test_display_round_trips() {
    let g: Grammar = "S -> A B\nA -> 'x'\nB -> 'y'".parse().unwrap();
    let g2: Grammar = g.to_string().parse().unwrap();
    assert_eq!(g, g2);
  }
}
