use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::grammar::Grammar;

/// A contiguous range of token positions: `len` tokens starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
  pub len: usize,
  pub start: usize,
}

impl Span {
  pub fn new(len: usize, start: usize) -> Self {
    Self { len, start }
  }

  pub fn end(&self) -> usize {
    self.start + self.len
  }
}

impl fmt::Display for Span {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}", self.start, self.end())
  }
}

/// How a nonterminal came to occupy a chart cell: either a unary rule
/// consumed the literal token under a length-1 span, or the span divides
/// after `split` tokens into a left part derived by `left` and a right part
/// derived by `right`.
#[derive(Debug, Clone, PartialEq)]
pub enum Derivation {
  Leaf(String),
  Split {
    split: usize,
    left: String,
    right: String,
  },
}

impl Derivation {
  pub fn is_leaf(&self) -> bool {
    match self {
      Self::Leaf(_) => true,
      _ => false,
    }
  }
}

impl fmt::Display for Derivation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf(token) => write!(f, "'{}'", token),
      Self::Split { split, left, right } => write!(f, "{} {} @{}", left, right, split),
    }
  }
}

/// The triangular CKY table: one cell per span, each holding the
/// nonterminals derivable over that span in discovery order, without
/// duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
  n: usize,
  // rows[len - 1][start]; the row for length l has n - l + 1 cells
  rows: Vec<Vec<Vec<String>>>,
}

impl Chart {
  pub fn new(n: usize) -> Self {
    Self {
      n,
      rows: (1..=n).map(|len| vec![Vec::new(); n - len + 1]).collect(),
    }
  }

  /// Length of the input this chart was built for.
  pub fn input_len(&self) -> usize {
    self.n
  }

  pub fn symbols(&self, span: Span) -> &[String] {
    &self.rows[span.len - 1][span.start]
  }

  pub fn contains(&self, span: Span, symbol: &str) -> bool {
    self.symbols(span).iter().any(|s| s == symbol)
  }

  pub fn add(&mut self, span: Span, symbol: &str) {
    if !self.contains(span, symbol) {
      self.rows[span.len - 1][span.start].push(symbol.to_string());
    }
  }

  /// Membership test: the start symbol covers the whole input.
  pub fn accepts(&self, start: &str) -> bool {
    self.n > 0 && self.contains(Span::new(self.n, 0), start)
  }
}

impl fmt::Display for Chart {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for len in (1..=self.n).rev() {
      for start in 0..=(self.n - len) {
        let span = Span::new(len, start);
        let mut symbols: Vec<&str> = self.symbols(span).iter().map(String::as_str).collect();
        symbols.sort_unstable();
        writeln!(f, "{}: {}", span, symbols.join(", "))?;
      }
    }
    Ok(())
  }
}

/// Parallel to the [`Chart`]: for every nonterminal present in a cell, the
/// list of all derivations that put it there, in discovery order. Later
/// derivations for an already-present symbol keep accumulating, which is
/// what makes ambiguity observable.
#[derive(Debug, Clone, PartialEq)]
pub struct BackPointers {
  rows: Vec<Vec<HashMap<String, Vec<Derivation>>>>,
}

impl BackPointers {
  pub fn new(n: usize) -> Self {
    Self {
      rows: (1..=n).map(|len| vec![HashMap::new(); n - len + 1]).collect(),
    }
  }

  pub fn push(&mut self, span: Span, symbol: &str, derivation: Derivation) {
    self.rows[span.len - 1][span.start]
      .entry(symbol.to_string())
      .or_default()
      .push(derivation);
  }

  /// All recorded derivations for `symbol` over `span`, in discovery order.
  /// Empty if the symbol never reached that cell.
  pub fn derivations(&self, span: Span, symbol: &str) -> &[Derivation] {
    self.rows[span.len - 1][span.start]
      .get(symbol)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }
}

/// Fills the CKY chart for `input`, bottom-up. Length-1 spans are seeded
/// from the grammar's unary productions; every longer span combines each of
/// its two-way splits through the binary production index. A sentence with
/// no parse just leaves the top cell without the start symbol; that is a
/// rejection, not an error.
pub fn parse_chart(g: &Grammar, input: &[&str]) -> (Chart, BackPointers) {
  let n = input.len();
  let mut chart = Chart::new(n);
  let mut back = BackPointers::new(n);

  for (j, token) in input.iter().enumerate() {
    let span = Span::new(1, j);
    for a in g.unary_producers(token) {
      chart.add(span, a);
      back.push(span, a, Derivation::Leaf((*token).to_string()));
    }
  }

  for len in 2..=n {
    for start in 0..=(n - len) {
      let span = Span::new(len, start);
      for split in 1..len {
        let left = Span::new(split, start);
        let right = Span::new(len - split, start + split);

        // reads only ever touch strictly shorter spans, but the borrow
        // checker can't see that, so collect before writing
        let mut found = Vec::new();
        for b in chart.symbols(left) {
          for c in chart.symbols(right) {
            for a in g.binary_producers(b, c) {
              found.push((a.clone(), b.clone(), c.clone()));
            }
          }
        }

        for (a, b, c) in found {
          chart.add(span, &a);
          back.push(
            span,
            &a,
            Derivation::Split {
              split,
              left: b,
              right: c,
            },
          );
        }
      }
    }
  }

  debug!(
    tokens = n,
    accepted = chart.accepts(&g.start),
    "chart fill complete"
  );

  (chart, back)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sentence_grammar() -> Grammar {
    r#"
      S -> NP VP
      NP -> Det N
      VP -> V NP
      Det -> "As" | muita
      N -> verdades | gente
      V -> incomodam
    "#
    .parse()
    .unwrap()
  }

  #[test]
  fn test_concrete_acceptance() {
    let g = sentence_grammar();
    let tokens = ["As", "verdades", "incomodam", "muita", "gente"];
    let (chart, _) = parse_chart(&g, &tokens);

    assert!(chart.contains(Span::new(5, 0), "S"));
    assert!(chart.accepts("S"));

    // intermediate constituents
    assert!(chart.contains(Span::new(2, 0), "NP"));
    assert!(chart.contains(Span::new(2, 3), "NP"));
    assert!(chart.contains(Span::new(3, 2), "VP"));
  }

  #[test]
  fn test_concrete_rejection() {
    let g = sentence_grammar();
    let (chart, _) = parse_chart(&g, &["gente", "incomodam", "As"]);

    assert!(!chart.contains(Span::new(3, 0), "S"));
    assert!(!chart.accepts("S"));
  }

  #[test]
  fn test_empty_input_rejects() {
    let g = sentence_grammar();
    let (chart, _) = parse_chart(&g, &[]);
    assert!(!chart.accepts("S"));
  }

  #[test]
  fn test_unknown_tokens_reject() {
    let g = sentence_grammar();
    let (chart, _) = parse_chart(&g, &["foo", "bar"]);
    assert!(chart.symbols(Span::new(1, 0)).is_empty());
    assert!(!chart.accepts("S"));
  }

  #[test]
  fn test_add_deduplicates() {
    let mut chart = Chart::new(1);
    chart.add(Span::new(1, 0), "A");
    chart.add(Span::new(1, 0), "A");
    assert_eq!(chart.symbols(Span::new(1, 0)), ["A"]);
  }

  #[test]
  fn test_ambiguous_derivations_all_recorded() {
    let g: Grammar = "S -> S S | 'x'".parse().unwrap();
    let (chart, back) = parse_chart(&g, &["x", "x", "x"]);

    assert!(chart.accepts("S"));

    // [x][xx] and [xx][x], in discovery order
    let top = back.derivations(Span::new(3, 0), "S");
    assert_eq!(
      top,
      [
        Derivation::Split {
          split: 1,
          left: "S".to_string(),
          right: "S".to_string(),
        },
        Derivation::Split {
          split: 2,
          left: "S".to_string(),
          right: "S".to_string(),
        },
      ]
    );

    assert_eq!(
      back.derivations(Span::new(1, 1), "S"),
      [Derivation::Leaf("x".to_string())]
    );
  }

  #[test]
  fn test_idempotent() {
    let g = sentence_grammar();
    let tokens = ["As", "verdades", "incomodam", "muita", "gente"];

    let (chart1, back1) = parse_chart(&g, &tokens);
    let (chart2, back2) = parse_chart(&g, &tokens);

    assert_eq!(chart1, chart2);
    assert_eq!(back1, back2);
  }

  /// Naive exponential membership check to cross-validate the dynamic
  /// program against.
  fn derives(g: &Grammar, symbol: &str, tokens: &[&str]) -> bool {
    match tokens {
      [] => false,
      [token] => g.unary_producers(token).iter().any(|a| a == symbol),
      _ => (1..tokens.len()).any(|k| {
        let (l, r) = tokens.split_at(k);
        g.nonterminals().any(|b| {
          g.nonterminals().any(|c| {
            g.binary_producers(b, c).iter().any(|a| a == symbol)
              && derives(g, b, l)
              && derives(g, c, r)
          })
        })
      }),
    }
  }

  #[test]
  fn test_agrees_with_brute_force() {
    let g: Grammar = r#"
      S -> A B | S S
      A -> 'x'
      B -> 'y'
    "#
    .parse()
    .unwrap();

    let alphabet = ["x", "y"];
    for len in 1..=6usize {
      for mut idx in 0..alphabet.len().pow(len as u32) {
        let mut sentence = Vec::with_capacity(len);
        for _ in 0..len {
          sentence.push(alphabet[idx % alphabet.len()]);
          idx /= alphabet.len();
        }

        let (chart, _) = parse_chart(&g, &sentence);
        assert_eq!(
          chart.accepts(&g.start),
          derives(&g, &g.start, &sentence),
          "membership mismatch on {:?}",
          sentence
        );
      }
    }
  }
}
