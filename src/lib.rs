#[macro_use]
extern crate lazy_static;

pub mod chart;
pub mod grammar;
pub mod parse_grammar;
pub mod syntree;
pub mod tree;
pub mod utils;

pub use crate::chart::{BackPointers, Chart, Derivation, Span, parse_chart};
pub use crate::grammar::{DEFAULT_START, Grammar};
pub use crate::parse_grammar::MalformedGrammar;
pub use crate::syntree::SynTree;
pub use crate::tree::{all_trees, build_tree};
pub use crate::utils::Err;

impl Grammar {
  /// Runs the CKY fill over `input` and returns the chart together with
  /// the back-pointer table. Both are freshly built per call.
  pub fn parse_chart(&self, input: &[&str]) -> (Chart, BackPointers) {
    parse_chart(self, input)
  }

  /// Membership test: does the grammar derive `input` from its start
  /// symbol?
  pub fn accepts(&self, input: &[&str]) -> bool {
    let (chart, _) = self.parse_chart(input);
    chart.accepts(&self.start)
  }

  /// Parses `input` and builds the canonical derivation tree, or `None`
  /// if the sentence is rejected.
  pub fn parse(&self, input: &[&str]) -> Option<SynTree> {
    let (chart, back) = self.parse_chart(input);
    if chart.accepts(&self.start) {
      Some(build_tree(
        &self.start,
        Span::new(input.len(), 0),
        &chart,
        &back,
      ))
    } else {
      None
    }
  }

  /// Parses `input` and enumerates every derivation tree, ambiguous ones
  /// included.
  pub fn parse_all(&self, input: &[&str]) -> Vec<SynTree> {
    if input.is_empty() {
      return Vec::new();
    }
    let (_, back) = self.parse_chart(input);
    all_trees(&self.start, Span::new(input.len(), 0), &back)
  }
}

#[test]
fn test_parse_end_to_end() {
  let g: Grammar = r#"
    S -> NP VP
    NP -> Det N
    VP -> V NP
    Det -> "As" | muita
    N -> verdades | gente
    V -> incomodam
  "#
  .parse()
  .unwrap();

  let tokens = ["As", "verdades", "incomodam", "muita", "gente"];
  assert!(g.accepts(&tokens));

  let tree = g.parse(&tokens).unwrap();
  assert_eq!(tree.leaves(), tokens);
  assert_eq!(g.parse_all(&tokens), vec![tree]);

  assert!(!g.accepts(&["gente", "incomodam", "As"]));
  assert!(g.parse(&["gente", "incomodam", "As"]).is_none());
  assert!(g.parse(&[]).is_none());
}
