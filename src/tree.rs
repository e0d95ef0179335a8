use crate::chart::{BackPointers, Chart, Derivation, Span};
use crate::syntree::{Constituent, SynTree, Word};
use crate::utils::combinations;

fn node(symbol: &str, span: Span, children: Vec<SynTree>) -> SynTree {
  SynTree::Branch(
    Constituent {
      symbol: symbol.to_string(),
      span,
    },
    children,
  )
}

fn token_leaf(token: &str, span: Span) -> SynTree {
  SynTree::Leaf(Word {
    token: token.to_string(),
    span,
  })
}

/// Builds the canonical derivation tree for `symbol` over `span`: at every
/// level, the first-discovered derivation wins. When the symbol is
/// genuinely ambiguous the remaining derivations stay reachable through the
/// back-pointer table (see [`all_trees`]); picking the first is a
/// discovery-order artifact of the fill loop, not a preference.
///
/// Callers should only ask for symbols already confirmed present in the
/// cell; an absent symbol yields a childless node rather than an error.
pub fn build_tree(symbol: &str, span: Span, chart: &Chart, back: &BackPointers) -> SynTree {
  let derivations = back.derivations(span, symbol);

  if let Some(Derivation::Leaf(token)) = derivations.iter().find(|d| d.is_leaf()) {
    return node(symbol, span, vec![token_leaf(token, span)]);
  }

  for derivation in derivations {
    if let Derivation::Split { split, left, right } = derivation {
      let left_span = Span::new(*split, span.start);
      let right_span = Span::new(span.len - split, span.start + split);
      // recorded splits are consistent by construction; this check only
      // guards against a chart that doesn't match the back-pointers
      if chart.contains(left_span, left) && chart.contains(right_span, right) {
        return node(
          symbol,
          span,
          vec![
            build_tree(left, left_span, chart, back),
            build_tree(right, right_span, chart, back),
          ],
        );
      }
    }
  }

  node(symbol, span, Vec::new())
}

/// Enumerates every derivation tree for `symbol` over `span`, expanding
/// each recorded derivation and taking the cartesian product of the
/// alternatives of its sub-spans. Outer order follows derivation discovery
/// order, so the first returned tree is the one [`build_tree`] materializes.
pub fn all_trees(symbol: &str, span: Span, back: &BackPointers) -> Vec<SynTree> {
  let mut trees = Vec::new();

  for derivation in back.derivations(span, symbol) {
    match derivation {
      Derivation::Leaf(token) => trees.push(node(symbol, span, vec![token_leaf(token, span)])),
      Derivation::Split { split, left, right } => {
        let left_span = Span::new(*split, span.start);
        let right_span = Span::new(span.len - split, span.start + split);
        let alternatives = [
          all_trees(left, left_span, back),
          all_trees(right, right_span, back),
        ];
        for children in combinations(&alternatives) {
          trees.push(node(symbol, span, children));
        }
      }
    }
  }

  trees
}
