use std::fmt;

use crate::chart::Span;

/// An inner tree node: a nonterminal covering a span of the sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Constituent {
  pub symbol: String,
  pub span: Span,
}

impl fmt::Display for Constituent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.span, self.symbol)
  }
}

/// A tree leaf: the literal token a unary rule consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
  pub token: String,
  pub span: Span,
}

impl fmt::Display for Word {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.span, self.token)
  }
}

/// A concrete derivation tree over a sentence.
#[derive(Debug, Clone, PartialEq)]
pub enum SynTree {
  Branch(Constituent, Vec<SynTree>),
  Leaf(Word),
}

impl SynTree {
  pub fn is_leaf(&self) -> bool {
    match self {
      Self::Leaf(_) => true,
      _ => false,
    }
  }

  pub fn get_leaf(&self) -> Option<&Word> {
    match self {
      Self::Leaf(w) => Some(w),
      _ => None,
    }
  }

  pub fn get_branch(&self) -> Option<(&Constituent, &Vec<SynTree>)> {
    match self {
      Self::Branch(c, cs) => Some((c, cs)),
      _ => None,
    }
  }

  /// Leaf tokens in left-to-right order.
  pub fn leaves(&self) -> Vec<&str> {
    match self {
      Self::Leaf(w) => vec![w.token.as_str()],
      Self::Branch(_, children) => children.iter().flat_map(|c| c.leaves()).collect(),
    }
  }
}

impl fmt::Display for SynTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf(w) => write!(f, "{}", w),
      Self::Branch(c, cs) => {
        write!(f, "({}", c)?;
        if cs.len() == 1 {
          write!(f, " ({}))", cs[0])
        } else {
          for child in cs.iter() {
            let fmt = format!("{}", child);
            for line in fmt.lines() {
              write!(f, "\n  {}", line)?;
            }
          }
          write!(f, ")")
        }
      }
    }
  }
}

#[test]
fn test_display() {
  let leaf = |token: &str, start: usize| {
    SynTree::Leaf(Word {
      token: token.to_string(),
      span: Span::new(1, start),
    })
  };
  let tree = SynTree::Branch(
    Constituent {
      symbol: "S".to_string(),
      span: Span::new(2, 0),
    },
    vec![
      SynTree::Branch(
        Constituent {
          symbol: "A".to_string(),
          span: Span::new(1, 0),
        },
        vec![leaf("x", 0)],
      ),
      SynTree::Branch(
        Constituent {
          symbol: "B".to_string(),
          span: Span::new(1, 1),
        },
        vec![leaf("y", 1)],
      ),
    ],
  );

  assert_eq!(
    tree.to_string(),
    "(0..2: S\n  (0..1: A (0..1: x))\n  (1..2: B (1..2: y)))"
  );
  assert_eq!(tree.leaves(), ["x", "y"]);
}
