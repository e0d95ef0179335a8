use std::env;
use std::io;
use std::io::Write;
use std::process;

use tracing_subscriber::EnvFilter;

use ckyparse::grammar::Grammar;
use ckyparse::tree::{all_trees, build_tree};
use ckyparse::{Err, Span};

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} FILE [options]

Reads a CNF grammar from FILE, then parses one whitespace-tokenized
sentence per line of stdin.

Options:
  -h, --help     Print this message
  -c, --chart    Print the CKY chart (defaults to not printing)
  -a, --all      Print every ambiguous tree (defaults to the first)
  --start=SYM    Use SYM as the start symbol (defaults to S)",
    prog_name
  )
}

fn parse(g: &Grammar, sentence: &str, print_chart: bool, print_all: bool) -> Result<(), Err> {
  let tokens = sentence.split(' ').collect::<Vec<_>>();

  let (chart, back) = g.parse_chart(&tokens);

  if print_chart {
    println!("chart:\n{}", chart);
  }

  if !chart.accepts(&g.start) {
    println!("rejected");
    return Ok(());
  }

  let span = Span::new(tokens.len(), 0);
  if print_all {
    let trees = all_trees(&g.start, span, &back);
    println!(
      "accepted, {} tree{}",
      trees.len(),
      if trees.len() == 1 { "" } else { "s" }
    );
    for t in trees {
      println!("{}\n", t);
    }
  } else {
    println!("accepted");
    println!("{}", build_tree(&g.start, span, &chart, &back));
  }

  Ok(())
}

struct Args {
  filename: String,
  start: Option<String>,
  print_chart: bool,
  print_all: bool,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    if v.is_empty() {
      return Err(Self::make_error_message("bad argument vector", "ckyparse"));
    }

    let args_len = v.len();
    let mut iter = v.into_iter();
    let prog_name = iter.next().unwrap();

    if args_len < 2 {
      return Err(Self::make_error_message("not enough arguments", prog_name));
    }

    let mut filename: Option<String> = None;
    let mut start: Option<String> = None;
    let mut print_chart = false;
    let mut print_all = false;

    for o in iter {
      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-c" || o == "--chart" {
        print_chart = true;
      } else if o == "-a" || o == "--all" {
        print_all = true;
      } else if let Some(sym) = o.strip_prefix("--start=") {
        start = Some(sym.to_string());
      } else if filename.is_none() {
        filename = Some(o);
      } else {
        return Err(Self::make_error_message("invalid arguments", prog_name));
      }
    }

    if let Some(filename) = filename {
      Ok(Self {
        filename,
        start,
        print_chart,
        print_all,
      })
    } else {
      Err(Self::make_error_message("missing filename", prog_name))
    }
  }
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let mut g = Grammar::read_from_file(&opts.filename)?;
  if let Some(start) = opts.start {
    g = g.with_start(start);
  }

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    match io::stdin().read_line(&mut input) {
      Ok(_) => {
        if input.is_empty() {
          // ctrl+d
          return Ok(());
        }
        parse(&g, input.trim(), opts.print_chart, opts.print_all)?;
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}
