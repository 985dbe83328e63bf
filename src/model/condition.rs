//! Narrow MSBuild condition evaluation
//!
//! Conditions arrive with properties already expanded. Supported forms:
//! `'a' == 'b'`, `'a' != 'b'` (case-insensitive), `Exists('path')`, boolean
//! literals, `!` negation, `and`/`or` and parentheses. Any other term is
//! reported at debug level and treated as true.

use std::path::Path;

/// Evaluate an expanded condition. `base_dir` anchors relative `Exists()` paths.
pub fn evaluate(condition: &str, base_dir: &Path) -> bool {
  let condition = condition.trim();
  if condition.is_empty() {
    return true;
  }

  let expr = strip_wrapping_parens(condition);

  let alternatives = split_keyword(expr, "or");
  if alternatives.len() > 1 {
    return alternatives.iter().any(|part| evaluate(part, base_dir));
  }

  let conjuncts = split_keyword(expr, "and");
  if conjuncts.len() > 1 {
    return conjuncts.iter().all(|part| evaluate(part, base_dir));
  }

  evaluate_term(expr, base_dir)
}

fn evaluate_term(term: &str, base_dir: &Path) -> bool {
  let term = term.trim();

  if let Some(rest) = term.strip_prefix('!')
    && !rest.starts_with('=')
  {
    return !evaluate(rest, base_dir);
  }

  let inner = strip_wrapping_parens(term);
  if inner.len() < term.len() {
    return evaluate(inner, base_dir);
  }

  if let Some(argument) = exists_argument(term) {
    let path = unquote(argument);
    return !path.is_empty() && base_dir.join(path).exists();
  }

  if let Some((left, op, right)) = split_comparison(term) {
    let equal = unquote(left).eq_ignore_ascii_case(unquote(right));
    return if op == "==" { equal } else { !equal };
  }

  match unquote(term).to_ascii_lowercase().as_str() {
    "true" => true,
    "false" => false,
    _ => {
      tracing::debug!("Unsupported condition term `{}`, treating as true", term);
      true
    }
  }
}

/// `Exists('...')` argument, case-insensitive function name
fn exists_argument(term: &str) -> Option<&str> {
  let open = term.find('(')?;
  if !term[..open].trim().eq_ignore_ascii_case("exists") || !term.ends_with(')') {
    return None;
  }
  Some(&term[open + 1..term.len() - 1])
}

fn split_comparison(term: &str) -> Option<(&str, &'static str, &str)> {
  let bytes = term.as_bytes();
  let mut in_quote = false;
  for i in 0..bytes.len().saturating_sub(1) {
    match bytes[i] {
      b'\'' => in_quote = !in_quote,
      b'=' | b'!' if !in_quote && bytes[i + 1] == b'=' => {
        let op = if bytes[i] == b'=' { "==" } else { "!=" };
        return Some((&term[..i], op, &term[i + 2..]));
      }
      _ => {}
    }
  }
  None
}

fn unquote(text: &str) -> &str {
  let text = text.trim();
  text
    .strip_prefix('\'')
    .and_then(|t| t.strip_suffix('\''))
    .unwrap_or(text)
    .trim()
}

/// `(expr)` → `expr` when the first paren closes at the very end
fn strip_wrapping_parens(mut expr: &str) -> &str {
  while expr.starts_with('(') && expr.ends_with(')') && closing_paren(expr) == Some(expr.len() - 1) {
    expr = expr[1..expr.len() - 1].trim();
  }
  expr
}

fn closing_paren(expr: &str) -> Option<usize> {
  let mut depth = 0usize;
  let mut in_quote = false;
  for (i, byte) in expr.bytes().enumerate() {
    match byte {
      b'\'' => in_quote = !in_quote,
      b'(' if !in_quote => depth += 1,
      b')' if !in_quote => {
        depth = depth.saturating_sub(1);
        if depth == 0 {
          return Some(i);
        }
      }
      _ => {}
    }
  }
  None
}

/// Split on ` keyword ` outside quotes and parentheses, ASCII case-insensitive
fn split_keyword<'a>(text: &'a str, keyword: &str) -> Vec<&'a str> {
  let needle = format!(" {} ", keyword).into_bytes();
  let lower = text.to_ascii_lowercase().into_bytes();
  let mut parts = Vec::new();
  let mut start = 0;
  let mut depth = 0usize;
  let mut in_quote = false;
  let mut i = 0;

  while i < lower.len() {
    match lower[i] {
      b'\'' => in_quote = !in_quote,
      b'(' if !in_quote => depth += 1,
      b')' if !in_quote => depth = depth.saturating_sub(1),
      b' ' if !in_quote && depth == 0 && lower[i..].starts_with(&needle) => {
        parts.push(&text[start..i]);
        i += needle.len();
        start = i;
        continue;
      }
      _ => {}
    }
    i += 1;
  }

  parts.push(&text[start..]);
  parts
}
