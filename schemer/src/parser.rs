use crate::value::{Value, list};
use nom::{
  IResult, Parser,
  branch::alt,
  bytes::complete::{escaped_transform, is_not, tag, take_while, take_while1},
  character::complete::{char, digit1, multispace1, one_of},
  combinator::{cut, map, map_res, not, opt, peek, recognize, value},
  error::{Error as NomError, ErrorKind},
  multi::many0,
  sequence::{delimited, preceded, terminated},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
  #[error("unexpected end of input")]
  Incomplete,

  #[error("unexpected closing parenthesis ')'")]
  UnmatchedClosing,

  #[error("{0}")]
  Error(String),
}

/// Characters that end an atom.
fn is_delimiter(c: char) -> bool {
  c.is_whitespace() || matches!(c, '(' | ')' | ';' | '"' | '\'')
}

/// Whitespace and `;` comments.
fn blank(i: &str) -> IResult<&str, ()> {
  let comment = preceded(char(';'), take_while(|c| c != '\n'));
  value((), many0(alt((multispace1, comment)))).parse(i)
}

/// An atom must be followed by a delimiter or the end of input; `12abc` is
/// a hard error rather than a number followed by a symbol.
fn atom<'a, O, F>(parser: F) -> impl Parser<&'a str, Output = O, Error = NomError<&'a str>>
where
  F: Parser<&'a str, Output = O, Error = NomError<&'a str>>,
{
  terminated(
    parser,
    cut(peek(not(take_while1(|c: char| !is_delimiter(c))))),
  )
}

fn float(i: &str) -> IResult<&str, Value> {
  let sign = || opt(one_of("+-"));
  let literal = alt((
    recognize((sign(), digit1, char('.'), opt(digit1))),
    recognize((sign(), char('.'), digit1)),
  ));
  atom(map_res(literal, |s: &str| s.parse().map(Value::Float))).parse(i)
}

fn integer(i: &str) -> IResult<&str, Value> {
  let literal = recognize((opt(one_of("+-")), digit1));
  atom(map_res(literal, |s: &str| s.parse().map(Value::Integer))).parse(i)
}

fn boolean(i: &str) -> IResult<&str, Value> {
  atom(alt((
    value(Value::Bool(true), tag("#t")),
    value(Value::Bool(false), tag("#f")),
  )))
  .parse(i)
}

fn string(i: &str) -> IResult<&str, Value> {
  let escape = alt((
    value("\n", char('n')),
    value("\t", char('t')),
    value("\r", char('r')),
    value("\\", char('\\')),
    value("\"", char('"')),
  ));
  let body = opt(escaped_transform(is_not("\\\""), '\\', escape));

  map(delimited(char('"'), body, char('"')), |s| {
    Value::String(s.unwrap_or_default().into())
  })
  .parse(i)
}

/// Any run of non-delimiters that does not start like a number or `#`.
fn symbol(i: &str) -> IResult<&str, Value> {
  match i.chars().next() {
    Some(c) if c.is_ascii_digit() || c == '#' => {
      Err(nom::Err::Error(NomError::new(i, ErrorKind::Alpha)))
    }
    _ => map(take_while1(|c| !is_delimiter(c)), Value::symbol).parse(i),
  }
}

/// `'x` reads as `(quote x)`.
fn quoted(i: &str) -> IResult<&str, Value> {
  map(preceded(char('\''), cut(form)), |datum| {
    list(vec![Value::symbol("quote"), datum])
  })
  .parse(i)
}

fn parenthesized(i: &str) -> IResult<&str, Value> {
  map(
    delimited(char('('), many0(form), preceded(blank, char(')'))),
    list,
  )
  .parse(i)
}

fn form(i: &str) -> IResult<&str, Value> {
  preceded(
    blank,
    alt((quoted, boolean, float, integer, string, parenthesized, symbol)),
  )
  .parse(i)
}

/// Checks that every string is closed and parentheses pair up, ignoring
/// anything inside strings and comments.
fn scan_balance(input: &str) -> Result<(), ParseError> {
  let mut depth = 0usize;
  let mut chars = input.chars();

  while let Some(c) = chars.next() {
    match c {
      ';' => {
        chars.by_ref().find(|&c| c == '\n');
      }
      '"' => loop {
        match chars.next() {
          None => return Err(ParseError::Incomplete),
          Some('\\') => {
            chars.next();
          }
          Some('"') => break,
          Some(_) => {}
        }
      },
      '(' => depth += 1,
      ')' => depth = depth.checked_sub(1).ok_or(ParseError::UnmatchedClosing)?,
      _ => {}
    }
  }

  if depth > 0 {
    Err(ParseError::Incomplete)
  } else {
    Ok(())
  }
}

fn describe_failure(at: &str) -> ParseError {
  let what = if at.starts_with('\'') {
    "expected an expression after quote (')"
  } else {
    "invalid syntax"
  };
  let excerpt: String = at.chars().take(20).collect();
  ParseError::Error(format!("{} at: {}", what, excerpt))
}

fn read_form(start: &str) -> Result<(Value, &str), ParseError> {
  match form(start) {
    Ok((rest, value)) => Ok((value, rest)),
    Err(nom::Err::Incomplete(_)) => Err(ParseError::Incomplete),
    Err(_) => Err(describe_failure(start)),
  }
}

fn skip_blank(input: &str) -> &str {
  blank(input).map_or(input, |(rest, _)| rest)
}

/// Read one form. Returns the form with the unread remainder, or `None` when
/// only whitespace and comments are left.
pub fn parse(input: &str) -> Result<Option<(Value, &str)>, ParseError> {
  let start = skip_blank(input);
  if start.is_empty() {
    return Ok(None);
  }

  scan_balance(start)?;
  read_form(start).map(Some)
}

/// Read every top-level form in `input`, in order. The balance scan runs once
/// over the whole input.
pub fn parse_program(input: &str) -> Result<Vec<Value>, ParseError> {
  scan_balance(input)?;

  let mut forms = Vec::new();
  let mut remaining = skip_blank(input);

  while !remaining.is_empty() {
    let (form, rest) = read_form(remaining)?;
    forms.push(form);
    remaining = skip_blank(rest);
  }

  Ok(forms)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{scheme_list, sym};

  #[test]
  fn test_parse_integer() {
    assert_eq!(
      parse("42").expect("Failed to parse integer 42"),
      Some((Value::Integer(42), ""))
    );
    assert_eq!(
      parse("-42").expect("Failed to parse integer -42"),
      Some((Value::Integer(-42), ""))
    );
    assert_eq!(
      parse("+7").expect("Failed to parse integer +7"),
      Some((Value::Integer(7), ""))
    );
  }

  #[test]
  fn test_parse_float() {
    assert_eq!(
      parse("42.5").expect("Failed to parse float 42.5"),
      Some((Value::Float(42.5), ""))
    );
    assert_eq!(
      parse("-0.5").expect("Failed to parse float -0.5"),
      Some((Value::Float(-0.5), ""))
    );
    assert_eq!(
      parse(".5").expect("Failed to parse float .5"),
      Some((Value::Float(0.5), ""))
    );
    assert_eq!(
      parse("42.").expect("Failed to parse float 42."),
      Some((Value::Float(42.0), ""))
    );
  }

  #[test]
  fn test_parse_number_requires_delimiter() {
    assert!(matches!(parse("12abc"), Err(ParseError::Error(_))));
  }

  #[test]
  fn test_parse_string() {
    assert_eq!(
      parse("\"hello\"").expect("Failed to parse string \"hello\""),
      Some((Value::String("hello".into()), ""))
    );
    assert_eq!(
      parse("\"hello\\nworld\"").expect("Failed to parse string with escaped newline"),
      Some((Value::String("hello\nworld".into()), ""))
    );
  }

  #[test]
  fn test_parse_empty_string_and_escapes() {
    assert_eq!(
      parse("\"\"").expect("Failed to parse empty string"),
      Some((Value::String("".into()), ""))
    );
    assert_eq!(
      parse(r#""say \"hi\" (\\)""#).expect("Failed to parse escaped quotes"),
      Some((Value::String("say \"hi\" (\\)".into()), ""))
    );
  }

  #[test]
  fn test_balance_ignores_strings_and_comments() {
    assert_eq!(scan_balance("(f \")\" ; (\n)"), Ok(()));
    assert_eq!(scan_balance("(f \"\\\"\""), Err(ParseError::Incomplete));
    assert_eq!(scan_balance("())"), Err(ParseError::UnmatchedClosing));
  }

  #[test]
  fn test_parse_bool() {
    assert_eq!(
      parse("#t").expect("Failed to parse #t"),
      Some((Value::Bool(true), ""))
    );
    assert_eq!(
      parse("#f").expect("Failed to parse #f"),
      Some((Value::Bool(false), ""))
    );
  }

  #[test]
  fn test_parse_bad_hash_token() {
    assert!(matches!(parse("#x"), Err(ParseError::Error(_))));
    assert!(matches!(parse("#true"), Err(ParseError::Error(_))));
  }

  #[test]
  fn test_parse_symbol() {
    for name in ["+", "-", "set!", "null?", "equal?", "make-counter", "<"] {
      assert_eq!(
        parse(name).expect("Failed to parse symbol"),
        Some((Value::symbol(name), ""))
      );
    }
  }

  #[test]
  fn test_parse_empty_list() {
    assert_eq!(
      parse("()").expect("Failed to parse empty list"),
      Some((Value::Nil, ""))
    );
  }

  #[test]
  fn test_parse_nested_list() {
    let expected = scheme_list![sym!("+"), scheme_list![1, 2], 3];
    assert_eq!(
      parse("(+ (1 2) 3)").expect("Failed to parse nested list (+ (1 2) 3)"),
      Some((expected, ""))
    );
  }

  #[test]
  fn test_parse_quote_shorthand() {
    let expected = scheme_list![sym!("quote"), scheme_list![1, 2]];
    assert_eq!(
      parse("'(1 2)").expect("Failed to parse quoted list"),
      Some((expected, ""))
    );
    assert_eq!(
      parse("'()").expect("Failed to parse quoted empty list"),
      Some((scheme_list![sym!("quote"), Value::Nil], ""))
    );
  }

  #[test]
  fn test_parse_quote_without_expression() {
    assert!(matches!(parse("(')"), Err(ParseError::Error(_))));
  }

  #[test]
  fn test_parse_with_comments() {
    let input = "; This is a comment\n(+ 1 ; inline ) comment\n 2)";
    let expected = scheme_list![sym!("+"), 1, 2];
    let result = parse(input).expect("Failed to parse expression with comments");
    assert_eq!(result, Some((expected, "")));
  }

  #[test]
  fn test_parse_empty_input() {
    assert_eq!(parse("").expect("Failed to parse empty string"), None);
    assert_eq!(parse("   ").expect("Failed to parse whitespace only"), None);
    assert_eq!(
      parse("; just a comment\n").expect("Failed to parse comment only"),
      None
    );
  }

  #[test]
  fn test_parse_program() {
    let forms = parse_program("(define x 1)\n; note\n x 'y").expect("Failed to parse program");
    assert_eq!(
      forms,
      vec![
        scheme_list![sym!("define"), sym!("x"), 1],
        sym!("x").into(),
        scheme_list![sym!("quote"), sym!("y")],
      ]
    );
  }

  #[test]
  fn test_parse_program_with_many_forms() {
    let source = "(+ 1 2) ; sum\n\"s\" 'x\n".repeat(20_000);
    let forms = parse_program(&source).expect("Failed to parse long program");

    assert_eq!(forms.len(), 60_000);
    assert_eq!(forms[0], scheme_list![sym!("+"), 1, 2]);
    assert_eq!(forms[59_999], scheme_list![sym!("quote"), sym!("x")]);
  }

  #[test]
  fn test_parse_program_reports_unbalanced_input() {
    assert_eq!(
      parse_program("(define x 1) x ("),
      Err(ParseError::Incomplete)
    );
    assert!(matches!(
      parse_program("(define x 1) 12abc"),
      Err(ParseError::Error(_))
    ));
  }

  #[test]
  fn test_incomplete_expression() {
    assert_eq!(parse("(+ 1"), Err(ParseError::Incomplete));
    assert_eq!(parse("((+ 1 2)"), Err(ParseError::Incomplete));
    assert_eq!(parse("\"hello"), Err(ParseError::Incomplete));
  }

  #[test]
  fn test_unmatched_closing_paren() {
    assert_eq!(parse(")"), Err(ParseError::UnmatchedClosing));
    assert_eq!(parse("(+ 1 2))"), Err(ParseError::UnmatchedClosing));
    assert_eq!(
      parse_program("(+ 1 2) 3)"),
      Err(ParseError::UnmatchedClosing)
    );
  }
}
