//! JSON parser with source ranges
//!
//! Strict JSON: one value, optional surrounding whitespace, no trailing
//! commas. Every node, key and object member records its range so the IR
//! can point back into the document.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1, take_while_m_n},
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{cut, eof, map, map_res, opt, recognize, value},
    error::{context, ErrorKind, ParseError as NomParseError, VerboseError, VerboseErrorKind},
    multi::{fold_many0, separated_list0},
    sequence::{pair, preceded, tuple},
    Err as NomErr, IResult,
};

use super::{Identifier, Literal, Node, NodeKind, Position, Property, TextRange};
use crate::error::{ParseError, Result};

type PResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

// ============================================================================
// Public API
// ============================================================================

/// Parse a complete JSON document into a ranged tree
pub fn parse_document(source: &str) -> Result<Node> {
    let parser = DocumentParser::new(source);
    match parser.document(source) {
        Ok((_, node)) => Ok(node),
        Err(NomErr::Error(e)) | Err(NomErr::Failure(e)) => Err(parser.syntax_error(e)),
        Err(NomErr::Incomplete(_)) => {
            let end = parser.position(source.len());
            Err(ParseError::Syntax {
                message: "unexpected end of input".to_string(),
                line: end.line,
                column: end.column,
                offset: end.offset,
            })
        }
    }
}

// ============================================================================
// Document Parser
// ============================================================================

/// Holds the full source so sub-parsers can turn remaining input into offsets
struct DocumentParser<'s> {
    source: &'s str,
    /// Byte offset at which each line starts
    line_starts: Vec<usize>,
}

impl<'s> DocumentParser<'s> {
    fn new(source: &'s str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { source, line_starts }
    }

    fn offset(&self, rest: &str) -> usize {
        self.source.len() - rest.len()
    }

    fn position(&self, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = self.source[self.line_starts[line]..offset].chars().count() + 1;
        Position {
            line: line as u32 + 1,
            column: column as u32,
            offset,
        }
    }

    /// Range between two suffixes of the source
    fn range(&self, start: &str, end: &str) -> TextRange {
        TextRange::new(
            self.position(self.offset(start)),
            self.position(self.offset(end)),
        )
    }

    fn syntax_error(&self, err: VerboseError<&str>) -> ParseError {
        let (rest, kind) = match err.errors.first() {
            Some((rest, kind)) => (*rest, kind.clone()),
            None => ("", VerboseErrorKind::Nom(ErrorKind::Fail)),
        };
        let position = self.position(self.offset(rest));

        let expected = err
            .errors
            .iter()
            .find_map(|(_, k)| match k {
                VerboseErrorKind::Context(ctx) => Some(ctx.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| match kind {
                VerboseErrorKind::Char(c) => format!("'{}'", c),
                VerboseErrorKind::Context(ctx) => ctx.to_string(),
                VerboseErrorKind::Nom(kind) => kind.description().to_lowercase(),
            });

        let found = match rest.chars().next() {
            Some(c) => format!("'{}'", c),
            None => "end of input".to_string(),
        };

        ParseError::Syntax {
            message: format!("expected {}, found {}", expected, found),
            line: position.line,
            column: position.column,
            offset: position.offset,
        }
    }

    fn document(&self, input: &'s str) -> PResult<'s, Node> {
        let (input, _) = multispace0(input)?;
        let (input, node) = self.json_value(input)?;
        let (input, _) = multispace0(input)?;
        let (input, _) = context("end of document", eof)(input)?;
        Ok((input, node))
    }

    fn json_value(&self, input: &'s str) -> PResult<'s, Node> {
        let start = input;
        let (rest, kind) = context(
            "value",
            alt((
                |i| self.object(i),
                |i| self.array(i),
                map(string, |s| NodeKind::Literal(Literal::String(s))),
                map(number, |n| NodeKind::Literal(Literal::Number(n))),
                value(NodeKind::Literal(Literal::Bool(true)), tag("true")),
                value(NodeKind::Literal(Literal::Bool(false)), tag("false")),
                value(NodeKind::Literal(Literal::Null), tag("null")),
            )),
        )(input)?;

        Ok((
            rest,
            Node {
                kind,
                range: self.range(start, rest),
            },
        ))
    }

    fn object(&self, input: &'s str) -> PResult<'s, NodeKind> {
        let (input, _) = char('{')(input)?;
        let (input, _) = multispace0(input)?;
        let (input, members) = separated_list0(separator, |i| self.member(i))(input)?;
        let (input, _) = multispace0(input)?;
        let (input, _) = cut(context("'}'", char('}')))(input)?;
        Ok((input, NodeKind::Object(members)))
    }

    fn member(&self, input: &'s str) -> PResult<'s, Property> {
        let start = input;
        let (input, key) = string(input)?;
        let key_range = self.range(start, input);
        let (input, _) = multispace0(input)?;
        let (input, _) = cut(context("':'", char(':')))(input)?;
        let (input, _) = multispace0(input)?;
        let (input, value) = cut(|i| self.json_value(i))(input)?;

        Ok((
            input,
            Property {
                key: Identifier {
                    value: key,
                    range: key_range,
                },
                value,
                range: self.range(start, input),
            },
        ))
    }

    fn array(&self, input: &'s str) -> PResult<'s, NodeKind> {
        let (input, _) = char('[')(input)?;
        let (input, _) = multispace0(input)?;
        let (input, items) = separated_list0(separator, |i| self.json_value(i))(input)?;
        let (input, _) = multispace0(input)?;
        let (input, _) = cut(context("']'", char(']')))(input)?;
        Ok((input, NodeKind::Array(items)))
    }
}

// ============================================================================
// Scalars
// ============================================================================

fn separator(input: &str) -> PResult<'_, char> {
    let (input, _) = multispace0(input)?;
    let (input, c) = char(',')(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, c))
}

fn number(input: &str) -> PResult<'_, f64> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            alt((tag("0"), digit1)),
            opt(pair(char('.'), digit1)),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

enum Fragment<'a> {
    Literal(&'a str),
    Escaped(char),
}

fn string(input: &str) -> PResult<'_, String> {
    let (input, _) = char('"')(input)?;
    let (input, s) = fold_many0(
        fragment,
        String::new,
        |mut acc, frag| {
            match frag {
                Fragment::Literal(s) => acc.push_str(s),
                Fragment::Escaped(c) => acc.push(c),
            }
            acc
        },
    )(input)?;
    let (input, _) = cut(context("closing quote", char('"')))(input)?;
    Ok((input, s))
}

fn fragment(input: &str) -> PResult<'_, Fragment<'_>> {
    alt((
        map(take_while1(is_unescaped), Fragment::Literal),
        map(escaped_char, Fragment::Escaped),
    ))(input)
}

/// Control characters must be escaped inside strings
fn is_unescaped(c: char) -> bool {
    c != '"' && c != '\\' && c >= '\u{20}'
}

fn escaped_char(input: &str) -> PResult<'_, char> {
    preceded(
        char('\\'),
        cut(context(
            "escape sequence",
            alt((
                unicode_escape,
                value('"', char('"')),
                value('\\', char('\\')),
                value('/', char('/')),
                value('\u{08}', char('b')),
                value('\u{0C}', char('f')),
                value('\n', char('n')),
                value('\r', char('r')),
                value('\t', char('t')),
            )),
        )),
    )(input)
}

fn hex4(input: &str) -> PResult<'_, u16> {
    map_res(
        take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit()),
        |h: &str| u16::from_str_radix(h, 16),
    )(input)
}

/// `\uXXXX`, combining a UTF-16 surrogate pair when present
fn unicode_escape(input: &str) -> PResult<'_, char> {
    let invalid = |at| NomErr::Error(VerboseError::from_error_kind(at, ErrorKind::Char));

    let (rest, high) = preceded(char('u'), hex4)(input)?;
    if !(0xD800..0xDC00).contains(&high) {
        return char::from_u32(u32::from(high))
            .map(|c| (rest, c))
            .ok_or_else(|| invalid(input));
    }

    let (rest, low) = preceded(tag("\\u"), hex4)(rest)?;
    if !(0xDC00..0xE000).contains(&low) {
        return Err(invalid(input));
    }
    let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
    char::from_u32(code)
        .map(|c| (rest, c))
        .ok_or_else(|| invalid(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars() {
        assert_eq!(
            parse_document("true").unwrap().kind,
            NodeKind::Literal(Literal::Bool(true))
        );
        assert_eq!(
            parse_document(" null ").unwrap().kind,
            NodeKind::Literal(Literal::Null)
        );
        assert_eq!(
            parse_document("-1.5e2").unwrap().kind,
            NodeKind::Literal(Literal::Number(-150.0))
        );
    }

    #[test]
    fn test_string_escapes() {
        let node = parse_document(r#""a\"b\\c\ndé😀""#).unwrap();
        assert_eq!(
            node.kind,
            NodeKind::Literal(Literal::String("a\"b\\c\nd\u{e9}\u{1F600}".to_string()))
        );
    }

    #[test]
    fn test_object_ranges() {
        let source = "{\n  \"type\": \"string\"\n}";
        let node = parse_document(source).unwrap();
        assert_eq!(node.range.start.offset, 0);
        assert_eq!(node.range.end.offset, source.len());

        let prop = node.property("type").unwrap();
        assert_eq!(prop.key.range.start, Position { line: 2, column: 3, offset: 4 });
        assert_eq!(prop.key.range.end.offset, 10);
        assert_eq!(prop.value.range.start, Position { line: 2, column: 11, offset: 12 });
        assert_eq!(prop.range.end.offset, 20);
    }

    #[test]
    fn test_array_children() {
        let node = parse_document("[1, \"two\", [], {}]").unwrap();
        let items = node.as_array().unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[1].range.start.offset, 4);
        assert_eq!(items[1].range.end.offset, 9);
    }

    #[test]
    fn test_rejects_raw_control_characters() {
        assert!(parse_document("\"tab\there\"").is_err());
        assert!(parse_document("\"line\nbreak\"").is_err());
        assert!(parse_document("{\"a\": \"\u{0}\"}").is_err());
        assert!(parse_document(r#""tab\there""#).is_ok());
    }

    #[test]
    fn test_rejects_trailing_comma() {
        let err = parse_document("{\"a\": 1,}").unwrap_err();
        match err {
            ParseError::Syntax { line, .. } => assert_eq!(line, 1),
            other => panic!("Expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_trailing_content() {
        assert!(parse_document("{} {}").is_err());
        assert!(parse_document("").is_err());
        assert!(parse_document("01").is_err());
    }

    #[test]
    fn test_error_position() {
        let err = parse_document("{\n  \"a\": tru\n}").unwrap_err();
        match err {
            ParseError::Syntax { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 8);
            }
            other => panic!("Expected syntax error, got {:?}", other),
        }
    }
}
