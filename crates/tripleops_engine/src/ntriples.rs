//! Line-oriented N-Triples reading and writing.
//!
//! Terms are kept in their N-Triples lexical form (`<iri>`, `_:label`,
//! `"literal"@lang`, `"literal"^^<iri>`), so writing is concatenation.

use std::io::Write;

use crate::Triple;

/// Parses one line. Blank lines and comments yield `Ok(None)`.
///
/// Relative IRIs (no scheme) are prefixed with `base` when one is given.
pub(crate) fn parse_line(line: &str, base: Option<&str>) -> Result<Option<Triple>, String> {
    let mut rest = line.trim();
    if rest.is_empty() || rest.starts_with('#') {
        return Ok(None);
    }

    let subject = next_term(&mut rest, base)?;
    if subject.starts_with('"') {
        return Err("subject cannot be a literal".to_string());
    }
    let predicate = next_term(&mut rest, base)?;
    if !predicate.starts_with('<') {
        return Err("predicate must be an IRI".to_string());
    }
    let object = next_term(&mut rest, base)?;

    let rest = rest.trim_start();
    let Some(tail) = rest.strip_prefix('.') else {
        return Err("missing terminating '.'".to_string());
    };
    let tail = tail.trim_start();
    if !(tail.is_empty() || tail.starts_with('#')) {
        return Err(format!("unexpected trailing content {tail:?}"));
    }

    Ok(Some(Triple {
        subject,
        predicate,
        object,
    }))
}

pub(crate) fn write_triple(out: &mut dyn Write, triple: &Triple) -> std::io::Result<()> {
    writeln!(
        out,
        "{} {} {} .",
        triple.subject, triple.predicate, triple.object
    )
}

fn next_term(rest: &mut &str, base: Option<&str>) -> Result<String, String> {
    let input = rest.trim_start();
    let term = match input.chars().next() {
        Some('<') => {
            let end = input
                .find('>')
                .ok_or_else(|| "unterminated IRI".to_string())?;
            let iri = &input[1..end];
            if iri.chars().any(char::is_whitespace) {
                return Err(format!("whitespace inside IRI <{iri}>"));
            }
            *rest = &input[end + 1..];
            match base {
                Some(base) if !has_scheme(iri) => format!("<{base}{iri}>"),
                _ => format!("<{iri}>"),
            }
        }
        Some('_') => {
            let body = input
                .strip_prefix("_:")
                .ok_or_else(|| "blank node must start with '_:'".to_string())?;
            let len = body
                .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.')))
                .unwrap_or(body.len());
            // A label may not end with '.', that dot terminates the statement.
            let label = body[..len].trim_end_matches('.');
            if label.is_empty() {
                return Err("empty blank node label".to_string());
            }
            *rest = &body[label.len()..];
            format!("_:{label}")
        }
        Some('"') => {
            let end = closing_quote(input).ok_or_else(|| "unterminated literal".to_string())?;
            let mut consumed = end + 1;
            let after = &input[consumed..];
            if let Some(lang) = after.strip_prefix('@') {
                let len = lang
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
                    .unwrap_or(lang.len());
                if len == 0 {
                    return Err("empty language tag".to_string());
                }
                consumed += 1 + len;
            } else if let Some(datatype) = after.strip_prefix("^^<") {
                let close = datatype
                    .find('>')
                    .ok_or_else(|| "unterminated datatype IRI".to_string())?;
                consumed += 3 + close + 1;
            }
            *rest = &input[consumed..];
            input[..consumed].to_string()
        }
        Some(other) => return Err(format!("unexpected character {other:?}")),
        None => return Err("unexpected end of line".to_string()),
    };
    Ok(term)
}

/// Byte index of the closing quote of a literal starting at `input[0]`.
fn closing_quote(input: &str) -> Option<usize> {
    let mut escaped = false;
    for (index, c) in input.char_indices().skip(1) {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return Some(index),
            _ => escaped = false,
        }
    }
    None
}

fn has_scheme(iri: &str) -> bool {
    let Some((scheme, _)) = iri.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Triple {
        parse_line(line, None).unwrap().unwrap()
    }

    #[test]
    fn parses_iris_blank_nodes_and_literals() {
        let t = parse(r#"<http://a/s> <http://a/p> "say \"hi\""@en-GB ."#);
        assert_eq!(t.subject, "<http://a/s>");
        assert_eq!(t.object, r#""say \"hi\""@en-GB"#);

        let t = parse("_:b0 <http://a/p> _:b1.");
        assert_eq!(t.subject, "_:b0");
        assert_eq!(t.object, "_:b1");

        let t = parse(r#"<s:1> <http://a/p> "42"^^<http://www.w3.org/2001/XMLSchema#int> . # note"#);
        assert_eq!(t.object, r#""42"^^<http://www.w3.org/2001/XMLSchema#int>"#);
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        assert_eq!(parse_line("   ", None), Ok(None));
        assert_eq!(parse_line("# comment", None), Ok(None));
    }

    #[test]
    fn relative_iris_resolve_against_base() {
        let t = parse_line("<alice> <http://xmlns.com/foaf/0.1/knows> <bob> .", Some("http://ex.org/"))
            .unwrap()
            .unwrap();
        assert_eq!(t.subject, "<http://ex.org/alice>");
        assert_eq!(t.predicate, "<http://xmlns.com/foaf/0.1/knows>");
        assert_eq!(t.object, "<http://ex.org/bob>");
    }

    #[test]
    fn reports_malformed_statements() {
        assert!(parse_line("<http://a/s> <http://a/p> <http://a/o>", None).is_err());
        assert!(parse_line("<http://a/s <http://a/p> <http://a/o> .", None).is_err());
        assert!(parse_line(r#""lit" <http://a/p> <http://a/o> ."#, None).is_err());
        assert!(parse_line("<http://a/s> _:p <http://a/o> .", None).is_err());
        assert!(parse_line(r#"<http://a/s> <http://a/p> "open ."#, None).is_err());
        assert!(parse_line("<http://a/s> <http://a/p> <http://a/o> . extra", None).is_err());
    }

    #[test]
    fn writes_one_statement_per_line() {
        let mut out = Vec::new();
        write_triple(&mut out, &parse("<http://a/s> <http://a/p> _:o .")).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "<http://a/s> <http://a/p> _:o .\n");
    }
}
