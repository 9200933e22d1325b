//! Path text to selectors.

use alloc::{format, sync::Arc, vec, vec::Vec};

use bstr::BStr;

use super::{Item, Selector};
use crate::{
    Error, PathErrorKind, Registry, Script,
    classes::{
        ACT_BLANK, ACT_BRACKET, ACT_CURRENT, ACT_DESCENT, ACT_MEMBER, ACT_ROOT, ACT_WILDCARD,
        P_DESCENT, P_DOT, P_START, P_STEP, classify, is_path_end, path_next,
    },
    escape::unescape,
    scanner::Scanner,
};

type Result<T> = core::result::Result<T, Error>;

fn malformed(message: impl Into<alloc::string::String>) -> Error {
    Error::path(PathErrorKind::MalformedPath, message)
}

/// Moves the offset of an error raised while compiling a piece of the path
/// that starts at `base`.
fn shifted(err: Error, base: usize) -> Error {
    let offset = base + err.offset().unwrap_or(0);
    err.at(offset)
}

pub(super) fn selectors(path: &str, registry: &Registry) -> Result<Vec<Selector>> {
    let mut scanner = Scanner::new(path.as_bytes());
    if scanner.first_non_space().is_err() {
        return Err(Error::path(PathErrorKind::EmptyRequest, "path is empty"));
    }
    let mut selectors = Vec::new();
    let mut state = P_START;

    while let Some(b) = scanner.peek() {
        let start = scanner.index();
        state = match path_next(state, classify(b)) {
            next if next >= 0 => {
                scanner.seek(start + 1);
                next
            }
            ACT_ROOT | ACT_CURRENT => {
                selectors.push(if b == b'$' { Selector::Root } else { Selector::Current });
                scanner.seek(start + 1);
                P_STEP
            }
            ACT_DESCENT => {
                selectors.push(Selector::Descent);
                scanner.seek(start + 1);
                P_DESCENT
            }
            ACT_WILDCARD => {
                selectors.push(Selector::Wildcard);
                scanner.seek(start + 1);
                P_STEP
            }
            ACT_MEMBER => {
                selectors.push(member(&mut scanner, path));
                P_STEP
            }
            ACT_BRACKET => {
                scanner.consume_balanced(b'[', b']')?;
                let inner = &path[start + 1..scanner.index() - 1];
                selectors.push(bracket(inner, start + 1, registry)?);
                P_STEP
            }
            ACT_BLANK => {
                if scanner.first_non_space().is_ok() {
                    return Err(scanner.error_symbol());
                }
                P_STEP
            }
            _ => return Err(unexpected(state, b, start)),
        };
    }
    if !is_path_end(state) {
        return Err(malformed("member name expected after '.'").at(path.len()));
    }
    Ok(selectors)
}

fn unexpected(state: i8, b: u8, at: usize) -> Error {
    match state {
        P_START => malformed("path must start with '$' or '@'"),
        P_DOT | P_DESCENT => malformed("member name expected after '.'"),
        _ => malformed(format!("unexpected '{}'", BStr::new(&[b]))),
    }
    .at(at)
}

/// A member name after a dot, running up to the next `.`, `[` or blank.
fn member(scanner: &mut Scanner<'_>, path: &str) -> Selector {
    let start = scanner.index();
    // Running off the end leaves the cursor there, which ends the name too.
    let _ = scanner.skip_to_any(b".[ \t\r\n");
    Selector::Child(Arc::from(&path[start..scanner.index()]))
}

/// The inside of one `[...]` group starting at byte `base` of the path.
fn bracket(inner: &str, base: usize, registry: &Registry) -> Result<Selector> {
    let trimmed = inner.trim();
    let base = base + (inner.len() - inner.trim_start().len());

    if trimmed == "*" {
        return Ok(Selector::Wildcard);
    }
    if let Some(rest) = trimmed.strip_prefix('?') {
        let body = rest.trim_start();
        let base = base + 1 + (rest.len() - body.len());
        let expression = parenthesized(body)
            .ok_or_else(|| malformed("filter must be written as [?(...)]").at(base))?;
        let script = Script::parse_with(expression, registry).map_err(|e| shifted(e, base + 1))?;
        return Ok(Selector::Filter(script));
    }
    if let Some(expression) = parenthesized(trimmed) {
        let script = Script::parse_with(expression, registry).map_err(|e| shifted(e, base + 1))?;
        return Ok(Selector::Script(script));
    }
    if trimmed.is_empty() {
        return Err(malformed("empty brackets").at(base));
    }

    let parts = split_unquoted(trimmed, b':');
    if parts.len() > 1 {
        return slice(&parts, base);
    }

    let mut items = Vec::new();
    for (offset, part) in split_unquoted(trimmed, b',') {
        items.push(item(part, base + offset)?);
    }
    Ok(match <[Item; 1]>::try_from(items) {
        Ok([Item::Key(key)]) => Selector::Child(key),
        Ok([item]) => Selector::Union(vec![item]),
        Err(items) => Selector::Union(items),
    })
}

fn parenthesized(text: &str) -> Option<&str> {
    text.strip_prefix('(')?.strip_suffix(')')
}

fn slice(parts: &[(usize, &str)], base: usize) -> Result<Selector> {
    if parts.len() > 3 {
        return Err(malformed("slice takes at most three fields").at(base));
    }
    let bound = |index: usize| -> Result<Option<i64>> {
        let Some(&(offset, text)) = parts.get(index) else {
            return Ok(None);
        };
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        text.parse::<i64>()
            .map(Some)
            .map_err(|_| malformed(format!("bad slice bound '{text}'")).at(base + offset))
    };
    let step = bound(2)?.unwrap_or(1);
    if step == 0 {
        return Err(malformed("slice step cannot be zero").at(base));
    }
    Ok(Selector::Slice {
        start: bound(0)?,
        stop: bound(1)?,
        step,
    })
}

/// One union member: a quoted key, an integer index or a bare key.
fn item(text: &str, base: usize) -> Result<Item> {
    let trimmed = text.trim();
    let base = base + (text.len() - text.trim_start().len());
    let bytes = trimmed.as_bytes();
    match bytes.first() {
        Some(&quote @ (b'\'' | b'"')) => {
            let mut scanner = Scanner::new(bytes);
            scanner.seek(1);
            if scanner.skip_to(quote).is_err() {
                return Err(malformed("unterminated quoted key").at(base));
            }
            let end = scanner.index();
            if end + 1 != bytes.len() {
                return Err(malformed("unexpected text after quoted key").at(base + end + 1));
            }
            let key = unescape(&bytes[1..end], base + 1)?;
            Ok(Item::Key(Arc::from(key.as_ref())))
        }
        Some(_) => Ok(trimmed
            .parse::<i64>()
            .map_or_else(|_| Item::Key(Arc::from(trimmed)), Item::Index)),
        None => Err(malformed("empty union member").at(base)),
    }
}

/// Splits on `separator` bytes that are not inside a quoted string. Each
/// piece comes with its offset in `text`.
fn split_unquoted(text: &str, separator: u8) -> Vec<(usize, &str)> {
    let mut scanner = Scanner::new(text.as_bytes());
    let mut parts = Vec::new();
    let mut start = 0;
    while let Ok(b) = scanner.skip_to_any(&[separator, b'\'', b'"']) {
        let at = scanner.index();
        if b == separator {
            parts.push((start, &text[start..at]));
            start = at + 1;
            scanner.seek(start);
        } else if scanner.consume_string(b).is_err() {
            break;
        }
    }
    parts.push((start, &text[start..]));
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_inside_quotes_do_not_split() {
        let parts: Vec<_> = split_unquoted(r#"'a,b', "c\",d",3"#, b',')
            .into_iter()
            .map(|(_, p)| p)
            .collect();
        assert_eq!(parts, [r#"'a,b'"#, r#" "c\",d""#, "3"]);
        assert_eq!(split_unquoted("1:'x", b':'), [(0, "1"), (2, "'x")]);
    }

    #[test]
    fn dotted_steps() {
        let registry = Registry::standard();
        let steps = selectors(" $..a.*[0] ", registry).unwrap();
        assert_eq!(steps.len(), 5);
        assert!(matches!(steps[1], Selector::Descent));
        assert!(matches!(&steps[2], Selector::Child(name) if &**name == "a"));
        assert!(matches!(steps[3], Selector::Wildcard));
        for bad in ["$.", "$..", "$.[0]", "$...a", "$a", "x", "$.a b"] {
            assert!(selectors(bad, registry).is_err(), "{bad}");
        }
    }

    #[test]
    fn union_members() {
        assert_eq!(item(" 'x y' ", 0).unwrap(), Item::Key("x y".into()));
        assert_eq!(item("-2", 0).unwrap(), Item::Index(-2));
        assert_eq!(item("name", 0).unwrap(), Item::Key("name".into()));
        assert!(item("'open", 0).is_err());
        assert!(item(r"'esc\'", 0).is_err());
        assert!(item("'a'b'", 0).is_err());
    }
}
