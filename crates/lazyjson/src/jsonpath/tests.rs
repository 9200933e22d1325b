use rstest::rstest;

use super::*;
use crate::{ErrorKind, PathErrorKind};

fn select(json: &str, path: &str) -> Vec<String> {
    let doc = Document::parse(json).unwrap();
    Path::parse(path)
        .unwrap()
        .evaluate(&doc)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect()
}

const SAMPLE: &str = r#"{"a": {"b": [10, 20, {"b": 30}], "c": "x"}, "2": "two", "list": ["p", "q", "r"]}"#;

#[rstest]
#[case("$", vec![SAMPLE])]
#[case("$.a.c", vec![r#""x""#])]
#[case("$['a']['c']", vec![r#""x""#])]
#[case(r#"$["a"].b[1]"#, vec!["20"])]
#[case("$.a.b[-1].b", vec!["30"])]
#[case("$.list[0,2]", vec![r#""p""#, r#""r""#])]
#[case("$.list['1']", vec![r#""q""#])]
#[case("$[2]", vec![r#""two""#])]
#[case("$.list.*", vec![r#""p""#, r#""q""#, r#""r""#])]
#[case("$.list[::-1]", vec![r#""r""#, r#""q""#, r#""p""#])]
#[case("$.list[1:]", vec![r#""q""#, r#""r""#])]
#[case("$..b", vec![r#"[10, 20, {"b": 30}]"#, "30"])]
#[case("$.a.b[?(@ > 15)]", vec!["20"])]
#[case("$.list[(@.length - 1)]", vec![r#""r""#])]
#[case("$.missing.b", vec![])]
#[case("$.list.x", vec![])]
#[case("$.a.c[0]", vec![])]
fn selects(#[case] path: &str, #[case] expected: Vec<&str>) {
    assert_eq!(select(SAMPLE, path), expected);
}

#[test]
fn descent_is_self_inclusive_and_deduplicated() {
    let json = r#"{"x": [1, [2]]}"#;
    assert_eq!(select(json, "$..*").len(), 4);
    assert_eq!(select(json, "$.x..[0]"), ["1", "2"]);

    let doc = Document::parse(json).unwrap();
    let x = doc.root().get("x").unwrap();
    let nodes = Path::parse("$..x..*").unwrap().evaluate(&doc).unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0].parent(), Some(x));
    assert_eq!(select(json, "$['x','x']..*").len(), 3);

    let err = Path::parse("$..").map(|_| ()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Path(PathErrorKind::MalformedPath));
}

#[test]
fn current_node_paths() {
    let doc = Document::parse(r#"{"a": {"b": 1}}"#).unwrap();
    let a = doc.root().get("a").unwrap();
    let path = Path::parse("@.b").unwrap();
    assert_eq!(path.evaluate_from(a).unwrap()[0].get_numeric().unwrap(), 1.0);
    assert!(path.evaluate(&doc).unwrap().is_empty());
    let root = Path::parse("$.a").unwrap().evaluate_from(a).unwrap();
    assert_eq!(root, [a]);
}

#[rstest]
#[case("", ErrorKind::Path(PathErrorKind::EmptyRequest))]
#[case("a.b", ErrorKind::Path(PathErrorKind::MalformedPath))]
#[case("$.", ErrorKind::Path(PathErrorKind::MalformedPath))]
#[case("$[]", ErrorKind::Path(PathErrorKind::MalformedPath))]
#[case("$[1:2:0]", ErrorKind::Path(PathErrorKind::MalformedPath))]
#[case("$[1:2:3:4]", ErrorKind::Path(PathErrorKind::MalformedPath))]
#[case("$[a:b]", ErrorKind::Path(PathErrorKind::MalformedPath))]
#[case("$['a]", ErrorKind::UnexpectedEndOfInput)]
#[case("$[?@.a]", ErrorKind::Path(PathErrorKind::MalformedPath))]
#[case("$[?(@.a ==)]", ErrorKind::Path(PathErrorKind::MalformedFormula))]
#[case("$$", ErrorKind::Path(PathErrorKind::MalformedPath))]
#[case("$.a b", ErrorKind::WrongSymbol)]
fn rejects(#[case] path: &str, #[case] kind: ErrorKind) {
    assert_eq!(Path::parse(path).map(|_| ()).unwrap_err().kind(), kind, "{path}");
}

#[test]
fn errors_point_into_the_path() {
    let err = Path::parse("$.a[?(@.b + #)]").map(|_| ()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Path(PathErrorKind::UnknownToken));
    assert_eq!(err.offset(), Some(12));
}

#[test]
fn filter_errors_propagate() {
    let doc = Document::parse(r#"[{"a": 1}, {"a": "x"}]"#).unwrap();
    let err = Path::parse("$[?(@.a * 2 > 1)]").unwrap().evaluate(&doc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WrongType);
}

#[test]
fn trailing_blanks_are_ignored_and_source_is_kept() {
    let path = Path::parse("$.a  ").unwrap();
    assert_eq!(path.to_string(), "$.a  ");
    assert_eq!(path.selectors().len(), 2);
    assert!(matches!(&path.selectors()[1], Selector::Child(k) if &**k == "a"));
}
