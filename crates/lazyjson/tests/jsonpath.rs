#![allow(missing_docs)]

mod common;

use common::BOOKSTORE;
use lazyjson::{ErrorKind, NodeRef, Path, Value, parse, query};
use rstest::rstest;

fn titles(nodes: &[NodeRef<'_>]) -> Vec<String> {
    nodes
        .iter()
        .map(|book| book.get("title").unwrap().get_string().unwrap().to_owned())
        .collect()
}

#[test]
fn bicycle() {
    common::init_tracing();
    let doc = parse(BOOKSTORE).unwrap();
    let found = doc.root().query("$.store.bicycle").unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].is_object());
    assert_eq!(found[0].path(), "$['store']['bicycle']");
    assert_eq!(found[0].get("color").unwrap().get_string().unwrap(), "red");
}

#[test]
fn every_price_in_document_order() {
    let doc = parse(BOOKSTORE).unwrap();
    let prices: Vec<f64> = doc
        .root()
        .query("$..price")
        .unwrap()
        .iter()
        .map(|p| p.get_numeric().unwrap())
        .collect();
    assert_eq!(prices, [8.95, 12.99, 8.99, 22.99, 19.95]);
}

#[test]
fn books_with_isbn() {
    let doc = parse(BOOKSTORE).unwrap();
    let books = doc.root().query("$..book[?(@.isbn)]").unwrap();
    assert_eq!(titles(&books), ["Moby Dick", "The Lord of the Rings"]);
}

#[test]
fn last_book_by_slice() {
    let doc = parse(BOOKSTORE).unwrap();
    let books = doc.root().query("$['store']['book'][-1:]").unwrap();
    assert_eq!(titles(&books), ["The Lord of the Rings"]);
}

#[test]
fn reversed_books() {
    let doc = parse(BOOKSTORE).unwrap();
    let books = doc.root().query("$.store.book[::-1]").unwrap();
    assert_eq!(
        titles(&books),
        ["The Lord of the Rings", "Moby Dick", "Sword of Honour", "Sayings of the Century"]
    );
}

#[test]
fn filter_operands_missing_on_some_nodes() {
    let doc = parse(BOOKSTORE).unwrap();
    let books = doc.root().query("$..book[?(@.isbn == '0-395-19395-8')]").unwrap();
    assert_eq!(titles(&books), ["The Lord of the Rings"]);
    let books = doc.root().query("$..book[?(not(@.isbn) && @.price > 10)]").unwrap();
    assert_eq!(titles(&books), ["Sword of Honour"]);
}

#[test]
fn cheap_books() {
    let doc = parse(BOOKSTORE).unwrap();
    let books = doc.root().query("$.store.book[?(@.price < 10)]").unwrap();
    assert_eq!(titles(&books), ["Sayings of the Century", "Moby Dick"]);
}

#[rstest]
#[case("$.store.book[*].author", 4)]
#[case("$..author", 4)]
#[case("$.store.*", 2)]
#[case("$.store..price", 5)]
#[case("$..book[2]", 1)]
#[case("$..book[:2]", 2)]
#[case("$..book[0,1]", 2)]
#[case("$..book[-2]", 1)]
#[case("$..*", 28)]
#[case("$..book[?(@.price > $.expensive)]", 2)]
#[case("$..book[?(@.author =~ '^H')]", 1)]
#[case("$..book[?(@.category == 'fiction' && @.price < 20)]", 2)]
#[case("$..book[?(length(@.title) > 15)]", 2)]
#[case("$..nothing", 0)]
#[case("$..book[5:1]", 0)]
#[case("$..book[5:1:-1]", 2)]
#[case("$..book[-10:]", 4)]
#[case("$..book[::-1]", 4)]
#[case("$..book[?(@.isbn == '0-553-21311-3')]", 1)]
#[case("$..book[?(@.isbn != '0-553-21311-3')]", 3)]
#[case("$..*[?(@.color)]", 1)]
fn result_sizes(#[case] path: &str, #[case] expected: usize) {
    let doc = parse(BOOKSTORE).unwrap();
    assert_eq!(doc.root().query(path).unwrap().len(), expected, "{path}");
}

#[test]
fn computed_index() {
    common::init_tracing();
    let doc = parse(BOOKSTORE).unwrap();
    let books = doc.root().query("$..book[(@.length-1)]").unwrap();
    assert_eq!(titles(&books), ["The Lord of the Rings"]);
}

#[test]
fn compiled_paths_are_reusable() {
    let path = Path::parse("$..book[?(@.isbn)].price").unwrap();
    let first = parse(BOOKSTORE).unwrap();
    let second = parse(r#"{"book": [{"isbn": "x", "price": 1}]}"#).unwrap();
    assert_eq!(path.evaluate(&first).unwrap().len(), 2);
    assert_eq!(path.evaluate(&second).unwrap()[0].get_numeric().unwrap(), 1.0);
    assert_eq!(lazyjson::evaluate(&path, &second).unwrap().len(), 1);
}

#[test]
fn one_shot_query() {
    let selection = query(BOOKSTORE.as_bytes(), "$.store.bicycle.*").unwrap();
    assert_eq!(
        selection.values().unwrap(),
        [Value::from("red"), Value::Number(19.95)]
    );
    assert_eq!(selection.to_bytes().unwrap(), br#"["red",19.95]"#);
}

#[test]
fn relative_queries_and_expressions() {
    let doc = parse(BOOKSTORE).unwrap();
    let moby = doc.root().query("$.store.book[2]").unwrap()[0];
    assert_eq!(moby.query("@.title").unwrap()[0].get_string().unwrap(), "Moby Dick");
    assert_eq!(moby.eval("@.price * 2").unwrap(), Value::Number(8.99 * 2.0));
    assert_eq!(
        lazyjson::eval(moby, "@.price < $.expensive").unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn queries_see_mutations() {
    let mut doc = parse(BOOKSTORE).unwrap();
    let bicycle = doc.root().query("$.store.bicycle").unwrap()[0].id();
    let isbn = doc.new_string("1-000");
    doc.append_object(bicycle, "isbn", isbn).unwrap();
    assert_eq!(doc.root().query("$..[?(@.isbn)]").unwrap().len(), 3);
}

#[test]
fn bad_paths() {
    let doc = parse(BOOKSTORE).unwrap();
    let err = doc.root().query("store.book").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Path(_)));
    let err = doc.root().query("$.store.book[?(@.price <)]").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Path(_)));
    let err = doc.root().query("$.store.book[::0]").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Path(lazyjson::PathErrorKind::MalformedPath));
    let err = doc.root().query("$.store.book[1:2:3:4]").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Path(_)));
}
