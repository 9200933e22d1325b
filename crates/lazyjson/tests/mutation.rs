#![allow(missing_docs)]

mod common;

use common::BOOKSTORE;
use lazyjson::{Document, ErrorKind, Value, parse};

fn ids_of(doc: &Document<'_>, path: &str) -> Vec<lazyjson::NodeId> {
    doc.root().query(path).unwrap().iter().map(|n| n.id()).collect()
}

#[test]
fn remaining_elements_stay_dense() {
    let mut doc = parse(b"[{},[],1]").unwrap();
    let root = doc.root_id();
    doc.delete_index(root, 1).unwrap();

    let indices: Vec<_> = doc.root().children().map(|c| c.index()).collect();
    assert_eq!(indices, [Some(0), Some(1)]);
    assert!(doc.root().at(2).is_none());
    assert_eq!(doc.root().at(-1).unwrap().get_numeric().unwrap(), 1.0);
}

#[test]
fn rejected_cycles_leave_both_trees_alone() {
    let mut doc = parse(br#"{"outer": {"inner": [true]}, "other": [null]}"#).unwrap();
    let before = doc.to_bytes().unwrap();
    let outer = ids_of(&doc, "$.outer")[0];
    let inner = ids_of(&doc, "$.outer.inner")[0];
    let root = doc.root_id();

    assert_eq!(doc.append_array(inner, outer).unwrap_err().kind(), ErrorKind::WrongRequest);
    assert_eq!(
        doc.set_array(inner, [root]).unwrap_err().kind(),
        ErrorKind::WrongRequest
    );
    assert_eq!(
        doc.append_object(outer, "self", outer).unwrap_err().kind(),
        ErrorKind::WrongRequest
    );

    assert_eq!(doc.to_bytes().unwrap(), before);
    assert!(!doc.root().is_dirty());
    assert_eq!(doc.get(inner).unwrap().parent().unwrap().id(), outer);
}

#[test]
fn clean_siblings_are_served_from_source() {
    let mut doc = parse(BOOKSTORE).unwrap();
    let price = ids_of(&doc, "$.store.bicycle.price")[0];
    doc.set_numeric(price, 21.5).unwrap();

    let root = doc.root();
    assert!(root.is_dirty());
    assert!(root.get("store").unwrap().is_dirty());
    assert!(!root.get("expensive").unwrap().is_dirty());
    let book = root.query("$.store.book").unwrap()[0];
    assert!(!book.is_dirty());

    let out = doc.to_bytes().unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with(r#"{"store":{"book":["#));
    assert!(text.contains(&String::from_utf8(book.to_bytes().unwrap()).unwrap()));
    assert!(text.ends_with(r#""bicycle":{"color":"red","price":21.5}},"expensive":10}"#));
}

#[test]
fn restock_the_bookstore() {
    common::init_tracing();
    let mut doc = parse(BOOKSTORE).unwrap();
    let books = ids_of(&doc, "$.store.book")[0];

    let isbnless = ids_of(&doc, "$.store.book[?(not(@.isbn))]");
    assert_eq!(isbnless.len(), 2);
    for book in isbnless {
        doc.remove(books, book).unwrap();
    }

    let title = doc.new_string("Dune");
    let price = doc.new_numeric(9.99);
    let dune = doc.new_object([("title", title), ("price", price)]).unwrap();
    doc.append_array(books, dune).unwrap();

    let cheap = doc.root().query("$..book[?(@.price < 10)].title").unwrap();
    let titles: Vec<_> = cheap.iter().map(|t| t.get_string().unwrap()).collect();
    assert_eq!(titles, ["Moby Dick", "Dune"]);
    assert_eq!(doc.root().query("$..book[2]").unwrap()[0].path(), "$['store']['book'][2]");

    let reparsed = parse(doc.to_bytes().unwrap()).unwrap();
    assert_eq!(reparsed.root().unpack().unwrap(), doc.root().unpack().unwrap());
}

#[test]
fn moving_a_subtree_between_parents() {
    let mut doc = parse(br#"{"a": {"k": [1, 2]}, "b": {}}"#).unwrap();
    let k = ids_of(&doc, "$.a.k")[0];
    let b = ids_of(&doc, "$.b")[0];
    doc.append_object(b, "moved", k).unwrap();

    assert!(doc.root().get("a").unwrap().is_empty());
    let moved = doc.get(k).unwrap();
    assert_eq!(moved.path(), "$['b']['moved']");
    assert_eq!(moved.to_bytes().unwrap(), b"[1, 2]");
    assert_eq!(doc.to_bytes().unwrap(), br#"{"a":{},"b":{"moved":[1, 2]}}"#);
}

#[test]
fn copies_between_documents_are_independent() {
    let source = parse(BOOKSTORE).unwrap();
    let bicycle = source.root().query("$.store.bicycle").unwrap()[0].id();

    let mut target = Document::new();
    let copy = target.import(&source, bicycle).unwrap();
    target.set_root(copy).unwrap();
    let color = target.root().get("color").unwrap().id();
    target.set_string(color, "blue").unwrap();

    assert_eq!(target.to_bytes().unwrap(), br#"{"color":"blue","price":19.95}"#);
    assert_eq!(
        source.root().query("$.store.bicycle.color").unwrap()[0].unpack().unwrap(),
        Value::from("red")
    );
}

#[test]
fn owned_documents_outlive_their_input() {
    let doc = {
        let text = String::from(r#"{"n": [1, 2, 3]}"#);
        let borrowed = parse(text.as_str()).unwrap();
        borrowed.into_owned()
    };
    assert!(!doc.is_borrowed());
    assert_eq!(doc.root().eval("length(@.n) + @.n[0]").unwrap(), Value::Number(4.0));
}

#[test]
fn deep_nesting_is_handled_without_recursion() {
    const LEVELS: usize = 200_000;
    let text = format!("{}{}", "[".repeat(LEVELS), "]".repeat(LEVELS));
    let mut doc = parse(text.as_str()).unwrap();
    assert_eq!(doc.root().nesting(), LEVELS);
    assert_eq!(doc.to_bytes().unwrap(), text.as_bytes());
    assert_eq!(doc.root().query("$..*").unwrap().len(), LEVELS - 1);
    assert_eq!(doc.root().unpack().unwrap_err().kind(), ErrorKind::WrongRequest);

    let mut copy = Document::new();
    let root = copy.import(&doc, doc.root_id()).unwrap();
    copy.set_root(root).unwrap();
    assert!(copy.root().is_dirty());
    assert_eq!(copy.to_bytes().unwrap(), text.as_bytes());

    let first = doc.root().at(0).unwrap().id();
    let root = doc.root_id();
    doc.set_node(first, root).unwrap();
    assert_eq!(doc.to_bytes().unwrap(), format!("[{text}]").as_bytes());
}
