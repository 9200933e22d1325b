#![no_main]
use std::cell::RefCell;

use arbitrary::Arbitrary;
use lazyjson::{Document, NodeRef, ParserOptions, Path};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde_json::{Map, Value};

const HEADER: usize = 1; // option flags

thread_local! {
    static RNG: RefCell<SmallRng> =
        RefCell::new(SmallRng::from_os_rng());
}

static WS_TABLE: &[&[u8]] = &[b" ", b"\t", b"\n", b"\r"];

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

/// Mostly writes one well-formed value wrapped in whitespace, so the
/// parser gets past validation and the tree operations get exercised.
fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if max_size > HEADER && (size < HEADER || seed.is_multiple_of(10)) {
        data[0] = with_rng(|rng| rng.next_u32() as u8);

        let mut prefix = HEADER;
        let limit = max_size - prefix;
        prefix += append_whitespace(&mut data[prefix..], limit);
        let limit = max_size - prefix;
        prefix += append_value(&mut data[prefix..], size.max(8), limit);
        let limit = max_size - prefix;
        prefix += append_whitespace(&mut data[prefix..], limit);
        prefix
    } else {
        fuzzer_mutate(data, size, max_size)
    }
}

fn append_whitespace(buf: &mut [u8], limit: usize) -> usize {
    with_rng(|rng| {
        if limit == 0 {
            return 0;
        }

        let count = rng.random_range(0..=limit.min(4));
        let mut written = 0;
        for _ in 0..count {
            let w = WS_TABLE[rng.random_range(0..WS_TABLE.len())];
            buf[written..written + w.len()].copy_from_slice(w);
            written += w.len();
        }
        written
    })
}

fn append_value(data: &mut [u8], size: usize, limit: usize) -> usize {
    let value = loop {
        let s = with_rng(|rng| rng.random_range(size / 2..size * 2).min(limit));
        let bytes: Vec<u8> = with_rng(|rng| (0..s).map(|_| rng.random::<u8>()).collect());
        if let Ok(value) = ArbitraryValue::arbitrary(&mut arbitrary::Unstructured::new(&bytes)) {
            break value;
        }
    };

    let serialized = serde_json::to_vec_pretty(&value.0).expect("Failed to serialize arbitrary value");

    let len = serialized.len().min(limit);
    data[..len].copy_from_slice(&serialized[..len]);
    len
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

#[derive(Debug)]
struct ArbitraryValue(Value);

impl<'a> Arbitrary<'a> for ArbitraryValue {
    fn arbitrary(u: &mut arbitrary::Unstructured<'_>) -> arbitrary::Result<Self> {
        let value = match u.choose_index(21)? {
            0 => Value::Null,
            1 => Value::Bool(u.arbitrary()?),
            2 => {
                let n: f64 = u.arbitrary()?;
                Value::Number(
                    serde_json::Number::from_f64(n).ok_or(arbitrary::Error::IncorrectFormat)?,
                )
            }
            3..=10 => Value::String(u.arbitrary()?),
            11..=15 => {
                let elems: Vec<ArbitraryValue> = u.arbitrary()?;
                Value::Array(elems.into_iter().map(|v| v.0).collect())
            }
            16..=20 => {
                let m: Vec<(String, ArbitraryValue)> = u.arbitrary()?;
                Value::Object(Map::from_iter(m.into_iter().map(|(k, v)| (k, v.0))))
            }
            _ => Err(arbitrary::Error::IncorrectFormat)?,
        };
        Ok(ArbitraryValue(value))
    }
}

fn count_descendants(node: NodeRef<'_>) -> usize {
    let mut stack: Vec<NodeRef<'_>> = node.children().collect();
    let mut count = 0;
    while let Some(next) = stack.pop() {
        count += 1;
        stack.extend(next.children());
    }
    count
}

fn document(data: &[u8]) {
    if data.len() <= HEADER {
        return;
    }

    let flags = data[0];
    let options = ParserOptions {
        max_depth: (flags & 1 != 0).then_some(usize::from(flags >> 1)),
    };
    let input = &data[HEADER..];

    let Ok(doc) = lazyjson::parse_with(input, options) else {
        return;
    };

    // An untouched document writes back its own text.
    let written = doc.to_bytes().expect("clean document serializes");
    assert_eq!(written, input.trim_ascii());

    // Invalid UTF-8 inside strings only surfaces on access, and very deep
    // trees are not unpacked.
    let Ok(value) = doc.root().unpack() else {
        return;
    };

    let everything = Path::parse("$..*").expect("static path compiles");
    let selected = everything.evaluate(&doc).expect("wildcard descent cannot fail");
    assert_eq!(selected.len(), count_descendants(doc.root()));

    // A copy is fully dirty, so it goes through the compact writer.
    let mut copy = Document::new();
    let root = copy.import(&doc, doc.root_id()).expect("import from a valid document");
    copy.set_root(root).expect("imported node is detached");
    // Literals like 1e999 decode to infinity, which has no JSON form.
    let Ok(rendered) = copy.to_bytes() else {
        return;
    };
    let reparsed = lazyjson::parse(rendered.as_slice()).expect("compact output reparses");
    assert_eq!(reparsed.root().unpack().expect("output is valid UTF-8"), value);
}

fuzz_target!(|data: &[u8]| document(data));
