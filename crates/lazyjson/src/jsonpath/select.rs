//! Selector evaluation over result sets.

use alloc::{string::ToString, vec, vec::Vec};

use super::{Item, Selector};
use crate::{Error, NodeRef, Value};

type Result<T> = core::result::Result<T, Error>;

pub(super) fn run<'a>(selectors: &[Selector], current: NodeRef<'a>) -> Result<Vec<NodeRef<'a>>> {
    let mut nodes = vec![current];
    for selector in selectors {
        nodes = apply(selector, &nodes, current)?;
        tracing::trace!(?selector, matched = nodes.len(), "applied selector");
        if nodes.is_empty() {
            break;
        }
    }
    Ok(nodes)
}

fn apply<'a>(
    selector: &Selector,
    nodes: &[NodeRef<'a>],
    current: NodeRef<'a>,
) -> Result<Vec<NodeRef<'a>>> {
    let mut out = Vec::new();
    match selector {
        Selector::Root => out.push(current.document().root()),
        Selector::Current => out.push(current),
        Selector::Child(key) => out.extend(nodes.iter().filter_map(|node| by_key(*node, key))),
        Selector::Wildcard => {
            for node in nodes {
                out.extend(node.children());
            }
        }
        Selector::Descent => descend(nodes, &mut out),
        Selector::Union(items) => {
            for node in nodes {
                out.extend(items.iter().filter_map(|item| by_item(*node, item)));
            }
        }
        Selector::Slice { start, stop, step } => {
            for node in nodes.iter().filter(|node| node.is_array()) {
                let children: Vec<_> = node.children().collect();
                out.extend(
                    slice_indices(children.len(), *start, *stop, *step)
                        .into_iter()
                        .map(|i| children[i]),
                );
            }
        }
        Selector::Filter(script) => {
            for node in nodes {
                for child in node.children() {
                    if script.evaluate(child)?.is_truthy() {
                        out.push(child);
                    }
                }
            }
        }
        Selector::Script(script) => {
            for node in nodes {
                let found = match script.evaluate(*node)? {
                    #[allow(clippy::cast_possible_truncation)]
                    Value::Number(n) if n.fract() == 0.0 => by_item(*node, &Item::Index(n as i64)),
                    Value::String(key) => by_key(*node, &key),
                    _ => None,
                };
                out.extend(found);
            }
        }
    }
    Ok(out)
}

/// Object member by key, or array element when the key is an integer.
fn by_key<'a>(node: NodeRef<'a>, key: &str) -> Option<NodeRef<'a>> {
    if node.is_array() {
        return node.at(key.parse().ok()?);
    }
    node.get(key)
}

fn by_item<'a>(node: NodeRef<'a>, item: &Item) -> Option<NodeRef<'a>> {
    match item {
        Item::Key(key) => by_key(node, key),
        Item::Index(i) if node.is_array() => node.at(isize::try_from(*i).ok()?),
        Item::Index(i) => node.get(&i.to_string()),
    }
}

/// Every node of `nodes` with all of its descendants, pre-order. A node
/// reached twice (as a descendant of an earlier node) is listed once.
fn descend<'a>(nodes: &[NodeRef<'a>], out: &mut Vec<NodeRef<'a>>) {
    let Some(first) = nodes.first() else {
        return;
    };
    let mut visited = vec![false; first.document().arena_len()];
    let mut stack = Vec::new();
    for &node in nodes {
        stack.push(node);
        while let Some(node) = stack.pop() {
            let seen = &mut visited[node.id().index()];
            if *seen {
                continue;
            }
            *seen = true;
            out.push(node);
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev());
        }
    }
}

/// Positions selected by `[start:stop:step]` on a sequence of `len`
/// elements, following Python's slice rules.
fn slice_indices(len: usize, start: Option<i64>, stop: Option<i64>, step: i64) -> Vec<usize> {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let clamp = |bound: i64, low: i64, high: i64| {
        let bound = if bound < 0 { bound + len } else { bound };
        bound.clamp(low, high)
    };
    let mut indices = Vec::new();
    if step > 0 {
        let start = start.map_or(0, |s| clamp(s, 0, len));
        let stop = stop.map_or(len, |s| clamp(s, 0, len));
        let mut i = start;
        while i < stop {
            indices.extend(usize::try_from(i));
            i = i.saturating_add(step);
        }
    } else {
        let start = start.map_or(len - 1, |s| clamp(s, -1, len - 1));
        let stop = stop.map_or(-1, |s| clamp(s, -1, len - 1));
        let mut i = start;
        while i > stop {
            indices.extend(usize::try_from(i));
            i = i.saturating_add(step);
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(None, None, 1, vec![0, 1, 2, 3, 4])]
    #[case(Some(1), Some(3), 1, vec![1, 2])]
    #[case(Some(-2), None, 1, vec![3, 4])]
    #[case(None, None, 2, vec![0, 2, 4])]
    #[case(None, None, -1, vec![4, 3, 2, 1, 0])]
    #[case(Some(3), Some(0), -1, vec![3, 2, 1])]
    #[case(Some(-1), Some(-3), -1, vec![4, 3])]
    #[case(Some(10), None, -2, vec![4, 2, 0])]
    #[case(Some(-10), Some(10), 1, vec![0, 1, 2, 3, 4])]
    #[case(Some(3), Some(1), 1, vec![])]
    fn python_slices(
        #[case] start: Option<i64>,
        #[case] stop: Option<i64>,
        #[case] step: i64,
        #[case] expected: Vec<usize>,
    ) {
        assert_eq!(slice_indices(5, start, stop, step), expected);
    }

    #[quickcheck_macros::quickcheck]
    fn slices_stay_in_bounds_and_ordered(len: u8, start: Option<i8>, stop: Option<i8>, step: i8) -> bool {
        if step == 0 {
            return true;
        }
        let indices = slice_indices(len.into(), start.map(i64::from), stop.map(i64::from), step.into());
        indices.iter().all(|&i| i < usize::from(len))
            && indices.windows(2).all(|w| if step > 0 { w[0] < w[1] } else { w[0] > w[1] })
    }

    #[test]
    fn empty_sequence_slices_to_nothing() {
        assert!(slice_indices(0, None, None, -1).is_empty());
        assert!(slice_indices(0, Some(-1), None, 1).is_empty());
    }
}
