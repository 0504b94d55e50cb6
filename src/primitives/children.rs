//! Children helpers - Working with the opaque children list.
//!
//! Children handed to a component (`Context::children`) may contain
//! fragments and empties. These helpers walk them the way the reconciler
//! sees them: fragments flattened, empties skipped.

use crate::error::{Error, Result};
use super::element::Element;

/// Flatten nested fragments and drop empties.
pub fn flatten(children: Vec<Element>) -> Vec<Element> {
    let mut out = Vec::with_capacity(children.len());
    flatten_into(children, &mut out);
    out
}

fn flatten_into(children: Vec<Element>, out: &mut Vec<Element>) {
    for child in children {
        match child {
            Element::Fragment(nested) => flatten_into(nested, out),
            Element::Empty => {}
            other => out.push(other),
        }
    }
}

fn visit<'a>(children: &'a [Element], f: &mut impl FnMut(&'a Element)) {
    for child in children {
        match child {
            Element::Fragment(nested) => visit(nested, f),
            Element::Empty => {}
            other => f(other),
        }
    }
}

/// Call `f` on every renderable child, in order.
pub fn for_each<'a>(children: &'a [Element], mut f: impl FnMut(usize, &'a Element)) {
    let mut index = 0;
    visit(children, &mut |child| {
        f(index, child);
        index += 1;
    });
}

/// Map every renderable child, in order.
pub fn map<T>(children: &[Element], mut f: impl FnMut(usize, &Element) -> T) -> Vec<T> {
    let mut out = Vec::new();
    for_each(children, |index, child| out.push(f(index, child)));
    out
}

/// Number of renderable children.
pub fn count(children: &[Element]) -> usize {
    let mut n = 0;
    visit(children, &mut |_| n += 1);
    n
}

/// The only renderable child. Fails unless there is exactly one.
pub fn only(children: &[Element]) -> Result<&Element> {
    let mut found = None;
    let mut n = 0;
    visit(children, &mut |child| {
        if found.is_none() {
            found = Some(child);
        }
        n += 1;
    });
    match (found, n) {
        (Some(child), 1) => Ok(child),
        _ => Err(Error::invalid_tree(format!(
            "expected exactly one child, found {n}"
        ))),
    }
}

/// Join the class names whose flag is set.
///
/// ```ignore
/// assert_eq!(class_set([("item", true), ("done", false)]), "item");
/// ```
pub fn class_set<'a>(classes: impl IntoIterator<Item = (&'a str, bool)>) -> String {
    classes
        .into_iter()
        .filter(|(_, on)| *on)
        .map(|(name, _)| name)
        .collect::<Vec<_>>()
        .join(" ")
}
