/*!
Evaluation of compiled paths against a context element.

Each segment maps one context element to a candidate list; filters apply to
that per-context list, so a positional predicate is 1-based within the
candidates a single context contributed. Candidates that survive the final
segment are collected in discovery order with duplicates suppressed.
*/

use super::{Axis, Filter, Path, PathFunction, Segment, Selector};
use crate::element::Element;
use std::collections::VecDeque;

// ------------------------------------------------------------------------------------------------
// Public (crate) Functions
// ------------------------------------------------------------------------------------------------

pub(crate) fn evaluate(path: &Path, context: &Element) -> Vec<Element> {
    let mut results: Vec<Element> = Vec::new();
    if path.segments.is_empty() {
        return results;
    }
    let mut queue: VecDeque<(Element, usize)> = VecDeque::new();
    queue.push_back((context.clone(), 0));
    while let Some((element, at)) = queue.pop_front() {
        let segment = &path.segments[at];
        let candidates = apply_segment(&element, segment);
        if at + 1 == path.segments.len() {
            for candidate in candidates {
                if !results.contains(&candidate) {
                    results.push(candidate);
                }
            }
        } else {
            for candidate in candidates {
                queue.push_back((candidate, at + 1));
            }
        }
    }
    results
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn apply_segment(context: &Element, segment: &Segment) -> Vec<Element> {
    let mut candidates = match &segment.selector {
        Selector::Root => vec![context.tree_root()],
        Selector::Current => vec![context.clone()],
        Selector::Parent => context.parent().into_iter().collect(),
        Selector::Tag(test) => {
            let pool = match segment.axis {
                Axis::Child => context.child_elements(),
                Axis::DescendantOrSelf => context.descendants_or_self(),
            };
            pool.into_iter()
                .filter(|e| test.matches_name(&e.name()))
                .collect()
        }
    };
    for filter in &segment.filters {
        candidates = apply_filter(candidates, filter);
        if candidates.is_empty() {
            break;
        }
    }
    candidates
}

fn apply_filter(candidates: Vec<Element>, filter: &Filter) -> Vec<Element> {
    match filter {
        Filter::Pos(n) => match n.checked_sub(1) {
            Some(at) => candidates.into_iter().nth(at).into_iter().collect(),
            None => Vec::new(),
        },
        Filter::HasAttr(test) => candidates
            .into_iter()
            .filter(|e| e.attrs().iter().any(|a| test.matches_name(a.name())))
            .collect(),
        Filter::AttrEq(test, value) => candidates
            .into_iter()
            .filter(|e| {
                e.attrs()
                    .iter()
                    .any(|a| test.matches_name(a.name()) && a.value() == value)
            })
            .collect(),
        Filter::HasChild(test) => candidates
            .into_iter()
            .filter(|e| {
                e.child_elements()
                    .iter()
                    .any(|c| test.matches_name(&c.name()))
            })
            .collect(),
        Filter::ChildEq(test, value) => candidates
            .into_iter()
            .filter(|e| {
                e.child_elements()
                    .iter()
                    .any(|c| test.matches_name(&c.name()) && &c.text() == value)
            })
            .collect(),
        Filter::HasText => candidates
            .into_iter()
            .filter(|e| !e.text().is_empty())
            .collect(),
        Filter::TextEq(value) => candidates
            .into_iter()
            .filter(|e| &e.text() == value)
            .collect(),
        Filter::Func(function) => candidates
            .into_iter()
            .filter(|e| !function_value(e, *function).is_empty())
            .collect(),
        Filter::FuncEq(function, value) => candidates
            .into_iter()
            .filter(|e| &function_value(e, *function) == value)
            .collect(),
    }
}

fn function_value(element: &Element, function: PathFunction) -> String {
    match function {
        PathFunction::LocalName => element.name().local_name().to_string(),
        PathFunction::Name => element.tag(),
        PathFunction::NamespacePrefix => {
            element.name().prefix().unwrap_or_default().to_string()
        }
        PathFunction::NamespaceUri => element.namespace_uri(),
    }
}

// ------------------------------------------------------------------------------------------------
// Unit Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn find_all(context: &Element, path: &str) -> Vec<Element> {
        evaluate(&Path::compile(path).expect("compile failed"), context)
    }

    fn tags(elements: &[Element]) -> Vec<String> {
        elements.iter().map(Element::tag).collect()
    }

    /// `<a><b1><c1><d1/><d1a/></c1></b1><b2><c2><d2/></c2></b2></a>`
    fn sample_tree() -> Element {
        let a = Element::new("a");
        let b1 = a.create_element("b1");
        let c1 = b1.create_element("c1");
        let _d1 = c1.create_element("d1");
        let _d1a = c1.create_element("d1a");
        let b2 = a.create_element("b2");
        let c2 = b2.create_element("c2");
        let _d2 = c2.create_element("d2");
        a
    }

    #[test]
    fn test_child_paths() {
        let a = sample_tree();
        assert_eq!(tags(&find_all(&a, "b1/c1/d1")), vec!["d1"]);
        assert_eq!(tags(&find_all(&a, "b1/c1/*")), vec!["d1", "d1a"]);
        assert!(find_all(&a, "b1/missing").is_empty());
    }

    #[test]
    fn test_parent_and_current_steps() {
        let a = sample_tree();
        let d1 = find_all(&a, "b1/c1/d1").remove(0);
        assert_eq!(tags(&find_all(&d1, ".")), vec!["d1"]);
        assert_eq!(tags(&find_all(&d1, "..")), vec!["c1"]);
        assert_eq!(tags(&find_all(&d1, "../../../b2/c2/d2")), vec!["d2"]);
        assert_eq!(tags(&find_all(&d1, "./../d1a")), vec!["d1a"]);
    }

    #[test]
    fn test_descendant_or_self() {
        let a = sample_tree();
        assert_eq!(tags(&find_all(&a, "//d1")), vec!["d1"]);
        assert_eq!(
            tags(&find_all(&a, "//*")),
            vec!["a", "b1", "c1", "d1", "d1a", "b2", "c2", "d2"]
        );
        assert_eq!(tags(&find_all(&a, "b2//d2")), vec!["d2"]);
    }

    #[test]
    fn test_descendant_results_deduplicated() {
        let root = Element::new("root");
        let outer = root.create_element("a");
        let inner = outer.create_element("a");
        let _leaf = inner.create_element("b");

        let found = find_all(&root, "//a//b");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tag(), "b");
    }

    #[test]
    fn test_positional_filter_is_per_context() {
        let root = Element::new("r");
        let c1 = root.create_element("c");
        let _ = c1.create_element("d");
        let _ = c1.create_element("d");
        let c2 = root.create_element("c");
        let only = c2.create_element("d");

        let found = find_all(&root, "c/d[1]");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], c1.child_elements()[0]);
        assert_eq!(found[1], only);

        let found = find_all(&root, "c/d[2]");
        assert_eq!(found.len(), 1);

        assert!(find_all(&root, "c/d[3]").is_empty());
        assert!(find_all(&root, "c/d[0]").is_empty());
    }

    #[test]
    fn test_attribute_filters() {
        let root = Element::new("library");
        let one = root.create_element("book");
        let _ = one.create_attr("lang", "en");
        let two = root.create_element("book");
        let _ = two.create_attr("lang", "de");
        let _plain = root.create_element("book");

        assert_eq!(find_all(&root, "book[@lang]").len(), 2);
        assert_eq!(find_all(&root, "book[@lang='de']"), vec![two.clone()]);
        assert!(find_all(&root, "book[@missing]").is_empty());
    }

    #[test]
    fn test_child_and_text_filters() {
        let root = Element::new("library");
        let one = root.create_element("book");
        one.create_element("title").set_text("Moby Dick");
        let two = root.create_element("book");
        two.create_element("title").set_text("Emma");
        two.create_element("isbn").set_text("x");

        assert_eq!(find_all(&root, "book[isbn]"), vec![two.clone()]);
        assert_eq!(
            find_all(&root, "book[title='Moby Dick']"),
            vec![one.clone()]
        );
        assert_eq!(
            find_all(&root, "book/title[text()='Emma']"),
            vec![two.child_elements()[0].clone()]
        );
        assert_eq!(find_all(&root, "book/title[text()]").len(), 2);
    }

    #[test]
    fn test_root_selector_from_deep_context() {
        let a = sample_tree();
        let d2 = find_all(&a, "b2/c2/d2").remove(0);
        assert_eq!(tags(&find_all(&d2, "/b1/c1/d1")), vec!["d1"]);
    }

    #[test]
    fn test_function_filters() {
        let root = Element::new("root");
        let _plain = root.create_element("item");
        let prefixed = root.create_element("t:item");

        assert_eq!(find_all(&root, "*[local-name()='item']").len(), 2);
        assert_eq!(
            find_all(&root, "*[name()='t:item']"),
            vec![prefixed.clone()]
        );
        assert_eq!(
            find_all(&root, "*[namespace-prefix()='t']"),
            vec![prefixed.clone()]
        );
        assert_eq!(find_all(&root, "*[namespace-prefix()]").len(), 1);
    }

    #[test]
    fn test_namespace_uri_filter_in_document_order() {
        let container = Element::new("");
        let root = container.create_element("root");
        let _ = root.create_attr("xmlns", "urn:root");
        let child1 = root.create_element("child1");
        let _ = child1.create_attr("xmlns", "urn:child");
        let grandchild1 = child1.create_element("grandchild1");
        let _ = grandchild1.create_attr("xmlns", "urn:root");
        let grandchild2 = child1.create_element("grandchild2");
        let greatgrandchild1 = grandchild2.create_element("greatgrandchild1");
        let _child2 = root.create_element("child2");

        let found = find_all(&container, "//*[namespace-uri()='urn:child']");
        assert_eq!(
            found,
            vec![
                child1.clone(),
                grandchild2.clone(),
                greatgrandchild1.clone()
            ]
        );
    }
}
