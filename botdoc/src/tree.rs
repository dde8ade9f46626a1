//! Depth-first search over the parsed HTML tree.

use scraper::ElementRef;

/// A reusable depth-first element search.
///
/// Every match handed out by [`Finder::find_next`] or [`Finder::find_all`] is counted, so calling
/// `find_next` again on the same root continues after the previous match. The counter belongs to
/// the finder, not to the tree: call [`Finder::reset_counters`] before searching an unrelated
/// subtree.
pub struct Finder<P> {
    predicate: P,
    yielded: usize,
}

impl<P> Finder<P>
where
    P: Fn(&ElementRef<'_>) -> bool,
{
    pub fn new(predicate: P) -> Self {
        Self {
            predicate,
            yielded: 0,
        }
    }

    pub fn reset_counters(&mut self) {
        self.yielded = 0;
    }

    /// Returns the next not yet yielded descendant of `root` matching the predicate. `root` itself
    /// is never considered.
    pub fn find_next<'a>(&mut self, root: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let found = root
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|element| (self.predicate)(element))
            .nth(self.yielded)?;
        self.yielded += 1;
        Some(found)
    }

    /// Returns all remaining matches below `root` in document order.
    pub fn find_all<'a>(&mut self, root: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let found = root
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|element| (self.predicate)(element))
            .skip(self.yielded)
            .collect::<Vec<_>>();
        self.yielded += found.len();
        found
    }
}

/// Matches elements by tag name.
pub fn tag(name: &'static str) -> impl Fn(&ElementRef<'_>) -> bool {
    move |element| element.value().name() == name
}

/// Matches elements by tag name and the exact value of one attribute.
pub fn tag_with_attr(
    name: &'static str,
    attr: &'static str,
    value: &'static str,
) -> impl Fn(&ElementRef<'_>) -> bool {
    move |element| {
        let element = element.value();
        element.name() == name && element.attr(attr) == Some(value)
    }
}

/// Text content of the whole subtree with runs of whitespace collapsed.
pub fn node_text(element: ElementRef<'_>) -> String {
    let text = element.text().collect::<String>();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Direct element children in document order.
pub fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    const LIST: &str = "<ul><li>A</li><li>B <b>bold</b></li><li>C</li></ul><p>x</p>";

    #[test]
    fn find_next_continues_after_previous_match() {
        let html = Html::parse_fragment(LIST);
        let mut items = Finder::new(tag("li"));
        let first = items.find_next(html.root_element()).map(node_text);
        let second = items.find_next(html.root_element()).map(node_text);
        assert_eq!(first.as_deref(), Some("A"));
        assert_eq!(second.as_deref(), Some("B bold"));
    }

    #[test]
    fn reset_counters_restarts_search() {
        let html = Html::parse_fragment(LIST);
        let mut items = Finder::new(tag("li"));
        assert_eq!(items.find_all(html.root_element()).len(), 3);
        assert!(items.find_next(html.root_element()).is_none());

        items.reset_counters();
        let first = items.find_next(html.root_element()).map(node_text);
        assert_eq!(first.as_deref(), Some("A"));
        let rest = items
            .find_all(html.root_element())
            .into_iter()
            .map(node_text)
            .collect::<Vec<_>>();
        assert_eq!(rest, vec!["B bold", "C"]);
    }

    #[test]
    fn root_is_not_a_match() {
        let html = Html::parse_fragment("<div id=\"a\"><div id=\"b\"></div></div>");
        let mut divs = Finder::new(tag("div"));
        let outer = divs.find_next(html.root_element()).unwrap();
        assert_eq!(outer.value().attr("id"), Some("a"));

        let mut inner = Finder::new(tag("div"));
        let found = inner.find_all(outer);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value().attr("id"), Some("b"));
    }

    #[test]
    fn attribute_predicate() {
        let html = Html::parse_fragment(r##"<a href="#x">x</a><a href="#sending-files">y</a>"##);
        let mut links = Finder::new(tag_with_attr("a", "href", "#sending-files"));
        let link = links.find_next(html.root_element()).map(node_text);
        assert_eq!(link.as_deref(), Some("y"));
    }

    #[test]
    fn text_collapses_whitespace() {
        let html = Html::parse_fragment("<p>  Array of\n   <a>PhotoSize</a> </p>");
        let p = child_elements(html.root_element()).next().unwrap();
        assert_eq!(node_text(p), "Array of PhotoSize");
    }
}
