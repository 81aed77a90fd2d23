//! Tree traversal
//!
//! [`walk_styled`] is a depth-first walk over two parallel explicit stacks: the steps
//! still to run and the style handle each step works with. Every element's inline
//! `style` attribute is cascaded into the style it was reached with, and the result is
//! threaded to its children. Both stacks live in a [`WalkStacks`] guard so every owned
//! handle is released exactly once, whether the walk finishes, stops early or fails.
//!
//! [`BreadthFirst`] is the style-free level-order scan used for titles and tables.

use std::collections::VecDeque;

use super::dom::{Document, Element, NodeId, NodeKind};
use super::style::{parse_declarations, ComputedStyle, ImportantPolicy, StyleArena, StyleHandle};
use crate::utils::error::{ConversionError, ConversionResult};

/// What the walker does after a visitor callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Do not visit this element's children (its `leave` still runs)
    SkipChildren,
    /// End the walk; no further callbacks, `leave` included
    Stop,
}

/// Receives (node, computed style) events in document order
pub trait StyledVisitor {
    fn enter(
        &mut self,
        doc: &Document,
        node: NodeId,
        element: &Element,
        style: &ComputedStyle,
    ) -> ConversionResult<Flow>;

    fn text(
        &mut self,
        doc: &Document,
        node: NodeId,
        text: &str,
        style: &ComputedStyle,
    ) -> ConversionResult<Flow>;

    fn leave(
        &mut self,
        doc: &Document,
        node: NodeId,
        element: &Element,
        style: &ComputedStyle,
    ) -> ConversionResult<()>;
}

#[derive(Debug, Clone, Copy)]
enum Step {
    /// Visit a node; paired style is the one inherited from its parent
    Enter(NodeId),
    /// Close an element; paired style is the element's own computed style
    Leave(NodeId),
    /// Drop the style an element handed to its children
    Release,
}

/// Owns the walk stacks and releases whatever is left on them when dropped
struct WalkStacks<'a> {
    arena: &'a mut StyleArena,
    steps: Vec<Step>,
    styles: Vec<StyleHandle>,
    /// Most entries the stacks may hold at once
    limit: usize,
}

impl<'a> WalkStacks<'a> {
    fn new(arena: &'a mut StyleArena, limit: usize) -> Self {
        Self {
            arena,
            steps: Vec::new(),
            styles: Vec::new(),
            limit,
        }
    }

    /// Make room for `additional` pushes on both stacks
    fn reserve(&mut self, additional: usize) -> ConversionResult<()> {
        let len = self.steps.len();
        if len.checked_add(additional).map_or(true, |n| n > self.limit) {
            return Err(ConversionError::overflow(format!(
                "walk stack of {} entries cannot grow by {}",
                len, additional
            )));
        }
        self.steps.try_reserve(additional)?;
        self.styles.try_reserve(additional)?;
        Ok(())
    }

    /// Push a step; on failure `style` is released before the error is returned
    fn push(&mut self, step: Step, style: StyleHandle) -> ConversionResult<()> {
        if let Err(e) = self.reserve(1) {
            self.arena.release(style)?;
            return Err(e);
        }
        self.steps.push(step);
        self.styles.push(style);
        Ok(())
    }

    fn pop(&mut self) -> Option<(Step, StyleHandle)> {
        let step = self.steps.pop()?;
        let style = self.styles.pop()?;
        Some((step, style))
    }
}

impl Drop for WalkStacks<'_> {
    fn drop(&mut self) {
        for handle in self.styles.drain(..) {
            if let Err(e) = self.arena.release(handle) {
                log::error!("walker cleanup: {}", e);
            }
        }
    }
}

/// Depth-first walk from `start`, cascading inline styles on top of `base`.
///
/// `start` must be an element.
pub fn walk_styled<V: StyledVisitor + ?Sized>(
    doc: &Document,
    start: NodeId,
    arena: &mut StyleArena,
    base: &StyleHandle,
    policy: ImportantPolicy,
    visitor: &mut V,
) -> ConversionResult<()> {
    walk_bounded(doc, start, arena, base, policy, visitor, usize::MAX)
}

/// [`walk_styled`] with at most `limit` pending stack entries
fn walk_bounded<V: StyledVisitor + ?Sized>(
    doc: &Document,
    start: NodeId,
    arena: &mut StyleArena,
    base: &StyleHandle,
    policy: ImportantPolicy,
    visitor: &mut V,
    limit: usize,
) -> ConversionResult<()> {
    if doc.element(start).is_none() {
        return Err(malformed_start(doc, start));
    }

    let mut stacks = WalkStacks::new(arena, limit);
    stacks.push(Step::Enter(start), base.borrow())?;

    while let Some((step, style)) = stacks.pop() {
        match step {
            Step::Enter(node) => {
                let node_ref = doc.get(node)?;
                match &node_ref.kind {
                    NodeKind::Text(text) => {
                        log::trace!("walk: text {}", node.index());
                        let flow = visitor.text(doc, node, text, stacks.arena.get(&style)?)?;
                        stacks.arena.release(style)?;
                        if flow == Flow::Stop {
                            return Ok(());
                        }
                    }
                    NodeKind::Element(element) => {
                        log::trace!("walk: enter <{}> {}", element.name, node.index());
                        let own = match element.attr("style") {
                            Some(text) => {
                                let local = parse_declarations(text)?;
                                let merged = stacks.arena.merge(&style, &local, policy);
                                // the parent's handle is only a borrow; hand it back either way
                                stacks.arena.release(style)?;
                                merged?
                            }
                            None => style,
                        };

                        let flow = match stacks.arena.get(&own) {
                            Ok(computed) => visitor.enter(doc, node, element, computed),
                            Err(e) => Err(e),
                        };
                        let flow = match flow {
                            Ok(flow) => flow,
                            Err(e) => {
                                stacks.arena.release(own)?;
                                return Err(e);
                            }
                        };
                        if flow == Flow::Stop {
                            stacks.arena.release(own)?;
                            return Ok(());
                        }

                        let inherited = match stacks.arena.inherited(&own) {
                            Ok(h) => h,
                            Err(e) => {
                                stacks.arena.release(own)?;
                                return Err(e);
                            }
                        };
                        let children = if flow == Flow::Continue {
                            node_ref.children.len()
                        } else {
                            0
                        };
                        // room for every push below before either handle is consumed
                        if let Err(e) = stacks.reserve(children.saturating_add(2)) {
                            stacks.arena.release(inherited)?;
                            stacks.arena.release(own)?;
                            return Err(e);
                        }
                        let for_children = inherited.borrow();
                        stacks.push(Step::Release, inherited)?;
                        stacks.push(Step::Leave(node), own)?;

                        if flow == Flow::Continue {
                            for &child in node_ref.children.iter().rev() {
                                stacks.push(Step::Enter(child), for_children.borrow())?;
                            }
                        }
                    }
                }
            }
            Step::Leave(node) => {
                let element = doc
                    .element(node)
                    .ok_or_else(|| ConversionError::internal("leave step on a text node"))?;
                log::trace!("walk: leave <{}> {}", element.name, node.index());
                let result = match stacks.arena.get(&style) {
                    Ok(computed) => visitor.leave(doc, node, element, computed),
                    Err(e) => Err(e),
                };
                stacks.arena.release(style)?;
                result?;
            }
            Step::Release => {
                stacks.arena.release(style)?;
            }
        }
    }

    Ok(())
}

fn malformed_start(doc: &Document, start: NodeId) -> ConversionError {
    if doc.text(start).is_some() {
        ConversionError::malformed("walk target is a text node")
    } else {
        ConversionError::malformed(format!("walk target {} is not in the document", start.index()))
    }
}

/// Visitor behind [`find_first`]
struct FindFirst<F> {
    predicate: F,
    found: Option<(NodeId, ComputedStyle)>,
}

impl<F> StyledVisitor for FindFirst<F>
where
    F: FnMut(&Document, NodeId, &ComputedStyle) -> bool,
{
    fn enter(
        &mut self,
        doc: &Document,
        node: NodeId,
        _element: &Element,
        style: &ComputedStyle,
    ) -> ConversionResult<Flow> {
        self.check(doc, node, style)
    }

    fn text(
        &mut self,
        doc: &Document,
        node: NodeId,
        _text: &str,
        style: &ComputedStyle,
    ) -> ConversionResult<Flow> {
        self.check(doc, node, style)
    }

    fn leave(
        &mut self,
        _doc: &Document,
        _node: NodeId,
        _element: &Element,
        _style: &ComputedStyle,
    ) -> ConversionResult<()> {
        Ok(())
    }
}

impl<F> FindFirst<F>
where
    F: FnMut(&Document, NodeId, &ComputedStyle) -> bool,
{
    fn check(&mut self, doc: &Document, node: NodeId, style: &ComputedStyle) -> ConversionResult<Flow> {
        if (self.predicate)(doc, node, style) {
            self.found = Some((node, style.clone()));
            return Ok(Flow::Stop);
        }
        Ok(Flow::Continue)
    }
}

/// First node (depth-first, document order) satisfying `predicate`, together with an
/// owned copy of its computed style. The caller releases the returned handle.
pub fn find_first<F>(
    doc: &Document,
    start: NodeId,
    arena: &mut StyleArena,
    base: &StyleHandle,
    policy: ImportantPolicy,
    predicate: F,
) -> ConversionResult<Option<(NodeId, StyleHandle)>>
where
    F: FnMut(&Document, NodeId, &ComputedStyle) -> bool,
{
    let mut finder = FindFirst {
        predicate,
        found: None,
    };
    walk_styled(doc, start, arena, base, policy, &mut finder)?;
    match finder.found {
        Some((node, style)) => Ok(Some((node, arena.alloc(style)?))),
        None => Ok(None),
    }
}

/// Level-order iterator over `start` and its descendants.
///
/// Children of the most recently yielded node are queued on the following call to
/// `next`, so [`BreadthFirst::skip_children`] can prune a subtree.
pub struct BreadthFirst<'a> {
    doc: &'a Document,
    queue: VecDeque<NodeId>,
    pending: Option<NodeId>,
}

impl<'a> BreadthFirst<'a> {
    pub fn new(doc: &'a Document, start: NodeId) -> Self {
        let mut queue = VecDeque::new();
        if doc.node(start).is_some() {
            queue.push_back(start);
        }
        Self {
            doc,
            queue,
            pending: None,
        }
    }

    /// Do not descend into the node just returned
    pub fn skip_children(&mut self) {
        self.pending = None;
    }
}

impl Iterator for BreadthFirst<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if let Some(prev) = self.pending.take() {
            self.queue.extend(self.doc.children(prev).iter().copied());
        }
        let next = self.queue.pop_front()?;
        self.pending = Some(next);
        Some(next)
    }
}

/// Concatenated text of `node` and its descendants, in document order
pub fn text_content(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    let mut stack = vec![node];
    while let Some(id) = stack.pop() {
        match doc.node(id).map(|n| &n.kind) {
            Some(NodeKind::Text(t)) => out.push_str(t),
            Some(NodeKind::Element(_)) => stack.extend(doc.children(id).iter().rev().copied()),
            None => {}
        }
    }
    out
}

/// Text of the first `<title>`, whitespace collapsed; `None` when absent or blank
pub fn find_title(doc: &Document) -> Option<String> {
    let root = doc.root()?;
    let title = BreadthFirst::new(doc, root)
        .find(|&id| matches!(doc.tag(id), Some(super::dom::Tag::Title)))?;
    let text = text_content(doc, title)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::html::parse_html;
    use crate::core::style::PropertyKinds;
    use crate::utils::error::FaultKind;

    /// Records every event with the computed style flattened to "k=v;..."
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        skip: Option<&'static str>,
    }

    fn flat(style: &ComputedStyle) -> String {
        style
            .iter()
            .map(|p| format!("{}={}", p.name, p.value))
            .collect::<Vec<_>>()
            .join(";")
    }

    impl StyledVisitor for Recorder {
        fn enter(
            &mut self,
            _doc: &Document,
            _node: NodeId,
            element: &Element,
            style: &ComputedStyle,
        ) -> ConversionResult<Flow> {
            self.events.push(format!("+{} [{}]", element.name, flat(style)));
            if Some(element.name.as_str()) == self.skip {
                return Ok(Flow::SkipChildren);
            }
            Ok(Flow::Continue)
        }

        fn text(
            &mut self,
            _doc: &Document,
            _node: NodeId,
            text: &str,
            style: &ComputedStyle,
        ) -> ConversionResult<Flow> {
            self.events.push(format!("'{}' [{}]", text, flat(style)));
            Ok(Flow::Continue)
        }

        fn leave(
            &mut self,
            _doc: &Document,
            _node: NodeId,
            element: &Element,
            _style: &ComputedStyle,
        ) -> ConversionResult<()> {
            self.events.push(format!("-{}", element.name));
            Ok(())
        }
    }

    /// Fails when entering the named element
    struct FailOn(&'static str);

    impl StyledVisitor for FailOn {
        fn enter(
            &mut self,
            _doc: &Document,
            _node: NodeId,
            element: &Element,
            _style: &ComputedStyle,
        ) -> ConversionResult<Flow> {
            if element.name == self.0 {
                return Err(ConversionError::unsupported("test failure"));
            }
            Ok(Flow::Continue)
        }

        fn text(
            &mut self,
            _doc: &Document,
            _node: NodeId,
            _text: &str,
            _style: &ComputedStyle,
        ) -> ConversionResult<Flow> {
            Ok(Flow::Continue)
        }

        fn leave(
            &mut self,
            _doc: &Document,
            _node: NodeId,
            _element: &Element,
            _style: &ComputedStyle,
        ) -> ConversionResult<()> {
            Ok(())
        }
    }

    fn sample() -> Document {
        let mut doc = Document::with_root("div");
        let root = doc.root().unwrap();
        let p = doc
            .append_element(root, "p", &[("style", "color: red; border: 1px solid")])
            .unwrap();
        doc.append_text(p, "a").unwrap();
        let b = doc.append_element(p, "b", &[("style", "font-weight: bold")]).unwrap();
        doc.append_text(b, "b").unwrap();
        doc.append_text(root, "c").unwrap();
        doc
    }

    #[test]
    fn test_walk_order_and_inheritance() {
        let doc = sample();
        let mut arena = StyleArena::new();
        let base = arena.root();
        let mut rec = Recorder::default();
        walk_styled(&doc, doc.root().unwrap(), &mut arena, &base, ImportantPolicy::default(), &mut rec)
            .unwrap();

        assert_eq!(
            rec.events,
            vec![
                "+div []",
                "+p [color=red;border=1px solid]",
                "'a' [color=red]",
                "+b [color=red;font-weight=bold]",
                "'b' [color=red;font-weight=bold]",
                "-b",
                "-p",
                "'c' []",
                "-div",
            ]
        );
        assert_eq!(arena.live(), 0);
    }

    #[test]
    fn test_skip_children() {
        let doc = sample();
        let mut arena = StyleArena::new();
        let base = arena.root();
        let mut rec = Recorder {
            skip: Some("p"),
            ..Default::default()
        };
        walk_styled(&doc, doc.root().unwrap(), &mut arena, &base, ImportantPolicy::default(), &mut rec)
            .unwrap();
        assert!(rec.events.contains(&"-p".to_string()));
        assert!(!rec.events.iter().any(|e| e.starts_with("'a'")));
        assert_eq!(arena.live(), 0);
    }

    #[test]
    fn test_error_releases_everything() {
        let doc = sample();
        let mut arena = StyleArena::new();
        let base = arena.root();
        let err = walk_styled(
            &doc,
            doc.root().unwrap(),
            &mut arena,
            &base,
            ImportantPolicy::default(),
            &mut FailOn("b"),
        )
        .unwrap_err();
        assert_eq!(err.kind, FaultKind::Unsupported);
        assert!(arena.allocations() > 0);
        assert_eq!(arena.live(), 0);
    }

    #[test]
    fn test_stack_limit_releases_everything() {
        let doc = build_tree(4, 3);
        for limit in [1, 2, 3, 5, 8] {
            let mut arena = StyleArena::new();
            let base = arena.root();
            let err = walk_bounded(
                &doc,
                doc.root().unwrap(),
                &mut arena,
                &base,
                ImportantPolicy::default(),
                &mut Recorder::default(),
                limit,
            )
            .unwrap_err();
            assert_eq!(err.kind, FaultKind::BufferOverflow, "limit {}", limit);
            assert_eq!(arena.live(), 0, "limit {}", limit);
            assert_eq!(arena.allocations(), arena.releases(), "limit {}", limit);
        }
    }

    #[test]
    fn test_text_start_is_malformed() {
        let doc = sample();
        let text = doc.children(doc.root().unwrap())[1];
        let mut arena = StyleArena::new();
        let base = arena.root();
        let err = walk_styled(&doc, text, &mut arena, &base, ImportantPolicy::default(), &mut Recorder::default())
            .unwrap_err();
        assert_eq!(err.kind, FaultKind::MalformedDocument);
    }

    /// Complete tree of the given depth and branching, alternating styled levels
    fn build_tree(depth: usize, branching: usize) -> Document {
        let mut doc = Document::with_root("div");
        let mut level = vec![doc.root().unwrap()];
        for d in 0..depth {
            let mut next = Vec::new();
            for &parent in &level {
                for _ in 0..branching {
                    let style = match d % 3 {
                        0 => "color: blue; margin: 1px",
                        1 => "font-style: italic",
                        _ => "",
                    };
                    let mut attrs = Vec::new();
                    if !style.is_empty() {
                        attrs.push(("style", style));
                    }
                    next.push(doc.append_element(parent, "span", &attrs).unwrap());
                }
            }
            level = next;
        }
        for &leaf in &level {
            doc.append_text(leaf, "x").unwrap();
        }
        doc
    }

    #[test]
    fn test_no_leak_over_repeated_walks() {
        let doc = build_tree(5, 3);
        let mut arena = StyleArena::new();
        let base = arena.root();
        for _ in 0..3 {
            let mut rec = Recorder::default();
            walk_styled(&doc, doc.root().unwrap(), &mut arena, &base, ImportantPolicy::default(), &mut rec)
                .unwrap();
            assert_eq!(arena.live(), 0);
        }
        assert!(arena.allocations() > 0);
        assert_eq!(arena.allocations(), arena.releases());
    }

    #[test]
    fn test_non_inheritable_not_visible_on_descendants() {
        let doc = parse_html(
            "<div style='background: yellow; border: 1px solid; margin: 2px; font-weight: bold; \
             font-style: italic; text-decoration: underline; color: red; font-family: serif; \
             font-size: 12pt; text-align: center'><span>x</span></div>",
        )
        .unwrap();
        let mut arena = StyleArena::new();
        let base = arena.root();
        let (node, handle) = find_first(
            &doc,
            doc.root().unwrap(),
            &mut arena,
            &base,
            ImportantPolicy::default(),
            |doc, id, _| doc.element(id).map(|e| e.name == "span").unwrap_or(false),
        )
        .unwrap()
        .unwrap();
        assert_eq!(doc.element(node).unwrap().name, "span");

        let style = arena.get(&handle).unwrap();
        for kind in [
            PropertyKinds::BOLD,
            PropertyKinds::ITALIC,
            PropertyKinds::UNDERLINE,
            PropertyKinds::COLOR,
            PropertyKinds::FONT_FAMILY,
            PropertyKinds::FONT_SIZE,
            PropertyKinds::TEXT_ALIGN,
        ] {
            assert!(style.has(kind), "{:?} should be inherited", kind);
        }
        for kind in [PropertyKinds::BACKGROUND, PropertyKinds::BORDER, PropertyKinds::MARGIN] {
            assert!(!style.has(kind), "{:?} should not be inherited", kind);
        }

        assert!(handle.is_owned());
        arena.release(handle).unwrap();
        assert_eq!(arena.live(), 0);
    }

    #[test]
    fn test_find_first_none_and_local_declaration() {
        let doc = parse_html("<div style='background: red'><p style='background: blue'>x</p></div>")
            .unwrap();
        let mut arena = StyleArena::new();
        let base = arena.root();

        let missing = find_first(&doc, doc.root().unwrap(), &mut arena, &base, ImportantPolicy::default(), |doc, id, _| {
            doc.element(id).map(|e| e.name == "table").unwrap_or(false)
        })
        .unwrap();
        assert!(missing.is_none());
        assert_eq!(arena.live(), 0);

        let (_, handle) = find_first(&doc, doc.root().unwrap(), &mut arena, &base, ImportantPolicy::default(), |doc, id, _| {
            doc.element(id).map(|e| e.name == "p").unwrap_or(false)
        })
        .unwrap()
        .unwrap();
        assert_eq!(arena.get(&handle).unwrap().get("background"), Some("blue"));
        arena.release(handle).unwrap();
        assert_eq!(arena.live(), 0);
    }

    #[test]
    fn test_breadth_first_and_skip() {
        let doc = sample();
        let root = doc.root().unwrap();
        let order: Vec<usize> = BreadthFirst::new(&doc, root).map(NodeId::index).collect();
        // div, p, "c", "a", b, "b"
        assert_eq!(order, vec![0, 1, 5, 2, 3, 4]);

        let mut it = BreadthFirst::new(&doc, root);
        let mut seen = Vec::new();
        while let Some(id) = it.next() {
            if doc.tag(id) == Some(&crate::core::dom::Tag::Paragraph) {
                it.skip_children();
            }
            seen.push(id.index());
        }
        assert_eq!(seen, vec![0, 1, 5]);
    }

    #[test]
    fn test_title_and_text_content() {
        let doc = parse_html("<html><head><title>  My\n  Page </title></head><body><p>a<b>b</b>c</p></body></html>")
            .unwrap();
        assert_eq!(find_title(&doc), Some("My Page".to_string()));
        let p = BreadthFirst::new(&doc, doc.root().unwrap())
            .find(|&id| doc.tag(id) == Some(&crate::core::dom::Tag::Paragraph))
            .unwrap();
        assert_eq!(text_content(&doc, p), "abc");
        assert_eq!(find_title(&parse_html("<p>x</p>").unwrap()), None);
    }
}
