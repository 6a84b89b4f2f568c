//! Page model - a small element tree standing in for the browser DOM
//!
//! The renderer and trackers only see `DomSurface`; `Document` is the
//! in-memory implementation used by the CLI preview and by tests.

use std::collections::BTreeMap;

use crate::error::{SiteError, SiteResult};

const VOID_TAGS: [&str; 4] = ["meta", "link", "br", "img"];

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub classes: Vec<String>,
    /// Plain text, escaped on output.
    pub text: String,
    /// Pre-escaped markup, emitted verbatim before children.
    pub html: Option<String>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn with_id(self, id: &str) -> Self {
        self.with_attr("id", id)
    }

    pub fn with_class(mut self, classes: &str) -> Self {
        for class in classes.split_whitespace() {
            self.add_class(class);
        }
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_html(mut self, html: String) -> Self {
        self.html = Some(html);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attrs.insert(name.to_string(), value.to_string());
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.remove(name);
    }

    pub fn data(&self, key: &str) -> Option<&str> {
        self.attr(&format!("data-{}", key))
    }

    pub fn set_data(&mut self, key: &str, value: &str) {
        self.set_attr(&format!("data-{}", key), value);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn toggle_class(&mut self, class: &str, on: bool) {
        if on {
            self.add_class(class);
        } else {
            self.classes.retain(|c| c != class);
        }
    }

    /// Replace the node's content with plain text.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.html = None;
        self.children.clear();
    }

    /// Concatenated text content of the node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.text_content());
        }
        out
    }

    pub fn find(&self, matches: &dyn Fn(&Node) -> bool) -> Option<&Node> {
        if matches(self) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(matches))
    }

    pub fn find_mut(&mut self, matches: &dyn Fn(&Node) -> bool) -> Option<&mut Node> {
        if matches(self) {
            return Some(self);
        }
        for child in self.children.iter_mut() {
            if let Some(found) = child.find_mut(matches) {
                return Some(found);
            }
        }
        None
    }

    pub fn for_each_mut(&mut self, matches: &dyn Fn(&Node) -> bool, apply: &mut dyn FnMut(&mut Node)) {
        if matches(self) {
            apply(self);
        }
        for child in self.children.iter_mut() {
            child.for_each_mut(matches, apply);
        }
    }

    pub fn path_to<'a>(&'a self, matches: &dyn Fn(&Node) -> bool) -> Option<Vec<&'a Node>> {
        if matches(self) {
            return Some(vec![]);
        }
        for child in &self.children {
            if let Some(mut path) = child.path_to(matches) {
                path.insert(0, self);
                return Some(path);
            }
        }
        None
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        if !self.classes.is_empty() {
            out.push_str(&format!(" class=\"{}\"", escape_html(&self.classes.join(" "))));
        }
        for (name, value) in &self.attrs {
            if value.is_empty() {
                out.push_str(&format!(" {}", name));
            } else {
                out.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
            }
        }
        out.push('>');
        if VOID_TAGS.contains(&self.tag.as_str()) {
            return;
        }
        out.push_str(&escape_html(&self.text));
        if let Some(html) = &self.html {
            out.push_str(html);
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str(&format!("</{}>", self.tag));
    }
}

/// Head elements addressable by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadSelector<'a> {
    MetaName(&'a str),
    MetaProperty(&'a str),
    LinkRel(&'a str),
}

impl HeadSelector<'_> {
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Self::MetaName(name) => node.tag == "meta" && node.attr("name") == Some(*name),
            Self::MetaProperty(prop) => node.tag == "meta" && node.attr("property") == Some(*prop),
            Self::LinkRel(rel) => node.tag == "link" && node.attr("rel") == Some(*rel),
        }
    }
}

/// DOM mutation capability.
pub trait DomSurface {
    fn element_mut(&mut self, id: &str) -> Option<&mut Node>;
    fn head_mut(&mut self, selector: HeadSelector<'_>) -> Option<&mut Node>;
    fn for_each_mut(&mut self, matches: &dyn Fn(&Node) -> bool, apply: &mut dyn FnMut(&mut Node));
    fn set_title(&mut self, title: &str);
    fn page_id(&self) -> Option<&str>;
    fn find_node(&self, matches: &dyn Fn(&Node) -> bool) -> Option<&Node>;
    /// Ancestors (outermost first) of the first node matching `matches`.
    fn ancestors(&self, matches: &dyn Fn(&Node) -> bool) -> Option<Vec<&Node>>;

    fn require(&mut self, id: &str) -> SiteResult<&mut Node> {
        self.element_mut(id)
            .ok_or_else(|| SiteError::MissingElement(format!("#{}", id)))
    }

    /// Set text on `#id` when `value` is non-empty; a missing element is skipped.
    fn set_text(&mut self, id: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        match self.require(id) {
            Ok(node) => node.set_text(value),
            Err(e) => tracing::debug!(error = %e, "skipping text update"),
        }
    }

    fn set_head_content(&mut self, selector: HeadSelector<'_>, value: &str) {
        if value.is_empty() {
            return;
        }
        if let Some(node) = self.head_mut(selector) {
            node.set_attr("content", value);
        }
    }

    /// Replace every child of `#id`. Returns false when the container is absent.
    fn replace_children(&mut self, id: &str, children: Vec<Node>) -> bool {
        match self.require(id) {
            Ok(container) => {
                container.set_text("");
                container.children = children;
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "skipping list render");
                false
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub head: Vec<Node>,
    pub body: Node,
}

impl Document {
    pub fn new(page: &str) -> Self {
        Self {
            title: String::new(),
            head: vec![],
            body: Node::new("body").with_attr("data-page", page),
        }
    }

    pub fn by_id(&self, id: &str) -> Option<&Node> {
        self.body.find(&|n: &Node| n.id() == Some(id))
    }

    pub fn head(&self, selector: HeadSelector<'_>) -> Option<&Node> {
        self.head.iter().find(|n| selector.matches(n))
    }

    pub fn collect(&self, matches: &dyn Fn(&Node) -> bool) -> Vec<&Node> {
        fn walk<'a>(node: &'a Node, matches: &dyn Fn(&Node) -> bool, out: &mut Vec<&'a Node>) {
            if matches(node) {
                out.push(node);
            }
            for child in &node.children {
                walk(child, matches, out);
            }
        }
        let mut out = vec![];
        walk(&self.body, matches, &mut out);
        out
    }

    pub fn to_html(&self) -> String {
        let mut head = Node::new("head").with_child(Node::new("title").with_text(&self.title));
        head.children.extend(self.head.iter().cloned());
        Node::new("html")
            .with_attr("lang", "en")
            .with_child(head)
            .with_child(self.body.clone())
            .to_html()
    }

    /// Static homepage markup: the fallback shown when content is unavailable.
    pub fn home_skeleton() -> Self {
        let mut doc = Self::new("home");
        doc.title = "HuTech Studio".to_string();
        doc.head = vec![
            Node::new("meta").with_attr("name", "description").with_attr("content", ""),
            Node::new("meta").with_attr("property", "og:title").with_attr("content", ""),
            Node::new("meta").with_attr("property", "og:description").with_attr("content", ""),
            Node::new("meta").with_attr("name", "twitter:title").with_attr("content", ""),
            Node::new("meta").with_attr("name", "twitter:description").with_attr("content", ""),
            Node::new("link").with_attr("rel", "canonical").with_attr("href", "https://hutech.studio/"),
        ];

        let booking = "mailto:as@hutech.ventures";
        doc.body = doc
            .body
            .with_child(
                Node::new("header").with_child(
                    Node::new("a")
                        .with_class("brand")
                        .with_attr("href", "#top")
                        .with_child(Node::new("span").with_text("HuTech Studio")),
                ),
            )
            .with_child(
                Node::new("section")
                    .with_id("hero")
                    .with_child(Node::new("h1").with_id("hero-headline").with_text("We prototype what matters."))
                    .with_child(Node::new("p").with_id("hero-subhead").with_text("Incubation studio for internal and external ventures."))
                    .with_child(
                        Node::new("a")
                            .with_id("hero-email-cta")
                            .with_class("btn btn-primary js-booking-link")
                            .with_attr("data-source", "hero_primary")
                            .with_attr("href", booking)
                            .with_text("Email us"),
                    )
                    .with_child(
                        Node::new("a")
                            .with_id("hero-secondary-cta")
                            .with_class("btn btn-secondary")
                            .with_attr("href", "#case-studies")
                            .with_text("View case study"),
                    )
                    .with_child(Node::new("p").with_id("hero-cta-helper").with_text("Email us only: as@hutech.ventures")),
            )
            .with_child(
                Node::new("section")
                    .with_id("trust")
                    .with_attr("data-reveal", "")
                    .with_child(Node::new("ul").with_id("trust-signal-list"))
                    .with_child(Node::new("p").with_id("brand-distinction-text"))
                    .with_child(Node::new("a").with_id("hutech-tech-link").with_attr("hidden", "")),
            )
            .with_child(
                Node::new("section")
                    .with_id("capabilities")
                    .with_attr("data-reveal", "")
                    .with_child(Node::new("ul").with_id("capability-list")),
            )
            .with_child(
                Node::new("section")
                    .with_id("process")
                    .with_child(Node::new("div").with_id("process-grid")),
            )
            .with_child(
                Node::new("section")
                    .with_id("case-studies")
                    .with_child(Node::new("div").with_id("case-grid")),
            )
            .with_child(
                Node::new("section")
                    .with_id("contact")
                    .with_child(
                        Node::new("a")
                            .with_id("contact-email")
                            .with_attr("href", booking)
                            .with_text("as@hutech.ventures"),
                    )
                    .with_child(
                        Node::new("a")
                            .with_id("final-email-cta")
                            .with_class("btn btn-primary js-booking-link")
                            .with_attr("data-source", "final_cta")
                            .with_attr("href", booking)
                            .with_text("Email us"),
                    ),
            )
            .with_child(
                Node::new("a")
                    .with_class("btn js-booking-link js-sticky-cta")
                    .with_attr("data-source", "sticky_cta")
                    .with_attr("href", booking)
                    .with_text("Email us"),
            )
            .with_child(Node::new("footer").with_child(Node::new("span").with_class("js-year")));
        doc
    }
}

impl DomSurface for Document {
    fn element_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.body.find_mut(&|n: &Node| n.id() == Some(id))
    }

    fn head_mut(&mut self, selector: HeadSelector<'_>) -> Option<&mut Node> {
        self.head.iter_mut().find(|n| selector.matches(n))
    }

    fn for_each_mut(&mut self, matches: &dyn Fn(&Node) -> bool, apply: &mut dyn FnMut(&mut Node)) {
        self.body.for_each_mut(matches, apply);
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn page_id(&self) -> Option<&str> {
        self.body.data("page")
    }

    fn find_node(&self, matches: &dyn Fn(&Node) -> bool) -> Option<&Node> {
        self.body.find(matches)
    }

    fn ancestors(&self, matches: &dyn Fn(&Node) -> bool) -> Option<Vec<&Node>> {
        self.body.path_to(matches)
    }
}
