//! @acp:module "Raw Node"
//! @acp:summary "Owned, immutable element tree built from the exchange document"
//! @acp:domain reqif
//! @acp:layer model

/// @acp:summary "Element of the exchange document"
///
/// Names are local names; the namespace URI is kept separately so that
/// lookups do not depend on the prefixes a tool chose to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNode {
    pub name: String,
    pub namespace: Option<String>,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Child elements and text in document order
    pub children: Vec<RawChild>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawChild {
    Element(RawNode),
    Text(String),
}

impl RawNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub(crate) fn from_xml(node: roxmltree::Node<'_, '_>) -> Self {
        let attributes = node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect();

        let children = node
            .children()
            .filter_map(|child| {
                if child.is_element() {
                    Some(RawChild::Element(RawNode::from_xml(child)))
                } else if child.is_text() {
                    child.text().map(|t| RawChild::Text(t.to_string()))
                } else {
                    None
                }
            })
            .collect();

        Self {
            name: node.tag_name().name().to_string(),
            namespace: node.tag_name().namespace().map(str::to_string),
            attributes,
            children,
        }
    }

    /// Value of an attribute by local name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Source-assigned `IDENTIFIER`
    pub fn identifier(&self) -> Option<&str> {
        self.attr("IDENTIFIER")
    }

    /// Human label (`LONG-NAME`)
    pub fn long_name(&self) -> Option<&str> {
        self.attr("LONG-NAME")
    }

    /// Referenced type id, i.e. the text of `TYPE/*-TYPE-REF`
    pub fn type_ref(&self) -> Option<String> {
        self.child("TYPE")
            .and_then(|t| t.elements().next())
            .map(|r| r.text().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Direct child elements
    pub fn elements(&self) -> impl Iterator<Item = &RawNode> {
        self.children.iter().filter_map(|c| match c {
            RawChild::Element(e) => Some(e),
            RawChild::Text(_) => None,
        })
    }

    /// First direct child element with the given local name
    pub fn child(&self, name: &str) -> Option<&RawNode> {
        self.elements().find(|e| e.name == name)
    }

    /// Follow a path of local names through direct children
    pub fn path(&self, names: &[&str]) -> Option<&RawNode> {
        names.iter().try_fold(self, |node, name| node.child(name))
    }

    /// All descendant elements in document order (pre-order, excluding self)
    pub fn descendants(&self) -> Vec<&RawNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&RawNode> = self.elements().collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            out.push(node);
            let mut kids: Vec<&RawNode> = node.elements().collect();
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    /// Descendant elements with the given local name, in document order
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RawNode> + 'a {
        self.descendants().into_iter().filter(move |n| n.name == name)
    }

    /// Concatenated text of this node and all descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                RawChild::Text(t) => out.push_str(t),
                RawChild::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Serialize the children of this node back to markup.
    ///
    /// Elements are written with their local names only, so an
    /// `<html:table>` in the source comes out as `<table>`.
    pub fn inner_markup(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            write_child(child, &mut out);
        }
        out
    }
}

fn write_child(child: &RawChild, out: &mut String) {
    match child {
        RawChild::Text(t) => escape_into(t, false, out),
        RawChild::Element(e) => {
            out.push('<');
            out.push_str(&e.name);
            for (k, v) in &e.attributes {
                out.push(' ');
                out.push_str(k);
                out.push_str("=\"");
                escape_into(v, true, out);
                out.push('"');
            }
            if e.children.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for c in &e.children {
                write_child(c, out);
            }
            out.push_str("</");
            out.push_str(&e.name);
            out.push('>');
        }
    }
}

fn escape_into(s: &str, attribute: bool, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}
