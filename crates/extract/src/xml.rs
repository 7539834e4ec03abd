use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Malformed(String),
    #[error("document has no root element")]
    NoRoot,
}

/// An owned element tree with resolved namespaces.
///
/// Field access goes through explicit traversal (`child`, `descendant`,
/// path lookups), each returning `Option` so that "field absent" is a
/// visible case rather than a null-propagation idiom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Local name, without any prefix.
    pub tag: String,
    /// Resolved namespace URI, if the element is bound to one.
    pub namespace: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// Trimmed text content; `None` when empty.
    pub fn text(&self) -> Option<&str> {
        let t = self.text.trim();
        (!t.is_empty()).then_some(t)
    }

    /// Attribute value by local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Tag match; `ns = None` matches any namespace (the tolerant bare-tag
    /// probe used when issuers drift from the canonical declaration).
    fn matches(&self, ns: Option<&str>, tag: &str) -> bool {
        self.tag == tag && ns.is_none_or(|ns| self.namespace.as_deref() == Some(ns))
    }

    /// First direct child matching `tag`.
    pub fn child(&self, ns: Option<&str>, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.matches(ns, tag))
    }

    /// Walk a chain of direct children.
    pub fn path(&self, ns: Option<&str>, path: &[&str]) -> Option<&Element> {
        let mut cur = self;
        for tag in path {
            cur = cur.child(ns, tag)?;
        }
        Some(cur)
    }

    /// First descendant matching `tag`, depth-first in document order.
    /// The element itself is not a candidate.
    pub fn descendant(&self, ns: Option<&str>, tag: &str) -> Option<&Element> {
        self.descendant_path(ns, &[tag])
    }

    /// Descendant search for the head of `path`, then direct children for
    /// the rest. Every matching head in document order is tried until one
    /// carries the full chain.
    pub fn descendant_path(&self, ns: Option<&str>, path: &[&str]) -> Option<&Element> {
        let (head, rest) = path.split_first()?;
        for child in &self.children {
            if child.matches(ns, head) {
                if let Some(hit) = child.path(ns, rest) {
                    return Some(hit);
                }
            }
            if let Some(hit) = child.descendant_path(ns, path) {
                return Some(hit);
            }
        }
        None
    }

    pub fn path_text(&self, ns: Option<&str>, path: &[&str]) -> Option<&str> {
        self.path(ns, path).and_then(Element::text)
    }

    pub fn descendant_text(&self, ns: Option<&str>, tag: &str) -> Option<&str> {
        self.descendant(ns, tag).and_then(Element::text)
    }

    pub fn descendant_path_text(&self, ns: Option<&str>, path: &[&str]) -> Option<&str> {
        self.descendant_path(ns, path).and_then(Element::text)
    }
}

/// Parse a byte buffer into an element tree.
pub fn parse_document(bytes: &[u8]) -> Result<Element, XmlError> {
    let mut reader = NsReader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(start))) => {
                stack.push(element_from_start(ns, &start)?);
            }
            Ok((ns, Event::Empty(start))) => {
                let el = element_from_start(ns, &start)?;
                attach(&mut stack, &mut root, el)?;
            }
            Ok((_, Event::End(_))) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| XmlError::Malformed("unexpected closing tag".into()))?;
                attach(&mut stack, &mut root, el)?;
            }
            Ok((_, Event::Text(text))) => {
                let piece = text
                    .unescape()
                    .map_err(|e| XmlError::Malformed(e.to_string()))?;
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&piece);
                }
            }
            Ok((_, Event::CData(data))) => {
                if let Some(open) = stack.last_mut() {
                    open.text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok((_, Event::Eof)) => break,
            // Declarations, comments and processing instructions carry no data
            // the extractors look at.
            Ok(_) => {}
            Err(e) => return Err(XmlError::Malformed(e.to_string())),
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::Malformed("unclosed element at end of input".into()));
    }
    root.ok_or(XmlError::NoRoot)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    el: Element,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(el),
        None if root.is_none() => *root = Some(el),
        None => return Err(XmlError::Malformed("multiple root elements".into())),
    }
    Ok(())
}

fn element_from_start(ns: ResolveResult<'_>, start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let tag = String::from_utf8_lossy(start.local_name().into_inner()).into_owned();
    let namespace = match ns {
        ResolveResult::Bound(n) => Some(String::from_utf8_lossy(n.into_inner()).into_owned()),
        _ => None,
    };

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::Malformed(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().into_inner()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::Malformed(e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        tag,
        namespace,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}
