//! A small owned element tree for resource documents.
//!
//! Documents are parsed from `quick-xml` events into [`XmlDocument`] and written
//! back with an indenting `quick-xml` writer. Only what resource files need is
//! modelled: elements with attributes, text, CDATA, comments, processing
//! instructions, the XML declaration and a doctype.
//!
//! Whitespace-only text that sits between sibling elements is dropped on load;
//! the writer regenerates the indentation. Whitespace inside leaf elements is
//! preserved verbatim.

use std::{
    borrow::Cow,
    io::{BufRead, Write},
};

use indoc::indoc;
use quick_xml::{
    Reader, Writer,
    escape::{partial_escape, unescape},
    events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event},
};

use crate::{error::Error, traits::Parser};

/// Namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

const EMPTY_RESX: &str = indoc! {r#"
    <?xml version="1.0" encoding="utf-8"?>
    <root>
      <resheader name="resmimetype">
        <value>text/microsoft-resx</value>
      </resheader>
      <resheader name="version">
        <value>2.0</value>
      </resheader>
      <resheader name="reader">
        <value>System.Resources.ResXResourceReader, System.Windows.Forms, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089</value>
      </resheader>
      <resheader name="writer">
        <value>System.Resources.ResXResourceWriter, System.Windows.Forms, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089</value>
      </resheader>
    </root>
"#};

/// A namespace-qualified element name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpandedName {
    pub namespace: Option<String>,
    pub local: String,
}

impl ExpandedName {
    pub fn new(namespace: Option<&str>, local: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            local: local.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified name as written in the document (`name`, `xml:space`, ...).
    pub name: String,
    pub value: String,
}

/// The `<?xml ...?>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    Declaration(Declaration),
    DocType(String),
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            XmlNode::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            XmlNode::Element(element) => Some(element),
            _ => None,
        }
    }

    fn is_whitespace_text(&self) -> bool {
        matches!(self, XmlNode::Text(text) if text.chars().all(char::is_whitespace))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written in the document.
    pub name: String,
    /// Namespace URI the element's prefix (or the default namespace) resolved to.
    pub namespace: Option<String>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<XmlNode>,
}

impl Element {
    /// Creates an element in the given namespace. The element is written
    /// unprefixed, so it inherits the default namespace of its parent.
    pub fn new(name: &ExpandedName) -> Self {
        Self {
            name: name.local.clone(),
            namespace: name.namespace.clone(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn is(&self, name: &ExpandedName) -> bool {
        self.local_name() == name.local && self.namespace == name.namespace
    }

    /// The default namespace declared on this element, if any.
    pub fn default_namespace(&self) -> Option<&str> {
        self.attribute("xmlns").filter(|uri| !uri.is_empty())
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value.to_string(),
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn push(&mut self, node: XmlNode) {
        self.children.push(node);
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    pub fn child(&self, name: &ExpandedName) -> Option<&Element> {
        self.elements().find(|element| element.is(name))
    }

    pub fn child_mut(&mut self, name: &ExpandedName) -> Option<&mut Element> {
        self.children
            .iter_mut()
            .filter_map(XmlNode::as_element_mut)
            .find(|element| element.is(name))
    }

    /// Removes the first child element with the given name.
    pub fn remove_child(&mut self, name: &ExpandedName) -> Option<Element> {
        let position = self
            .children
            .iter()
            .position(|node| node.as_element().is_some_and(|e| e.is(name)))?;
        match self.children.remove(position) {
            XmlNode::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Text of the first child node, if that node is text or CDATA.
    pub fn first_text(&self) -> Option<&str> {
        match self.children.first() {
            Some(XmlNode::Text(text)) | Some(XmlNode::CData(text)) => Some(text),
            _ => None,
        }
    }

    /// Replaces the first child node with a text node, or adds one when the
    /// element is empty.
    pub fn replace_first_with_text(&mut self, text: &str) {
        match self.children.first_mut() {
            Some(first) => *first = XmlNode::Text(text.to_string()),
            None => self.children.push(XmlNode::Text(text.to_string())),
        }
    }

    fn drop_ignorable_whitespace(&mut self) {
        if self.elements().next().is_some() {
            self.children.retain(|node| !node.is_whitespace_text());
        }
    }
}

/// A parsed document: nodes before the root, the root element, nodes after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub prolog: Vec<XmlNode>,
    pub root: Element,
    pub epilog: Vec<XmlNode>,
}

impl XmlDocument {
    pub fn new(root: Element) -> Self {
        Self {
            prolog: vec![XmlNode::Declaration(Declaration {
                version: "1.0".to_string(),
                encoding: Some("utf-8".to_string()),
                standalone: None,
            })],
            root,
            epilog: Vec::new(),
        }
    }

    /// The standard empty resource document, headers included.
    pub fn empty_resx() -> Result<Self, Error> {
        <Self as Parser>::from_str(EMPTY_RESX)
    }

    /// Serializes the document to a UTF-8 string.
    pub fn to_xml_string(&self) -> Result<String, Error> {
        let mut out = Vec::new();
        self.to_writer(&mut out)?;
        String::from_utf8(out).map_err(|e| Error::InvalidResource(e.to_string()))
    }
}

impl Parser for XmlDocument {
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut xml_reader = Reader::from_reader(reader);
        let mut buf = Vec::new();
        let mut builder = TreeBuilder::default();

        loop {
            let event = xml_reader
                .read_event_into(&mut buf)
                .map_err(|e| Error::malformed("", e.to_string()))?;
            match event {
                Event::Start(e) => builder.open(&e)?,
                Event::Empty(e) => {
                    builder.open(&e)?;
                    builder.close()?;
                }
                Event::End(_) => builder.close()?,
                Event::Text(e) => {
                    let raw = decode(&e)?;
                    let text = unescape(&normalize_line_endings(&raw))
                        .map_err(|e| Error::malformed("", e.to_string()))?
                        .into_owned();
                    builder.text(text)?;
                }
                Event::CData(e) => {
                    let text = normalize_line_endings(&decode(&e)?).into_owned();
                    builder.push(XmlNode::CData(text))?
                }
                Event::Comment(e) => builder.push(XmlNode::Comment(decode(&e)?))?,
                Event::PI(e) => builder.push(XmlNode::ProcessingInstruction(decode(&e)?))?,
                Event::DocType(e) => builder.push(XmlNode::DocType(decode(&e)?))?,
                Event::Decl(e) => builder.push(XmlNode::Declaration(read_declaration(&e)?))?,
                Event::Eof => break,
            }
            buf.clear();
        }

        builder.finish()
    }

    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let mut xml_writer = Writer::new_with_indent(&mut writer, b' ', 2);

        for node in &self.prolog {
            write_node(&mut xml_writer, node)?;
        }
        write_element(&mut xml_writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut xml_writer, node)?;
        }
        xml_writer.get_mut().write_all(b"\n")?;
        Ok(())
    }
}

#[derive(Default)]
struct TreeBuilder {
    prolog: Vec<XmlNode>,
    root: Option<Element>,
    epilog: Vec<XmlNode>,
    open: Vec<Element>,
    // One frame of (prefix, uri) declarations per open element.
    scopes: Vec<Vec<(Option<String>, String)>>,
}

impl TreeBuilder {
    fn open(&mut self, start: &BytesStart) -> Result<(), Error> {
        if self.open.is_empty() && self.root.is_some() {
            return Err(Error::malformed("", "more than one root element"));
        }

        let name = decode(start.name().as_ref())?;
        let mut attributes = Vec::new();
        let mut declared = Vec::new();

        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::malformed("", e.to_string()))?;
            let key = decode(attr.key.as_ref())?;
            let value = attr
                .unescape_value()
                .map_err(|e| Error::malformed("", e.to_string()))?
                .into_owned();
            if key == "xmlns" {
                declared.push((None, value.clone()));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declared.push((Some(prefix.to_string()), value.clone()));
            }
            attributes.push(Attribute { name: key, value });
        }

        self.scopes.push(declared);
        let prefix = name.split_once(':').map(|(prefix, _)| prefix);
        let namespace = self.resolve(prefix);

        self.open.push(Element {
            name,
            namespace,
            attributes,
            children: Vec::new(),
        });
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        let mut element = self
            .open
            .pop()
            .ok_or_else(|| Error::malformed("", "unexpected closing tag"))?;
        self.scopes.pop();
        element.drop_ignorable_whitespace();

        match self.open.last_mut() {
            Some(parent) => parent.push(XmlNode::Element(element)),
            None => self.root = Some(element),
        }
        Ok(())
    }

    fn text(&mut self, text: String) -> Result<(), Error> {
        match self.open.last_mut() {
            Some(parent) => {
                parent.push(XmlNode::Text(text));
                Ok(())
            }
            None if text.chars().all(char::is_whitespace) => Ok(()),
            None => Err(Error::malformed("", "text outside of the root element")),
        }
    }

    fn push(&mut self, node: XmlNode) -> Result<(), Error> {
        match (self.open.last_mut(), &self.root) {
            (Some(parent), _) => parent.push(node),
            (None, None) => self.prolog.push(node),
            (None, Some(_)) => self.epilog.push(node),
        }
        Ok(())
    }

    fn resolve(&self, prefix: Option<&str>) -> Option<String> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE.to_string());
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(declared, _)| declared.as_deref() == prefix)
            .map(|(_, uri)| uri.clone())
            .filter(|uri| !uri.is_empty())
    }

    fn finish(self) -> Result<XmlDocument, Error> {
        if let Some(unclosed) = self.open.last() {
            return Err(Error::malformed(
                "",
                format!("unexpected end of file inside <{}>", unclosed.name),
            ));
        }
        let root = self
            .root
            .ok_or_else(|| Error::MissingRoot {
                path: String::new(),
            })?;
        Ok(XmlDocument {
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

fn decode(bytes: &[u8]) -> Result<String, Error> {
    String::from_utf8(bytes.to_vec()).map_err(|e| Error::malformed("", e.to_string()))
}

/// Folds `\r\n` and lone `\r` into `\n` (XML 1.0, section 2.11). Character
/// references are expanded afterwards, so an escaped `&#13;` survives.
fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

fn read_declaration(decl: &BytesDecl) -> Result<Declaration, Error> {
    let version = decl
        .version()
        .map_err(|e| Error::malformed("", e.to_string()))?;
    let encoding = match decl.encoding() {
        Some(value) => Some(decode(&value.map_err(|e| Error::malformed("", e.to_string()))?)?),
        None => None,
    };
    let standalone = match decl.standalone() {
        Some(value) => Some(decode(&value.map_err(|e| Error::malformed("", e.to_string()))?)?),
        None => None,
    };
    Ok(Declaration {
        version: decode(&version)?,
        encoding,
        standalone,
    })
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &XmlNode) -> Result<(), Error> {
    match node {
        XmlNode::Element(element) => write_element(writer, element)?,
        XmlNode::Text(text) => {
            let mut escaped = partial_escape(text);
            if escaped.contains('\r') {
                escaped = Cow::Owned(escaped.replace('\r', "&#13;"));
            }
            writer.write_event(Event::Text(BytesText::from_escaped(escaped)))?
        }
        XmlNode::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str())))?,
        XmlNode::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?
        }
        XmlNode::ProcessingInstruction(content) => {
            writer.write_event(Event::PI(BytesPI::new(content.as_str())))?
        }
        XmlNode::DocType(content) => {
            writer.write_event(Event::DocType(BytesText::from_escaped(content.as_str())))?
        }
        XmlNode::Declaration(decl) => {
            // Output is always UTF-8, whatever the source declared.
            let encoding = decl.encoding.as_ref().map(|_| "utf-8");
            writer.write_event(Event::Decl(BytesDecl::new(
                &decl.version,
                encoding,
                decl.standalone.as_deref(),
            )))?
        }
    }
    Ok(())
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<(), Error> {
    let mut start = BytesStart::new(element.name.as_str());
    for attr in &element.attributes {
        start.push_attribute((attr.name.as_str(), attr.value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}
