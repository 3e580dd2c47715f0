//! The XML form of an element set.
//!
//! ```xml
//! <DtalgebraSet>
//!   <Dtalgebra>
//!     <Dtelem>
//!       <Dtvalue>42</Dtvalue>
//!       <Dtbase name="weight" type="decimal" attr="#" subject="#"/>
//!     </Dtelem>
//!   </Dtalgebra>
//! </DtalgebraSet>
//! ```
//!
//! Reading is done by a small streaming scanner that turns the text into
//! start, end and text events, and a reader that checks every event against a
//! stack of open elements. Anything out of place fails with the element path
//! where it happened.

use std::mem;

use tracing::debug;

use crate::basis::Basis;
use crate::cache::KeyCache;
use crate::collection::ElementSet;
use crate::datatype::{Value, ValueType};
use crate::element::AlgebraElement;
use crate::error::{DtalgebraError, Result};

const SET_TAG: &str = "DtalgebraSet";
const ELEMENT_TAG: &str = "Dtalgebra";
const ENTRY_TAG: &str = "Dtelem";
const VALUE_TAG: &str = "Dtvalue";
const BASE_TAG: &str = "Dtbase";

// ------------- Scanner -------------
#[derive(Debug)]
enum Event {
    Start {
        name: String,
        attributes: Vec<(String, String)>,
        empty: bool,
    },
    End {
        name: String,
    },
    Text(String),
}

struct Scanner<'t> {
    text: &'t str,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'t> Scanner<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            text: text.strip_prefix('\u{feff}').unwrap_or(text),
            pos: 0,
            line: 1,
            col: 1,
        }
    }
    fn rest(&self) -> &'t str {
        let text: &'t str = self.text;
        &text[self.pos..]
    }
    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }
    fn skip(&mut self, bytes: usize) {
        let target = self.pos + bytes;
        while self.pos < target && self.bump().is_some() {}
    }
    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }
    fn error(&self, message: impl Into<String>) -> DtalgebraError {
        DtalgebraError::Xml {
            message: message.into(),
            location: String::from("/"),
            line: self.line,
            col: self.col,
        }
    }
    /// Consumes everything up to and including `end`, returning what came before it.
    fn take_until(&mut self, end: &str, what: &str) -> Result<&'t str> {
        let rest = self.rest();
        match rest.find(end) {
            Some(at) => {
                self.skip(at + end.len());
                Ok(&rest[..at])
            }
            None => Err(self.error(format!("unterminated {}", what))),
        }
    }
    fn name(&mut self) -> Result<String> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '/' | '>' | '=' | '<'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected a name"));
        }
        self.skip(len);
        Ok(rest[..len].to_owned())
    }
    fn expect(&mut self, c: char) -> Result<()> {
        match self.bump() {
            Some(found) if found == c => Ok(()),
            Some(found) => Err(self.error(format!("expected '{}', found '{}'", c, found))),
            None => Err(self.error(format!("expected '{}', found end of input", c))),
        }
    }

    fn next_event(&mut self) -> Result<Option<(Event, usize, usize)>> {
        loop {
            let (line, col) = (self.line, self.col);
            let rest = self.rest();
            if rest.is_empty() {
                return Ok(None);
            }
            if rest.starts_with("<!--") {
                self.skip(4);
                self.take_until("-->", "comment")?;
            } else if rest.starts_with("<?") {
                self.skip(2);
                let instruction = self.take_until("?>", "processing instruction")?;
                if let Some(declaration) = instruction.strip_prefix("xml") {
                    check_declaration(declaration).map_err(|m| DtalgebraError::Xml {
                        message: m,
                        location: String::from("/"),
                        line,
                        col,
                    })?;
                }
            } else if rest.starts_with("<!DOCTYPE") {
                return Err(self.error("document type declarations are not supported"));
            } else if rest.starts_with("<![CDATA[") {
                self.skip(9);
                let data = self.take_until("]]>", "CDATA section")?;
                return Ok(Some((Event::Text(data.to_owned()), line, col)));
            } else if rest.starts_with("</") {
                self.skip(2);
                let name = self.name()?;
                self.skip_whitespace();
                self.expect('>')?;
                return Ok(Some((Event::End { name }, line, col)));
            } else if rest.starts_with('<') {
                self.skip(1);
                let event = self.start_tag()?;
                return Ok(Some((event, line, col)));
            } else {
                let len = rest.find('<').unwrap_or(rest.len());
                let raw = &rest[..len];
                let text = decode_entities(raw).map_err(|m| self.error(m))?;
                self.skip(len);
                return Ok(Some((Event::Text(text), line, col)));
            }
        }
    }

    fn start_tag(&mut self) -> Result<Event> {
        let name = self.name()?;
        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.skip(2);
                return Ok(Event::Start { name, attributes, empty: true });
            }
            if rest.starts_with('>') {
                self.skip(1);
                return Ok(Event::Start { name, attributes, empty: false });
            }
            if rest.is_empty() {
                return Err(self.error(format!("unterminated tag <{}>", name)));
            }
            let attribute = self.name()?;
            self.skip_whitespace();
            self.expect('=')?;
            self.skip_whitespace();
            let quote = match self.bump() {
                Some(q @ ('"' | '\'')) => q,
                _ => return Err(self.error(format!("expected a quoted value for '{}'", attribute))),
            };
            let raw = self.take_until(&quote.to_string(), "attribute value")?;
            if raw.contains('<') {
                return Err(self.error(format!("'<' in the value of '{}'", attribute)));
            }
            let value = decode_entities(raw).map_err(|m| self.error(m))?;
            attributes.push((attribute, value));
        }
    }
}

// only UTF-8 documents are accepted
fn check_declaration(declaration: &str) -> std::result::Result<(), String> {
    let Some(at) = declaration.find("encoding") else {
        return Ok(());
    };
    let value = declaration[at + "encoding".len()..]
        .trim_start()
        .trim_start_matches('=')
        .trim_start();
    let value = value
        .trim_start_matches(['"', '\''])
        .split(['"', '\''])
        .next()
        .unwrap_or("");
    if value.eq_ignore_ascii_case("utf-8") || value.eq_ignore_ascii_case("utf8") {
        Ok(())
    } else {
        Err(format!("unsupported encoding '{}', only UTF-8 is read", value))
    }
}

fn decode_entities(raw: &str) -> std::result::Result<String, String> {
    if !raw.contains('&') {
        return Ok(raw.to_owned());
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(at) = rest.find('&') {
        out += &rest[..at];
        let after = &rest[at + 1..];
        let end = after
            .find(';')
            .ok_or_else(|| format!("unterminated entity in '{}'", raw))?;
        let entity = &after[..end];
        let decoded = match entity {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| format!("unknown entity '&{};'", entity))?
            }
        };
        out.push(decoded);
        rest = &after[end + 1..];
    }
    out += rest;
    Ok(out)
}

// ------------- Reader -------------
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Node {
    Set,
    Element,
    Entry,
    Value,
    Base,
}
impl Node {
    fn tag(&self) -> &'static str {
        match self {
            Node::Set => SET_TAG,
            Node::Element => ELEMENT_TAG,
            Node::Entry => ENTRY_TAG,
            Node::Value => VALUE_TAG,
            Node::Base => BASE_TAG,
        }
    }
    fn child(parent: Option<Node>, tag: &str) -> Option<Node> {
        match (parent, tag) {
            (None, SET_TAG) => Some(Node::Set),
            (Some(Node::Set), ELEMENT_TAG) => Some(Node::Element),
            (Some(Node::Element), ENTRY_TAG) => Some(Node::Entry),
            (Some(Node::Entry), VALUE_TAG) => Some(Node::Value),
            (Some(Node::Entry), BASE_TAG) => Some(Node::Base),
            _ => None,
        }
    }
}

struct Frame {
    node: Node,
    ordinal: usize,
    children: usize,
}

#[derive(Default)]
struct PendingEntry {
    // null flag and collected text of the Dtvalue
    value: Option<(bool, String)>,
    basis: Option<Basis>,
}

struct Reader<'c> {
    cache: &'c mut KeyCache,
    stack: Vec<Frame>,
    roots: usize,
    set: ElementSet,
    element: AlgebraElement,
    entry: PendingEntry,
    line: usize,
    col: usize,
}

impl<'c> Reader<'c> {
    fn location(&self) -> String {
        let mut path = String::new();
        for frame in &self.stack {
            path.push('/');
            path += frame.node.tag();
            if matches!(frame.node, Node::Element | Node::Entry) {
                path += &format!("[{}]", frame.ordinal);
            }
        }
        if path.is_empty() {
            path.push('/');
        }
        path
    }
    fn error(&self, message: impl Into<String>) -> DtalgebraError {
        DtalgebraError::Xml {
            message: message.into(),
            location: self.location(),
            line: self.line,
            col: self.col,
        }
    }
    // scanner errors only know their position
    fn relocate(&self, e: DtalgebraError) -> DtalgebraError {
        match e {
            DtalgebraError::Xml { message, line, col, .. } => DtalgebraError::Xml {
                message,
                location: self.location(),
                line,
                col,
            },
            other => other,
        }
    }
    fn top(&self) -> Option<Node> {
        self.stack.last().map(|f| f.node)
    }

    fn start(&mut self, name: &str, attributes: &[(String, String)]) -> Result<()> {
        let parent = self.top();
        let node = Node::child(parent, name)
            .ok_or_else(|| self.error(format!("unexpected element <{}>", name)))?;
        if node == Node::Set {
            self.roots += 1;
            if self.roots > 1 {
                return Err(self.error(format!("more than one <{}>", SET_TAG)));
            }
        }
        let ordinal = match self.stack.last_mut() {
            Some(frame) => {
                frame.children += 1;
                frame.children
            }
            None => 1,
        };
        self.stack.push(Frame { node, ordinal, children: 0 });
        let attribute = |key: &str| {
            attributes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        match node {
            Node::Element => self.element = AlgebraElement::new(),
            Node::Entry => self.entry = PendingEntry::default(),
            Node::Value => {
                if self.entry.value.is_some() {
                    return Err(self.error(format!("more than one <{}>", VALUE_TAG)));
                }
                let null = match attribute("null") {
                    None | Some("false") => false,
                    Some("true") => true,
                    Some(other) => return Err(self.error(format!("invalid null flag '{}'", other))),
                };
                self.entry.value = Some((null, String::new()));
            }
            Node::Base => {
                if self.entry.basis.is_some() {
                    return Err(self.error(format!("more than one <{}>", BASE_TAG)));
                }
                let basis = Basis::new(
                    self.cache,
                    attribute("name").unwrap_or(""),
                    attribute("type").unwrap_or(""),
                    attribute("attr"),
                    attribute("subject"),
                )
                .map_err(|e| self.error(e.to_string()))?;
                self.entry.basis = Some(basis);
            }
            Node::Set => {}
        }
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        let node = match self.top() {
            Some(node) if node.tag() == name => node,
            Some(node) => {
                return Err(self.error(format!("expected </{}>, found </{}>", node.tag(), name)))
            }
            None => return Err(self.error(format!("unexpected closing tag </{}>", name))),
        };
        match node {
            Node::Value => {
                if let Some((true, text)) = &self.entry.value {
                    if !text.trim().is_empty() {
                        return Err(self.error("a null value cannot have text"));
                    }
                }
            }
            Node::Entry => {
                let entry = mem::take(&mut self.entry);
                let (Some((null, text)), Some(basis)) = (entry.value, entry.basis) else {
                    return Err(self.error(format!(
                        "<{}> needs one <{}> and one <{}>",
                        ENTRY_TAG, VALUE_TAG, BASE_TAG
                    )));
                };
                let value = if null || (text.is_empty() && basis.value_type() != ValueType::String) {
                    Value::Null
                } else {
                    Value::parse(basis.value_type(), &text).map_err(|e| self.error(e.to_string()))?
                };
                let element = mem::take(&mut self.element);
                self.element = element.with(basis, value).map_err(|e| self.error(e.to_string()))?;
            }
            Node::Element => {
                self.set.insert(mem::take(&mut self.element));
            }
            Node::Set | Node::Base => {}
        }
        self.stack.pop();
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        if self.top() == Some(Node::Value) {
            if let Some((_, collected)) = self.entry.value.as_mut() {
                collected.push_str(text);
                return Ok(());
            }
        }
        if text.trim().is_empty() {
            Ok(())
        } else {
            Err(self.error(format!("unexpected text '{}'", text.trim())))
        }
    }
}

pub(crate) fn parse(text: &str, cache: &mut KeyCache) -> Result<ElementSet> {
    let mut scanner = Scanner::new(text);
    let mut reader = Reader {
        cache,
        stack: Vec::new(),
        roots: 0,
        set: ElementSet::new(),
        element: AlgebraElement::new(),
        entry: PendingEntry::default(),
        line: 1,
        col: 1,
    };
    while let Some((event, line, col)) = scanner.next_event().map_err(|e| reader.relocate(e))? {
        reader.line = line;
        reader.col = col;
        match event {
            Event::Start { name, attributes, empty } => {
                reader.start(&name, &attributes)?;
                if empty {
                    reader.end(&name)?;
                }
            }
            Event::End { name } => reader.end(&name)?,
            Event::Text(text) => reader.text(&text)?,
        }
    }
    reader.line = scanner.line;
    reader.col = scanner.col;
    if let Some(node) = reader.top() {
        return Err(reader.error(format!("unclosed <{}>", node.tag())));
    }
    if reader.roots == 0 {
        return Err(reader.error(format!("missing <{}>", SET_TAG)));
    }
    debug!("Parsed {} elements from XML", reader.set.len());
    Ok(reader.set)
}

// ------------- Writer -------------
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out += "&amp;",
            '<' => out += "&lt;",
            '>' => out += "&gt;",
            '"' => out += "&quot;",
            '\'' => out += "&apos;",
            c => out.push(c),
        }
    }
    out
}

pub fn format(set: &ElementSet) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out += &format!("<{}>\n", SET_TAG);
    for element in set.iter() {
        out += &format!("  <{}>\n", ELEMENT_TAG);
        for (basis, value) in element.iter() {
            out += &format!("    <{}>\n", ENTRY_TAG);
            match value {
                Value::Null => out += &format!("      <{} null=\"true\"/>\n", VALUE_TAG),
                other => out += &format!("      <{0}>{1}</{0}>\n", VALUE_TAG, escape(&other.to_string())),
            }
            out += &format!(
                "      <{} name=\"{}\" type=\"{}\" attr=\"{}\" subject=\"{}\"/>\n",
                BASE_TAG,
                escape(basis.name()),
                escape(basis.type_token()),
                escape(basis.attribute()),
                escape(basis.subject())
            );
            out += &format!("    </{}>\n", ENTRY_TAG);
        }
        out += &format!("  </{}>\n", ELEMENT_TAG);
    }
    out += &format!("</{}>\n", SET_TAG);
    out
}
