/*!
The parsing state machine: consumes the lexical event stream from the token
layer and reconstructs the document tree.

The reader owns the open-element stack and performs all balance checking
itself (the token layer's own end-name checking is switched off), which is
what lets permissive mode, the auto-close set, and the duplicate-attribute
policy work. Entity references are resolved above the lexer so that the
caller-supplied entity map and the permissive passthrough rule have full
effect; numeric character references are resolved in the same pass.
*/

use crate::element::Element;
use crate::error::{
    bad_char_ref, bad_entity, mismatched_end, multiple_roots, trailing_content, unexpected_end,
    unexpected_eof, unknown_entity, unsupported_charset, Error, Result, SyntaxError,
};
use crate::name::QName;
use crate::node::NodeKind;
use crate::syntax::{
    is_whitespace, BOM_CHAR, PREDEFINED_ENTITIES, UTF8_BOM, XML_DECL_TARGET, XML_DOCTYPE_KEYWORD,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::io::{Cursor, Read};
use std::rc::Rc;
use std::str::from_utf8;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

///
/// A pluggable character-set decoder: given the encoding label from the XML
/// declaration and a reader over the raw document bytes, produce a reader
/// yielding UTF-8.
///
pub type CharsetReader = Rc<dyn Fn(&str, Box<dyn Read>) -> std::io::Result<Box<dyn Read>>>;

///
/// Tag names treated as implicitly self-closing under permissive parsing,
/// mirroring the HTML elements that take no content.
///
pub const HTML_AUTO_CLOSE: &[&str] = &[
    "basefont", "br", "area", "link", "img", "param", "hr", "input", "col", "frame", "isindex",
    "base", "meta",
];

///
/// Switches applied while reading a document.
///
#[derive(Clone)]
pub struct ReadSettings {
    /// Downgrade selected structural errors to silent repair: mismatched end
    /// tags close up to a matching ancestor, unknown entities pass through
    /// literally, and the auto-close set takes effect.
    pub permissive: bool,
    /// Tag names (ASCII case-insensitive, local part) that are implicitly
    /// self-closed under `permissive`; see [`HTML_AUTO_CLOSE`].
    pub auto_close: Vec<String>,
    /// Keep CDATA sections as dedicated CDATA nodes instead of plain
    /// character data.
    pub preserve_cdata: bool,
    /// Keep every occurrence of a repeated attribute key in source order
    /// instead of last-write-wins.
    pub preserve_duplicate_attrs: bool,
    /// Fail on documents with more than one root element or significant
    /// content after the root's close.
    pub validate_input: bool,
    /// Additional entity definitions; the five predefined XML entities are
    /// always available regardless of this map.
    pub entities: HashMap<String, String>,
    /// Invoked when the declared encoding is not UTF-8 or US-ASCII; reading
    /// fails on such documents when absent.
    pub charset_reader: Option<CharsetReader>,
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl Default for ReadSettings {
    fn default() -> Self {
        Self {
            permissive: false,
            auto_close: Vec::new(),
            preserve_cdata: false,
            preserve_duplicate_attrs: false,
            validate_input: false,
            entities: HashMap::new(),
            charset_reader: None,
        }
    }
}

impl Debug for ReadSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ReadSettings")
            .field("permissive", &self.permissive)
            .field("auto_close", &self.auto_close)
            .field("preserve_cdata", &self.preserve_cdata)
            .field("preserve_duplicate_attrs", &self.preserve_duplicate_attrs)
            .field("validate_input", &self.validate_input)
            .field("entities", &self.entities)
            .field("charset_reader", &self.charset_reader.is_some())
            .finish()
    }
}

impl ReadSettings {
    ///
    /// The [`HTML_AUTO_CLOSE`] preset as an owned list, ready to assign to
    /// [`ReadSettings::auto_close`].
    ///
    pub fn html_auto_close() -> Vec<String> {
        HTML_AUTO_CLOSE.iter().map(|tag| tag.to_string()).collect()
    }
}

// ------------------------------------------------------------------------------------------------
// Private (crate) Functions
// ------------------------------------------------------------------------------------------------

///
/// Parse `input` into children of `container` (a document's synthetic
/// root). The container is expected to be empty; on error the caller clears
/// it so no partial tree escapes.
///
pub(crate) fn read_document(
    container: &Element,
    settings: &ReadSettings,
    input: &[u8],
) -> Result<()> {
    let mut bytes: &[u8] = input;
    if bytes.starts_with(UTF8_BOM) {
        trace!("read_document - preserving byte-order mark");
        let _ = container.create_text(BOM_CHAR.to_string());
        bytes = &bytes[UTF8_BOM.len()..];
    }

    let declared = sniff_declaration(bytes).encoding;
    let decoded_storage: Option<Vec<u8>> = match declared {
        Some(label) if !is_native_encoding(&label) => match &settings.charset_reader {
            Some(charset_reader) => {
                debug!("read_document - decoding `{}` input", label);
                let mut decoded_reader =
                    charset_reader(&label, Box::new(Cursor::new(bytes.to_vec())))?;
                let mut decoded = Vec::new();
                let _ = decoded_reader.read_to_end(&mut decoded)?;
                Some(decoded)
            }
            None => {
                error!("read_document - no charset reader for `{}`", label);
                return Err(unsupported_charset(label));
            }
        },
        _ => None,
    };
    let bytes: &[u8] = match &decoded_storage {
        Some(decoded) => decoded.as_slice(),
        None => bytes,
    };

    parse_events(container, settings, bytes)
}

fn parse_events(container: &Element, settings: &ReadSettings, bytes: &[u8]) -> Result<()> {
    let decl_inst = sniff_declaration(bytes).inst;
    let mut decl_used = false;

    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().check_end_names = false;
    reader.config_mut().allow_unmatched_ends = true;
    reader.config_mut().allow_dangling_amp = settings.permissive;

    let mut buf: Vec<u8> = Vec::new();
    let mut stack: Vec<Element> = vec![container.clone()];

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::Syntax(SyntaxError::Lexer(e)))?;

        sweep_auto_close(&mut stack, settings, &event);

        match event {
            Event::Start(ref ev) => {
                trace!("parse_events - Event::Start ({:?})", ev);
                check_new_root(container, &stack, settings, position)?;
                let element = open_element(last(&stack), ev, settings, position)?;
                stack.push(element);
            }
            Event::Empty(ref ev) => {
                trace!("parse_events - Event::Empty ({:?})", ev);
                check_new_root(container, &stack, settings, position)?;
                let _ = open_element(last(&stack), ev, settings, position)?;
            }
            Event::End(ref ev) => {
                trace!("parse_events - Event::End ({:?})", ev);
                let name = QName::from(utf8(ev.name().as_ref())?);
                close_element(&mut stack, settings, name, position)?;
            }
            Event::Text(ref ev) => {
                let text = resolve_entities(utf8(ev.as_ref())?, settings, position)?;
                attach_char_data(container, &stack, settings, text, false, position)?;
            }
            Event::GeneralRef(ref ev) => {
                let text = resolve_reference(utf8(ev.as_ref())?, settings, position)?;
                attach_char_data(container, &stack, settings, text, false, position)?;
            }
            Event::CData(ref ev) => {
                trace!("parse_events - Event::CData");
                let data = utf8(ev.as_ref())?.to_string();
                attach_char_data(
                    container,
                    &stack,
                    settings,
                    data,
                    settings.preserve_cdata,
                    position,
                )?;
            }
            Event::Comment(ref ev) => {
                trace!("parse_events - Event::Comment");
                let _ = last(&stack).create_comment(utf8(ev.as_ref())?);
            }
            Event::PI(ref ev) => {
                trace!("parse_events - Event::PI");
                let target = utf8(ev.target())?.to_string();
                let inst = utf8(ev.content())?.trim_start().to_string();
                let _ = last(&stack).create_proc_inst(target, inst);
            }
            Event::Decl(_) => {
                trace!("parse_events - Event::Decl");
                let inst = if decl_used {
                    String::new()
                } else {
                    decl_used = true;
                    decl_inst.clone().unwrap_or_default()
                };
                let _ = last(&stack).create_proc_inst(XML_DECL_TARGET, inst);
            }
            Event::DocType(ref ev) => {
                trace!("parse_events - Event::DocType");
                let body = format!("{} {}", XML_DOCTYPE_KEYWORD, utf8(ev.as_ref())?.trim());
                let _ = last(&stack).create_directive(body);
            }
            Event::Eof => {
                if stack.len() > 1 {
                    error!("parse_events - EOF with {} open element(s)", stack.len() - 1);
                    return Err(unexpected_eof(stack.len() - 1));
                }
                break;
            }
        }
        buf.clear();
    }
    Ok(())
}

fn last(stack: &[Element]) -> &Element {
    &stack[stack.len() - 1]
}

///
/// Before each incoming token (EOF included): while the innermost open
/// element names a tag in the auto-close set and the token does not itself
/// close it, synthesize its close. `<br>text` thereby becomes a self-closed
/// `<br/>` followed by text.
///
fn sweep_auto_close(stack: &mut Vec<Element>, settings: &ReadSettings, event: &Event<'_>) {
    if !settings.permissive || settings.auto_close.is_empty() {
        return;
    }
    while stack.len() > 1 {
        let top_local = last(stack).name().local_name().to_string();
        let in_set = settings
            .auto_close
            .iter()
            .any(|tag| tag.eq_ignore_ascii_case(&top_local));
        if !in_set {
            return;
        }
        if let Event::End(ev) = event {
            if let Ok(name) = from_utf8(ev.name().as_ref()) {
                if QName::from(name).local_name().eq_ignore_ascii_case(&top_local) {
                    return;
                }
            }
        }
        trace!("sweep_auto_close - closing <{}>", top_local);
        let _ = stack.pop();
    }
}

fn check_new_root(
    container: &Element,
    stack: &[Element],
    settings: &ReadSettings,
    position: u64,
) -> Result<()> {
    if stack.len() == 1 && settings.validate_input && !container.child_elements().is_empty() {
        error!("check_new_root - second root element at {}", position);
        return Err(multiple_roots(position));
    }
    Ok(())
}

fn open_element(
    parent: &Element,
    ev: &BytesStart<'_>,
    settings: &ReadSettings,
    position: u64,
) -> Result<Element> {
    let element = parent.create_element(utf8(ev.name().as_ref())?);
    for attr in ev.attributes().with_checks(false) {
        let attr = attr.map_err(|e| Error::Syntax(SyntaxError::Attribute(e)))?;
        let key = utf8(attr.key.as_ref())?.to_string();
        let value = resolve_entities(utf8(attr.value.as_ref())?, settings, position)?;
        if settings.preserve_duplicate_attrs {
            element.push_attr(&key, value);
        } else {
            let _ = element.create_attr(&key, value);
        }
    }
    Ok(element)
}

fn close_element(
    stack: &mut Vec<Element>,
    settings: &ReadSettings,
    name: QName,
    position: u64,
) -> Result<()> {
    if stack.len() > 1 && last(stack).name() == name {
        let _ = stack.pop();
        return Ok(());
    }
    if settings.permissive {
        // close up to a matching open ancestor, or drop the stray end tag
        match stack.iter().skip(1).rposition(|e| e.name() == name) {
            Some(at) => {
                trace!("close_element - recovering to <{}>", name);
                stack.truncate(at + 1);
            }
            None => trace!("close_element - dropping stray </{}>", name),
        }
        return Ok(());
    }
    if stack.len() > 1 {
        error!("close_element - <{}> closed by </{}>", last(stack).tag(), name);
        Err(mismatched_end(last(stack).tag(), name.full(), position))
    } else {
        error!("close_element - </{}> with nothing open", name);
        Err(unexpected_end(name.full(), position))
    }
}

///
/// Attach character data to the innermost open element. At the document
/// level, whitespace is dropped (unless it continues an already-attached
/// run) and significant content after the root fails under validation.
/// Consecutive plain text coalesces into a single node.
///
fn attach_char_data(
    container: &Element,
    stack: &[Element],
    settings: &ReadSettings,
    data: String,
    cdata: bool,
    position: u64,
) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    let target = last(stack);
    let at_document_level = stack.len() == 1;
    let continues_run = !cdata && last_child_is_plain_text(target);
    if at_document_level && is_whitespace(&data) && !continues_run {
        return Ok(());
    }
    if at_document_level
        && settings.validate_input
        && !is_whitespace(&data)
        && !container.child_elements().is_empty()
    {
        error!("attach_char_data - content after root at {}", position);
        return Err(trailing_content(position));
    }
    if continues_run {
        append_to_last_text(target, &data);
    } else if cdata {
        let _ = target.create_cdata(data);
    } else {
        let _ = target.create_text(data);
    }
    Ok(())
}

fn last_child_is_plain_text(element: &Element) -> bool {
    let data = element.edata();
    match data.children.last() {
        Some(cell) => matches!(&cell.borrow().kind, NodeKind::CharData(cd) if !cd.cdata),
        None => false,
    }
}

fn append_to_last_text(element: &Element, data: &str) {
    let edata = element.edata();
    if let Some(cell) = edata.children.last() {
        let mut node = cell.borrow_mut();
        if let NodeKind::CharData(cd) = &mut node.kind {
            cd.data.push_str(data);
            cd.whitespace = is_whitespace(&cd.data);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Private Functions -- Entities
// ------------------------------------------------------------------------------------------------

const MAX_ENTITY_REF_LEN: usize = 64;

///
/// Resolve entity and numeric character references embedded in `text`.
/// Unknown or malformed references fail in strict mode and pass through
/// literally under `permissive`.
fn resolve_entities(text: &str, settings: &ReadSettings, position: u64) -> Result<String> {
    if !text.contains('&') {
        return Ok(text.to_string());
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let semi = match tail[1..].find(';') {
            Some(at) if at >= 1 && at < MAX_ENTITY_REF_LEN => Some(at + 1),
            _ => None,
        };
        match semi {
            Some(semi) => {
                out.push_str(&resolve_reference(&tail[1..semi], settings, position)?);
                rest = &tail[semi + 1..];
            }
            None => {
                if settings.permissive {
                    out.push('&');
                    rest = &tail[1..];
                } else {
                    error!("resolve_entities - malformed reference at {}", position);
                    return Err(bad_entity(position));
                }
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

///
/// Resolve a single reference name (the part between `&` and `;`): numeric
/// character references, the predefined five, then the caller's map.
///
fn resolve_reference(name: &str, settings: &ReadSettings, position: u64) -> Result<String> {
    if let Some(digits) = name.strip_prefix('#') {
        return match resolve_char_ref(digits) {
            Some(c) => Ok(c.to_string()),
            None if settings.permissive => Ok(format!("&{};", name)),
            None => {
                error!("resolve_reference - bad char ref `&#{};`", digits);
                Err(bad_char_ref(digits, position))
            }
        };
    }
    if let Some(value) = PREDEFINED_ENTITIES.get(name) {
        return Ok((*value).to_string());
    }
    if let Some(value) = settings.entities.get(name) {
        return Ok(value.clone());
    }
    if settings.permissive {
        Ok(format!("&{};", name))
    } else {
        error!("resolve_reference - unknown entity `&{};`", name);
        Err(unknown_entity(name, position))
    }
}

fn resolve_char_ref(digits: &str) -> Option<char> {
    let value = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        Some(hex) if !hex.is_empty() => u32::from_str_radix(hex, 16).ok()?,
        Some(_) => return None,
        None if !digits.is_empty() => digits.parse::<u32>().ok()?,
        None => return None,
    };
    std::char::from_u32(value)
}

// ------------------------------------------------------------------------------------------------
// Private Functions -- Declaration Sniffing
// ------------------------------------------------------------------------------------------------

struct DeclInfo {
    encoding: Option<String>,
    inst: Option<String>,
}

///
/// Extract the XML declaration's body and encoding label by raw scanning,
/// before (and independent of) the token layer. The declaration text is
/// kept so the tree preserves it verbatim as a `ProcInst`.
///
fn sniff_declaration(bytes: &[u8]) -> DeclInfo {
    let absent = DeclInfo {
        encoding: None,
        inst: None,
    };
    if !bytes.starts_with(b"<?xml") {
        return absent;
    }
    match bytes.get(5) {
        Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') | Some(b'?') => (),
        _ => return absent,
    }
    let end = match find_subsequence(bytes, b"?>") {
        Some(end) => end,
        None => return absent,
    };
    let inst = String::from_utf8_lossy(&bytes[5..end]).trim().to_string();
    let encoding = extract_pseudo_attr(&inst, "encoding");
    DeclInfo {
        encoding,
        inst: Some(inst),
    }
}

fn extract_pseudo_attr(decl: &str, name: &str) -> Option<String> {
    let at = decl.find(name)?;
    let rest = decl[at + name.len()..].trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let rest = &rest[1..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn is_native_encoding(label: &str) -> bool {
    label.eq_ignore_ascii_case("utf-8")
        || label.eq_ignore_ascii_case("utf8")
        || label.eq_ignore_ascii_case("us-ascii")
        || label.eq_ignore_ascii_case("ascii")
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    from_utf8(bytes).map_err(|e| Error::Syntax(SyntaxError::Encoding(e)))
}

// ------------------------------------------------------------------------------------------------
// Unit Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strict() -> ReadSettings {
        ReadSettings::default()
    }

    #[test]
    fn test_resolve_entities_predefined() {
        let out = resolve_entities("a &lt; b &amp; c", &strict(), 0).expect("resolve failed");
        assert_eq!(out, "a < b & c");
    }

    #[test]
    fn test_resolve_entities_numeric() {
        let out = resolve_entities("&#65;&#x42;&#x43;", &strict(), 0).expect("resolve failed");
        assert_eq!(out, "ABC");
        assert!(resolve_entities("&#xD800;", &strict(), 0).is_err());
        assert!(resolve_entities("&#;", &strict(), 0).is_err());
    }

    #[test]
    fn test_resolve_entities_custom_map() {
        let mut settings = strict();
        let _ = settings
            .entities
            .insert("copy".to_string(), "\u{A9}".to_string());
        let out = resolve_entities("&copy; 2020", &settings, 0).expect("resolve failed");
        assert_eq!(out, "\u{A9} 2020");
    }

    #[test]
    fn test_resolve_entities_unknown() {
        assert!(resolve_entities("&nope;", &strict(), 0).is_err());

        let mut permissive = strict();
        permissive.permissive = true;
        let out = resolve_entities("&nope; & done", &permissive, 0).expect("resolve failed");
        assert_eq!(out, "&nope; & done");
    }

    #[test]
    fn test_sniff_declaration() {
        let info = sniff_declaration(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r/>");
        assert_eq!(info.encoding, Some("ISO-8859-1".to_string()));
        assert_eq!(
            info.inst,
            Some("version=\"1.0\" encoding=\"ISO-8859-1\"".to_string())
        );

        let info = sniff_declaration(b"<?xml version='1.0'?><r/>");
        assert_eq!(info.encoding, None);
        assert_eq!(info.inst, Some("version='1.0'".to_string()));

        let info = sniff_declaration(b"<r/>");
        assert!(info.inst.is_none());

        // not a declaration, a processing instruction
        let info = sniff_declaration(b"<?xmlx?><r/>");
        assert!(info.inst.is_none());
    }

    #[test]
    fn test_native_encodings() {
        assert!(is_native_encoding("UTF-8"));
        assert!(is_native_encoding("utf8"));
        assert!(is_native_encoding("US-ASCII"));
        assert!(!is_native_encoding("ISO-8859-1"));
        assert!(!is_native_encoding("UTF-16"));
    }

    #[test]
    fn test_html_auto_close_preset() {
        let preset = ReadSettings::html_auto_close();
        assert!(preset.iter().any(|t| t == "br"));
        assert!(preset.iter().any(|t| t == "hr"));
        assert_eq!(preset.len(), HTML_AUTO_CLOSE.len());
    }
}
