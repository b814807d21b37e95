/*!
Pure syntactic tokens and character classes of the XML 1.0 grammar, shared by
the parser, the serializer, and the node constructors.
*/

use std::collections::HashMap;

// ------------------------------------------------------------------------------------------------
// Public Values -- Markup Tokens
// ------------------------------------------------------------------------------------------------

pub const XML_PI_START: &str = "<?";
pub const XML_PI_END: &str = "?>";

pub const XML_COMMENT_START: &str = "<!--";
pub const XML_COMMENT_END: &str = "-->";

pub const XML_CDATA_START: &str = "<![CDATA[";
pub const XML_CDATA_END: &str = "]]>";

pub const XML_DIRECTIVE_START: &str = "<!";
pub const XML_DIRECTIVE_END: &str = ">";

pub const XML_DOCTYPE_KEYWORD: &str = "DOCTYPE";

pub const XML_ELEMENT_START_START: &str = "<";
pub const XML_ELEMENT_START_END: &str = ">";
pub const XML_ELEMENT_SELF_CLOSE: &str = "/>";
pub const XML_ELEMENT_END_START: &str = "</";
pub const XML_ELEMENT_END_END: &str = ">";

// ------------------------------------------------------------------------------------------------
// Public Values -- Namespace Support
// ------------------------------------------------------------------------------------------------

pub const XMLNS_ATTRIBUTE: &str = "xmlns";

pub const XML_NS_SEPARATOR: char = ':';

/**
Target of the XML declaration pseudo processing-instruction; the declaration
is preserved in the tree as a `ProcInst` with this target.
*/
pub const XML_DECL_TARGET: &str = "xml";

// ------------------------------------------------------------------------------------------------
// Public Values -- Entities and Encodings
// ------------------------------------------------------------------------------------------------

/**
A leading UTF-8 byte-order mark; preserved on read as character data attached
to the document itself.
*/
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub const BOM_CHAR: char = '\u{FEFF}';

lazy_static! {
    /**
    The five entities predefined by the XML specification. These are always
    available to the parser, regardless of any caller-supplied entity map.
    */
    pub(crate) static ref PREDEFINED_ENTITIES: HashMap<&'static str, &'static str> = {
        let mut entities = HashMap::new();
        let _ = entities.insert("amp", "&");
        let _ = entities.insert("lt", "<");
        let _ = entities.insert("gt", ">");
        let _ = entities.insert("apos", "'");
        let _ = entities.insert("quot", "\"");
        entities
    };
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

///
/// Returns `true` if every byte of `data` is one of space, tab, carriage
/// return, or line feed. This is the classification cached on character-data
/// nodes; the empty string is vacuously whitespace.
///
pub fn is_whitespace(data: &str) -> bool {
    data.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
}

///
/// Returns `true` if `c` lies in the `Char` production of XML 1.0. Characters
/// outside this set are replaced with `U+FFFD` on output.
///
pub fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{0020}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

// ------------------------------------------------------------------------------------------------
// Unit Tests
// ------------------------------------------------------------------------------------------------
