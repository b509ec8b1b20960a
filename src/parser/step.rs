use std::collections::BTreeMap;
use std::fmt;

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    String(String),
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Enum(String),
    Reference(u64),
    List(Vec<StepValue>),
    /// Typed value like `IFCIDENTIFIER('x')`.
    Typed(String, Box<StepValue>),
    Null,
    Derived,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepEntity {
    pub id: u64,
    pub entity_type: String,
    pub values: Vec<StepValue>,
}

#[derive(Debug)]
pub struct StepFile {
    pub entities: BTreeMap<u64, StepEntity>,
    pub schema: String,
    /// Byte offset of the `ENDSEC;` closing the DATA section.
    pub data_end: Option<usize>,
}

impl StepFile {
    pub fn parse(content: &str) -> Result<Self, ParseError> {
        if !content.trim_start().starts_with("ISO-10303-21") {
            return Err(ParseError::InvalidStep {
                message: "missing ISO-10303-21 header".to_string(),
            });
        }

        let mut entities = BTreeMap::new();
        let mut schema = String::new();
        let mut in_data = false;
        let mut data_end = None;

        for (offset, statement) in split_statements(content)? {
            // Parse schema
            if statement.starts_with("FILE_SCHEMA") {
                if let Some(start) = statement.find("('") {
                    if let Some(end) = statement[start + 2..].find('\'') {
                        schema = statement[start + 2..start + 2 + end].to_string();
                    }
                }
                continue;
            }

            if statement == "DATA" {
                in_data = true;
                continue;
            }
            if statement == "ENDSEC" {
                if in_data && data_end.is_none() {
                    data_end = Some(offset);
                }
                in_data = false;
                continue;
            }

            if in_data && statement.starts_with('#') {
                if let Some(entity) = Self::parse_entity(statement) {
                    entities.insert(entity.id, entity);
                }
            }
        }

        Ok(StepFile {
            entities,
            schema,
            data_end,
        })
    }

    fn parse_entity(statement: &str) -> Option<StepEntity> {
        // Format: #123=IFCWALL('guid',#ref,'name',...)
        let eq_pos = statement.find('=')?;
        let id: u64 = statement[1..eq_pos].trim().parse().ok()?;

        let rest = statement[eq_pos + 1..].trim();
        let paren_pos = rest.find('(')?;
        let entity_type = rest[..paren_pos].trim().to_uppercase();

        if !rest.ends_with(')') {
            return None;
        }
        let values_str = &rest[paren_pos + 1..rest.len() - 1];
        let values = Self::parse_values(values_str);

        Some(StepEntity {
            id,
            entity_type,
            values,
        })
    }

    fn parse_values(s: &str) -> Vec<StepValue> {
        let mut values = Vec::new();
        let mut current = String::new();
        let mut in_string = false;
        let mut paren_depth = 0;

        for ch in s.chars() {
            match ch {
                '\'' => {
                    in_string = !in_string;
                    current.push(ch);
                }
                '(' if !in_string => {
                    paren_depth += 1;
                    current.push(ch);
                }
                ')' if !in_string => {
                    paren_depth -= 1;
                    current.push(ch);
                }
                ',' if !in_string && paren_depth == 0 => {
                    values.push(Self::parse_single_value(current.trim()));
                    current.clear();
                }
                _ => current.push(ch),
            }
        }

        if !current.trim().is_empty() {
            values.push(Self::parse_single_value(current.trim()));
        }

        values
    }

    fn parse_single_value(s: &str) -> StepValue {
        let s = s.trim();

        if s == "$" {
            return StepValue::Null;
        }
        if s == "*" {
            return StepValue::Derived;
        }
        if let Some(stripped) = s.strip_prefix('#') {
            if let Ok(id) = stripped.parse::<u64>() {
                return StepValue::Reference(id);
            }
        }
        if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
            let raw = &s[1..s.len() - 1];
            return StepValue::String(decode_step_string(raw));
        }
        if s.len() >= 2 && s.starts_with('.') && s.ends_with('.') {
            let inner = &s[1..s.len() - 1];
            if inner == "T" {
                return StepValue::Boolean(true);
            }
            if inner == "F" {
                return StepValue::Boolean(false);
            }
            return StepValue::Enum(inner.to_string());
        }
        if s.starts_with('(') && s.ends_with(')') {
            let inner = &s[1..s.len() - 1];
            return StepValue::List(Self::parse_values(inner));
        }
        if let Ok(i) = s.parse::<i64>() {
            return StepValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return StepValue::Real(f);
        }
        // Typed value like IFCBOOLEAN(.T.)
        if s.starts_with(|c: char| c.is_ascii_alphabetic()) && s.ends_with(')') {
            if let Some(paren_pos) = s.find('(') {
                let type_name = s[..paren_pos].trim().to_uppercase();
                let inner = &s[paren_pos + 1..s.len() - 1];
                return StepValue::Typed(type_name, Box::new(Self::parse_single_value(inner)));
            }
        }

        StepValue::String(s.to_string())
    }

    #[must_use]
    pub fn get_entity(&self, id: u64) -> Option<&StepEntity> {
        self.entities.get(&id)
    }

    /// Entities of one type, in id order.
    #[must_use]
    pub fn get_entities_by_type(&self, entity_type: &str) -> Vec<&StepEntity> {
        self.entities
            .values()
            .filter(|e| e.entity_type == entity_type)
            .collect()
    }

    #[must_use]
    pub fn max_id(&self) -> u64 {
        self.entities.keys().next_back().copied().unwrap_or(0)
    }
}

impl StepEntity {
    #[must_use]
    pub fn string_at(&self, index: usize) -> Option<&str> {
        match self.values.get(index) {
            Some(StepValue::String(s)) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn ref_at(&self, index: usize) -> Option<u64> {
        match self.values.get(index) {
            Some(StepValue::Reference(id)) => Some(*id),
            _ => None,
        }
    }

    /// References held in a list attribute; empty when the slot is not a list.
    #[must_use]
    pub fn refs_at(&self, index: usize) -> Vec<u64> {
        match self.values.get(index) {
            Some(StepValue::List(list)) => list
                .iter()
                .filter_map(|item| match item {
                    StepValue::Reference(id) => Some(*id),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn value_at(&self, index: usize) -> StepValue {
        self.values.get(index).cloned().unwrap_or(StepValue::Null)
    }
}

impl fmt::Display for StepValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepValue::String(s) => write!(f, "'{}'", encode_step_string(s)),
            StepValue::Real(r) => {
                let text = r.to_string();
                if text.contains('.') || text.contains("inf") || text.contains("NaN") {
                    f.write_str(&text)
                } else {
                    write!(f, "{text}.")
                }
            }
            StepValue::Integer(i) => write!(f, "{i}"),
            StepValue::Boolean(b) => f.write_str(if *b { ".T." } else { ".F." }),
            StepValue::Enum(e) => write!(f, ".{e}."),
            StepValue::Reference(id) => write!(f, "#{id}"),
            StepValue::List(list) => {
                f.write_str("(")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            StepValue::Typed(name, value) => write!(f, "{name}({value})"),
            StepValue::Null => f.write_str("$"),
            StepValue::Derived => f.write_str("*"),
        }
    }
}

impl fmt::Display for StepEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}={}(", self.id, self.entity_type)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str(");")
    }
}

/// Splits the exchange file into `;`-terminated statements, honouring string
/// literals and `/* */` comments. Yields the byte offset of each statement.
fn split_statements(content: &str) -> Result<Vec<(usize, &str)>, ParseError> {
    let mut statements = Vec::new();
    let bytes = content.as_bytes();
    let mut start = 0;
    let mut in_string = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => in_string = !in_string,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'*') => {
                let end = content[i + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |p| i + 2 + p + 2);
                // Comments before a statement are not part of it.
                if content[start..i].trim().is_empty() {
                    start = end;
                }
                i = end;
                continue;
            }
            b';' if !in_string => {
                let raw = &content[start..i];
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    let offset = start + (raw.len() - raw.trim_start().len());
                    statements.push((offset, trimmed));
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    if in_string {
        return Err(ParseError::InvalidStep {
            message: "unterminated string literal".to_string(),
        });
    }

    Ok(statements)
}

/// Encode text for a STEP string literal.
///
/// Non-ASCII characters become `\X2\…\X0\` (BMP) or `\X4\…\X0\` groups.
#[must_use]
pub fn encode_step_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending: Vec<char> = Vec::new();

    let flush = |pending: &mut Vec<char>, out: &mut String| {
        if pending.is_empty() {
            return;
        }
        let wide = pending.iter().any(|c| u32::from(*c) > 0xFFFF);
        if wide {
            out.push_str("\\X4\\");
            for c in pending.iter() {
                out.push_str(&format!("{:08X}", u32::from(*c)));
            }
        } else {
            out.push_str("\\X2\\");
            for c in pending.iter() {
                out.push_str(&format!("{:04X}", u32::from(*c)));
            }
        }
        out.push_str("\\X0\\");
        pending.clear();
    };

    for ch in s.chars() {
        if ch.is_ascii() {
            flush(&mut pending, &mut out);
            match ch {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                _ => out.push(ch),
            }
        } else {
            pending.push(ch);
        }
    }
    flush(&mut pending, &mut out);

    out
}

/// Decode STEP/IFC encoded strings with Unicode escape sequences.
/// Supports:
/// - `\X2\XXXX\X0\` - 2-byte Unicode (BMP), can have multiple 4-char hex codes
/// - `\X4\XXXXXXXX\X0\` - 4-byte Unicode
/// - `\X\XX` - 1-byte ISO 8859-1
/// - `\\` - escaped backslash
/// - `''` - escaped apostrophe
fn decode_step_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.peek() {
                Some('X') => {
                    chars.next(); // consume 'X'
                    match chars.peek().copied() {
                        Some(width @ ('2' | '4')) => {
                            chars.next(); // consume width
                            chars.next(); // consume '\'

                            let mut hex = String::new();
                            while let Some(&c) = chars.peek() {
                                if c == '\\' {
                                    break;
                                }
                                hex.push(c);
                                chars.next();
                            }
                            // Skip \X0\
                            if chars.peek() == Some(&'\\') {
                                chars.next(); // '\'
                                chars.next(); // 'X'
                                chars.next(); // '0'
                                chars.next(); // '\'
                            }
                            let step = if width == '2' { 4 } else { 8 };
                            for chunk in hex.as_bytes().chunks(step) {
                                if chunk.len() == step {
                                    if let Ok(s) = std::str::from_utf8(chunk) {
                                        if let Ok(code) = u32::from_str_radix(s, 16) {
                                            if let Some(c) = char::from_u32(code) {
                                                result.push(c);
                                            }
                                        }
                                    }
                                }
                            }
                        }
                        Some('\\') => {
                            // \X\ followed by 2 hex digits - ISO 8859-1
                            chars.next(); // consume '\'
                            let mut hex = String::new();
                            for _ in 0..2 {
                                if let Some(&c) = chars.peek() {
                                    hex.push(c);
                                    chars.next();
                                }
                            }
                            if let Ok(code) = u8::from_str_radix(&hex, 16) {
                                result.push(code as char);
                            }
                        }
                        _ => {
                            result.push('\\');
                            result.push('X');
                        }
                    }
                }
                Some('\\') => {
                    chars.next();
                    result.push('\\');
                }
                Some('S') => {
                    // \S\X - single char shift (ISO 8859-1 high bit)
                    chars.next(); // 'S'
                    chars.next(); // '\'
                    if let Some(c) = chars.next() {
                        match char::from_u32(u32::from(c) + 128).filter(|_| c.is_ascii()) {
                            Some(shifted) => result.push(shifted),
                            None => {
                                result.push_str("\\S\\");
                                result.push(c);
                            }
                        }
                    }
                }
                _ => result.push('\\'),
            }
        } else if ch == '\'' {
            // '' is escaped apostrophe in STEP
            if chars.peek() == Some(&'\'') {
                chars.next();
            }
            result.push('\'');
        } else {
            result.push(ch);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
/* owner */
#1=IFCORGANIZATION($,'Caf\\X2\\00E9\\X0\\ A; B',$,$,$);
#2=IFCMATERIALLAYER(#3,0.2,$,'Beton',
  $,$,$);
#3=IFCPROPERTYSINGLEVALUE('uuid',$,IFCIDENTIFIER('abc'),$);
ENDSEC;
END-ISO-10303-21;
";

    #[test]
    fn parses_multiline_entities_and_strings_with_semicolons() {
        let file = StepFile::parse(SAMPLE).unwrap();
        assert_eq!(file.schema, "IFC4");
        assert_eq!(file.entities.len(), 3);
        assert_eq!(file.get_entity(1).unwrap().string_at(1), Some("Café A; B"));
        assert_eq!(file.get_entity(2).unwrap().ref_at(0), Some(3));
        assert_eq!(
            file.get_entity(3).unwrap().value_at(2),
            StepValue::Typed(
                "IFCIDENTIFIER".to_string(),
                Box::new(StepValue::String("abc".to_string()))
            )
        );
        assert_eq!(file.max_id(), 3);
    }

    #[test]
    fn single_shift_escapes_decode_only_ascii() {
        let entity = StepFile::parse_entity("#1=IFCPROJECT('x',$,'Caf\\S\\i',$)").unwrap();
        assert_eq!(entity.string_at(2), Some("Café"));

        let entity = StepFile::parse_entity("#1=IFCPROJECT('x',$,'Caf\\S\\é',$)").unwrap();
        assert_eq!(entity.string_at(2), Some("Caf\\S\\é"));
    }

    #[test]
    fn data_end_points_at_closing_endsec() {
        let file = StepFile::parse(SAMPLE).unwrap();
        let offset = file.data_end.unwrap();
        assert!(SAMPLE[offset..].starts_with("ENDSEC;\nEND-ISO"));
    }

    #[test]
    fn rejects_non_step_content() {
        assert!(StepFile::parse("<html/>").is_err());
        assert!(StepFile::parse("ISO-10303-21;\nDATA;\n#1=X('open);").is_err());
    }

    #[test]
    fn entity_display_round_trips_through_parser() {
        let entity = StepEntity {
            id: 7,
            entity_type: "IFCMATERIAL".to_string(),
            values: vec![
                StepValue::String("Dämmung 'WLG 035'".to_string()),
                StepValue::Null,
                StepValue::Real(200.0),
                StepValue::Enum("STANDARD".to_string()),
            ],
        };
        let line = entity.to_string();
        assert_eq!(
            line,
            "#7=IFCMATERIAL('D\\X2\\00E4\\X0\\mmung ''WLG 035''',$,200.,.STANDARD.);"
        );
        let parsed = StepFile::parse_entity(line.trim_end_matches(';')).unwrap();
        assert_eq!(parsed, entity);
    }
}
