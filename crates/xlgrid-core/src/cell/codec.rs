//! Encoding of cell values in `<c>` nodes
//!
//! `t` attribute and `<v>` child as SpreadsheetML stores them:
//!
//! | value   | `t`          | payload                  |
//! |---------|--------------|--------------------------|
//! | empty   | absent       | no `<v>`                 |
//! | integer | absent       | `<v>42</v>`              |
//! | float   | absent       | `<v>3.5</v>`             |
//! | boolean | `b`          | `<v>1</v>` / `<v>0</v>`  |
//! | string  | `s`          | shared string index      |
//! | string  | `str`        | text in `<v>`            |
//! | string  | `inlineStr`  | text in `<is><t>`        |
//! | error   | `e`          | error code in `<v>`      |

use super::value::{CellValue, ValueType, NUM_ERROR};
use crate::error::{Error, Result};
use crate::shared_strings::SharedStrings;
use crate::xml::{NodeId, XmlDocument};

/// Classify a cell node without decoding its payload
///
/// Integer and float are told apart by looking at the stored text: a '.',
/// "E-" or "e-" makes it a float. "1E5" is therefore an integer by type even
/// though it only parses as a float; [`read_value`] handles that.
pub(crate) fn value_type(doc: &XmlDocument, cell: NodeId) -> ValueType {
    let marker = doc.attribute(cell, "t");
    let value = doc.child(cell, "v");

    match (marker, value) {
        (None, None) => ValueType::Empty,
        (None, Some(v)) | (Some("n"), Some(v)) => {
            let text = doc.text(v).unwrap_or_default();
            if text.contains('.') || text.contains("E-") || text.contains("e-") {
                ValueType::Float
            } else {
                ValueType::Integer
            }
        }
        (Some("s" | "inlineStr" | "str"), _) => ValueType::String,
        (Some("b"), _) => ValueType::Boolean,
        (Some(_), _) => ValueType::Error,
    }
}

/// Decode the value of a cell node
pub(crate) fn read_value(
    doc: &XmlDocument,
    cell: NodeId,
    strings: &SharedStrings,
) -> Result<CellValue> {
    let payload = || {
        doc.child(cell, "v")
            .and_then(|v| doc.text(v))
            .unwrap_or_default()
    };

    Ok(match value_type(doc, cell) {
        ValueType::Empty => CellValue::Empty,
        ValueType::Integer => {
            let text = payload().trim();
            match text.parse::<i64>() {
                Ok(i) => CellValue::Integer(i),
                // e.g. "1E5" or a value wider than i64
                Err(_) => CellValue::Float(parse_float(text)?),
            }
        }
        ValueType::Float => CellValue::Float(parse_float(payload().trim())?),
        ValueType::Boolean => CellValue::Boolean(payload().trim() == "1"),
        ValueType::String => match doc.attribute(cell, "t") {
            Some("s") => {
                let text = payload().trim();
                let index = text.parse::<u32>().map_err(|_| {
                    Error::MalformedXml(format!("invalid shared string index '{}'", text))
                })?;
                CellValue::String(strings.string_at(index)?)
            }
            Some("inlineStr") => CellValue::String(inline_text(doc, cell)),
            _ => CellValue::String(payload().to_string()),
        },
        ValueType::Error => CellValue::Error(payload().to_string()),
    })
}

fn parse_float(text: &str) -> Result<f64> {
    text.parse::<f64>()
        .map_err(|_| Error::MalformedXml(format!("invalid number '{}'", text)))
}

/// Text of an `<is>` payload, rich text runs concatenated
fn inline_text(doc: &XmlDocument, cell: NodeId) -> String {
    let Some(is) = doc.child(cell, "is") else {
        return String::new();
    };
    rich_text(doc, is)
}

/// Text of a string item (`<si>` or `<is>`): either `<t>` or the `<t>` of each `<r>` run
pub fn rich_text(doc: &XmlDocument, item: NodeId) -> String {
    if let Some(t) = doc.child(item, "t") {
        return doc.text(t).unwrap_or_default().to_string();
    }
    doc.children_named(item, "r")
        .filter_map(|run| doc.child(run, "t"))
        .filter_map(|t| doc.text(t))
        .collect()
}

/// Format a finite float so it reads back as the same value
///
/// The text always carries a '.' so the textual classification still sees a
/// float when the file is read again. Debug formatting switches to exponent
/// notation from 1e16 on ("1e16"), which gets a ".0" mantissa.
pub(crate) fn format_float(value: f64) -> String {
    let text = format!("{:?}", value);
    if text.contains('.') {
        return text;
    }
    match text.find('e') {
        Some(pos) => format!("{}.0{}", &text[..pos], &text[pos..]),
        None => format!("{}.0", text),
    }
}

/// Write a value into a cell node
///
/// Non-finite floats are stored as the "#NUM!" error. The formula child, if
/// any, is left in place.
pub(crate) fn write_value(
    doc: &mut XmlDocument,
    cell: NodeId,
    value: &CellValue,
    strings: &SharedStrings,
) {
    match value {
        CellValue::Empty => clear_value(doc, cell),
        CellValue::Boolean(b) => write_payload(doc, cell, Some("b"), if *b { "1" } else { "0" }),
        CellValue::Integer(i) => write_payload(doc, cell, None, &i.to_string()),
        CellValue::Float(f) if !f.is_finite() => write_payload(doc, cell, Some("e"), NUM_ERROR),
        CellValue::Float(f) => write_payload(doc, cell, None, &format_float(*f)),
        CellValue::String(s) => {
            let index = strings.get_or_insert(s);
            write_payload(doc, cell, Some("s"), &index.to_string());
        }
        CellValue::Error(code) => write_payload(doc, cell, Some("e"), code),
    }
}

/// Remove the type marker and the value payload
pub(crate) fn clear_value(doc: &mut XmlDocument, cell: NodeId) {
    doc.remove_attribute(cell, "t");
    doc.remove_child(cell, "v");
    doc.remove_child(cell, "is");
}

fn write_payload(doc: &mut XmlDocument, cell: NodeId, marker: Option<&str>, text: &str) {
    match marker {
        Some(marker) => doc.set_attribute(cell, "t", marker),
        None => {
            doc.remove_attribute(cell, "t");
        }
    }
    doc.remove_child(cell, "is");

    let v = match doc.child(cell, "v") {
        Some(v) => v,
        None => doc.append_child(cell, "v"),
    };
    doc.set_text(v, text);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_from(xml: &str) -> (XmlDocument, NodeId) {
        let doc = XmlDocument::parse(xml.as_bytes()).unwrap();
        let root = doc.root();
        (doc, root)
    }

    #[test]
    fn test_classification() {
        let cases = [
            (r#"<c r="A1"/>"#, ValueType::Empty),
            (r#"<c r="A1"><v>42</v></c>"#, ValueType::Integer),
            (r#"<c r="A1"><v>3.14</v></c>"#, ValueType::Float),
            (r#"<c r="A1"><v>1E-3</v></c>"#, ValueType::Float),
            (r#"<c r="A1"><v>1E5</v></c>"#, ValueType::Integer),
            (r#"<c r="A1" t="n"><v>7</v></c>"#, ValueType::Integer),
            (r#"<c r="A1" t="s"><v>0</v></c>"#, ValueType::String),
            (r#"<c r="A1" t="str"><v>x</v></c>"#, ValueType::String),
            (r#"<c r="A1" t="inlineStr"><is><t>x</t></is></c>"#, ValueType::String),
            (r#"<c r="A1" t="b"><v>1</v></c>"#, ValueType::Boolean),
            (r#"<c r="A1" t="e"><v>#N/A</v></c>"#, ValueType::Error),
            (r#"<c r="A1" t="zz"><v>1</v></c>"#, ValueType::Error),
            (r#"<c r="A1" t="n"/>"#, ValueType::Error),
        ];
        for (xml, expected) in cases {
            let (doc, cell) = cell_from(xml);
            assert_eq!(value_type(&doc, cell), expected, "{xml}");
        }
    }

    #[test]
    fn test_read_values() {
        let strings = SharedStrings::new();
        strings.append("shared");

        let cases = [
            (r#"<c r="A1"><v>42</v></c>"#, CellValue::Integer(42)),
            (r#"<c r="A1"><v>1E5</v></c>"#, CellValue::Float(100000.0)),
            (r#"<c r="A1"><v>-2.5</v></c>"#, CellValue::Float(-2.5)),
            (r#"<c r="A1" t="s"><v>0</v></c>"#, CellValue::from("shared")),
            (r#"<c r="A1" t="str"><v>direct</v></c>"#, CellValue::from("direct")),
            (
                r#"<c r="A1" t="inlineStr"><is><r><t>in</t></r><r><t>line</t></r></is></c>"#,
                CellValue::from("inline"),
            ),
            (r#"<c r="A1" t="b"><v>1</v></c>"#, CellValue::Boolean(true)),
            (r#"<c r="A1" t="b"><v>0</v></c>"#, CellValue::Boolean(false)),
            (r#"<c r="A1" t="e"><v>#N/A</v></c>"#, CellValue::error("#N/A")),
        ];
        for (xml, expected) in cases {
            let (doc, cell) = cell_from(xml);
            assert_eq!(read_value(&doc, cell, &strings).unwrap(), expected, "{xml}");
        }

        let (doc, cell) = cell_from(r#"<c r="A1" t="s"><v>5</v></c>"#);
        assert!(matches!(
            read_value(&doc, cell, &strings),
            Err(Error::SharedStringIndex(5, 1))
        ));
    }

    #[test]
    fn test_write_then_classify() {
        let strings = SharedStrings::new();
        let mut doc = XmlDocument::new("c");
        let cell = doc.root();

        write_value(&mut doc, cell, &CellValue::Integer(10), &strings);
        assert_eq!(doc.attribute(cell, "t"), None);
        assert_eq!(value_type(&doc, cell), ValueType::Integer);

        write_value(&mut doc, cell, &CellValue::Float(2.0), &strings);
        assert_eq!(value_type(&doc, cell), ValueType::Float);
        assert_eq!(read_value(&doc, cell, &strings).unwrap(), CellValue::Float(2.0));

        write_value(&mut doc, cell, &CellValue::Boolean(true), &strings);
        assert_eq!(doc.attribute(cell, "t"), Some("b"));

        write_value(&mut doc, cell, &CellValue::from("text"), &strings);
        assert_eq!(doc.attribute(cell, "t"), Some("s"));
        assert_eq!(strings.index_of("text"), Some(0));

        clear_value(&mut doc, cell);
        assert_eq!(value_type(&doc, cell), ValueType::Empty);
    }

    #[test]
    fn test_large_integral_floats_stay_floats() {
        let strings = SharedStrings::new();
        for value in [1e15, 1e16, 1e17, -3e20, 1e300, 1e-7] {
            let mut doc = XmlDocument::new("c");
            let cell = doc.root();
            write_value(&mut doc, cell, &CellValue::Float(value), &strings);

            assert_eq!(value_type(&doc, cell), ValueType::Float, "{value}");
            assert_eq!(
                read_value(&doc, cell, &strings).unwrap(),
                CellValue::Float(value)
            );
        }
        assert_eq!(format_float(1e16), "1.0e16");
        assert_eq!(format_float(2.5), "2.5");
    }

    #[test]
    fn test_non_finite_floats_become_num_error() {
        let strings = SharedStrings::new();
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut doc = XmlDocument::new("c");
            let cell = doc.root();
            write_value(&mut doc, cell, &CellValue::Float(value), &strings);

            assert_eq!(value_type(&doc, cell), ValueType::Error);
            let read = read_value(&doc, cell, &strings).unwrap();
            assert_eq!(read.as_string(), "#NUM!");
        }
    }

    #[test]
    fn test_setter_drops_inline_payload() {
        let strings = SharedStrings::new();
        let (mut doc, cell) = cell_from(r#"<c r="A1" t="inlineStr"><is><t>x</t></is></c>"#);
        write_value(&mut doc, cell, &CellValue::Integer(1), &strings);
        assert_eq!(doc.child(cell, "is"), None);
        assert_eq!(read_value(&doc, cell, &strings).unwrap(), CellValue::Integer(1));
    }
}
