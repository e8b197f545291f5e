//! Text emitters for the document model.
//!
//! Both modes emit the identical token stream; pretty mode adds depth-tracked
//! indentation and collapses empty containers onto one line. Non-finite
//! floats render as the quoted sentinels `"NaN"`, `"Infinity"` and
//! `"-Infinity"` because the JSON number grammar cannot express them; this is
//! a deliberate, documented extension paired with sentinel decoding.

use crate::value::{JsValue, Number};

/// Rendering mode for [`print`](crate::print).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    Compact,
    /// Two-space indentation with `\n` line endings. Use
    /// [`JsValue::to_pretty_string`] for custom whitespace.
    Pretty,
}

impl JsValue {
    /// Renders the minimal equivalent text.
    pub fn to_compact_string(&self) -> String {
        let mut printer = Printer::compact();
        printer.write_value(self);
        printer.out
    }

    /// Renders with one element per line, indented by `indent` per nesting
    /// level and separated by `newline`.
    pub fn to_pretty_string(&self, indent: &str, newline: &str) -> String {
        let mut printer = Printer::pretty(indent, newline);
        printer.write_value(self);
        printer.out
    }
}

struct Printer<'a> {
    out: String,
    pretty: bool,
    indent: &'a str,
    newline: &'a str,
    depth: usize,
}

impl<'a> Printer<'a> {
    fn compact() -> Self {
        Self {
            out: String::new(),
            pretty: false,
            indent: "",
            newline: "",
            depth: 0,
        }
    }

    fn pretty(indent: &'a str, newline: &'a str) -> Self {
        Self {
            out: String::new(),
            pretty: true,
            indent,
            newline,
            depth: 0,
        }
    }

    fn write_value(&mut self, value: &JsValue) {
        match value {
            JsValue::Null => self.out.push_str("null"),
            JsValue::Bool(true) => self.out.push_str("true"),
            JsValue::Bool(false) => self.out.push_str("false"),
            JsValue::Number(number) => self.write_number(number),
            JsValue::String(text) => self.write_string(text),
            JsValue::Array(items) => self.write_array(items),
            JsValue::Object(object) => self.write_object(object),
        }
    }

    fn write_number(&mut self, number: &Number) {
        if let Number::Float(value) = number {
            if !value.is_finite() {
                let sentinel = if value.is_nan() {
                    "\"NaN\""
                } else if *value > 0.0 {
                    "\"Infinity\""
                } else {
                    "\"-Infinity\""
                };
                self.out.push_str(sentinel);
                return;
            }
        }
        self.out.push_str(&number.to_string());
    }

    fn write_string(&mut self, text: &str) {
        self.out.push('"');
        for c in text.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\u{8}' => self.out.push_str("\\b"),
                '\u{c}' => self.out.push_str("\\f"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                c if c < '\u{20}' => {
                    self.out.push_str(&format!("\\u{:04x}", u32::from(c)));
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }

    fn write_array(&mut self, items: &[JsValue]) {
        if items.is_empty() {
            self.out.push_str("[]");
            return;
        }
        self.out.push('[');
        self.depth += 1;
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                self.out.push(',');
            }
            self.break_line();
            self.write_value(item);
        }
        self.depth -= 1;
        self.break_line();
        self.out.push(']');
    }

    fn write_object(&mut self, object: &crate::value::JsObject) {
        if object.is_empty() {
            self.out.push_str("{}");
            return;
        }
        self.out.push('{');
        self.depth += 1;
        for (index, (key, value)) in object.iter().enumerate() {
            if index > 0 {
                self.out.push(',');
            }
            self.break_line();
            self.write_string(key);
            // Never break before a `:`.
            self.out.push(':');
            if self.pretty {
                self.out.push(' ');
            }
            self.write_value(value);
        }
        self.depth -= 1;
        self.break_line();
        self.out.push('}');
    }

    fn break_line(&mut self) {
        if self.pretty {
            self.out.push_str(self.newline);
            for _ in 0..self.depth {
                self.out.push_str(self.indent);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use test_case::test_case;

    #[test_case("null"; "null literal")]
    #[test_case("true"; "true literal")]
    #[test_case("42"; "integer")]
    #[test_case("-1.5"; "decimal")]
    #[test_case("9223372036854775808"; "big integer")]
    #[test_case(r#""hi""#; "string")]
    #[test_case("[]"; "empty array")]
    #[test_case("{}"; "empty object")]
    #[test_case(r#"[1,[2,[]],{"a":null}]"#; "nested array")]
    #[test_case(r#"{"a":1,"b":[true,false]}"#; "nested object")]
    fn compact_print_is_minimal(input: &str) {
        let value = parse(input).expect("valid JSON");
        assert_eq!(value.to_compact_string(), input);
    }

    #[test]
    fn pretty_print_layout() {
        let value = parse(r#"{"a":[1,2],"b":{},"c":{"d":null}}"#).expect("valid JSON");
        let expected = "{\n  \"a\": [\n    1,\n    2\n  ],\n  \"b\": {},\n  \"c\": {\n    \"d\": null\n  }\n}";
        assert_eq!(value.to_pretty_string("  ", "\n"), expected);
    }

    #[test]
    fn string_escaping() {
        let value = JsValue::from("a\"b\\c\nd\u{1}e");
        assert_eq!(value.to_compact_string(), r#""a\"b\\c\nd\u0001e""#);
    }

    #[test_case(f64::NAN, "\"NaN\"")]
    #[test_case(f64::INFINITY, "\"Infinity\"")]
    #[test_case(f64::NEG_INFINITY, "\"-Infinity\"")]
    fn non_finite_sentinels(value: f64, expected: &str) {
        assert_eq!(
            JsValue::Number(Number::Float(value)).to_compact_string(),
            expected
        );
    }

    #[test_case("[1,2,3]")]
    #[test_case(r#"{"a":{"b":[1.50,2e8,"x"]},"c":[[],{}]}"#)]
    #[test_case("0.001")]
    fn parser_idempotence(input: &str) {
        let first = parse(input).expect("valid JSON");
        for text in [
            first.to_compact_string(),
            first.to_pretty_string("    ", "\n"),
        ] {
            assert_eq!(parse(&text).expect("printed JSON reparses"), first);
        }
    }
}
