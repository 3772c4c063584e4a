//! Structured GraphQL document builder.
//!
//! Argument values are always rendered as GraphQL literals with string escaping,
//! so caller-supplied text (board titles, tokens, evidence paths, field values)
//! can never terminate a string early or inject selections.

use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Object(Vec<(String, Value)>),
    List(Vec<Value>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    fn render(&self, out: &mut String) {
        match self {
            Value::Str(s) => push_string_literal(out, s),
            Value::Object(entries) => {
                out.push('{');
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(k);
                    out.push(':');
                    v.render(out);
                }
                out.push('}');
            }
            Value::List(items) => {
                out.push('[');
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    v.render(out);
                }
                out.push(']');
            }
        }
    }
}

/// A field in a selection set, with optional alias, arguments and sub-selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    alias: Option<String>,
    args: Vec<(String, Value)>,
    selection: Vec<Field>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            args: Vec::new(),
            selection: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.push((name.into(), value));
        self
    }

    pub fn select(mut self, field: Field) -> Self {
        self.selection.push(field);
        self
    }

    pub fn select_all<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection.extend(names.into_iter().map(Field::new));
        self
    }

    fn render(&self, out: &mut String) {
        if let Some(alias) = &self.alias {
            out.push_str(alias);
            out.push(':');
        }
        out.push_str(&self.name);
        if !self.args.is_empty() {
            out.push('(');
            for (i, (k, v)) in self.args.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(k);
                out.push(':');
                v.render(out);
            }
            out.push(')');
        }
        render_selection(&self.selection, out);
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    kind: OperationKind,
    fields: Vec<Field>,
}

impl Operation {
    pub fn query(root: Field) -> Self {
        Self {
            kind: OperationKind::Query,
            fields: vec![root],
        }
    }

    pub fn mutation(root: Field) -> Self {
        Self {
            kind: OperationKind::Mutation,
            fields: vec![root],
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(match self.kind {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
        });
        render_selection(&self.fields, &mut out);
        out
    }
}

fn render_selection(fields: &[Field], out: &mut String) {
    if fields.is_empty() {
        return;
    }
    out.push('{');
    for (i, f) in fields.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        f.render(out);
    }
    out.push('}');
}

fn push_string_literal(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_selection_with_aliases() {
        let doc = Operation::query(
            Field::new("board")
                .arg("title", Value::str("Evidence"))
                .select(
                    Field::new("customFields")
                        .select(Field::new("_id").alias("id"))
                        .select(Field::new("name")),
                ),
        )
        .render();
        assert_eq!(
            doc,
            r#"query{board(title:"Evidence"){customFields{id:_id name}}}"#
        );
    }

    #[test]
    fn renders_objects_and_lists() {
        let doc = Operation::mutation(Field::new("updateCard").arg(
            "card",
            Value::object([
                ("_id", Value::str("c1")),
                (
                    "customFields",
                    Value::List(vec![
                        Value::object([("_id", Value::str("f1")), ("value", Value::str("done"))]),
                        Value::object([("_id", Value::str("f2")), ("value", Value::str(""))]),
                    ]),
                ),
            ]),
        ))
        .render();
        assert_eq!(
            doc,
            r#"mutation{updateCard(card:{_id:"c1",customFields:[{_id:"f1",value:"done"},{_id:"f2",value:""}]})}"#
        );
    }

    #[test]
    fn escapes_quotes_backslashes_and_control_characters() {
        let doc = Operation::query(
            Field::new("board").arg("title", Value::str("a\"b\\c\nd\u{1}")),
        )
        .render();
        assert_eq!(doc, r#"query{board(title:"a\"b\\c\nd\u0001")}"#);
    }

    #[test]
    fn injected_selection_stays_inside_the_literal() {
        let hostile = r#"x"){ __schema { types { name } } }#"#;
        let doc = Operation::query(Field::new("board").arg("title", Value::str(hostile))).render();
        assert!(doc.starts_with(r#"query{board(title:"x\"){"#));
        assert!(doc.ends_with(r#"#")}"#));
    }
}
