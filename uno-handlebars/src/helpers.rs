//! Built-in helpers available to every template
//!
//! - comparison and logic: `eq`, `ne`, `and`, `or`, `not`
//! - strings: `upper`, `lower`
//! - collections: `len`, `join`
//! - `json`, for embedding a value as JSON text

use handlebars::{handlebars_helper, Handlebars};
use serde_json::Value;

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

handlebars_helper!(eq: |a: Json, b: Json| a == b);
handlebars_helper!(ne: |a: Json, b: Json| a != b);
handlebars_helper!(and: |a: Json, b: Json| truthy(a) && truthy(b));
handlebars_helper!(or: |a: Json, b: Json| truthy(a) || truthy(b));
handlebars_helper!(not: |a: Json| !truthy(a));
handlebars_helper!(upper: |s: str| s.to_uppercase());
handlebars_helper!(lower: |s: str| s.to_lowercase());
handlebars_helper!(len: |v: Json| match v {
    Value::Array(a) => a.len(),
    Value::Object(o) => o.len(),
    Value::String(s) => s.chars().count(),
    _ => 0,
});
handlebars_helper!(join: |items: array, sep: str| {
    items.iter().map(plain).collect::<Vec<_>>().join(sep)
});
handlebars_helper!(json: |v: Json| serde_json::to_string(v).unwrap_or_default());

/// Register all built-in helpers on `registry`.
pub fn register_builtin_helpers(registry: &mut Handlebars<'static>) {
    registry.register_helper("eq", Box::new(eq));
    registry.register_helper("ne", Box::new(ne));
    registry.register_helper("and", Box::new(and));
    registry.register_helper("or", Box::new(or));
    registry.register_helper("not", Box::new(not));
    registry.register_helper("upper", Box::new(upper));
    registry.register_helper("lower", Box::new(lower));
    registry.register_helper("len", Box::new(len));
    registry.register_helper("join", Box::new(join));
    registry.register_helper("json", Box::new(json));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> Handlebars<'static> {
        let mut hb = Handlebars::new();
        hb.register_escape_fn(handlebars::no_escape);
        register_builtin_helpers(&mut hb);
        hb
    }

    #[test]
    fn test_truthiness() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!([])));
        assert!(truthy(&json!("x")));
        assert!(truthy(&json!(1.5)));
    }

    #[test]
    fn test_conditionals() {
        let hb = registry();
        let out = hb
            .render_template(
                "{{#if (eq status \"open\")}}A{{/if}}{{#if (not closed)}}B{{/if}}{{#if (and 1 \"\")}}C{{/if}}",
                &json!({"status": "open", "closed": false}),
            )
            .unwrap();
        assert_eq!(out, "AB");
    }

    #[test]
    fn test_join_and_len() {
        let hb = registry();
        let out = hb
            .render_template(
                "IN ({{join marks \",\"}}) /* {{len marks}} */",
                &json!({"marks": ["?", "?", "?"]}),
            )
            .unwrap();
        assert_eq!(out, "IN (?,?,?) /* 3 */");
    }

    #[test]
    fn test_case_helpers() {
        let hb = registry();
        let out = hb
            .render_template("{{upper dir}} {{lower col}}", &json!({"dir": "asc", "col": "NAME"}))
            .unwrap();
        assert_eq!(out, "ASC name");
    }
}
