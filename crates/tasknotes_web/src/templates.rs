//! Embedded page templates.
//!
//! Templates ship inside the binary; `build_templates` compiles them once at
//! startup so a broken template fails the boot instead of a request.

use chrono::DateTime;
use std::collections::HashMap;
use tera::{Tera, Value};

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("macros.html", include_str!("../templates/macros.html")),
    (
        "security/login.html",
        include_str!("../templates/security/login.html"),
    ),
    (
        "security/register.html",
        include_str!("../templates/security/register.html"),
    ),
    (
        "security/account.html",
        include_str!("../templates/security/account.html"),
    ),
    ("user/index.html", include_str!("../templates/user/index.html")),
    ("user/show.html", include_str!("../templates/user/show.html")),
    ("user/form.html", include_str!("../templates/user/form.html")),
    (
        "user/password.html",
        include_str!("../templates/user/password.html"),
    ),
    ("user/delete.html", include_str!("../templates/user/delete.html")),
    ("entry/index.html", include_str!("../templates/entry/index.html")),
    ("entry/show.html", include_str!("../templates/entry/show.html")),
    ("entry/form.html", include_str!("../templates/entry/form.html")),
    ("entry/delete.html", include_str!("../templates/entry/delete.html")),
    (
        "taxonomy/index.html",
        include_str!("../templates/taxonomy/index.html"),
    ),
    (
        "taxonomy/show.html",
        include_str!("../templates/taxonomy/show.html"),
    ),
    (
        "taxonomy/form.html",
        include_str!("../templates/taxonomy/form.html"),
    ),
    (
        "taxonomy/delete.html",
        include_str!("../templates/taxonomy/delete.html"),
    ),
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Compiles every embedded template and registers the custom filters.
pub fn build_templates() -> tera::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES.iter().copied())?;
    tera.register_filter("timestamp", timestamp_filter);
    Ok(tera)
}

/// `{{ value | timestamp }}`: epoch milliseconds as `YYYY-MM-DD HH:MM` (UTC).
fn timestamp_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let millis = value
        .as_i64()
        .ok_or_else(|| tera::Error::msg("timestamp filter expects epoch milliseconds"))?;
    let formatted = DateTime::from_timestamp_millis(millis)
        .map(|moment| moment.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default();
    Ok(Value::String(formatted))
}

#[cfg(test)]
mod tests {
    use super::{build_templates, timestamp_filter};
    use std::collections::HashMap;
    use tera::Value;

    #[test]
    fn embedded_templates_compile() {
        let tera = build_templates().expect("embedded templates should compile");
        assert!(tera.get_template_names().any(|name| name == "entry/index.html"));
    }

    #[test]
    fn timestamp_filter_formats_epoch_millis() {
        let formatted = timestamp_filter(&Value::from(86_400_000_i64), &HashMap::new())
            .expect("number should format");
        assert_eq!(formatted, Value::String("1970-01-02 00:00".to_string()));
        assert!(timestamp_filter(&Value::from("soon"), &HashMap::new()).is_err());
    }
}
