//! Small helpers shared by the page handlers.
//!
//! Templates are plain HTML files compiled into the binary with
//! `include_str!`; `{{ name }}` placeholders are substituted with
//! HTML-escaped values.

/// Fill `{{ key }}` placeholders in `template`, escaping every value.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |page, (key, value)| {
        page.replace(&format!("{{{{ {key} }}}}"), &escape_html(value))
    })
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Keep `next` only when it points back into this site.
///
/// Browsers drop tabs and newlines inside URLs, so any control character
/// disqualifies the path.
pub fn local_redirect(next: Option<&str>) -> &str {
    match next {
        Some(path) if is_local_path(path) => path,
        _ => "/",
    }
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_and_escapes() {
        let page = render("<p>{{ email }}</p>{{ email }}", &[("email", "<a&b>")]);
        assert_eq!(page, "<p>&lt;a&amp;b&gt;</p>&lt;a&amp;b&gt;");
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        assert_eq!(render("{{ other }}", &[("email", "x")]), "{{ other }}");
    }

    #[test]
    fn only_local_redirects() {
        assert_eq!(local_redirect(Some("/dashboard")), "/dashboard");
        assert_eq!(local_redirect(Some("//evil.example")), "/");
        assert_eq!(local_redirect(Some("https://evil.example")), "/");
        assert_eq!(local_redirect(Some("/\\evil.example")), "/");
        assert_eq!(local_redirect(Some("/\t/evil.example")), "/");
        assert_eq!(local_redirect(Some("/\r\n/evil.example")), "/");
        assert_eq!(local_redirect(Some("/admin/\u{7f}")), "/");
        assert_eq!(local_redirect(Some("/admin/user?page=2")), "/admin/user?page=2");
        assert_eq!(local_redirect(None), "/");
    }
}
