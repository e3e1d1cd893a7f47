/**
  Escapes text for use inside HTML element content and quoted attributes
 */
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }

    escaped
}

/**
  Formats a float the way it is shown to users, always with a fractional part
  so that `12` reads as `12.0`
 */
pub fn format_decimal(value: f64) -> String {
    format!("{:?}", value)
}


#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn escape_tests() {
        assert_eq!(escape_html("Neem"), "Neem");
        assert_eq!(
            escape_html("<b>\"Oak\" & 'Ash'</b>"),
            "&lt;b&gt;&quot;Oak&quot; &amp; &#39;Ash&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn decimal_tests() {
        assert_eq!(format_decimal(12.0), "12.0");
        assert_eq!(format_decimal(3.5), "3.5");
        assert_eq!(format_decimal(-0.25), "-0.25");
    }
}
