//! Optional `index.html` that loads every entry.

/// Manifest key and file name of the page.
pub const PAGE_NAME: &str = "index.html";

/// Render a page linking `stylesheets` and loading `scripts` in order.
pub fn render_page(stylesheets: &[String], scripts: &[String]) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
    );
    for href in stylesheets {
        out.push_str(&format!(
            "<link rel=\"stylesheet\" href=\"{}\">\n",
            escape_attr(href)
        ));
    }
    out.push_str("</head>\n<body>\n");
    for src in scripts {
        out.push_str(&format!("<script src=\"{}\"></script>\n", escape_attr(src)));
    }
    out.push_str("</body>\n</html>\n");
    out
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}
