//! HTML documentation page served at `GET /`.
//!
//! Generated from the route table, so the page always lists exactly the
//! routes the router serves.

use super::routes::{Route, Target};

/// Render the documentation page for a set of routes.
pub fn render_index(routes: &[Route]) -> String {
    let rows: String = routes.iter().map(render_row).collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>MangaDex API Facade</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, sans-serif; margin: 2rem; color: #222; }}
        table {{ border-collapse: collapse; }}
        th, td {{ text-align: left; padding: 0.4rem 0.8rem; border-bottom: 1px solid #ddd; }}
        code {{ font-family: ui-monospace, monospace; }}
    </style>
</head>
<body>
    <h1>MangaDex API Facade</h1>
    <p>Read-only JSON endpoints. Query parameters are forwarded unchanged.
    Failures return <code>500</code> with <code>{{"error": "..."}}</code>.</p>
    <table>
        <thead>
            <tr><th>Method</th><th>Path</th><th>Operation</th><th>Description</th></tr>
        </thead>
        <tbody>
{rows}        </tbody>
    </table>
</body>
</html>
"#
    )
}

fn render_row(route: &Route) -> String {
    let operation = match route.target {
        Target::Gateway(operation) => operation.name(),
        Target::Health | Target::RateLimits | Target::Docs => "-",
    };

    format!(
        "            <tr><td>{}</td><td><code>{}</code></td><td>{}</td><td>{}</td></tr>\n",
        route.method,
        escape_html(route.path),
        escape_html(operation),
        escape_html(route.description),
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
