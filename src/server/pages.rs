//! server::pages
//!
//! Minimal server-rendered HTML.

use std::fmt::Write as _;

use crate::core::types::{EditorType, Filename};

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, login: Option<&str>, body: &str) -> String {
    let nav = match login {
        Some(login) => format!(
            "<a href=\"/\">Home</a> | {} | <a href=\"/logout\">Log out</a>",
            escape_html(login)
        ),
        None => "<a href=\"/login\">Log in with GitHub</a>".to_string(),
    };
    format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
<meta charset=\"utf-8\">
<title>{title}</title>
<link rel=\"stylesheet\" href=\"/editor.css\">
</head>
<body>
<nav>{nav}</nav>
<main>
{body}
</main>
<script src=\"/editor.js\"></script>
</body>
</html>
",
        title = escape_html(title),
    )
}

pub fn logged_out() -> String {
    layout(
        "Logged out",
        None,
        "<h1>You are not logged in</h1>\n<p><a href=\"/login\">Log in with GitHub</a> to edit configurations.</p>",
    )
}

/// One file shown on the index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub filename: String,
    pub title: Option<String>,
}

fn file_list(editor_type: EditorType, entries: &[IndexEntry]) -> String {
    if entries.is_empty() {
        return "<p>No files found.</p>".to_string();
    }
    let mut html = String::from("<ul>\n");
    for entry in entries {
        let _ = write!(
            html,
            "<li><a href=\"/edit/{kind}/{file}\">{file}</a>",
            kind = editor_type,
            file = escape_html(&entry.filename),
        );
        if let Some(title) = &entry.title {
            let _ = write!(html, " - {}", escape_html(title));
        }
        html.push_str("</li>\n");
    }
    html.push_str("</ul>");
    html
}

pub fn index(login: &str, purl: &[IndexEntry], registry: &[IndexEntry]) -> String {
    let body = format!(
        "<h1>Configurations</h1>
<p><a href=\"/prepare_new\">New PURL configuration</a> | <a href=\"/foundry_reg\">New registry entry</a></p>
<h2>PURL configurations</h2>
{}
<h2>Registry entries</h2>
{}",
        file_list(EditorType::Purl, purl),
        file_list(EditorType::Registry, registry),
    );
    layout("Configurations", Some(login), &body)
}

/// What the editor page is seeded with.
#[derive(Debug, Clone)]
pub struct EditorView<'a> {
    pub login: &'a str,
    pub editor_type: EditorType,
    pub filename: &'a Filename,
    pub content: &'a str,
    pub existing: bool,
    pub commit_message: &'a str,
    pub description: &'a str,
}

pub fn editor(view: &EditorView<'_>) -> String {
    let submit_url = if view.existing {
        "/update_config"
    } else {
        "/add_config"
    };
    let heading = if view.existing { "Editing" } else { "Adding" };
    let filename = escape_html(view.filename.as_str());
    let body = format!(
        "<h1>{heading} {filename}</h1>
<form id=\"editor\" method=\"post\" action=\"{submit_url}\" data-submit-url=\"{submit_url}\" data-validate-url=\"/validate\">
<input type=\"hidden\" name=\"filename\" value=\"{filename}\">
<input type=\"hidden\" name=\"editor_type\" value=\"{editor_type}\">
<textarea name=\"code\" rows=\"30\" cols=\"100\">{content}</textarea>
<p><label>Commit message <input type=\"text\" name=\"commit_msg\" value=\"{commit}\"></label></p>
<p><label>Description<br><textarea name=\"long_msg\" rows=\"4\" cols=\"100\">{description}</textarea></label></p>
<p><label><input type=\"checkbox\" name=\"draft\" value=\"true\"> Open as draft</label></p>
<p><button type=\"button\" id=\"validate\">Validate</button> <button type=\"submit\">Submit</button></p>
</form>",
        editor_type = view.editor_type,
        content = escape_html(view.content),
        commit = escape_html(view.commit_message),
        description = escape_html(view.description),
    );
    layout(&format!("{} {}", heading, view.filename), Some(view.login), &body)
}

pub fn prepare_new(login: &str) -> String {
    let body = "<h1>New configuration</h1>
<form method=\"post\" action=\"/edit_new\">
<p><label>Idspace <input type=\"text\" name=\"idspace\" required></label></p>
<p><label>Type <select name=\"editor_type\">
<option value=\"purl\">PURL configuration</option>
<option value=\"registry\">Registry entry</option>
</select></label></p>
<p><label>Related issue number <input type=\"number\" name=\"issue_number\"></label></p>
<p><label>Related pull request or issue link <input type=\"url\" name=\"add_issue_link\"></label></p>
<p><button type=\"submit\">Continue</button></p>
</form>";
    layout("New configuration", Some(login), body)
}

pub fn foundry_reg(login: &str, error: Option<&str>) -> String {
    let mut body = String::from("<h1>Register a new ontology</h1>\n");
    if let Some(error) = error {
        let _ = writeln!(body, "<p class=\"error\">{}</p>", escape_html(error));
    }
    body.push_str("<form method=\"post\" action=\"/foundry_reg\">\n");
    for (name, label) in [
        ("id", "Ontology id"),
        ("title", "Title"),
        ("description", "Description"),
        ("homepage", "Homepage"),
        ("license", "License"),
        ("contact", "Contact email"),
        ("repository", "Repository"),
        ("tracker", "Issue tracker"),
        ("domain", "Domain"),
    ] {
        let _ = writeln!(
            body,
            "<p><label>{label} <input type=\"text\" name=\"{name}\"></label></p>"
        );
    }
    body.push_str("<p><button type=\"submit\">Continue</button></p>\n</form>");
    layout("Register a new ontology", Some(login), &body)
}
