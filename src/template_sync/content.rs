use std::path::{Path, PathBuf};

use minify_html::Cfg;
use once_cell::sync::Lazy;
use thiserror::Error;

use super::template::TemplateSpec;

// Whitespace collapsing is always on in minify-html. Everything that could
// change how a mail client or SES renders the template is kept.
static MINIFY_CFG: Lazy<Cfg> = Lazy::new(|| Cfg {
    minify_css: true,
    minify_js: true,
    keep_comments: true,
    keep_closing_tags: true,
    keep_html_and_head_opening_tags: true,
    do_not_minify_doctype: true,
    ensure_spec_compliant_unquoted_attribute_values: true,
    keep_spaces_between_attributes: true,
    preserve_brace_template_syntax: true,
    ..Cfg::default()
});

#[derive(Debug, Error)]
#[error("unable to read {path}: {source}", path = .path.display())]
pub struct FileError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

/// Paths of the files a template is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFiles {
    pub subject: PathBuf,
    pub html_body: PathBuf,
    pub raw_body: PathBuf,
}

impl TemplateFiles {
    /// Reads the three parts verbatim and minifies the html body.
    #[tracing::instrument(level = "debug")]
    pub async fn load(&self, template_name: &str) -> Result<TemplateSpec, FileError> {
        let subject_part = read_file(&self.subject).await?;
        let text_part = read_file(&self.raw_body).await?;
        let html = read_file(&self.html_body).await?;
        let html_part = minify_html(&html);
        tracing::debug!(
            message = "minified html body",
            original_len = html.len(),
            minified_len = html_part.len()
        );

        Ok(TemplateSpec::new(
            template_name,
            subject_part,
            text_part,
            html_part,
        ))
    }
}

async fn read_file(path: &Path) -> Result<String, FileError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FileError {
            path: path.to_path_buf(),
            source,
        })
}

/// Minifies `html`, keeping quotes around attribute values that hold SES
/// replacement tags.
pub fn minify_html(html: &str) -> String {
    let minified = minify_html::minify(html.as_bytes(), &MINIFY_CFG);
    quote_template_attributes(&String::from_utf8_lossy(&minified))
}

// minify-html drops quotes from `href="{{link}}"` since the value is valid
// unquoted before SES fills it in. Substituted values may contain spaces, so
// every unquoted value holding `{{` gets its quotes back.
fn quote_template_attributes(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(offset) = html[pos..].find('<') {
        let start = pos + offset;
        out.push_str(&html[pos..start]);
        let rest = &html[start..];

        if rest.starts_with("<!--") {
            let end = rest.find("-->").map_or(html.len(), |i| start + i + 3);
            out.push_str(&html[start..end]);
            pos = end;
            continue;
        }
        if !rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            out.push('<');
            pos = start + 1;
            continue;
        }

        let end = quote_tag_attributes(html, start, &mut out);
        pos = end;

        // Raw text of script and style is copied as is.
        let tag_name = rest[1..]
            .split(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if tag_name == "script" || tag_name == "style" {
            let close = format!("</{}", tag_name);
            let end = html[pos..]
                .to_ascii_lowercase()
                .find(&close)
                .map_or(html.len(), |i| pos + i);
            out.push_str(&html[pos..end]);
            pos = end;
        }
    }
    out.push_str(&html[pos..]);
    out
}

/// Copies the start tag beginning at `start` into `out` and returns the index
/// just past it.
fn quote_tag_attributes(html: &str, start: usize, out: &mut String) -> usize {
    let bytes = html.as_bytes();
    let len = html.len();
    let mut i = start;
    while i < len && bytes[i] != b'>' {
        match bytes[i] {
            quote @ b'"' | quote @ b'\'' => {
                let end = html[i + 1..]
                    .find(quote as char)
                    .map_or(len, |j| i + 1 + j + 1);
                out.push_str(&html[i..end]);
                i = end;
            }
            b'=' => {
                out.push('=');
                i += 1;
                if i < len && bytes[i] != b'"' && bytes[i] != b'\'' {
                    let end = html[i..]
                        .find(|c: char| c.is_ascii_whitespace() || c == '>')
                        .map_or(len, |j| i + j);
                    let value = &html[i..end];
                    if value.contains("{{") {
                        let quote = if value.contains('"') { '\'' } else { '"' };
                        out.push(quote);
                        out.push_str(value);
                        out.push(quote);
                    } else {
                        out.push_str(value);
                    }
                    i = end;
                }
            }
            _ => {
                let ch = html[i..].chars().next().unwrap_or_default();
                out.push(ch);
                i += ch.len_utf8();
            }
        }
    }
    if i < len {
        out.push('>');
        i += 1;
    }
    i
}
