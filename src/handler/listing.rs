//! Directory listing pages
//!
//! Children starting with `.` and `node_modules` are never shown. Entries come
//! out in whatever order the filesystem returns them.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::io;
use std::path::Path;
use std::time::SystemTime;
use tokio::fs;

use crate::handler::format::{format_size, format_time};
use crate::handler::resolve::ResolvedPath;
use crate::http::mime::{self, ICON_PARENT};

/// Bytes escaped inside one path segment of a link
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'/')
    .add(b';')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

const PAGE_HEAD: &str = r#"<html>
<head>
    <meta charset="utf-8">
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap-icons@1.11.3/font/bootstrap-icons.min.css" crossorigin="anonymous">
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@4.4.1/dist/css/bootstrap.min.css" crossorigin="anonymous">
</head>
<body>
<div class="container">
"#;

const PAGE_TAIL: &str = r"
	</tbody>
</table>

</div></div>

</div>
</body>
</html>";

/// One visible child of a listed directory
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// Whether a child name shows up in listings
pub fn is_listed(name: &str) -> bool {
    !name.starts_with('.') && name != "node_modules"
}

/// Read the visible children of `dir`
///
/// Names that are not valid UTF-8 and children whose metadata cannot be read
/// are skipped. Failing to open or iterate the directory itself is an error.
pub async fn read_entries(dir: &Path) -> io::Result<Vec<DirectoryEntry>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !is_listed(&name) {
            continue;
        }

        // Follows symlinks, so a link to a directory lists as a directory
        let Ok(meta) = fs::metadata(entry.path()).await else {
            continue;
        };

        entries.push(DirectoryEntry {
            name,
            is_dir: meta.is_dir(),
            size: meta.len(),
            modified: meta.modified().ok(),
        });
    }

    Ok(entries)
}

/// Enumerate and render the listing page for a resolved directory
pub async fn build_listing(dir: &ResolvedPath) -> io::Result<String> {
    let entries = read_entries(&dir.fs_path).await?;
    Ok(render_listing(dir, &entries))
}

/// Render the listing page
pub fn render_listing(dir: &ResolvedPath, entries: &[DirectoryEntry]) -> String {
    let base = encoded_base(&dir.segments);
    let mut page = String::with_capacity(2048 + entries.len() * 256);
    page.push_str(PAGE_HEAD);

    page.push_str(&format!(
        r#"
<div class="row pt-3 pb-2"><div class="col-12">
    <h5>Current path: <code>{}</code></h5>
</div></div>

<div class="row"><div class="col-12">

<table class="table">
	<thead>
		<tr>
			<th>Name</th>
			<th style="width: 14em;">Modified</th>
			<th style="width: 5em;">Size</th>
		</tr>
	</thead>
	<tbody>
"#,
        escape_html(&dir.url_path())
    ));

    if !dir.is_root() {
        let parent = encoded_base(&dir.segments[..dir.segments.len() - 1]);
        page.push_str(&format!(
            "\t\t<tr><td>{ICON_PARENT} <a href=\"{parent}\">Up one level</a></td><td>&nbsp;</td><td>&nbsp;</td></tr>\n"
        ));
    }

    for entry in entries {
        write_row(&mut page, &base, entry);
    }

    page.push_str(PAGE_TAIL);
    page
}

fn write_row(page: &mut String, base: &str, entry: &DirectoryEntry) {
    let extension = Path::new(&entry.name).extension().and_then(|e| e.to_str());
    let icon = mime::classify(extension, entry.is_dir).icon;
    let slash = if entry.is_dir { "/" } else { "" };
    let href = format!("{base}{}{slash}", utf8_percent_encode(&entry.name, SEGMENT));

    page.push_str(&format!(
        "\t\t<tr>\n\t\t\t<td>{icon} <a href=\"{href}\">{}</a></td>\n",
        escape_html(&entry.name)
    ));

    if entry.is_dir {
        page.push_str("\t\t\t<td> - </td>\n\t\t\t<td> - </td>\n");
    } else {
        let modified = entry.modified.map(format_time).unwrap_or_default();
        page.push_str(&format!(
            "\t\t\t<td class=\"text-secondary\"><i class=\"bi bi-calendar2-day\"></i> {modified}</td>\n"
        ));
        page.push_str(&format!(
            "\t\t\t<td class=\"text-secondary\">{}</td>\n",
            format_size(entry.size)
        ));
    }

    page.push_str("\t\t</tr>\n");
}

/// Absolute, percent-encoded URL of a directory, ending in `/`
fn encoded_base(segments: &[String]) -> String {
    let mut url = String::from("/");
    for segment in segments {
        url.extend(utf8_percent_encode(segment, SEGMENT));
        url.push('/');
    }
    url
}

fn escape_html(text: &str) -> String {
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
