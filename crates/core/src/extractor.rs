use crate::error::IngestError;
use crate::models::ExtractedDocument;
use serde_json::Value;
use std::fs;
use std::path::Path;

type ExtractFn = fn(&Path) -> Result<ExtractedDocument, IngestError>;

/// Extension (lowercase, no dot) to extractor.
const EXTRACTORS: &[(&str, ExtractFn)] = &[
    ("pdf", extract_pdf),
    ("md", extract_markdown),
    ("markdown", extract_markdown),
    ("txt", extract_plain_text),
    ("rst", extract_plain_text),
    ("html", extract_html),
    ("htm", extract_html),
    ("epub", extract_epub),
    ("docx", extract_docx),
    ("ipynb", extract_notebook),
    ("py", extract_code),
    ("js", extract_code),
    ("ts", extract_code),
    ("go", extract_code),
    ("rs", extract_code),
    ("java", extract_code),
    ("c", extract_code),
    ("cpp", extract_code),
    ("h", extract_code),
    ("hpp", extract_code),
    ("rb", extract_code),
    ("sh", extract_code),
    ("bash", extract_code),
    ("sql", extract_code),
    ("yaml", extract_code),
    ("yml", extract_code),
];

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn extractor_for(path: &Path) -> Option<ExtractFn> {
    let ext = extension_of(path)?;
    EXTRACTORS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, extractor)| *extractor)
}

pub fn is_supported(path: &Path) -> bool {
    extractor_for(path).is_some()
}

pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
    EXTRACTORS.iter().map(|(ext, _)| *ext)
}

/// Routes `path` to the extractor registered for its extension.
pub fn extract(path: &Path) -> Result<ExtractedDocument, IngestError> {
    match extractor_for(path) {
        Some(extractor) => extractor(path),
        None => Err(IngestError::UnsupportedFormat(
            extension_of(path)
                .map(|ext| format!(".{ext}"))
                .unwrap_or_else(|| path.display().to_string()),
        )),
    }
}

/// UTF-8 decode that drops invalid sequences instead of failing.
pub fn decode_lossy(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(error) => String::from_utf8_lossy(error.as_bytes()).replace('\u{FFFD}', ""),
    }
}

fn read_text(path: &Path) -> Result<String, IngestError> {
    Ok(decode_lossy(fs::read(path)?))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn extract_markdown(path: &Path) -> Result<ExtractedDocument, IngestError> {
    Ok(ExtractedDocument::new(read_text(path)?, "markdown"))
}

fn extract_plain_text(path: &Path) -> Result<ExtractedDocument, IngestError> {
    Ok(ExtractedDocument::new(read_text(path)?, "text"))
}

pub fn language_for_extension(ext: &str) -> &'static str {
    match ext {
        "py" => "python",
        "js" => "javascript",
        "ts" => "typescript",
        "go" => "go",
        "rs" => "rust",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "hpp" => "cpp",
        "rb" => "ruby",
        "sh" | "bash" => "bash",
        "zsh" => "zsh",
        "sql" => "sql",
        "yaml" | "yml" => "yaml",
        "json" => "json",
        "toml" => "toml",
        _ => "text",
    }
}

fn extract_code(path: &Path) -> Result<ExtractedDocument, IngestError> {
    let language = extension_of(path)
        .map(|ext| language_for_extension(&ext))
        .unwrap_or("text");
    Ok(ExtractedDocument::new(read_text(path)?, "code").with("language", language))
}

fn extract_notebook(path: &Path) -> Result<ExtractedDocument, IngestError> {
    let notebook: Value = serde_json::from_slice(&fs::read(path)?)?;
    Ok(notebook_to_document(&notebook))
}

fn cell_source(cell: &Value) -> String {
    match cell.get("source") {
        Some(Value::String(source)) => source.clone(),
        Some(Value::Array(lines)) => lines.iter().filter_map(Value::as_str).collect(),
        _ => String::new(),
    }
}

pub fn notebook_to_document(notebook: &Value) -> ExtractedDocument {
    let language = notebook
        .pointer("/metadata/language_info/name")
        .or_else(|| notebook.pointer("/metadata/kernelspec/language"))
        .and_then(Value::as_str)
        .unwrap_or("python");

    let mut cells = Vec::new();
    let mut code_cells = 0usize;
    let mut markdown_cells = 0usize;

    let listed = notebook
        .get("cells")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for cell in listed {
        let source = cell_source(cell);
        match cell.get("cell_type").and_then(Value::as_str) {
            Some("markdown") => {
                cells.push(source);
                markdown_cells += 1;
            }
            Some("code") => {
                cells.push(format!("```{language}\n{source}\n```"));
                code_cells += 1;
            }
            _ => {}
        }
    }

    ExtractedDocument::new(cells.join("\n\n"), "jupyter")
        .with("code_cells", code_cells)
        .with("markdown_cells", markdown_cells)
}

#[cfg(feature = "pdf")]
fn extract_pdf(path: &Path) -> Result<ExtractedDocument, IngestError> {
    let document =
        lopdf::Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

    let mut pages = Vec::new();
    for (page_no, _page_id) in document.get_pages() {
        let text = document
            .extract_text(&[page_no])
            .map_err(|error| IngestError::PdfParse(error.to_string()))?;

        let text = text.trim();
        if !text.is_empty() {
            pages.push(text.to_string());
        }
    }

    Ok(ExtractedDocument::new(pages.join("\n\n"), "pdf").with("total_pages", pages.len()))
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_path: &Path) -> Result<ExtractedDocument, IngestError> {
    Err(IngestError::MissingDependency {
        format: "pdf".to_string(),
        feature: "pdf",
    })
}

#[cfg(feature = "html")]
fn extract_html(path: &Path) -> Result<ExtractedDocument, IngestError> {
    Ok(html::html_to_document(&read_text(path)?, &file_stem(path)))
}

#[cfg(not(feature = "html"))]
fn extract_html(_path: &Path) -> Result<ExtractedDocument, IngestError> {
    Err(IngestError::MissingDependency {
        format: "html".to_string(),
        feature: "html",
    })
}

#[cfg(feature = "office")]
fn extract_epub(path: &Path) -> Result<ExtractedDocument, IngestError> {
    office::epub_to_document(&fs::read(path)?, &file_stem(path))
}

#[cfg(not(feature = "office"))]
fn extract_epub(_path: &Path) -> Result<ExtractedDocument, IngestError> {
    Err(IngestError::MissingDependency {
        format: "epub".to_string(),
        feature: "office",
    })
}

#[cfg(feature = "office")]
fn extract_docx(path: &Path) -> Result<ExtractedDocument, IngestError> {
    office::docx_to_document(&fs::read(path)?)
}

#[cfg(not(feature = "office"))]
fn extract_docx(_path: &Path) -> Result<ExtractedDocument, IngestError> {
    Err(IngestError::MissingDependency {
        format: "docx".to_string(),
        feature: "office",
    })
}

#[cfg(feature = "html")]
pub mod html {
    use crate::models::ExtractedDocument;
    use scraper::{ElementRef, Html, Selector};

    const HIDDEN_TAGS: [&str; 5] = ["script", "style", "nav", "footer", "aside"];

    fn first_match<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
        let selector = Selector::parse(selector).ok()?;
        document.select(&selector).next()
    }

    fn collect_visible_text(element: ElementRef<'_>, lines: &mut Vec<String>) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    lines.push(trimmed.to_string());
                }
            } else if let Some(child_element) = ElementRef::wrap(child) {
                if !HIDDEN_TAGS.contains(&child_element.value().name()) {
                    collect_visible_text(child_element, lines);
                }
            }
        }
    }

    /// Stripped text nodes under `element`, one per line, skipping hidden tags.
    pub fn visible_text(element: ElementRef<'_>) -> String {
        let mut lines = Vec::new();
        collect_visible_text(element, &mut lines);
        lines.join("\n")
    }

    /// Visible text of the `body` (or whole document) of an XHTML/HTML page.
    pub fn body_text(markup: &str) -> String {
        let document = Html::parse_document(markup);
        match first_match(&document, "body") {
            Some(body) => visible_text(body),
            None => visible_text(document.root_element()),
        }
    }

    pub fn html_to_document(markup: &str, fallback_title: &str) -> ExtractedDocument {
        let document = Html::parse_document(markup);

        let title = first_match(&document, "title")
            .map(|title| title.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| fallback_title.to_string());

        let text = ["main", "article", "body"]
            .iter()
            .find_map(|selector| first_match(&document, selector))
            .map(visible_text)
            .unwrap_or_default();

        ExtractedDocument::new(text, "html").with("title", title)
    }
}

#[cfg(feature = "office")]
pub mod office {
    use super::html;
    use crate::error::IngestError;
    use crate::models::{ExtractedDocument, MetadataValue};
    use percent_encoding::percent_decode_str;
    use quick_xml::events::Event;
    use quick_xml::Reader;
    use std::collections::HashMap;
    use std::io::{Cursor, Read};
    use tracing::warn;
    use url::Url;

    /// Maximum decompressed bytes read from a single archive entry.
    const MAX_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

    type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

    fn failure(format: &str, details: impl ToString) -> IngestError {
        IngestError::Extraction {
            format: format.to_string(),
            details: details.to_string(),
        }
    }

    fn open_archive<'a>(bytes: &'a [u8], format: &str) -> Result<Archive<'a>, IngestError> {
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|error| failure(format, error))
    }

    fn read_entry(archive: &mut Archive<'_>, name: &str, format: &str) -> Result<Vec<u8>, IngestError> {
        let entry = archive.by_name(name).map_err(|error| failure(format, error))?;
        let mut out = Vec::new();
        entry
            .take(MAX_ENTRY_BYTES)
            .read_to_end(&mut out)
            .map_err(|error| failure(format, error))?;
        if out.len() as u64 >= MAX_ENTRY_BYTES {
            return Err(failure(
                format,
                format!("archive entry {name} exceeds {MAX_ENTRY_BYTES} bytes"),
            ));
        }
        Ok(out)
    }

    pub fn docx_to_document(bytes: &[u8]) -> Result<ExtractedDocument, IngestError> {
        let mut archive = open_archive(bytes, "docx")?;
        let xml = read_entry(&mut archive, "word/document.xml", "docx")?;
        Ok(ExtractedDocument::new(docx_body_text(&xml)?, "docx"))
    }

    /// Body paragraphs first, then every table row rendered as `cell | cell`.
    pub fn docx_body_text(xml: &[u8]) -> Result<String, IngestError> {
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();

        let mut paragraphs = Vec::new();
        let mut rows = Vec::new();

        let mut table_depth = 0usize;
        let mut in_text = false;
        let mut paragraph = String::new();
        let mut cell = String::new();
        let mut cell_paragraphs = 0usize;
        let mut row_cells: Vec<String> = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"w:tbl" => table_depth += 1,
                    b"w:tr" if table_depth == 1 => row_cells.clear(),
                    b"w:tc" if table_depth == 1 => {
                        cell.clear();
                        cell_paragraphs = 0;
                    }
                    b"w:p" => paragraph.clear(),
                    b"w:t" => in_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"w:tab" => paragraph.push('\t'),
                    b"w:br" | b"w:cr" => paragraph.push('\n'),
                    _ => {}
                },
                Ok(Event::Text(text)) if in_text => {
                    let unescaped = text.unescape().map_err(|error| failure("docx", error))?;
                    paragraph.push_str(&unescaped);
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"w:t" => in_text = false,
                    b"w:p" if table_depth == 0 => {
                        let trimmed = paragraph.trim();
                        if !trimmed.is_empty() {
                            paragraphs.push(trimmed.to_string());
                        }
                        paragraph.clear();
                    }
                    b"w:p" => {
                        if cell_paragraphs > 0 {
                            cell.push('\n');
                        }
                        cell.push_str(&paragraph);
                        cell_paragraphs += 1;
                        paragraph.clear();
                    }
                    b"w:tc" if table_depth == 1 => row_cells.push(cell.trim().to_string()),
                    b"w:tr" if table_depth == 1 => {
                        if row_cells.iter().any(|value| !value.is_empty()) {
                            rows.push(row_cells.join(" | "));
                        }
                        row_cells.clear();
                    }
                    b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(error) => return Err(failure("docx", error)),
                _ => {}
            }
            buf.clear();
        }

        paragraphs.extend(rows);
        Ok(paragraphs.join("\n\n"))
    }

    #[derive(Debug, Default)]
    struct Package {
        title: Option<String>,
        creator: Option<String>,
        manifest: HashMap<String, (String, String)>,
        spine: Vec<String>,
    }

    fn attribute(e: &quick_xml::events::BytesStart<'_>, key: &[u8]) -> Option<String> {
        e.attributes()
            .flatten()
            .find(|attr| attr.key.local_name().as_ref() == key)
            .and_then(|attr| attr.unescape_value().ok().map(|value| value.into_owned()))
    }

    fn rootfile_path(container: &[u8]) -> Result<String, IngestError> {
        let mut reader = Reader::from_reader(container);
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    if e.local_name().as_ref() == b"rootfile" {
                        if let Some(path) = attribute(&e, b"full-path") {
                            return Ok(path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(error) => return Err(failure("epub", error)),
                _ => {}
            }
            buf.clear();
        }
        Err(failure("epub", "container.xml names no rootfile"))
    }

    fn parse_package(opf: &[u8]) -> Result<Package, IngestError> {
        let mut reader = Reader::from_reader(opf);
        let mut buf = Vec::new();
        let mut package = Package::default();
        let mut capture: Option<&'static str> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"title" if package.title.is_none() => capture = Some("title"),
                    b"creator" if package.creator.is_none() => capture = Some("creator"),
                    _ => record_entry(&e, &mut package),
                },
                Ok(Event::Empty(e)) => record_entry(&e, &mut package),
                Ok(Event::Text(text)) => {
                    if let Some(field) = capture {
                        let value = text
                            .unescape()
                            .map_err(|error| failure("epub", error))?
                            .trim()
                            .to_string();
                        if !value.is_empty() {
                            match field {
                                "title" => package.title = Some(value),
                                _ => package.creator = Some(value),
                            }
                        }
                    }
                }
                Ok(Event::End(_)) => capture = None,
                Ok(Event::Eof) => break,
                Err(error) => return Err(failure("epub", error)),
                _ => {}
            }
            buf.clear();
        }

        Ok(package)
    }

    fn record_entry(e: &quick_xml::events::BytesStart<'_>, package: &mut Package) {
        match e.local_name().as_ref() {
            b"item" => {
                if let (Some(id), Some(href)) = (attribute(e, b"id"), attribute(e, b"href")) {
                    let media_type = attribute(e, b"media-type").unwrap_or_default();
                    package.manifest.insert(id, (href, media_type));
                }
            }
            b"itemref" => {
                if let Some(idref) = attribute(e, b"idref") {
                    package.spine.push(idref);
                }
            }
            _ => {}
        }
    }

    /// Archive entry a manifest `href` points at, relative to the package document.
    /// Dot segments are resolved, the fragment dropped and percent escapes decoded.
    fn resolve_href(opf_path: &str, href: &str) -> Option<String> {
        let package = Url::parse("epub://book/").ok()?.join(opf_path).ok()?;
        let target = package.join(href).ok()?;
        percent_decode_str(target.path().trim_start_matches('/'))
            .decode_utf8()
            .ok()
            .map(|path| path.into_owned())
    }

    pub fn epub_to_document(
        bytes: &[u8],
        fallback_title: &str,
    ) -> Result<ExtractedDocument, IngestError> {
        let mut archive = open_archive(bytes, "epub")?;
        let container = read_entry(&mut archive, "META-INF/container.xml", "epub")?;
        let opf_path = rootfile_path(&container)?;
        let package = parse_package(&read_entry(&mut archive, &opf_path, "epub")?)?;

        let mut chapters = Vec::new();
        for idref in &package.spine {
            let Some((href, media_type)) = package.manifest.get(idref) else {
                continue;
            };
            if !media_type.contains("html") {
                continue;
            }
            let Some(entry) = resolve_href(&opf_path, href) else {
                warn!(href = %href, "skipping unresolvable epub href");
                continue;
            };
            let markup = match read_entry(&mut archive, &entry, "epub") {
                Ok(bytes) => super::decode_lossy(bytes),
                Err(error) => {
                    warn!(entry = %entry, error = %error, "skipping unreadable epub chapter");
                    continue;
                }
            };
            let text = html::body_text(&markup);
            if !text.is_empty() {
                chapters.push(text);
            }
        }

        let title = package
            .title
            .unwrap_or_else(|| fallback_title.to_string());

        Ok(ExtractedDocument::new(chapters.join("\n\n"), "epub")
            .with("title", title)
            .with("author", MetadataValue::from(package.creator))
            .with("chapters", chapters.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetadataValue;
    use serde_json::json;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn dispatch_is_case_insensitive() {
        assert!(is_supported(Path::new("notes/README.MD")));
        assert!(is_supported(Path::new("book.EPUB")));
        assert!(is_supported(Path::new("main.rs")));
        assert!(!is_supported(Path::new("archive.tar.gz")));
        assert!(!is_supported(Path::new("Makefile")));
        assert!(supported_extensions().any(|ext| ext == "ipynb"));
    }

    #[test]
    fn unsupported_extension_is_a_typed_error() {
        let error = extract(Path::new("image.png")).expect_err("png is not registered");
        match error {
            IngestError::UnsupportedFormat(ext) => assert_eq!(ext, ".png"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_utf8_bytes_are_dropped() {
        assert_eq!(decode_lossy(b"caf\xff\xfee ok".to_vec()), "cafe ok");
        assert_eq!(decode_lossy("naïve".as_bytes().to_vec()), "naïve");
    }

    #[test]
    fn code_files_record_their_language() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("lib.RS");
        fs::write(&path, "fn main() {}\n")?;

        let document = extract(&path)?;
        assert_eq!(document.text, "fn main() {}\n");
        assert_eq!(document.format(), Some("code"));
        assert_eq!(
            document.metadata.get("language"),
            Some(&MetadataValue::from("rust"))
        );
        Ok(())
    }

    #[test]
    fn text_and_markdown_formats() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let notes = dir.path().join("notes.rst");
        let readme = dir.path().join("readme.markdown");
        fs::write(&notes, "plain")?;
        fs::write(&readme, "# Title")?;

        assert_eq!(extract(&notes)?.format(), Some("text"));
        assert_eq!(extract(&readme)?.format(), Some("markdown"));
        Ok(())
    }

    #[test]
    fn notebook_cells_are_fenced_and_counted() {
        let notebook = json!({
            "metadata": {"language_info": {"name": "julia"}},
            "cells": [
                {"cell_type": "markdown", "source": ["# Intro\n", "Some prose"]},
                {"cell_type": "code", "source": "x = 1"},
                {"cell_type": "raw", "source": "ignored"},
                {"cell_type": "code", "source": ["y = 2\n", "x + y"]}
            ]
        });

        let document = notebook_to_document(&notebook);
        assert_eq!(
            document.text,
            "# Intro\nSome prose\n\n```julia\nx = 1\n```\n\n```julia\ny = 2\nx + y\n```"
        );
        assert_eq!(document.format(), Some("jupyter"));
        assert_eq!(document.metadata.get("code_cells"), Some(&MetadataValue::Integer(2)));
        assert_eq!(
            document.metadata.get("markdown_cells"),
            Some(&MetadataValue::Integer(1))
        );
    }

    #[test]
    fn notebook_defaults_to_python_fences() {
        let document = notebook_to_document(&json!({
            "cells": [{"cell_type": "code", "source": "print(1)"}]
        }));
        assert_eq!(document.text, "```python\nprint(1)\n```");
    }

    #[test]
    fn malformed_notebook_is_a_json_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.ipynb");
        fs::write(&path, "{not json")?;
        assert!(matches!(extract(&path), Err(IngestError::Json(_))));
        Ok(())
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn unreadable_pdf_is_a_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"%PDF-1.4\n%broken")?;
        assert!(matches!(extract(&path), Err(IngestError::PdfParse(_))));
        Ok(())
    }

    #[cfg(feature = "html")]
    #[test]
    fn html_prefers_main_and_drops_chrome() {
        let markup = r#"<html><head><title> Field Guide </title><style>p{}</style></head>
            <body><nav>Home | About</nav>
            <main><h1>Heading</h1><p>First <b>bold</b> line</p>
            <script>var x = 1;</script><aside>related</aside></main>
            <footer>copyright</footer></body></html>"#;

        let document = html::html_to_document(markup, "fallback");
        assert_eq!(document.text, "Heading\nFirst\nbold\nline");
        assert_eq!(document.metadata.get("title"), Some(&MetadataValue::from("Field Guide")));
    }

    #[cfg(feature = "html")]
    #[test]
    fn html_without_title_uses_file_stem() {
        let document = html::html_to_document("<body><p>hello</p></body>", "page");
        assert_eq!(document.text, "hello");
        assert_eq!(document.metadata.get("title"), Some(&MetadataValue::from("page")));
    }

    #[cfg(feature = "office")]
    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .expect("zip entry starts");
            writer.write_all(content.as_bytes()).expect("zip entry written");
        }
        writer.finish().expect("zip finishes").into_inner()
    }

    #[cfg(feature = "office")]
    #[test]
    fn docx_paragraphs_then_table_rows() -> Result<(), Box<dyn std::error::Error>> {
        let xml = r#"<w:document xmlns:w="ns"><w:body>
            <w:p><w:r><w:t xml:space="preserve">Hello </w:t></w:r><w:r><w:t>world</w:t></w:r></w:p>
            <w:p><w:r><w:t>   </w:t></w:r></w:p>
            <w:tbl>
              <w:tr><w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc></w:tr>
              <w:tr><w:tc><w:p/></w:tc><w:tc><w:p><w:r><w:t> </w:t></w:r></w:p></w:tc></w:tr>
            </w:tbl>
            <w:p><w:r><w:t>Closing &amp; done</w:t></w:r></w:p>
            </w:body></w:document>"#;

        let dir = tempdir()?;
        let path = dir.path().join("report.docx");
        fs::write(&path, zip_bytes(&[("word/document.xml", xml)]))?;

        let document = extract(&path)?;
        assert_eq!(document.text, "Hello world\n\nClosing & done\n\na | b");
        assert_eq!(document.format(), Some("docx"));
        Ok(())
    }

    #[cfg(feature = "office")]
    #[test]
    fn docx_without_body_is_an_extraction_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.docx");
        fs::write(&path, zip_bytes(&[("other.xml", "<x/>")]))?;
        assert!(matches!(extract(&path), Err(IngestError::Extraction { .. })));
        Ok(())
    }

    #[cfg(feature = "office")]
    #[test]
    fn epub_follows_spine_and_reads_dublin_core() -> Result<(), Box<dyn std::error::Error>> {
        let container = r#"<?xml version="1.0"?>
            <container xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
              <rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles>
            </container>"#;
        let opf = r#"<?xml version="1.0"?>
            <package xmlns="http://www.idpf.org/2007/opf" xmlns:dc="http://purl.org/dc/elements/1.1/">
              <metadata><dc:title>Sea Charts</dc:title><dc:creator>A. Navigator</dc:creator></metadata>
              <manifest>
                <item id="c2" href="two.xhtml" media-type="application/xhtml+xml"/>
                <item id="c1" href="one.xhtml" media-type="application/xhtml+xml"/>
                <item id="css" href="style.css" media-type="text/css"/>
                <item id="blank" href="blank.xhtml" media-type="application/xhtml+xml"/>
              </manifest>
              <spine><itemref idref="c1"/><itemref idref="blank"/><itemref idref="c2"/></spine>
            </package>"#;

        let bytes = zip_bytes(&[
            ("META-INF/container.xml", container),
            ("OEBPS/content.opf", opf),
            ("OEBPS/one.xhtml", "<html><body><p>Chapter one</p></body></html>"),
            ("OEBPS/two.xhtml", "<html><body><p>Chapter two</p></body></html>"),
            ("OEBPS/blank.xhtml", "<html><body></body></html>"),
            ("OEBPS/style.css", "p {}"),
        ]);

        let dir = tempdir()?;
        let path = dir.path().join("charts.epub");
        fs::write(&path, bytes)?;

        let document = extract(&path)?;
        assert_eq!(document.text, "Chapter one\n\nChapter two");
        assert_eq!(document.metadata.get("title"), Some(&MetadataValue::from("Sea Charts")));
        assert_eq!(
            document.metadata.get("author"),
            Some(&MetadataValue::from("A. Navigator"))
        );
        assert_eq!(document.metadata.get("chapters"), Some(&MetadataValue::Integer(2)));
        Ok(())
    }

    #[cfg(feature = "office")]
    #[test]
    fn epub_hrefs_are_decoded_and_normalized() -> Result<(), Box<dyn std::error::Error>> {
        let container = r#"<container><rootfiles>
              <rootfile full-path="OEBPS/content.opf"/>
            </rootfiles></container>"#;
        let opf = r#"<package>
              <manifest>
                <item id="c1" href="chapter%201.xhtml#start" media-type="application/xhtml+xml"/>
                <item id="gone" href="missing.xhtml" media-type="application/xhtml+xml"/>
                <item id="c2" href="../Text/two.xhtml" media-type="application/xhtml+xml"/>
              </manifest>
              <spine><itemref idref="c1"/><itemref idref="gone"/><itemref idref="c2"/></spine>
            </package>"#;

        let bytes = zip_bytes(&[
            ("META-INF/container.xml", container),
            ("OEBPS/content.opf", opf),
            ("OEBPS/chapter 1.xhtml", "<html><body><p>Chapter one</p></body></html>"),
            ("Text/two.xhtml", "<html><body><p>Chapter two</p></body></html>"),
        ]);

        let document = office::epub_to_document(&bytes, "logbook")?;
        assert_eq!(document.text, "Chapter one\n\nChapter two");
        assert_eq!(document.metadata.get("title"), Some(&MetadataValue::from("logbook")));
        assert_eq!(document.metadata.get("chapters"), Some(&MetadataValue::Integer(2)));
        Ok(())
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn pdf_without_parser_is_a_missing_dependency() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("x.pdf");
        fs::write(&path, b"%PDF-1.4")?;
        match extract(&path) {
            Err(IngestError::MissingDependency { format, feature }) => {
                assert_eq!(format, "pdf");
                assert_eq!(feature, "pdf");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        Ok(())
    }

    #[cfg(not(feature = "office"))]
    #[test]
    fn office_formats_without_parser_are_missing_dependencies() {
        for name in ["book.epub", "report.docx"] {
            assert!(matches!(
                extract(Path::new(name)),
                Err(IngestError::MissingDependency { feature: "office", .. })
            ));
        }
    }
}
