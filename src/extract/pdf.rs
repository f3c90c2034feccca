//! PDF text extraction on top of `lopdf`.
//!
//! Each page's content stream is decoded into text items tagged with their
//! vertical position; items are then stitched into lines whenever that
//! position changes. Shown strings go through the encoding of the font
//! selected by `Tf` (WinAnsi, MacRoman, ToUnicode maps and so on). Pages are decoded on worker threads and reassembled in
//! page order, separated by a blank line.

use crate::cancellation::CancellationToken;
use anyhow::{Result, anyhow};
use lopdf::content::{Content, Operation};
use lopdf::{Document as PdfDocument, Encoding, Object, ObjectId};
use std::collections::BTreeMap;
use std::thread;
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;

/// Vertical movement smaller than this stays on the same line.
const LINE_Y_TOLERANCE: f32 = 0.01;
/// `TJ` adjustments (thousandths of text space) wide enough to read as a space.
const TJ_SPACE_THRESHOLD: f32 = -250.0;
const PAGE_SEPARATOR: &str = "\n\n";

/// Resolved encodings of a page's fonts, keyed by resource name.
type FontEncodings<'a> = BTreeMap<Vec<u8>, Encoding<'a>>;

/// Everything a worker needs to decode one page.
struct PageSource<'a> {
    number: u32,
    content: Vec<u8>,
    fonts: FontEncodings<'a>,
}

/// One run of text shown at a vertical position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub y: f32,
}

impl TextItem {
    pub fn new(text: impl Into<String>, y: f32) -> Self {
        Self {
            text: text.into(),
            y,
        }
    }
}

/// Join items on the same line directly and break lines when `y` changes.
pub fn group_lines(items: &[TextItem]) -> String {
    let mut page = String::new();
    let mut line = String::new();
    let mut last_y: Option<f32> = None;

    for item in items {
        if let Some(prev) = last_y {
            if (item.y - prev).abs() > LINE_Y_TOLERANCE {
                page.push_str(&line);
                page.push('\n');
                line.clear();
            }
        }
        line.push_str(&item.text);
        last_y = Some(item.y);
    }
    page.push_str(&line);
    page
}

/// Extract the text of every page, in order. Fails if any page fails.
pub fn extract_pdf_text(bytes: &[u8], cancel: Option<&CancellationToken>) -> Result<String> {
    let doc = PdfDocument::load_mem(bytes).map_err(|err| anyhow!("Failed to parse PDF: {err}"))?;
    let pages = doc.get_pages();
    info!(pages = pages.len(), "Parsed PDF structure");
    if pages.is_empty() {
        return Ok(String::new());
    }

    let mut sources = Vec::with_capacity(pages.len());
    for (&number, &page_id) in &pages {
        let content = doc
            .get_page_content(page_id)
            .map_err(|err| anyhow!("Failed to read content of page {number}: {err}"))?;
        sources.push(PageSource {
            number,
            content,
            fonts: page_fonts(&doc, page_id, number),
        });
    }

    let mut page_texts = decode_pages(&sources, cancel)?;
    page_texts.sort_by_key(|(number, _)| *number);

    for (number, text) in page_texts.iter_mut() {
        if text.trim().is_empty() {
            // Text drawn through form XObjects never shows up in the page stream.
            match doc.extract_text(&[*number]) {
                Ok(fallback) => *text = fallback,
                Err(err) => debug!(page = *number, "No fallback text for page: {err}"),
            }
        }
    }

    let joined = page_texts
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR);
    Ok(joined.nfc().collect())
}

/// Fonts whose encoding lopdf cannot resolve are left out; their strings
/// fall back to [`decode_pdf_string`].
fn page_fonts<'a>(doc: &'a PdfDocument, page_id: ObjectId, number: u32) -> FontEncodings<'a> {
    let fonts = match doc.get_page_fonts(page_id) {
        Ok(fonts) => fonts,
        Err(err) => {
            debug!(page = number, "No font resources: {err}");
            return FontEncodings::new();
        }
    };
    fonts
        .into_iter()
        .filter(|(_, font)| font.type_is(b"Font"))
        .filter_map(|(name, font)| match font.get_font_encoding(doc) {
            Ok(encoding) => Some((name, encoding)),
            Err(err) => {
                debug!(
                    page = number,
                    font = %String::from_utf8_lossy(&name),
                    "Unresolved font encoding: {err}"
                );
                None
            }
        })
        .collect()
}

fn decode_pages(
    sources: &[PageSource<'_>],
    cancel: Option<&CancellationToken>,
) -> Result<Vec<(u32, String)>> {
    let workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, sources.len().max(1));
    let chunk_len = sources.len().div_ceil(workers).max(1);
    debug!(
        pages = sources.len(),
        workers, chunk_len, "Decoding PDF pages"
    );

    let results: Vec<Result<Vec<(u32, String)>>> = thread::scope(|scope| {
        let handles: Vec<_> = sources
            .chunks(chunk_len)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|page| {
                            if let Some(cancel) = cancel {
                                cancel.check_cancelled("pdf-page")?;
                            }
                            let items = page_text_items(&page.content, &page.fonts).map_err(
                                |err| anyhow!("Failed to decode page {}: {err}", page.number),
                            )?;
                            Ok((page.number, group_lines(&items)))
                        })
                        .collect::<Result<Vec<_>>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(anyhow!("PDF page worker panicked")))
            })
            .collect()
    });

    let mut pages = Vec::with_capacity(sources.len());
    for chunk in results {
        pages.extend(chunk?);
    }
    Ok(pages)
}

/// Text-positioning state needed to tell which line a string lands on.
#[derive(Debug, Clone, Copy)]
struct TextCursor {
    line_y: f32,
    scale_y: f32,
    leading: f32,
}

impl Default for TextCursor {
    fn default() -> Self {
        Self {
            line_y: 0.0,
            scale_y: 1.0,
            leading: 0.0,
        }
    }
}

impl TextCursor {
    fn translate(&mut self, ty: f32) {
        self.line_y += ty * self.scale_y;
    }

    fn next_line(&mut self) {
        self.translate(-self.leading);
    }
}

fn page_text_items(content: &[u8], fonts: &FontEncodings<'_>) -> Result<Vec<TextItem>> {
    let content = Content::decode(content).map_err(|err| anyhow!("{err}"))?;
    let mut cursor = TextCursor::default();
    let mut encoding: Option<&Encoding<'_>> = None;
    let mut items = Vec::new();

    for Operation { operator, operands } in &content.operations {
        match operator.as_str() {
            "BT" => cursor = TextCursor {
                leading: cursor.leading,
                ..TextCursor::default()
            },
            "Tm" => {
                if let (Some(d), Some(f)) = (number_at(operands, 3), number_at(operands, 5)) {
                    cursor.scale_y = if d.abs() > f32::EPSILON { d } else { 1.0 };
                    cursor.line_y = f;
                }
            }
            "Td" => {
                if let Some(ty) = number_at(operands, 1) {
                    cursor.translate(ty);
                }
            }
            "TD" => {
                if let Some(ty) = number_at(operands, 1) {
                    cursor.leading = -ty;
                    cursor.translate(ty);
                }
            }
            "TL" => {
                if let Some(leading) = number_at(operands, 0) {
                    cursor.leading = leading;
                }
            }
            "Tf" => {
                encoding = operands
                    .first()
                    .and_then(|name| name.as_name().ok())
                    .and_then(|name| fonts.get(name));
            }
            "T*" => cursor.next_line(),
            "Tj" => push_item(&mut items, operands.first(), encoding, cursor.line_y),
            "'" => {
                cursor.next_line();
                push_item(&mut items, operands.first(), encoding, cursor.line_y);
            }
            "\"" => {
                cursor.next_line();
                push_item(&mut items, operands.get(2), encoding, cursor.line_y);
            }
            "TJ" => push_item(&mut items, operands.first(), encoding, cursor.line_y),
            _ => {}
        }
    }
    Ok(items)
}

fn number_at(operands: &[Object], index: usize) -> Option<f32> {
    operands.get(index).and_then(|obj| obj.as_float().ok())
}

fn push_item(
    items: &mut Vec<TextItem>,
    operand: Option<&Object>,
    encoding: Option<&Encoding<'_>>,
    y: f32,
) {
    let Some(operand) = operand else {
        return;
    };
    let text = shown_text(operand, encoding);
    if !text.is_empty() {
        items.push(TextItem { text, y });
    }
}

fn shown_text(operand: &Object, encoding: Option<&Encoding<'_>>) -> String {
    match operand {
        Object::String(bytes, _) => decode_shown(bytes, encoding),
        Object::Array(parts) => {
            let mut text = String::new();
            for part in parts {
                match part {
                    Object::String(bytes, _) => text.push_str(&decode_shown(bytes, encoding)),
                    other => {
                        if other
                            .as_float()
                            .is_ok_and(|adjust| adjust < TJ_SPACE_THRESHOLD)
                            && !text.ends_with(' ')
                        {
                            text.push(' ');
                        }
                    }
                }
            }
            text
        }
        _ => String::new(),
    }
}

fn decode_shown(bytes: &[u8], encoding: Option<&Encoding<'_>>) -> String {
    match encoding.map(|encoding| PdfDocument::decode_text(encoding, bytes)) {
        Some(Ok(text)) => text,
        _ => decode_pdf_string(bytes),
    }
}

/// UTF-16BE when the string carries a byte-order mark, otherwise one byte per
/// character (PDFDocEncoding agrees with Latin-1 for printable text).
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    #[test]
    fn same_line_items_are_joined_directly() {
        let items = vec![
            TextItem::new("Hello, ", 700.0),
            TextItem::new("world", 700.0),
            TextItem::new("Next line", 686.0),
            TextItem::new(" continues", 686.0),
        ];
        assert_eq!(group_lines(&items), "Hello, world\nNext line continues");
    }

    #[test]
    fn empty_item_list_is_empty_text() {
        assert_eq!(group_lines(&[]), "");
    }

    #[test]
    fn decodes_utf16_and_single_byte_strings() {
        assert_eq!(decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0xE9]), "H\u{e9}");
        assert_eq!(decode_pdf_string(b"plain"), "plain");
    }

    #[test]
    fn content_stream_operators_track_lines() {
        let stream = b"BT /F1 12 Tf 1 0 0 1 72 720 Tm (First) Tj ( line) Tj 0 -14 Td [(Sec) 40 (ond)] TJ 14 TL T* [(third) -400 (line)] TJ ET";
        let items = page_text_items(stream, &FontEncodings::new()).unwrap();

        assert_eq!(group_lines(&items), "First line\nSecond\nthird line");
    }

    #[test]
    fn malformed_pdf_is_an_error() {
        assert!(extract_pdf_text(b"%PDF-1.4 truncated", None).is_err());
    }

    #[test]
    fn extracts_pages_in_order_with_blank_line_between() {
        let pdf = build_pdf(&["(Page one) Tj", "(Page two) Tj 0 -20 Td (second line) Tj"]);

        let text = extract_pdf_text(&pdf, None).unwrap();

        assert_eq!(text, "Page one\n\nPage two\nsecond line");
    }

    #[test]
    fn cancelled_extraction_fails() {
        let pdf = build_pdf(&["(Only page) Tj"]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(extract_pdf_text(&pdf, Some(&cancel)).is_err());
    }

    #[test]
    fn win_ansi_strings_use_the_font_encoding() {
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        };
        let pdf = build_pdf_with_font(&[b"(It\x92s \x93here\x94) Tj"], font, None);

        let text = extract_pdf_text(&pdf, None).unwrap();

        assert_eq!(text, "It\u{2019}s \u{201c}here\u{201d}");
    }

    #[test]
    fn identity_h_strings_use_the_to_unicode_map() {
        let cmap = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo
<< /Registry (Adobe)
/Ordering (UCS)
/Supplement 0
>> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
3 beginbfchar
<0003> <0020>
<0024> <0041>
<0051> <0061>
endbfchar
endcmap
CMapName currentdict /CMap defineresource pop
end
end"
        .to_vec();
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "NotoSans",
            "Encoding" => "Identity-H",
        };
        let pdf = build_pdf_with_font(&[b"<002400030051> Tj"], font, Some(cmap));

        let text = extract_pdf_text(&pdf, None).unwrap();

        assert_eq!(text, "A a");
    }

    fn build_pdf(page_ops: &[&str]) -> Vec<u8> {
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        };
        let ops: Vec<&[u8]> = page_ops.iter().map(|ops| ops.as_bytes()).collect();
        build_pdf_with_font(&ops, font, None)
    }

    fn build_pdf_with_font(
        page_ops: &[&[u8]],
        mut font: lopdf::Dictionary,
        to_unicode: Option<Vec<u8>>,
    ) -> Vec<u8> {
        let mut doc = PdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        if let Some(cmap) = to_unicode {
            let cmap_id = doc.add_object(Stream::new(dictionary! {}, cmap));
            font.set("ToUnicode", cmap_id);
        }
        let font_id = doc.add_object(font);
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for ops in page_ops {
            let mut body = b"BT /F1 12 Tf 72 720 Td ".to_vec();
            body.extend_from_slice(ops);
            body.extend_from_slice(b" ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, body));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }
}
