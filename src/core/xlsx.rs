//! Minimal Office Open XML workbook writer.
//!
//! Every cell is written as a shared string, so values come back verbatim
//! when the workbook is read again. The first row of each sheet is a bold,
//! frozen header.

use crate::utils::error::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

const MIN_COLUMN_WIDTH: usize = 10;
const MAX_COLUMN_WIDTH: usize = 60;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const CT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const CT_SHARED_STRINGS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";

/// 標題列使用的粗體樣式 (cellXfs index)
const HEADER_STYLE: &str = "1";

type XmlWriter = Writer<Cursor<Vec<u8>>>;

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            header,
            rows,
        }
    }

    fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }

    /// Widths in characters, sized to the longest cell of each column.
    pub fn column_widths(&self) -> Vec<usize> {
        let mut widths = vec![0usize; self.column_count()];
        for row in std::iter::once(&self.header).chain(self.rows.iter()) {
            for (column, value) in row.iter().enumerate() {
                widths[column] = widths[column].max(value.chars().count());
            }
        }
        widths
            .into_iter()
            .map(|width| (width + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH))
            .collect()
    }
}

#[derive(Default)]
struct SharedStrings {
    index: HashMap<String, usize>,
    values: Vec<String>,
    references: usize,
}

impl SharedStrings {
    fn intern(&mut self, value: &str) -> usize {
        self.references += 1;
        if let Some(&position) = self.index.get(value) {
            return position;
        }
        let position = self.values.len();
        self.values.push(value.to_string());
        self.index.insert(value.to_string(), position);
        position
    }

    fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = new_part()?;
        let count = self.references.to_string();
        let unique = self.values.len().to_string();

        start(
            &mut writer,
            "sst",
            &[("xmlns", NS_MAIN), ("count", &count), ("uniqueCount", &unique)],
        )?;
        for value in &self.values {
            start(&mut writer, "si", &[])?;
            // 前後空白需要 xml:space 才會保留
            let attributes: &[(&str, &str)] = if value.trim() != value {
                &[("xml:space", "preserve")]
            } else {
                &[]
            };
            start(&mut writer, "t", attributes)?;
            writer.write_event(Event::Text(BytesText::new(&encode_cell_text(value))))?;
            end(&mut writer, "t")?;
            end(&mut writer, "si")?;
        }
        end(&mut writer, "sst")?;

        Ok(finish(writer))
    }
}

/// Encodes the sheets into xlsx bytes.
pub fn write_workbook(sheets: &[Sheet]) -> Result<Vec<u8>> {
    let mut strings = SharedStrings::default();
    let worksheets = sheets
        .iter()
        .enumerate()
        .map(|(position, sheet)| worksheet_xml(sheet, position == 0, &mut strings))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        "Writing workbook with {} sheet(s), {} shared strings",
        sheets.len(),
        strings.values.len()
    );

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    let parts = [
        ("[Content_Types].xml", content_types_xml(sheets.len())?),
        ("_rels/.rels", root_rels_xml()?),
        ("xl/workbook.xml", workbook_xml(sheets)?),
        ("xl/_rels/workbook.xml.rels", workbook_rels_xml(sheets.len())?),
        ("xl/styles.xml", styles_xml()?),
        ("xl/sharedStrings.xml", strings.to_xml()?),
    ];
    for (name, bytes) in parts {
        zip.start_file(name, options)?;
        zip.write_all(&bytes)?;
    }

    for (position, bytes) in worksheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", position + 1), options)?;
        zip.write_all(bytes)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn worksheet_xml(sheet: &Sheet, selected: bool, strings: &mut SharedStrings) -> Result<Vec<u8>> {
    let columns = sheet.column_count();
    let last_row = sheet.rows.len() + 1;

    let mut writer = new_part()?;
    start(&mut writer, "worksheet", &[("xmlns", NS_MAIN), ("xmlns:r", NS_REL)])?;

    if columns > 0 {
        let dimension = format!("A1:{}{}", column_name(columns - 1), last_row);
        empty(&mut writer, "dimension", &[("ref", &dimension)])?;
    }

    start(&mut writer, "sheetViews", &[])?;
    let view: &[(&str, &str)] = if selected {
        &[("tabSelected", "1"), ("workbookViewId", "0")]
    } else {
        &[("workbookViewId", "0")]
    };
    start(&mut writer, "sheetView", view)?;
    empty(
        &mut writer,
        "pane",
        &[
            ("ySplit", "1"),
            ("topLeftCell", "A2"),
            ("activePane", "bottomLeft"),
            ("state", "frozen"),
        ],
    )?;
    empty(&mut writer, "selection", &[("pane", "bottomLeft")])?;
    end(&mut writer, "sheetView")?;
    end(&mut writer, "sheetViews")?;
    empty(&mut writer, "sheetFormatPr", &[("defaultRowHeight", "15")])?;

    if columns > 0 {
        start(&mut writer, "cols", &[])?;
        for (column, width) in sheet.column_widths().into_iter().enumerate() {
            let index = (column + 1).to_string();
            let width = width.to_string();
            empty(
                &mut writer,
                "col",
                &[
                    ("min", &index),
                    ("max", &index),
                    ("width", &width),
                    ("customWidth", "1"),
                ],
            )?;
        }
        end(&mut writer, "cols")?;
    }

    start(&mut writer, "sheetData", &[])?;
    write_row(&mut writer, 1, &sheet.header, Some(HEADER_STYLE), strings)?;
    for (offset, row) in sheet.rows.iter().enumerate() {
        write_row(&mut writer, offset + 2, row, None, strings)?;
    }
    end(&mut writer, "sheetData")?;
    end(&mut writer, "worksheet")?;

    Ok(finish(writer))
}

fn write_row(
    writer: &mut XmlWriter,
    row_number: usize,
    values: &[String],
    style: Option<&str>,
    strings: &mut SharedStrings,
) -> Result<()> {
    let row_ref = row_number.to_string();
    start(writer, "row", &[("r", &row_ref)])?;

    for (column, value) in values.iter().enumerate() {
        let cell_ref = format!("{}{}", column_name(column), row_number);
        let mut cell = BytesStart::new("c");
        cell.push_attribute(("r", cell_ref.as_str()));
        cell.push_attribute(("t", "s"));
        if let Some(style) = style {
            cell.push_attribute(("s", style));
        }
        writer.write_event(Event::Start(cell))?;

        let position = strings.intern(value).to_string();
        start(writer, "v", &[])?;
        writer.write_event(Event::Text(BytesText::new(&position)))?;
        end(writer, "v")?;
        end(writer, "c")?;
    }

    end(writer, "row")
}

fn styles_xml() -> Result<Vec<u8>> {
    let mut writer = new_part()?;
    start(&mut writer, "styleSheet", &[("xmlns", NS_MAIN)])?;

    start(&mut writer, "fonts", &[("count", "2")])?;
    for bold in [false, true] {
        start(&mut writer, "font", &[])?;
        if bold {
            empty(&mut writer, "b", &[])?;
        }
        empty(&mut writer, "sz", &[("val", "11")])?;
        empty(&mut writer, "name", &[("val", "Calibri")])?;
        empty(&mut writer, "family", &[("val", "2")])?;
        end(&mut writer, "font")?;
    }
    end(&mut writer, "fonts")?;

    start(&mut writer, "fills", &[("count", "2")])?;
    for pattern in ["none", "gray125"] {
        start(&mut writer, "fill", &[])?;
        empty(&mut writer, "patternFill", &[("patternType", pattern)])?;
        end(&mut writer, "fill")?;
    }
    end(&mut writer, "fills")?;

    start(&mut writer, "borders", &[("count", "1")])?;
    start(&mut writer, "border", &[])?;
    for side in ["left", "right", "top", "bottom", "diagonal"] {
        empty(&mut writer, side, &[])?;
    }
    end(&mut writer, "border")?;
    end(&mut writer, "borders")?;

    let base_xf = [
        ("numFmtId", "0"),
        ("fontId", "0"),
        ("fillId", "0"),
        ("borderId", "0"),
    ];
    start(&mut writer, "cellStyleXfs", &[("count", "1")])?;
    empty(&mut writer, "xf", &base_xf)?;
    end(&mut writer, "cellStyleXfs")?;

    start(&mut writer, "cellXfs", &[("count", "2")])?;
    empty(
        &mut writer,
        "xf",
        &[
            ("numFmtId", "0"),
            ("fontId", "0"),
            ("fillId", "0"),
            ("borderId", "0"),
            ("xfId", "0"),
        ],
    )?;
    empty(
        &mut writer,
        "xf",
        &[
            ("numFmtId", "0"),
            ("fontId", "1"),
            ("fillId", "0"),
            ("borderId", "0"),
            ("xfId", "0"),
            ("applyFont", "1"),
        ],
    )?;
    end(&mut writer, "cellXfs")?;

    start(&mut writer, "cellStyles", &[("count", "1")])?;
    empty(
        &mut writer,
        "cellStyle",
        &[("name", "Normal"), ("xfId", "0"), ("builtinId", "0")],
    )?;
    end(&mut writer, "cellStyles")?;

    end(&mut writer, "styleSheet")?;
    Ok(finish(writer))
}

fn content_types_xml(sheet_count: usize) -> Result<Vec<u8>> {
    let mut writer = new_part()?;
    start(&mut writer, "Types", &[("xmlns", NS_CONTENT_TYPES)])?;

    empty(
        &mut writer,
        "Default",
        &[
            ("Extension", "rels"),
            ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
        ],
    )?;
    empty(
        &mut writer,
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/xml")],
    )?;
    empty(
        &mut writer,
        "Override",
        &[("PartName", "/xl/workbook.xml"), ("ContentType", CT_WORKBOOK)],
    )?;
    for number in 1..=sheet_count {
        let part = format!("/xl/worksheets/sheet{}.xml", number);
        empty(
            &mut writer,
            "Override",
            &[("PartName", &part), ("ContentType", CT_WORKSHEET)],
        )?;
    }
    empty(
        &mut writer,
        "Override",
        &[("PartName", "/xl/styles.xml"), ("ContentType", CT_STYLES)],
    )?;
    empty(
        &mut writer,
        "Override",
        &[("PartName", "/xl/sharedStrings.xml"), ("ContentType", CT_SHARED_STRINGS)],
    )?;

    end(&mut writer, "Types")?;
    Ok(finish(writer))
}

fn root_rels_xml() -> Result<Vec<u8>> {
    let mut writer = new_part()?;
    start(&mut writer, "Relationships", &[("xmlns", NS_PKG_REL)])?;
    relationship(&mut writer, 1, "officeDocument", "xl/workbook.xml")?;
    end(&mut writer, "Relationships")?;
    Ok(finish(writer))
}

fn workbook_xml(sheets: &[Sheet]) -> Result<Vec<u8>> {
    let mut writer = new_part()?;
    start(&mut writer, "workbook", &[("xmlns", NS_MAIN), ("xmlns:r", NS_REL)])?;
    start(&mut writer, "sheets", &[])?;
    for (position, sheet) in sheets.iter().enumerate() {
        let sheet_id = (position + 1).to_string();
        let rel_id = format!("rId{}", position + 1);
        empty(
            &mut writer,
            "sheet",
            &[("name", &sheet.name), ("sheetId", &sheet_id), ("r:id", &rel_id)],
        )?;
    }
    end(&mut writer, "sheets")?;
    end(&mut writer, "workbook")?;
    Ok(finish(writer))
}

fn workbook_rels_xml(sheet_count: usize) -> Result<Vec<u8>> {
    let mut writer = new_part()?;
    start(&mut writer, "Relationships", &[("xmlns", NS_PKG_REL)])?;
    for number in 1..=sheet_count {
        let target = format!("worksheets/sheet{}.xml", number);
        relationship(&mut writer, number, "worksheet", &target)?;
    }
    relationship(&mut writer, sheet_count + 1, "styles", "styles.xml")?;
    relationship(&mut writer, sheet_count + 2, "sharedStrings", "sharedStrings.xml")?;
    end(&mut writer, "Relationships")?;
    Ok(finish(writer))
}

fn relationship(writer: &mut XmlWriter, id: usize, kind: &str, target: &str) -> Result<()> {
    let id = format!("rId{}", id);
    let kind = format!("{}/{}", NS_REL, kind);
    empty(
        writer,
        "Relationship",
        &[("Id", &id), ("Type", &kind), ("Target", target)],
    )
}

fn new_part() -> Result<XmlWriter> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(writer)
}

fn finish(writer: XmlWriter) -> Vec<u8> {
    writer.into_inner().into_inner()
}

fn element<'a>(name: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
    let mut element = BytesStart::new(name);
    for &attribute in attributes {
        element.push_attribute(attribute);
    }
    element
}

fn start(writer: &mut XmlWriter, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
    writer.write_event(Event::Start(element(name, attributes)))?;
    Ok(())
}

fn empty(writer: &mut XmlWriter, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
    writer.write_event(Event::Empty(element(name, attributes)))?;
    Ok(())
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// XML 1.0 無法表示的控制字元改寫為 OOXML `_xHHHH_` 形式
fn encode_cell_text(value: &str) -> Cow<'_, str> {
    if !value.chars().any(is_unrepresentable) {
        return Cow::Borrowed(value);
    }
    let mut encoded = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        if is_unrepresentable(ch) {
            encoded.push_str(&format!("_x{:04X}_", ch as u32));
        } else {
            encoded.push(ch);
        }
    }
    Cow::Owned(encoded)
}

fn is_unrepresentable(ch: char) -> bool {
    (ch as u32) < 0x20 && ch != '\t' && ch != '\n'
}

/// Zero-based column index to its letter name (`0` -> `A`, `26` -> `AA`).
pub fn column_name(index: usize) -> String {
    let mut remaining = index + 1;
    let mut letters = Vec::new();
    while remaining > 0 {
        let rem = (remaining - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(18), "S");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_control_characters_are_encoded() {
        assert_eq!(encode_cell_text("USD\u{1} 100"), "USD_x0001_ 100");
        assert_eq!(encode_cell_text("a\r\nb"), "a_x000D_\nb");
        assert!(matches!(encode_cell_text("tab\tok"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_column_widths_are_clamped() {
        let sheet = Sheet::new(
            "Extracted_Data",
            vec!["Id".to_string(), "Description".to_string()],
            vec![vec!["1".to_string(), "x".repeat(200)]],
        );
        assert_eq!(sheet.column_widths(), vec![MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH]);
    }

    #[test]
    fn test_shared_strings_are_deduplicated_and_escaped() {
        let mut strings = SharedStrings::default();
        assert_eq!(strings.intern("N/A"), 0);
        assert_eq!(strings.intern("Smith & Sons <Ltd>"), 1);
        assert_eq!(strings.intern("N/A"), 0);
        assert_eq!(strings.intern(" padded "), 2);

        let xml = text(strings.to_xml().unwrap());
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#));
        assert!(xml.contains(r#"count="4" uniqueCount="3""#));
        assert!(xml.contains("<t>Smith &amp; Sons &lt;Ltd&gt;</t>"));
        assert!(xml.contains(r#"<t xml:space="preserve"> padded </t>"#));
    }

    #[test]
    fn test_sheet_name_is_escaped_in_workbook() {
        let sheet = Sheet::new("R&D \"Q1\"", vec![], vec![]);
        let xml = text(workbook_xml(&[sheet]).unwrap());
        assert!(xml.contains(r#"name="R&amp;D &quot;Q1&quot;""#));
        assert!(xml.contains(r#"r:id="rId1""#));
    }

    #[test]
    fn test_header_row_uses_bold_style() {
        let sheet = Sheet::new(
            "Extracted_Data",
            vec!["Filename".to_string()],
            vec![vec!["a.pdf".to_string()]],
        );
        let mut strings = SharedStrings::default();
        let xml = text(worksheet_xml(&sheet, true, &mut strings).unwrap());
        assert!(xml.contains(r#"<dimension ref="A1:A2"/>"#));
        assert!(xml.contains(r#"<c r="A1" t="s" s="1"><v>0</v></c>"#));
        assert!(xml.contains(r#"<c r="A2" t="s"><v>1</v></c>"#));
        assert!(xml.contains(r#"state="frozen""#));
    }

    #[test]
    fn test_workbook_contains_required_parts() {
        let sheet = Sheet::new("Extracted_Data", vec!["Filename".to_string()], vec![]);
        let bytes = write_workbook(&[sheet]).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "xl/_rels/workbook.xml.rels",
                "xl/sharedStrings.xml",
                "xl/styles.xml",
                "xl/workbook.xml",
                "xl/worksheets/sheet1.xml",
            ]
        );
    }
}
