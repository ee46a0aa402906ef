//! Builders for small but real documents used by the unit tests.

use docx_rs::{Docx, Paragraph, Run};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use quick_xml::escape::escape;
use rust_xlsxwriter::Workbook;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// One page per entry, each carrying a single line of text.
pub fn write_pdf(path: &Path, pages: &[&str]) -> TestResult {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path)?;
    Ok(())
}

pub fn write_docx(path: &Path, paragraphs: &[&str]) -> TestResult {
    let docx = paragraphs.iter().fold(Docx::new(), |docx, text| {
        docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)))
    });
    docx.build()
        .pack(File::create(path)?)
        .map_err(|error| error.to_string())?;
    Ok(())
}

/// One worksheet per entry; values go down column A.
pub fn write_xlsx(path: &Path, sheets: &[&[&str]]) -> TestResult {
    let mut workbook = Workbook::new();
    for values in sheets {
        let worksheet = workbook.add_worksheet();
        for (row, value) in values.iter().enumerate() {
            worksheet.write_string(row as u32, 0, *value)?;
        }
    }
    workbook.save(path)?;
    Ok(())
}

/// One slide per entry, each shape holding one paragraph of text.
pub fn write_pptx(path: &Path, slides: &[&[&str]]) -> TestResult {
    let order = (0..slides.len()).collect::<Vec<_>>();
    write_pptx_ordered(path, slides, &order)
}

/// Writes `slides[i]` to `slideN.xml` with N = i + 1, listing them in `order`.
pub fn write_pptx_ordered(path: &Path, slides: &[&[&str]], order: &[usize]) -> TestResult {
    let mut zip = ZipWriter::new(File::create(path)?);
    let options = SimpleFileOptions::default();

    let slide_ids = order
        .iter()
        .enumerate()
        .map(|(position, index)| {
            format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + position, index + 1)
        })
        .collect::<String>();
    zip.start_file("ppt/presentation.xml", options)?;
    zip.write_all(
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldIdLst>{slide_ids}</p:sldIdLst></p:presentation>"#
        )
        .as_bytes(),
    )?;

    let relationships = (0..slides.len())
        .map(|index| {
            format!(
                r#"<Relationship Id="rId{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{id}.xml"/>"#,
                id = index + 1
            )
        })
        .collect::<String>();
    zip.start_file("ppt/_rels/presentation.xml.rels", options)?;
    zip.write_all(
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{relationships}</Relationships>"#
        )
        .as_bytes(),
    )?;

    for (index, shapes) in slides.iter().enumerate() {
        let shapes_xml = shapes
            .iter()
            .map(|text| {
                format!(
                    r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Text"/></p:nvSpPr><p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
                    escape(*text)
                )
            })
            .collect::<String>();
        zip.start_file(format!("ppt/slides/slide{}.xml", index + 1), options)?;
        zip.write_all(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree>{shapes_xml}</p:spTree></p:cSld></p:sld>"#
            )
            .as_bytes(),
        )?;
    }

    zip.finish()?;
    Ok(())
}
