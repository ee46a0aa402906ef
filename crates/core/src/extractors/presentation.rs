use super::ContentExtractor;
use crate::{ContentLocation, ExtractionError, FormatKind, Keyword};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";
const SLIDE_PREFIX: &str = "ppt/slides/slide";

/// Walks slides in presentation order and the text-bearing shapes of each slide.
#[derive(Debug, Default, Clone, Copy)]
pub struct PptxExtractor;

impl ContentExtractor for PptxExtractor {
    fn kind(&self) -> FormatKind {
        FormatKind::Presentation
    }

    fn find_match(
        &self,
        path: &Path,
        keyword: &Keyword,
    ) -> Result<Option<ContentLocation>, ExtractionError> {
        let mut archive = ZipArchive::new(BufReader::new(File::open(path)?))?;
        let slides = slide_parts(&mut archive)?;
        debug!(path = %path.display(), slides = slides.len(), "scanning presentation slides");

        for (index, part) in slides.iter().enumerate() {
            let xml = read_part(&mut archive, part)?;
            if slide_mentions(&xml, keyword)? {
                return Ok(Some(ContentLocation::Slide(index as u32 + 1)));
            }
        }

        Ok(None)
    }
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, ExtractionError> {
    let mut entry = archive.by_name(name)?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Slide part names in the order the presentation lists them.
fn slide_parts<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>, ExtractionError> {
    let presentation = read_part(archive, PRESENTATION_PART)?;
    let slide_ids = slide_relationship_ids(&presentation)?;

    if !slide_ids.is_empty() {
        let rels = read_part(archive, PRESENTATION_RELS_PART)?;
        let targets = relationship_targets(&rels)?;
        let ordered = slide_ids
            .iter()
            .map(|id| {
                targets.get(id).cloned().ok_or_else(|| {
                    ExtractionError::Presentation(format!("slide relationship {id} has no target"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(ordered);
    }

    let mut numbered = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|number| (number, name.to_string())))
        .collect::<Vec<_>>();
    numbered.sort_unstable();
    Ok(numbered.into_iter().map(|(_, name)| name).collect())
}

fn slide_number(part: &str) -> Option<u32> {
    part.strip_prefix(SLIDE_PREFIX)?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

fn slide_relationship_ids(presentation_xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(presentation_xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(element) | Event::Empty(element)
                if element.local_name().as_ref() == b"sldId" =>
            {
                if let Some(id) = prefixed_attribute(&element, b"id")? {
                    ids.push(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(ids)
}

fn relationship_targets(rels_xml: &str) -> Result<HashMap<String, String>, ExtractionError> {
    let mut reader = Reader::from_str(rels_xml);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(element) | Event::Empty(element)
                if element.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                for attribute in element.attributes() {
                    let attribute = attribute?;
                    match attribute.key.as_ref() {
                        b"Id" => id = Some(attribute.unescape_value()?.into_owned()),
                        b"Target" => target = Some(attribute.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, resolve_target(&target));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(targets)
}

fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{target}"),
    }
}

/// Value of a namespaced attribute such as `r:id`, ignoring the unprefixed `id`.
fn prefixed_attribute(
    element: &BytesStart<'_>,
    local_name: &[u8],
) -> Result<Option<String>, ExtractionError> {
    for attribute in element.attributes() {
        let attribute = attribute?;
        if attribute.key.prefix().is_some() && attribute.key.local_name().as_ref() == local_name {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// True when the text of any single top-level shape on the slide contains the
/// keyword. Shapes inside a group are not read.
fn slide_mentions(slide_xml: &str, keyword: &Keyword) -> Result<bool, ExtractionError> {
    let mut reader = Reader::from_str(slide_xml);
    let mut shape_text = String::new();
    let mut group_depth = 0usize;
    let mut in_shape = false;
    let mut in_text_run = false;

    loop {
        match reader.read_event()? {
            Event::Start(element) => match element.local_name().as_ref() {
                b"grpSp" => group_depth += 1,
                b"sp" if group_depth == 0 => {
                    in_shape = true;
                    shape_text.clear();
                }
                b"t" if in_shape => in_text_run = true,
                b"br" if in_shape => shape_text.push('\n'),
                _ => {}
            },
            Event::Empty(element) if in_shape && element.local_name().as_ref() == b"br" => {
                shape_text.push('\n');
            }
            Event::Text(text) if in_text_run => shape_text.push_str(&text.unescape()?),
            Event::End(element) => match element.local_name().as_ref() {
                b"grpSp" => group_depth = group_depth.saturating_sub(1),
                b"t" => in_text_run = false,
                b"p" if in_shape => shape_text.push('\n'),
                b"sp" if in_shape => {
                    in_shape = false;
                    if keyword.matches(&shape_text) {
                        return Ok(true);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(false)
}
