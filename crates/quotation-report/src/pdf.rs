//! PDF encoding of laid-out pages with lopdf.
use crate::fonts::{encode_win_ansi, Font};
use crate::layout::{DrawOp, Page, Rgb, PAGE_HEIGHT, PAGE_WIDTH};
use crate::RenderError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

/// Document-level metadata written to the trailer `Info` dictionary.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: String,
    pub subject: Option<String>,
}

/// Serialize pages to PDF 1.5 bytes using the standard Helvetica fonts.
pub fn encode(pages: &[Page], info: &DocumentInfo) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for font in [Font::Regular, Font::Bold] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page_operations(page),
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().map_err(|e| RenderError::Encode(e.to_string()))?,
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
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
            "Resources" => resources_id,
            "MediaBox" => Object::Array(vec![0.0f32.into(), 0.0f32.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()]),
        }),
    );

    let mut info_dict = dictionary! {
        "Title" => Object::String(encode_win_ansi(&info.title), StringFormat::Literal),
        "Producer" => Object::string_literal("quotation-report"),
    };
    if let Some(subject) = &info.subject {
        info_dict.set("Subject", Object::String(encode_win_ansi(subject), StringFormat::Literal));
    }
    let info_id = doc.add_object(info_dict);

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(bytes)
}

fn color_operands(color: Rgb) -> Vec<Object> {
    vec![color.0.into(), color.1.into(), color.2.into()]
}

fn page_operations(page: &Page) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(page.ops.len() * 4);

    for op in &page.ops {
        match op {
            DrawOp::FillRect { x, y, width, height, color } => {
                ops.push(Operation::new("rg", color_operands(*color)));
                ops.push(Operation::new("re", vec![(*x).into(), (*y).into(), (*width).into(), (*height).into()]));
                ops.push(Operation::new("f", vec![]));
            }
            DrawOp::StrokeRect { x, y, width, height, color, line_width } => {
                ops.push(Operation::new("RG", color_operands(*color)));
                ops.push(Operation::new("w", vec![(*line_width).into()]));
                ops.push(Operation::new("re", vec![(*x).into(), (*y).into(), (*width).into(), (*height).into()]));
                ops.push(Operation::new("S", vec![]));
            }
            DrawOp::Text { x, y, font, size, color, text } => {
                ops.push(Operation::new("rg", color_operands(*color)));
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![Object::Name(font.resource().as_bytes().to_vec()), (*size).into()],
                ));
                ops.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
        }
    }
    ops
}
