//! Page layout for quotation documents.
//!
//! Produces positioned drawing operations on US Letter pages, origin at the
//! bottom-left corner, units in points. Nothing here knows about PDF syntax;
//! see [`crate::pdf`] for encoding.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ banner: Quotation Report     │
//! │ Quotation N        date/ref  │
//! │ From:            To:         │
//! │ ...              ...         │
//! │ ┌ table header ────────────┐ │
//! │ │ rows ... (may continue)  │ │
//! │ └ subtotal/tax/disc/total ─┘ │
//! │ terms (last page only)       │
//! └──────────────────────────────┘
//! ```

use crate::fonts::Font;
use crate::table::{ItemTable, HEADER};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
const INCH: f32 = 72.0;
const MARGIN: f32 = INCH;

const BANNER_HEIGHT: f32 = INCH;
const ADDRESS_TOP: f32 = PAGE_HEIGHT - 1.5 * INCH;
const ADDRESS_LEADING: f32 = 0.18 * INCH;
const RECIPIENT_X: f32 = 4.5 * INCH;

const COLUMN_WIDTHS: [f32; 4] = [3.0 * INCH, 1.0 * INCH, 1.25 * INCH, 1.25 * INCH];
const HEADER_HEIGHT: f32 = 24.0;
const ROW_HEIGHT: f32 = 18.0;
const CELL_PADDING: f32 = 6.0;
const TABLE_GAP: f32 = 0.5 * INCH;
const TABLE_FONT_SIZE: f32 = 10.0;

const TERMS_FONT_SIZE: f32 = 9.0;
const TERMS_LEADING: f32 = 1.2 * TERMS_FONT_SIZE;
const TERMS_BOTTOM: f32 = 0.5 * INCH;
const FOOTER_GAP: f32 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

pub const NAVY: Rgb = Rgb(0.0, 0.2, 0.4);
pub const ALICE_BLUE: Rgb = Rgb(0.941, 0.973, 1.0);
pub const WHITE_SMOKE: Rgb = Rgb(0.961, 0.961, 0.961);
pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);
pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
pub const RED: Rgb = Rgb(1.0, 0.0, 0.0);

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
        line_width: f32,
    },
    Text {
        x: f32,
        y: f32,
        font: Font,
        size: f32,
        color: Rgb,
        text: String,
    },
}

impl DrawOp {
    fn text(x: f32, y: f32, font: Font, size: f32, color: Rgb, text: impl Into<String>) -> Self {
        DrawOp::Text {
            x,
            y,
            font,
            size,
            color,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// All text drawn on this page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Baseline of the first text op equal to `needle`.
    pub fn baseline_of(&self, needle: &str) -> Option<f32> {
        self.ops.iter().find_map(|op| match op {
            DrawOp::Text { y, text, .. } if text == needle => Some(*y),
            _ => None,
        })
    }
}

/// Everything the layout prints, already resolved to strings.
#[derive(Debug, Clone)]
pub struct LayoutInput<'a> {
    pub title: &'a str,
    pub quotation_number: Option<u64>,
    /// Right-aligned line under the banner (issue date, reference)
    pub meta_line: Option<String>,
    pub issuer_lines: Vec<String>,
    pub recipient_lines: Vec<String>,
    pub table: &'a ItemTable,
    pub terms: &'a str,
}

/// Most lines an address block may hold; longer blocks would push the table
/// off the first page.
pub const MAX_PARTY_LINES: usize = 20;

/// Lowest point any row or terms line may reach; the page footer sits below.
const BODY_FLOOR: f32 = TERMS_BOTTOM + FOOTER_GAP;

/// Lay out a quotation over as many pages as its rows and terms need.
///
/// Terms sit at the bottom of the last table page when they fit below the
/// final row; otherwise they flow onto trailing pages of their own.
pub fn layout(input: &LayoutInput<'_>) -> Vec<Page> {
    let terms: Vec<&str> = input.terms.lines().collect();

    let mut pages = Vec::new();
    let mut page = Page::default();

    draw_banner(&mut page, input);
    let blocks_bottom = draw_address_blocks(&mut page, input);

    let mut y = blocks_bottom - TABLE_GAP;
    draw_header_row(&mut page, y);
    y -= HEADER_HEIGHT;

    let item_rows = input.table.lines.iter().map(|line| (line.cells(), false));
    let summary_rows = input
        .table
        .summary_rows()
        .into_iter()
        .enumerate()
        .map(|(i, (label, amount))| ([String::new(), String::new(), label, amount], i == 3));

    for (cells, emphasized) in item_rows.chain(summary_rows) {
        if y - ROW_HEIGHT < BODY_FLOOR {
            pages.push(std::mem::take(&mut page));
            y = draw_continuation_heading(&mut page, input.title);
            draw_header_row(&mut page, y);
            y -= HEADER_HEIGHT;
        }
        draw_body_row(&mut page, y, &cells, emphasized);
        y -= ROW_HEIGHT;
    }

    let terms_top = terms_first_baseline(terms.len());
    if terms_top + TERMS_FONT_SIZE + FOOTER_GAP <= y {
        draw_terms(&mut page, &terms, terms_top);
    } else {
        let mut remaining = terms.as_slice();
        while !remaining.is_empty() {
            pages.push(std::mem::take(&mut page));
            let top = draw_continuation_heading(&mut page, input.title);
            let first_baseline = top - TERMS_FONT_SIZE;
            let (now, rest) = remaining.split_at(terms_capacity(first_baseline).min(remaining.len()));
            draw_terms(&mut page, now, first_baseline);
            remaining = rest;
        }
    }
    pages.push(page);

    let total = pages.len();
    if total > 1 {
        for (i, page) in pages.iter_mut().enumerate() {
            let label = format!("Page {} of {}", i + 1, total);
            let x = PAGE_WIDTH - MARGIN - Font::Regular.text_width(&label, 8.0);
            page.ops.push(DrawOp::text(x, TERMS_BOTTOM / 2.0, Font::Regular, 8.0, BLACK, label));
        }
    }
    pages
}

/// Baseline of the first terms line when the block ends at the bottom margin.
fn terms_first_baseline(line_count: usize) -> f32 {
    let needed = TERMS_BOTTOM + line_count.saturating_sub(1) as f32 * TERMS_LEADING;
    needed.max(INCH)
}

/// Terms lines that fit between `first_baseline` and the bottom margin.
fn terms_capacity(first_baseline: f32) -> usize {
    ((first_baseline - TERMS_BOTTOM) / TERMS_LEADING).floor().max(0.0) as usize + 1
}

fn draw_banner(page: &mut Page, input: &LayoutInput<'_>) {
    page.ops.push(DrawOp::FillRect {
        x: 0.0,
        y: PAGE_HEIGHT - BANNER_HEIGHT,
        width: PAGE_WIDTH,
        height: BANNER_HEIGHT,
        color: NAVY,
    });
    page.ops.push(DrawOp::text(
        MARGIN,
        PAGE_HEIGHT - 0.7 * INCH,
        Font::Bold,
        24.0,
        WHITE,
        input.title,
    ));

    if let Some(number) = input.quotation_number {
        page.ops.push(DrawOp::text(
            MARGIN,
            PAGE_HEIGHT - 1.1 * INCH,
            Font::Bold,
            18.0,
            RED,
            format!("Quotation {}", number),
        ));
    }

    if let Some(meta) = &input.meta_line {
        let x = PAGE_WIDTH - MARGIN - Font::Regular.text_width(meta, 9.0);
        page.ops.push(DrawOp::text(x, PAGE_HEIGHT - 1.1 * INCH, Font::Regular, 9.0, BLACK, meta.as_str()));
    }
}

/// Draw "From:" and "To:" side by side. Returns the baseline below the
/// longer block.
fn draw_address_blocks(page: &mut Page, input: &LayoutInput<'_>) -> f32 {
    let from_end = draw_address_block(page, MARGIN, "From:", &input.issuer_lines);
    let to_end = draw_address_block(page, RECIPIENT_X, "To:", &input.recipient_lines);
    from_end.min(to_end)
}

fn draw_address_block(page: &mut Page, x: f32, heading: &str, lines: &[String]) -> f32 {
    page.ops.push(DrawOp::text(x, ADDRESS_TOP, Font::Bold, 12.0, BLACK, heading));

    if lines.len() > MAX_PARTY_LINES {
        tracing::warn!(
            heading,
            lines = lines.len(),
            kept = MAX_PARTY_LINES,
            "address block truncated"
        );
    }

    let mut y = ADDRESS_TOP - 0.2 * INCH;
    for line in lines.iter().take(MAX_PARTY_LINES) {
        page.ops.push(DrawOp::text(x, y, Font::Regular, 10.0, BLACK, line.as_str()));
        y -= ADDRESS_LEADING;
    }
    y
}

fn draw_continuation_heading(page: &mut Page, title: &str) -> f32 {
    let y = PAGE_HEIGHT - MARGIN;
    page.ops.push(DrawOp::text(
        MARGIN,
        y,
        Font::Bold,
        12.0,
        NAVY,
        format!("{} (continued)", title),
    ));
    y - 0.3 * INCH
}

fn draw_header_row(page: &mut Page, top: f32) {
    let mut x = MARGIN;
    for (label, width) in HEADER.iter().zip(COLUMN_WIDTHS) {
        let bottom = top - HEADER_HEIGHT;
        page.ops.push(DrawOp::FillRect { x, y: bottom, width, height: HEADER_HEIGHT, color: NAVY });
        page.ops.push(grid_cell(x, bottom, width, HEADER_HEIGHT));
        page.ops.push(DrawOp::text(
            x + CELL_PADDING,
            bottom + 12.0,
            Font::Bold,
            TABLE_FONT_SIZE,
            WHITE_SMOKE,
            *label,
        ));
        x += width;
    }
}

fn draw_body_row(page: &mut Page, top: f32, cells: &[String; 4], emphasized: bool) {
    let bottom = top - ROW_HEIGHT;
    let font = if emphasized { Font::Bold } else { Font::Regular };
    let mut x = MARGIN;

    for (column, (text, width)) in cells.iter().zip(COLUMN_WIDTHS).enumerate() {
        page.ops.push(DrawOp::FillRect { x, y: bottom, width, height: ROW_HEIGHT, color: ALICE_BLUE });
        page.ops.push(grid_cell(x, bottom, width, ROW_HEIGHT));

        if !text.is_empty() {
            let text_x = if column == 0 {
                x + CELL_PADDING
            } else {
                x + (width - font.text_width(text, TABLE_FONT_SIZE)) / 2.0
            };
            page.ops.push(DrawOp::text(text_x, bottom + 5.5, font, TABLE_FONT_SIZE, BLACK, text.as_str()));
        }
        x += width;
    }
}

fn grid_cell(x: f32, y: f32, width: f32, height: f32) -> DrawOp {
    DrawOp::StrokeRect {
        x,
        y,
        width,
        height,
        color: BLACK,
        line_width: 1.0,
    }
}

fn draw_terms(page: &mut Page, lines: &[&str], first_baseline: f32) {
    let mut y = first_baseline;
    for line in lines {
        page.ops.push(DrawOp::text(MARGIN, y, Font::Regular, TERMS_FONT_SIZE, BLACK, *line));
        y -= TERMS_LEADING;
    }
}
