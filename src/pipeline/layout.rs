//! Layout reconstruction: positioned text runs → lines → paragraphs and tables.
//!
//! pdfium hands back text as runs with bounding boxes in PDF user space
//! (points, origin bottom-left). This module rebuilds reading order from
//! geometry alone:
//!
//! 1. Runs whose vertical extents overlap belong to the same line.
//! 2. Inside a line, a horizontal gap much wider than a space starts a new
//!    cell; a gap about one space wide becomes a space.
//! 3. Consecutive lines with the same number of cells (two or more) form a
//!    table.
//! 4. Other lines are grouped into paragraphs, broken on vertical gaps
//!    larger than the usual line spacing.
//!
//! Everything here is a pure function of its input, so it is tested without
//! pdfium.

use crate::backend::{PageContent, PageImage, TextRun};
use crate::pipeline::postprocess::{clean_text, join_lines};

/// A horizontal gap at least this many average character widths wide
/// separates two cells of a line.
const CELL_GAP_CHARS: f32 = 2.5;
/// Absolute lower bound for a cell gap, in points.
const MIN_CELL_GAP_PT: f32 = 12.0;
/// A gap wider than this fraction of the line height inserts a space.
const WORD_GAP_RATIO: f32 = 0.15;
/// A vertical gap wider than this fraction of the line height starts a
/// new paragraph.
const PARAGRAPH_GAP_RATIO: f32 = 0.8;

/// One visual line of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    /// Text of each cell, left to right. Plain lines have one cell.
    pub cells: Vec<String>,
}

impl Line {
    pub fn height(&self) -> f32 {
        (self.top - self.bottom).max(1.0)
    }

    pub fn text(&self) -> String {
        self.cells.join(" ")
    }
}

/// A unit of content written to the Word document.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(String),
    /// Rows of cell text; every row has the same number of cells.
    Table(Vec<Vec<String>>),
    Image(PageImage),
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutOptions {
    pub detect_tables: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self { detect_tables: true }
    }
}

/// Lay out one page: text blocks in reading order, then the page's images.
pub fn layout_page(page: PageContent, options: LayoutOptions) -> Vec<Block> {
    let lines = group_lines(&page.runs);
    let mut blocks = reflow(&lines, options);
    blocks.extend(page.images.into_iter().map(Block::Image));
    blocks
}

/// Group runs into lines, top of the page first.
pub fn group_lines(runs: &[TextRun]) -> Vec<Line> {
    let mut sorted: Vec<&TextRun> = runs.iter().filter(|r| !r.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| b.top.total_cmp(&a.top).then(a.left.total_cmp(&b.left)));

    let mut rows: Vec<Vec<&TextRun>> = Vec::new();
    for run in sorted {
        match rows.iter_mut().rev().find(|row| same_line(row, run)) {
            Some(row) => row.push(run),
            None => rows.push(vec![run]),
        }
    }

    let mut lines: Vec<Line> = rows.into_iter().map(build_line).collect();
    lines.sort_by(|a, b| b.top.total_cmp(&a.top));
    lines
}

fn same_line(row: &[&TextRun], run: &TextRun) -> bool {
    let top = row.iter().map(|r| r.top).fold(f32::MIN, f32::max);
    let bottom = row.iter().map(|r| r.bottom).fold(f32::MAX, f32::min);
    let overlap = top.min(run.top) - bottom.max(run.bottom);
    let smaller = (top - bottom).min(run.height()).max(1.0);
    overlap >= 0.5 * smaller
}

fn build_line(mut runs: Vec<&TextRun>) -> Line {
    runs.sort_by(|a, b| a.left.total_cmp(&b.left));

    let top = runs.iter().map(|r| r.top).fold(f32::MIN, f32::max);
    let bottom = runs.iter().map(|r| r.bottom).fold(f32::MAX, f32::min);
    let left = runs.first().map(|r| r.left).unwrap_or_default();
    let height = (top - bottom).max(1.0);

    let mut cells: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_right: Option<f32> = None;

    for run in runs {
        let text = run.text.trim();
        if let Some(right) = prev_right {
            let gap = run.left - right;
            if gap >= cell_gap(run) {
                cells.push(std::mem::take(&mut current));
            } else if gap > WORD_GAP_RATIO * height
                && !current.ends_with(' ')
                && !current.is_empty()
            {
                current.push(' ');
            }
        }
        current.push_str(text);
        prev_right = Some(run.right);
    }
    cells.push(current);

    Line {
        top,
        bottom,
        left,
        cells: cells
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect(),
    }
}

fn cell_gap(run: &TextRun) -> f32 {
    let chars = run.text.trim().chars().count().max(1) as f32;
    let char_width = (run.right - run.left).abs() / chars;
    (CELL_GAP_CHARS * char_width).max(MIN_CELL_GAP_PT)
}

/// Turn lines into paragraphs and tables.
pub fn reflow(lines: &[Line], options: LayoutOptions) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut prev: Option<&Line> = None;
    let mut i = 0;

    while i < lines.len() {
        if options.detect_tables {
            let rows = table_run_len(&lines[i..]);
            if rows >= 2 {
                flush_paragraph(&mut paragraph, &mut blocks);
                let table = lines[i..i + rows]
                    .iter()
                    .map(|l| l.cells.iter().map(|c| clean_text(c)).collect())
                    .collect();
                blocks.push(Block::Table(table));
                prev = None;
                i += rows;
                continue;
            }
        }

        let line = &lines[i];
        if let Some(p) = prev {
            if starts_paragraph(p, line) {
                flush_paragraph(&mut paragraph, &mut blocks);
            }
        }
        paragraph.push(line.text());
        prev = Some(line);
        i += 1;
    }
    flush_paragraph(&mut paragraph, &mut blocks);
    blocks
}

/// Number of leading lines that share one cell count of at least two.
fn table_run_len(lines: &[Line]) -> usize {
    let Some(first) = lines.first() else {
        return 0;
    };
    let columns = first.cells.len();
    if columns < 2 {
        return 0;
    }
    lines
        .iter()
        .take_while(|l| l.cells.len() == columns)
        .count()
}

fn starts_paragraph(prev: &Line, line: &Line) -> bool {
    let gap = prev.bottom - line.top;
    gap > PARAGRAPH_GAP_RATIO * prev.height().max(line.height())
}

fn flush_paragraph(lines: &mut Vec<String>, blocks: &mut Vec<Block>) {
    if lines.is_empty() {
        return;
    }
    let text = clean_text(&join_lines(lines));
    lines.clear();
    if !text.is_empty() {
        blocks.push(Block::Paragraph(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, left: f32, top: f32) -> TextRun {
        // 6 pt per character, 10 pt tall
        TextRun {
            text: text.to_string(),
            left,
            right: left + 6.0 * text.chars().count() as f32,
            top,
            bottom: top - 10.0,
        }
    }

    #[test]
    fn runs_on_one_baseline_form_one_line() {
        let runs = vec![run("world", 44.0, 700.0), run("Hello", 10.0, 700.0)];
        let lines = group_lines(&runs);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].cells, vec!["Hello world"]);
    }

    #[test]
    fn lines_are_ordered_top_down() {
        let runs = vec![run("second", 10.0, 688.0), run("first", 10.0, 700.0)];
        let lines = group_lines(&runs);
        let texts: Vec<_> = lines.iter().map(Line::text).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn close_lines_join_into_one_paragraph() {
        let runs = vec![
            run("The conver-", 10.0, 700.0),
            run("sion works.", 10.0, 688.0),
        ];
        let blocks = reflow(&group_lines(&runs), LayoutOptions::default());
        assert_eq!(blocks, vec![Block::Paragraph("The conversion works.".into())]);
    }

    #[test]
    fn vertical_gap_starts_new_paragraph() {
        let runs = vec![run("First.", 10.0, 700.0), run("Second.", 10.0, 660.0)];
        let blocks = reflow(&group_lines(&runs), LayoutOptions::default());
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph("First.".into()),
                Block::Paragraph("Second.".into()),
            ]
        );
    }

    #[test]
    fn aligned_columns_become_a_table() {
        let runs = vec![
            run("Name", 10.0, 700.0),
            run("Qty", 200.0, 700.0),
            run("Apple", 10.0, 688.0),
            run("3", 200.0, 688.0),
            run("Pear", 10.0, 676.0),
            run("5", 200.0, 676.0),
        ];
        let blocks = reflow(&group_lines(&runs), LayoutOptions::default());
        assert_eq!(
            blocks,
            vec![Block::Table(vec![
                vec!["Name".to_string(), "Qty".to_string()],
                vec!["Apple".to_string(), "3".to_string()],
                vec!["Pear".to_string(), "5".to_string()],
            ])]
        );
    }

    #[test]
    fn single_wide_line_is_not_a_table() {
        let runs = vec![run("Total", 10.0, 700.0), run("42", 200.0, 700.0)];
        let blocks = reflow(&group_lines(&runs), LayoutOptions::default());
        assert_eq!(blocks, vec![Block::Paragraph("Total 42".into())]);
    }

    #[test]
    fn tables_can_be_disabled() {
        let runs = vec![
            run("a", 10.0, 700.0),
            run("b", 200.0, 700.0),
            run("c", 10.0, 688.0),
            run("d", 200.0, 688.0),
        ];
        let blocks = reflow(
            &group_lines(&runs),
            LayoutOptions {
                detect_tables: false,
            },
        );
        assert_eq!(blocks, vec![Block::Paragraph("a b c d".into())]);
    }

    #[test]
    fn images_follow_text() {
        let page = PageContent {
            index: 0,
            width: 612.0,
            height: 792.0,
            runs: vec![run("Caption", 10.0, 700.0)],
            images: vec![PageImage {
                png: vec![1, 2, 3],
                width: 10,
                height: 10,
            }],
        };
        let blocks = layout_page(page, LayoutOptions::default());
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[1], Block::Image(_)));
    }

    #[test]
    fn blank_runs_are_ignored() {
        let runs = vec![run("   ", 10.0, 700.0)];
        assert!(group_lines(&runs).is_empty());
        assert!(reflow(&[], LayoutOptions::default()).is_empty());
    }
}
