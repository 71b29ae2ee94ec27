#[cfg(test)]
#[path = "print_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;

use super::Pagination;
use crate::domain::models::Sheet;
use crate::domain::models::SheetPair;
use crate::domain::models::SheetSide;
use crate::domain::models::Slot;

pub const PRINT_FILE_NAME: &str = "print.html";

const SLOT_STYLE: &str = "border: 1px dashed #ccc; width: 8cm; height: 12cm; position: relative; box-sizing: border-box;";
const IMAGE_STYLE: &str = "width: 100%; height: 100%; object-fit: cover;";
const LABEL_STYLE: &str = "position: absolute; bottom: 10px; left: 0; right: 0; margin: 0; text-align: center; font-family: 'Roboto Slab', serif; color: #FFD700; font-size: 18pt; text-shadow: 0 0 5px black;";

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }

    return escaped;
}

fn render_slot(index: usize, slot: &Slot) -> String {
    let (row, column) = Sheet::position(index);
    let placement = format!("grid-row: {}; grid-column: {};", row + 1, column + 1);

    match slot {
        Slot::Card(card) => {
            let label = escape_html(card.label());
            return format!(
                "<div class=\"slot card\" style=\"{SLOT_STYLE} {placement}\"><img src=\"{src}\" alt=\"{label}\" style=\"{IMAGE_STYLE}\"><h3 style=\"{LABEL_STYLE}\">{label}</h3></div>",
                src = card.current_image().to_data_url(),
            );
        }
        Slot::Back(image) => {
            return format!(
                "<div class=\"slot back\" style=\"{SLOT_STYLE} {placement}\"><img src=\"{src}\" alt=\"Card back\" style=\"{IMAGE_STYLE}\"></div>",
                src = image.to_data_url(),
            );
        }
        Slot::Placeholder => {
            return format!("<div class=\"slot empty\" style=\"{SLOT_STYLE} {placement}\"></div>");
        }
    }
}

fn render_sheet(sheet: &Sheet) -> String {
    let side = match sheet.side {
        SheetSide::Front => "front",
        SheetSide::Back => "back",
    };
    let slots = sheet
        .slots
        .iter()
        .enumerate()
        .map(|(index, slot)| return render_slot(index, slot))
        .collect::<Vec<String>>()
        .join("\n      ");

    return format!(
        "  <div class=\"print-page {side}\">\n    <div class=\"grid\">\n      {slots}\n    </div>\n  </div>"
    );
}

/// Renders sheet pairs as a standalone HTML document with one A4 page per
/// sheet, ready to be printed duplex from a browser.
pub fn render_print_document(pairs: &[SheetPair], title: &str) -> Result<String> {
    if pairs.is_empty() {
        bail!("There is nothing to print yet. Generate some cards first.");
    }

    let pages = Pagination::print_order(pairs)
        .into_iter()
        .map(|sheet| return render_sheet(sheet))
        .collect::<Vec<String>>()
        .join("\n");

    let title = escape_html(title);
    let document = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <link href="https://fonts.googleapis.com/css2?family=Roboto+Slab:wght@400;700&display=swap" rel="stylesheet">
  <style>
    @page {{ size: A4; margin: 0; }}
    body {{ margin: 0; font-family: 'Roboto Slab', serif; -webkit-print-color-adjust: exact !important; print-color-adjust: exact !important; }}
    .print-page {{ page-break-after: always; width: 210mm; height: 297mm; box-sizing: border-box; overflow: hidden; display: flex; justify-content: center; align-items: center; }}
    .grid {{ display: grid; grid-template-columns: repeat(2, 1fr); gap: 0.5cm; }}
  </style>
</head>
<body>
{pages}
</body>
</html>
"#
    );

    return Ok(document);
}
