//! Modal composition: a screen drawn centered over a frozen snapshot of
//! the screen it was opened from.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect, Size};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Clear, Widget};

use crate::tui::screen::Screen;

/// Rect of `size` centered in `outer`, clamped to fit.
pub fn centered_rect(size: Size, outer: Rect) -> Rect {
    let width = size.width.min(outer.width);
    let height = size.height.min(outer.height);
    let [_, center_v, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width),
        Constraint::Fill(1),
    ])
    .areas(center_v);
    center
}

/// Where `modal` is drawn inside `area`.
pub fn modal_area(modal: &dyn Screen, area: Rect) -> Rect {
    centered_rect(modal.preferred_size(area.as_size()), area)
}

/// Copies the dimmed backdrop into `area`, then draws `modal` on top.
pub fn compose(backdrop: Option<&Buffer>, modal: &mut dyn Screen, area: Rect, buf: &mut Buffer) {
    if let Some(backdrop) = backdrop {
        copy_dimmed(backdrop, area, buf);
    }
    let rect = modal_area(modal, area);
    Clear.render(rect, buf);
    modal.render(rect, buf);
}

fn copy_dimmed(src: &Buffer, area: Rect, dst: &mut Buffer) {
    let region = src.area.intersection(area).intersection(dst.area);
    let dim = Style::default().add_modifier(Modifier::DIM);
    for y in region.top()..region.bottom() {
        for x in region.left()..region.right() {
            if let (Some(from), Some(to)) = (src.cell((x, y)), dst.cell_mut((x, y))) {
                *to = from.clone();
                to.set_style(dim);
            }
        }
    }
}
