use config::LayoutConfig;
use ratatui::layout::Rect;

/// Window borders on each side of a column
const BORDERS: u16 = 2;
const STATUS_HEIGHT: u16 = 1;

/// Placement of every window for one terminal size.
///
/// Widths in `sidebar_width` and `main_width` are content widths, excluding
/// the window borders; the rects are outer window areas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLayout {
    pub sidebar_width: u16,
    pub main_width: u16,
    pub sidebar: Vec<Rect>,
    pub source: Rect,
    pub output: Rect,
    pub status: Rect,
}

impl AppLayout {
    pub fn compute(width: u16, height: u16, panels: usize, config: &LayoutConfig) -> Self {
        let fraction = u32::from(width) * u32::from(config.sidebar_fraction_percent) / 100;
        let sidebar_width =
            (fraction as u16).clamp(config.sidebar_min_width, config.sidebar_max_width);
        let main_width = width.saturating_sub(sidebar_width + 2 * BORDERS);

        let status_height = STATUS_HEIGHT.min(height);
        let body = height - status_height;
        let sidebar_outer = (sidebar_width + BORDERS).min(width);
        let main_x = sidebar_outer;
        let main_outer = width - sidebar_outer;

        let sidebar = split_evenly(body, panels)
            .scan(0u16, |y, h| {
                let rect = Rect::new(0, *y, sidebar_outer, h);
                *y += h;
                Some(rect)
            })
            .collect();

        let source_height = (u32::from(body) * u32::from(config.source_percent) / 100) as u16;
        let output_height = body - source_height;

        Self {
            sidebar_width,
            main_width,
            sidebar,
            source: Rect::new(main_x, 0, main_outer, source_height),
            output: Rect::new(main_x, source_height, main_outer, output_height),
            status: Rect::new(0, body, width, status_height),
        }
    }
}

/// Heights summing to `total`, earlier panels taking the remainder
fn split_evenly(total: u16, parts: usize) -> impl Iterator<Item = u16> {
    let parts = parts.max(1) as u16;
    let base = total / parts;
    let remainder = total % parts;
    (0..parts).map(move |i| base + u16::from(i < remainder))
}
