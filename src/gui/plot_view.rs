/// Dataset plot: original and processed rows with draggable region overlays

use egui_plot::{Line, Plot, PlotPoints, PlotUi, Points, Polygon, VLine};

use super::theme::{region_color, ThemeColors};
use crate::data::dataset::Dataset;
use crate::data::region::Span;
use crate::pipeline::controller::Edit;
use crate::pipeline::model::Pipeline;

/// Pointer distance, in pixels, at which a region edge can be grabbed
const EDGE_GRAB_PX: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Grip {
    Low,
    High,
    /// Whole region, grabbed at this x
    Body(f64),
}

/// A region being dragged on the plot
#[derive(Debug, Clone)]
struct RegionDrag {
    step: String,
    region: String,
    grip: Grip,
    start: Span,
    span: Span,
}

#[derive(Debug, Clone)]
pub struct PlotViewState {
    pub show_original: bool,
    pub show_processed: bool,
    pub show_mask: bool,
    /// Rows drawn at most for 2D datasets
    pub max_rows: usize,
    pub auto_scale: bool,
    /// Incremented on auto-scale to give the plot a fresh ID (resets zoom)
    pub plot_generation: u32,
    drag: Option<RegionDrag>,
    /// The pointer was over a region last frame: plot panning is off
    over_region: bool,
}

impl Default for PlotViewState {
    fn default() -> Self {
        Self {
            show_original: true,
            show_processed: true,
            show_mask: true,
            max_rows: 12,
            auto_scale: true,
            plot_generation: 0,
            drag: None,
            over_region: false,
        }
    }
}

impl PlotViewState {
    pub fn reset_zoom(&mut self) {
        self.auto_scale = true;
    }
}

/// What the plot asks of the controller this frame
#[derive(Debug, Default)]
pub struct PlotViewResponse {
    pub edit: Option<Edit>,
    /// Visible x range
    pub view: Option<(f64, f64)>,
}

/// Row indices to draw, evenly spread over the dataset
fn sampled_rows(rows: usize, max_rows: usize) -> Vec<usize> {
    if rows <= max_rows.max(1) {
        return (0..rows).collect();
    }
    let step = rows as f64 / max_rows as f64;
    (0..max_rows).map(|i| (i as f64 * step) as usize).collect()
}

fn y_extent(dataset: &Dataset) -> (f64, f64) {
    let values = dataset
        .processed_data
        .iter()
        .flatten()
        .chain(dataset.data.iter())
        .filter(|v| v.is_finite());
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    });
    if lo.is_finite() && hi.is_finite() && hi > lo {
        (lo, hi)
    } else {
        (-1.0, 1.0)
    }
}

fn row_line<'a>(x: &'a [f64], y: &'a [f64]) -> PlotPoints<'a> {
    x.iter().zip(y.iter()).map(|(&x, &y)| [x, y]).collect()
}

fn masked_points(x: &[f64], y: &[f64], mask: &[bool]) -> Vec<[f64; 2]> {
    x.iter()
        .zip(y.iter())
        .zip(mask.iter())
        .filter(|(_, &m)| m)
        .map(|((&x, &y), _)| [x, y])
        .collect()
}

/// Which part of `span` the plot x value `x` is on, if any
fn grip_at(span: Span, x: f64, tolerance: f64) -> Option<Grip> {
    let (lo, hi) = span.ordered();
    if (x - lo).abs() <= tolerance {
        Some(Grip::Low)
    } else if (x - hi).abs() <= tolerance {
        Some(Grip::High)
    } else if x > lo && x < hi {
        Some(Grip::Body(x))
    } else {
        None
    }
}

fn dragged_span(start: Span, grip: Grip, x: f64) -> Span {
    let (lo, hi) = start.ordered();
    match grip {
        Grip::Low => Span::new(x.min(hi), x.max(hi)),
        Grip::High => Span::new(lo.min(x), lo.max(x)),
        Grip::Body(anchor) => Span::new(lo + x - anchor, hi + x - anchor),
    }
}

pub fn show_plot(
    ui: &mut egui::Ui,
    dataset: &Dataset,
    pipeline: Option<&Pipeline>,
    state: &mut PlotViewState,
    colors: &ThemeColors,
) -> PlotViewResponse {
    let mut response = PlotViewResponse::default();

    if dataset.is_empty() {
        ui.centered_and_justified(|ui| {
            ui.heading("Dataset is empty");
        });
        return response;
    }

    let (rows, cols) = dataset.shape();
    let has_processed = dataset.processed_data.is_some();

    // Controls above the plot
    ui.horizontal(|ui| {
        ui.checkbox(&mut state.show_original, "Original");
        ui.add_enabled(has_processed, egui::Checkbox::new(&mut state.show_processed, "Processed"));
        ui.checkbox(&mut state.show_mask, "Masked points");
        ui.separator();
        if ui.button("⊞ Auto Scale").clicked() {
            state.auto_scale = true;
        }
        ui.separator();
        ui.label(format!("{} | {}×{} | {}", dataset.title, rows, cols, dataset.x.label()));
        if let Some(drag) = &state.drag {
            ui.separator();
            ui.colored_label(colors.selection_stroke, format!("↔ {}  {}", drag.region, drag.span));
        }
    });

    let overlays: Vec<(String, String, Span, egui::Color32)> = pipeline
        .map(|p| {
            p.visible_overlays()
                .map(|(step, item)| {
                    let span = match &state.drag {
                        Some(d) if d.step == step && d.region == item.param => d.span,
                        _ => item.overlay.span,
                    };
                    (
                        step.to_string(),
                        item.param.clone(),
                        span,
                        region_color(item.overlay.color, item.overlay.hovered),
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    if state.auto_scale {
        state.plot_generation = state.plot_generation.wrapping_add(1);
    }
    state.auto_scale = false;

    let (y_lo, y_hi) = y_extent(dataset);
    let margin = (y_hi - y_lo) * 0.05;
    let lines = sampled_rows(rows, state.max_rows);
    let processed_x = &dataset.processed_coord().values;

    let plot = Plot::new(format!("dataset_plot_{}", state.plot_generation))
        .height(ui.available_height() - 4.0)
        .x_axis_label(dataset.x.label())
        .y_axis_label(dataset.units.as_str())
        .allow_drag(!state.over_region && state.drag.is_none())
        .allow_zoom(true)
        .allow_scroll(true)
        .allow_boxed_zoom(state.drag.is_none())
        .show_grid([true, false])
        .legend(
            egui_plot::Legend::default()
                .position(egui_plot::Corner::RightTop)
                .background_alpha(0.6),
        );

    let plot_resp = plot.show(ui, |plot_ui: &mut PlotUi| {
        for (n, &r) in lines.iter().enumerate() {
            if state.show_original {
                let line = Line::new(row_line(&dataset.x.values, dataset.row(r)))
                    .color(colors.original_line)
                    .width(0.9);
                let line = if n == 0 { line.name("Original") } else { line };
                plot_ui.line(line);
            }

            if state.show_processed {
                if let Some(values) = dataset.processed_row(r) {
                    let line = Line::new(row_line(processed_x, values))
                        .color(colors.processed_line)
                        .width(1.2);
                    let line = if n == 0 { line.name("Processed") } else { line };
                    plot_ui.line(line);
                }
            }

            if state.show_mask {
                let (x, y, mask) = match (dataset.processed_row(r), dataset.processed_mask_row(r)) {
                    (Some(values), Some(mask)) if state.show_processed => {
                        (processed_x.as_slice(), values, mask)
                    }
                    _ => (dataset.x.values.as_slice(), dataset.row(r), dataset.mask_row(r)),
                };
                let pts = masked_points(x, y, mask);
                if !pts.is_empty() {
                    let points = Points::new(PlotPoints::from(pts))
                        .color(colors.masked_points)
                        .radius(1.8);
                    let points = if n == 0 { points.name("Masked") } else { points };
                    plot_ui.points(points);
                }
            }
        }

        // Region overlays
        for (_, region, span, color) in &overlays {
            let (lo, hi) = span.ordered();
            let corners = vec![
                [lo, y_lo - margin],
                [hi, y_lo - margin],
                [hi, y_hi + margin],
                [lo, y_hi + margin],
            ];
            plot_ui.polygon(
                Polygon::new(PlotPoints::from(corners))
                    .fill_color(*color)
                    .stroke(egui::Stroke::NONE)
                    .name(region),
            );
            let edge = color.to_opaque();
            plot_ui.vline(VLine::new(lo).color(edge).width(1.0));
            plot_ui.vline(VLine::new(hi).color(edge).width(1.0));
        }
    });

    let transform = &plot_resp.transform;
    let bounds = transform.bounds();
    response.view = Some((bounds.min()[0], bounds.max()[0]));

    let tolerance = EDGE_GRAB_PX * transform.dvalue_dpos()[0].abs();
    let pointer_x = plot_resp
        .response
        .hover_pos()
        .or_else(|| plot_resp.response.interact_pointer_pos())
        .map(|pos| transform.value_from_position(pos).x);

    let hit = pointer_x.and_then(|x| {
        overlays
            .iter()
            .rev()
            .find_map(|(step, region, span, _)| {
                grip_at(*span, x, tolerance).map(|g| (step, region, *span, g))
            })
    });
    state.over_region = hit.is_some();

    if let Some((_, _, _, grip)) = &hit {
        let icon = match grip {
            Grip::Low | Grip::High => egui::CursorIcon::ResizeHorizontal,
            Grip::Body(_) => egui::CursorIcon::Grab,
        };
        ui.ctx().set_cursor_icon(icon);
    }

    if plot_resp.response.drag_started() {
        if let Some((step, region, span, grip)) = &hit {
            state.drag = Some(RegionDrag {
                step: step.to_string(),
                region: region.to_string(),
                grip: *grip,
                start: *span,
                span: *span,
            });
        }
    }

    if let (Some(drag), Some(x)) = (state.drag.as_mut(), pointer_x) {
        if plot_resp.response.dragged() {
            drag.span = dragged_span(drag.start, drag.grip, x);
        }
    }

    if plot_resp.response.drag_stopped() {
        if let Some(drag) = state.drag.take() {
            if drag.span != drag.start {
                response.edit = Some(Edit::DragRegion {
                    step: drag.step,
                    region: drag.region,
                    span: drag.span,
                });
            }
        }
    } else if plot_resp.response.clicked() {
        if let Some((step, region, _, _)) = hit {
            response.edit = Some(Edit::SelectRegion {
                step: step.clone(),
                region: region.clone(),
            });
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_sampled_evenly() {
        assert_eq!(sampled_rows(3, 12), vec![0, 1, 2]);
        assert_eq!(sampled_rows(100, 4), vec![0, 25, 50, 75]);
    }

    #[test]
    fn row_line_pairs_coordinates() {
        let x = [0.0, 1.0, 2.0];
        let y = [5.0, 6.0];
        let points = row_line(&x, &y);
        let pairs: Vec<[f64; 2]> = points.points().iter().map(|p| [p.x, p.y]).collect();
        assert_eq!(pairs, vec![[0.0, 5.0], [1.0, 6.0]]);
    }

    #[test]
    fn edges_win_over_body() {
        let span = Span::new(10.0, 20.0);
        assert_eq!(grip_at(span, 10.2, 0.5), Some(Grip::Low));
        assert_eq!(grip_at(span, 19.9, 0.5), Some(Grip::High));
        assert_eq!(grip_at(span, 15.0, 0.5), Some(Grip::Body(15.0)));
        assert_eq!(grip_at(span, 25.0, 0.5), None);
    }

    #[test]
    fn dragging_keeps_spans_ordered() {
        let start = Span::new(10.0, 20.0);
        assert_eq!(dragged_span(start, Grip::Low, 25.0), Span::new(20.0, 25.0));
        assert_eq!(dragged_span(start, Grip::High, 12.0), Span::new(10.0, 12.0));
        assert_eq!(dragged_span(start, Grip::Body(15.0), 17.0), Span::new(12.0, 22.0));
    }

    #[test]
    fn masked_points_follow_the_mask() {
        let pts = masked_points(&[1.0, 2.0, 3.0], &[5.0, 6.0, 7.0], &[false, true, true]);
        assert_eq!(pts, vec![[2.0, 6.0], [3.0, 7.0]]);
    }
}
