//! Measuring and allocating a flow box.
//!
//! The axis lines run along is the *item* axis, the other one the *line*
//! axis. Sizing along the item axis ignores the line axis. Sizing along the
//! line axis first decides how many children fit on a line for the given
//! item-axis extent, then sums the tallest child of every line.

use crate::distribute::{RequestedSize, distribute_natural, split_evenly};
use crate::error::Result;
use crate::geometry::Rect;
use crate::tree::{Placement, WidgetTree};
use crate::types::{Align, Orientation};
use crate::widget::{Measurement, WidgetId};

use super::FlowBox;

/// Item sizes for one line-length decision.
#[derive(Debug)]
struct Items {
    line_length: usize,
    /// Size of every column, indexed by column.
    sizes: Vec<i32>,
    /// Unused item-axis space when children do not fill their columns.
    leftover: i32,
}

struct Flow<'a> {
    tree: &'a WidgetTree,
    state: &'a FlowBox,
    children: Vec<WidgetId>,
    item_align: Align,
    line_align: Align,
}

fn fill_or(align: Align) -> Align {
    if align == Align::Baseline {
        Align::Fill
    } else {
        align
    }
}

fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

const fn align_offset(align: Align, leftover: i32) -> i32 {
    match align {
        Align::End => leftover,
        Align::Center => leftover / 2,
        _ => 0,
    }
}

impl<'a> Flow<'a> {
    fn new(tree: &'a WidgetTree, state: &'a FlowBox, halign: Align, valign: Align) -> Self {
        let (item_align, line_align) = match state.orientation {
            Orientation::Horizontal => (halign, valign),
            Orientation::Vertical => (valign, halign),
        };
        Self {
            tree,
            state,
            children: state.focusable(tree),
            item_align: fill_or(item_align),
            line_align: fill_or(line_align),
        }
    }

    const fn item_axis(&self) -> Orientation {
        self.state.orientation
    }

    const fn line_axis(&self) -> Orientation {
        self.state.orientation.opposite()
    }

    const fn item_spacing(&self) -> i32 {
        match self.state.orientation {
            Orientation::Horizontal => self.state.column_spacing,
            Orientation::Vertical => self.state.row_spacing,
        }
    }

    const fn line_spacing(&self) -> i32 {
        match self.state.orientation {
            Orientation::Horizontal => self.state.row_spacing,
            Orientation::Vertical => self.state.column_spacing,
        }
    }

    fn min_items(&self) -> usize {
        self.state.min_children_per_line.max(1)
    }

    fn max_items(&self) -> usize {
        self.state.max_children_per_line.max(self.min_items())
    }

    fn line_count(&self, line_length: usize) -> usize {
        self.children.len().div_ceil(line_length).max(1)
    }

    /// Largest minimum and natural size of any child.
    fn max_item_size(&self, orientation: Orientation, for_size: Option<i32>) -> Result<(i32, i32)> {
        let mut minimum = 0;
        let mut natural = 0;
        for child in &self.children {
            let measured = self.tree.measure(*child, orientation, for_size)?;
            minimum = minimum.max(measured.minimum);
            natural = natural.max(measured.natural);
        }
        Ok((minimum, natural))
    }

    /// First guess at the line length: as many children as fit at the
    /// largest natural size, within the configured bounds.
    fn guess_line_length(&self, avail: i32, natural_item: i32) -> usize {
        let spacing = self.item_spacing();
        let mut length = if natural_item + spacing > 0 {
            (avail / (natural_item + spacing)).max(0) as usize
        } else {
            self.max_items()
        };
        if count(length) * spacing + (count(length) + 1) * natural_item <= avail {
            length += 1;
        }
        length.clamp(self.min_items(), self.max_items())
    }

    /// Column of the child at `index`. With end alignment the short last
    /// line is pushed to the trailing columns.
    fn column_of(&self, index: usize, line_length: usize) -> usize {
        let n = self.children.len();
        let position = index % line_length;
        let extra = n % line_length;
        if self.item_align == Align::End && extra > 0 && index >= n - extra {
            position + line_length - extra
        } else {
            position
        }
    }

    /// Per-column requests when lines hold `line_length` children.
    fn aligned_requests(&self, line_length: usize) -> Result<Vec<RequestedSize>> {
        let mut sizes: Vec<RequestedSize> = (0..line_length)
            .map(|column| RequestedSize::new(column, 0, 0))
            .collect();
        for (index, child) in self.children.iter().enumerate() {
            let measured = self.tree.measure(*child, self.item_axis(), None)?;
            let column = &mut sizes[self.column_of(index, line_length)];
            column.minimum = column.minimum.max(measured.minimum);
            column.natural = column.natural.max(measured.natural);
        }
        Ok(sizes)
    }

    fn line_extent(&self, sizes: &[RequestedSize]) -> i32 {
        sizes.iter().map(|size| size.minimum).sum::<i32>()
            + (count(sizes.len()) - 1).max(0) * self.item_spacing()
    }

    /// Grow the line length from `line_length` while the aligned columns
    /// still fit in `avail`.
    fn fit_aligned(&self, avail: i32, line_length: usize) -> Result<(usize, Vec<RequestedSize>)> {
        let mut length = line_length;
        let mut sizes = self.aligned_requests(length)?;
        let mut extent = self.line_extent(&sizes);
        while extent < avail && length < self.max_items() {
            let attempt = self.aligned_requests(length + 1)?;
            extent = self.line_extent(&attempt);
            if extent > avail {
                break;
            }
            length += 1;
            sizes = attempt;
        }
        Ok((length, sizes))
    }

    /// Decide the line length and column sizes for `avail` pixels along
    /// the item axis.
    fn items(&self, avail: i32) -> Result<Items> {
        let (_, natural_item) = self.max_item_size(self.item_axis(), None)?;
        let guess = self.guess_line_length(avail, natural_item);
        let spacing = self.item_spacing();
        let fill = self.item_align == Align::Fill;

        if self.state.homogeneous {
            let length = guess;
            let mut size = ((avail - (count(length) - 1) * spacing) / count(length)).max(0);
            if !fill {
                size = size.min(natural_item);
            }
            let extra = (avail - (count(length) - 1) * spacing - size * count(length)).max(0);
            let sizes = if fill {
                split_evenly(extra, length).into_iter().map(|e| size + e).collect()
            } else {
                vec![size; length]
            };
            return Ok(Items {
                line_length: length,
                sizes,
                leftover: if fill { 0 } else { extra },
            });
        }

        let (length, mut requests) = self.fit_aligned(avail, guess)?;
        let mut extra = avail - self.line_extent(&requests);
        if extra > 0 {
            extra = distribute_natural(extra, &mut requests);
        }
        let mut sizes: Vec<i32> = requests.iter().map(|size| size.minimum).collect();
        let mut leftover = extra.max(0);
        if fill && extra > 0 {
            for (size, share) in sizes.iter_mut().zip(split_evenly(extra, length)) {
                *size += share;
            }
            leftover = 0;
        }
        Ok(Items {
            line_length: length,
            sizes,
            leftover,
        })
    }

    /// Minimum and natural line-axis size of every line.
    fn line_requests(&self, items: &Items) -> Result<Vec<RequestedSize>> {
        let mut lines: Vec<RequestedSize> = (0..self.line_count(items.line_length))
            .map(|line| RequestedSize::new(line, 0, 0))
            .collect();
        for (index, child) in self.children.iter().enumerate() {
            let column = self.column_of(index, items.line_length);
            let item_size = items.sizes.get(column).copied().unwrap_or(0);
            let measured = self.tree.measure(*child, self.line_axis(), Some(item_size))?;
            let line = &mut lines[index / items.line_length];
            line.minimum = line.minimum.max(measured.minimum);
            line.natural = line.natural.max(measured.natural);
        }
        Ok(lines)
    }

    /// Size along the item axis; never depends on the line axis.
    fn measure_items(&self) -> Result<Measurement> {
        let n = self.children.len();
        if n == 0 {
            return Ok(Measurement::default());
        }
        let spacing = self.item_spacing();
        let min_columns = self.min_items().min(n);
        let nat_columns = self.max_items().min(n);
        if self.state.homogeneous {
            let (minimum, natural) = self.max_item_size(self.item_axis(), None)?;
            return Ok(Measurement::new(
                minimum * count(min_columns) + (count(min_columns) - 1) * spacing,
                natural * count(nat_columns) + (count(nat_columns) - 1) * spacing,
            ));
        }
        let minimum = self.line_extent(&self.aligned_requests(min_columns)?);
        let natural = self
            .aligned_requests(nat_columns)?
            .iter()
            .map(|size| size.natural)
            .sum::<i32>()
            + (count(nat_columns) - 1) * spacing;
        Ok(Measurement::new(minimum, natural.max(minimum)))
    }

    /// Size along the line axis when the item axis gets `size` pixels.
    fn measure_lines(&self, size: i32) -> Result<Measurement> {
        if self.children.is_empty() {
            return Ok(Measurement::default());
        }
        let items = self.items(size)?;
        let spacing = self.line_spacing();
        if self.state.homogeneous {
            let item_size = items.sizes.iter().copied().min().unwrap_or(0);
            let (minimum, natural) = self.max_item_size(self.line_axis(), Some(item_size))?;
            let lines = count(self.line_count(items.line_length));
            return Ok(Measurement::new(
                minimum * lines + (lines - 1) * spacing,
                natural * lines + (lines - 1) * spacing,
            ));
        }
        let lines = self.line_requests(&items)?;
        let mut minimum = 0;
        let mut natural = 0;
        let mut first = true;
        for line in lines.iter().filter(|line| line.natural > 0) {
            if !first {
                minimum += spacing;
                natural += spacing;
            }
            first = false;
            minimum += line.minimum;
            natural += line.natural;
        }
        Ok(Measurement::new(minimum, natural))
    }

    fn plan(&self, content: Rect, rtl: bool) -> Result<(Vec<Placement>, usize)> {
        let n = self.children.len();
        if n == 0 {
            return Ok((Vec::new(), 1));
        }
        let (item_axis, line_axis) = (self.item_axis(), self.line_axis());
        let item_spacing = self.item_spacing();
        let line_spacing = self.line_spacing();
        let items = self.items(content.size(item_axis))?;
        let length = items.line_length;
        let n_lines = self.line_count(length);
        let other = content.size(line_axis);
        let line_fill = self.line_align == Align::Fill;

        let (lines, line_leftover) = if self.state.homogeneous {
            let item_size = items.sizes.iter().copied().min().unwrap_or(0);
            let (_, natural) = self.max_item_size(line_axis, Some(item_size))?;
            let mut size = ((other - (count(n_lines) - 1) * line_spacing) / count(n_lines)).max(0);
            if !line_fill {
                size = size.min(natural);
            }
            let extra = (other - (count(n_lines) - 1) * line_spacing - size * count(n_lines)).max(0);
            if line_fill {
                let lines = split_evenly(extra, n_lines).into_iter().map(|e| size + e).collect();
                (lines, 0)
            } else {
                (vec![size; n_lines], extra)
            }
        } else {
            let mut requests = self.line_requests(&items)?;
            let remaining = other
                - requests.iter().map(|line| line.minimum).sum::<i32>()
                - (count(n_lines) - 1) * line_spacing;
            let extra = if remaining > 0 {
                distribute_natural(remaining, &mut requests)
            } else {
                0
            };
            let mut lines: Vec<i32> = requests.iter().map(|line| line.minimum).collect();
            if line_fill {
                for (line, share) in lines.iter_mut().zip(split_evenly(extra, n_lines)) {
                    *line += share;
                }
                (lines, 0)
            } else {
                (lines, extra)
            }
        };

        #[cfg(feature = "layout-trace")]
        tracing::trace!(
            target: "trellis::flowbox",
            line_length = length,
            columns = ?items.sizes,
            lines = ?lines,
            "allocate"
        );

        let mut placements = Vec::with_capacity(n);
        let mut line_offset = align_offset(self.line_align, line_leftover);
        let mut item_offset = 0;
        for (index, child) in self.children.iter().enumerate() {
            let line = index / length;
            if index % length == 0 {
                if line > 0 {
                    line_offset += lines[line - 1] + line_spacing;
                }
                item_offset = align_offset(self.item_align, items.leftover);
                let short = n % length;
                if self.item_align == Align::End && line == n_lines - 1 && short > 0 {
                    item_offset += items.sizes[..length - short]
                        .iter()
                        .map(|size| size + item_spacing)
                        .sum::<i32>();
                }
            }
            let size = items.sizes[self.column_of(index, length)];
            let mut rect = Rect::from_axes(
                item_axis,
                content.start(item_axis) + item_offset,
                content.start(line_axis) + line_offset,
                size,
                lines[line],
            );
            if rtl {
                rect = rect.mirrored_in(&content);
            }
            placements.push(Placement::new(*child, rect, None));
            item_offset += size + item_spacing;
        }
        Ok((placements, length))
    }
}

pub(crate) fn measure(
    tree: &WidgetTree,
    state: &FlowBox,
    halign: Align,
    valign: Align,
    orientation: Orientation,
    for_size: Option<i32>,
) -> Result<Measurement> {
    let flow = Flow::new(tree, state, halign, valign);
    let measured = if orientation == state.orientation {
        flow.measure_items()?
    } else {
        let size = match for_size {
            Some(size) => size,
            None => flow.measure_items()?.minimum,
        };
        flow.measure_lines(size)?
    };

    #[cfg(feature = "layout-trace")]
    tracing::trace!(target: "trellis::flowbox", %orientation, ?for_size, ?measured, "measure");

    Ok(measured)
}

pub(crate) fn allocate(tree: &mut WidgetTree, id: WidgetId, content: Rect) -> Result<Rect> {
    let view: &WidgetTree = tree;
    let widget = view.widget(id)?;
    let rtl = widget.style().is_rtl();
    let flow = Flow::new(view, view.as_flow_box(id)?, widget.halign(), widget.valign());
    let (placements, line_length) = flow.plan(content, rtl)?;

    let state = tree.flow_box_state_mut(id)?;
    state.content = content;
    state.line_length = line_length;
    tree.allocate_placements(&placements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::Leaf;

    #[test]
    fn test_end_aligned_short_line_uses_trailing_columns() {
        let mut tree = WidgetTree::new();
        let flow_box = tree.new_flow_box("flow");
        for i in 0..5 {
            let leaf = tree.new_leaf(format!("c{i}"), Leaf::fixed(10, 10));
            let _ = tree
                .flow_box_mut(flow_box)
                .and_then(|mut f| f.insert(leaf, None))
                .expect("insert");
        }
        let state = tree.as_flow_box(flow_box).expect("flow box");
        let flow = Flow::new(&tree, state, Align::End, Align::Fill);
        assert_eq!(flow.column_of(3, 3), 1);
        assert_eq!(flow.column_of(4, 3), 2);
        assert_eq!(flow.column_of(2, 3), 2);
    }

    #[test]
    fn test_guess_line_length_respects_bounds() {
        let tree = WidgetTree::new();
        let state = FlowBox::default();
        let flow = Flow::new(&tree, &state, Align::Fill, Align::Fill);
        assert_eq!(flow.guess_line_length(215, 50), 4);
        assert_eq!(flow.guess_line_length(10, 50), 1);
        assert_eq!(flow.guess_line_length(10_000, 50), 7);
    }
}
