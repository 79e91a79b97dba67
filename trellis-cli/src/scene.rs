//! JSON scene descriptions.
//!
//! A scene is one root node. Every node names its widget type in a `type`
//! field and may carry the common widget properties (`name`, `visible`,
//! `halign`, `valign`, `hexpand`, `vexpand`, `style`). Children of boxes,
//! button boxes and grids carry their placement next to those properties:
//!
//! ```json
//! {
//!   "type": "box",
//!   "orientation": "horizontal",
//!   "spacing": 6,
//!   "children": [
//!     { "type": "leaf", "min_width": 40, "nat_width": 80, "min_height": 20, "nat_height": 20,
//!       "pack": { "expand": true } },
//!     { "type": "leaf", "min_width": 30, "nat_width": 30, "min_height": 20, "nat_height": 20 }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use trellis_layout::{
    Align, BaselinePosition, BoxChild, ButtonBoxStyle, Leaf, Orientation, PackType,
    ScrollablePolicy, SelectionMode, Style, WidgetId, WidgetTree,
};

/// A widget and its subtree.
#[derive(Debug, Deserialize)]
pub struct Node {
    /// Widget name; defaults to the type and a running number.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    visible: Option<bool>,
    #[serde(default)]
    halign: Option<Align>,
    #[serde(default)]
    valign: Option<Align>,
    #[serde(default)]
    hexpand: Option<bool>,
    #[serde(default)]
    vexpand: Option<bool>,
    #[serde(default)]
    style: Option<Style>,
    /// Placement inside a box or button box.
    #[serde(default)]
    pack: Option<Packing>,
    /// Placement inside a grid: left, top, width, height.
    #[serde(default)]
    attach: Option<[i32; 4]>,
    /// Button box child grouped apart from the others.
    #[serde(default)]
    secondary: bool,
    /// Button box child sized on its own.
    #[serde(default)]
    non_homogeneous: bool,
    /// What the widget is.
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// Widget types a scene can build.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Content with fixed size requests.
    Leaf(Leaf),
    /// Linear container.
    Box(BoxNode),
    /// Linear container for buttons.
    ButtonBox(ButtonBoxNode),
    /// Two-dimensional container.
    Grid(GridNode),
    /// Reflowing container.
    FlowBox(FlowBoxNode),
    /// Vertical list.
    ListBox(ListBoxNode),
    /// Scrolling container.
    Viewport(ViewportNode),
}

impl NodeKind {
    const fn type_name(&self) -> &'static str {
        match self {
            Self::Leaf(_) => "leaf",
            Self::Box(_) => "box",
            Self::ButtonBox(_) => "button_box",
            Self::Grid(_) => "grid",
            Self::FlowBox(_) => "flow_box",
            Self::ListBox(_) => "list_box",
            Self::Viewport(_) => "viewport",
        }
    }
}

/// Box packing properties.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Packing {
    pack_type: PackType,
    expand: bool,
    fill: bool,
    padding: i32,
}

impl Default for Packing {
    fn default() -> Self {
        Self {
            pack_type: PackType::Start,
            expand: false,
            fill: true,
            padding: 0,
        }
    }
}

/// Properties of a box.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BoxNode {
    orientation: Orientation,
    spacing: i32,
    homogeneous: bool,
    baseline_position: Option<BaselinePosition>,
    center: Option<Box<Node>>,
    children: Vec<Node>,
}

/// Properties of a button box.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ButtonBoxNode {
    orientation: Orientation,
    spacing: i32,
    layout: ButtonBoxStyle,
    child_min_size: Option<(i32, i32)>,
    child_ipadding: Option<(i32, i32)>,
    children: Vec<Node>,
}

/// Properties of a grid.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GridNode {
    row_spacing: i32,
    column_spacing: i32,
    row_homogeneous: bool,
    column_homogeneous: bool,
    baseline_row: i32,
    children: Vec<Node>,
}

/// Properties of a flow box.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FlowBoxNode {
    orientation: Orientation,
    homogeneous: bool,
    row_spacing: i32,
    column_spacing: i32,
    min_children_per_line: usize,
    max_children_per_line: usize,
    selection_mode: SelectionMode,
    children: Vec<Node>,
}

impl Default for FlowBoxNode {
    fn default() -> Self {
        Self {
            orientation: Orientation::Horizontal,
            homogeneous: false,
            row_spacing: 0,
            column_spacing: 0,
            min_children_per_line: 1,
            max_children_per_line: trellis_layout::flow_box::DEFAULT_MAX_CHILDREN_PER_LINE,
            selection_mode: SelectionMode::Single,
            children: Vec::new(),
        }
    }
}

/// Properties of a list box.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListBoxNode {
    selection_mode: SelectionMode,
    placeholder: Option<Box<Node>>,
    rows: Vec<Node>,
}

/// Properties of a viewport.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ViewportNode {
    hscroll_policy: ScrollablePolicy,
    vscroll_policy: ScrollablePolicy,
    child: Option<Box<Node>>,
}

/// Parse a scene from JSON text.
///
/// # Errors
///
/// Fails on malformed JSON or unknown widget types.
pub fn parse(text: &str) -> Result<Node> {
    serde_json::from_str(text).context("invalid scene description")
}

/// Builds widgets for scene nodes, numbering unnamed ones.
pub struct SceneBuilder<'t> {
    tree: &'t mut WidgetTree,
    counter: usize,
}

impl<'t> SceneBuilder<'t> {
    /// Build into `tree`.
    pub const fn new(tree: &'t mut WidgetTree) -> Self {
        Self { tree, counter: 0 }
    }

    /// Create the widget for `node` and its subtree. Returns the root.
    ///
    /// # Errors
    ///
    /// Fails when the layout engine rejects a property or child.
    pub fn build(&mut self, node: &Node) -> Result<WidgetId> {
        let name = node.name.clone().unwrap_or_else(|| {
            self.counter += 1;
            format!("{}{}", node.kind.type_name(), self.counter)
        });
        let id = match &node.kind {
            NodeKind::Leaf(leaf) => self.tree.new_leaf(name, *leaf),
            NodeKind::Box(desc) => self.build_box(name, desc)?,
            NodeKind::ButtonBox(desc) => self.build_button_box(name, desc)?,
            NodeKind::Grid(desc) => self.build_grid(name, desc)?,
            NodeKind::FlowBox(desc) => self.build_flow_box(name, desc)?,
            NodeKind::ListBox(desc) => self.build_list_box(name, desc)?,
            NodeKind::Viewport(desc) => self.build_viewport(name, desc)?,
        };
        self.apply_common(id, node)?;
        Ok(id)
    }

    fn apply_common(&mut self, id: WidgetId, node: &Node) -> Result<()> {
        if let Some(style) = node.style {
            self.tree.set_style(id, style)?;
        }
        if let Some(align) = node.halign {
            self.tree.set_halign(id, align)?;
        }
        if let Some(align) = node.valign {
            self.tree.set_valign(id, align)?;
        }
        self.tree.set_hexpand(id, node.hexpand)?;
        self.tree.set_vexpand(id, node.vexpand)?;
        if node.visible == Some(false) {
            self.tree.set_visible(id, false)?;
        }
        Ok(())
    }

    fn packing(node: &Node) -> BoxChild {
        let packing = node.pack.unwrap_or_default();
        BoxChild::new(packing.expand, packing.fill, packing.padding).packed(packing.pack_type)
    }

    fn build_box(&mut self, name: String, desc: &BoxNode) -> Result<WidgetId> {
        let id = self.tree.new_box(name, desc.orientation);
        let mut children = Vec::with_capacity(desc.children.len());
        for child in &desc.children {
            children.push((self.build(child)?, Self::packing(child)));
        }
        let center = match &desc.center {
            Some(center) => Some(self.build(center)?),
            None => None,
        };

        let mut handle = self.tree.box_mut(id)?;
        handle.set_spacing(desc.spacing)?;
        handle.set_homogeneous(desc.homogeneous)?;
        if let Some(position) = desc.baseline_position {
            handle.set_baseline_position(position)?;
        }
        for (child, packing) in children {
            handle.pack(child, packing)?;
        }
        if center.is_some() {
            handle.set_center(center)?;
        }
        Ok(id)
    }

    fn build_button_box(&mut self, name: String, desc: &ButtonBoxNode) -> Result<WidgetId> {
        let id = self.tree.new_button_box(name, desc.orientation);
        let mut children = Vec::with_capacity(desc.children.len());
        for child in &desc.children {
            children.push((self.build(child)?, child));
        }

        let mut base = self.tree.box_mut(id)?;
        base.set_spacing(desc.spacing)?;
        for (child, node) in &children {
            base.pack(*child, Self::packing(node))?;
        }

        let mut handle = self.tree.button_box_mut(id)?;
        handle.set_layout(desc.layout)?;
        if let Some((width, height)) = desc.child_min_size {
            handle.set_child_min_size(width, height)?;
        }
        if let Some((x, y)) = desc.child_ipadding {
            handle.set_child_ipadding(x, y)?;
        }
        for (child, node) in children {
            handle.set_child_secondary(child, node.secondary)?;
            handle.set_child_non_homogeneous(child, node.non_homogeneous)?;
        }
        Ok(id)
    }

    fn build_grid(&mut self, name: String, desc: &GridNode) -> Result<WidgetId> {
        let id = self.tree.new_grid(name);
        let mut children = Vec::with_capacity(desc.children.len());
        for child in &desc.children {
            children.push((self.build(child)?, child.attach));
        }

        let mut handle = self.tree.grid_mut(id)?;
        handle.set_row_spacing(desc.row_spacing)?;
        handle.set_column_spacing(desc.column_spacing)?;
        handle.set_row_homogeneous(desc.row_homogeneous)?;
        handle.set_column_homogeneous(desc.column_homogeneous)?;
        handle.set_baseline_row(desc.baseline_row)?;
        for (child, attach) in children {
            match attach {
                Some([left, top, width, height]) => handle.attach(child, left, top, width, height)?,
                None => handle.add(child)?,
            }
        }
        Ok(id)
    }

    fn build_flow_box(&mut self, name: String, desc: &FlowBoxNode) -> Result<WidgetId> {
        let id = self.tree.new_flow_box(name);
        let mut children = Vec::with_capacity(desc.children.len());
        for child in &desc.children {
            children.push(self.build(child)?);
        }

        let mut handle = self.tree.flow_box_mut(id)?;
        handle.set_orientation(desc.orientation)?;
        handle.set_homogeneous(desc.homogeneous)?;
        handle.set_row_spacing(desc.row_spacing)?;
        handle.set_column_spacing(desc.column_spacing)?;
        handle.set_max_children_per_line(desc.max_children_per_line)?;
        handle.set_min_children_per_line(desc.min_children_per_line)?;
        handle.set_selection_mode(desc.selection_mode)?;
        for child in children {
            let _ = handle.insert(child, None)?;
        }
        Ok(id)
    }

    fn build_list_box(&mut self, name: String, desc: &ListBoxNode) -> Result<WidgetId> {
        let id = self.tree.new_list_box(name);
        let mut rows = Vec::with_capacity(desc.rows.len());
        for row in &desc.rows {
            rows.push(self.build(row)?);
        }
        let placeholder = match &desc.placeholder {
            Some(placeholder) => Some(self.build(placeholder)?),
            None => None,
        };

        let mut handle = self.tree.list_box_mut(id)?;
        handle.set_selection_mode(desc.selection_mode)?;
        for row in rows {
            let _ = handle.insert(row, None)?;
        }
        handle.set_placeholder(placeholder)?;
        Ok(id)
    }

    fn build_viewport(&mut self, name: String, desc: &ViewportNode) -> Result<WidgetId> {
        let id = self.tree.new_viewport(name, None, None);
        let child = match &desc.child {
            Some(child) => Some(self.build(child)?),
            None => None,
        };
        let mut handle = self.tree.viewport_mut(id)?;
        handle.set_hscroll_policy(desc.hscroll_policy)?;
        handle.set_vscroll_policy(desc.vscroll_policy)?;
        handle.set_child(child)?;
        Ok(id)
    }
}

/// Parse `text` and build it into a fresh tree.
///
/// # Errors
///
/// Fails on malformed scenes or rejected properties.
pub fn load(text: &str) -> Result<(WidgetTree, WidgetId)> {
    let node = parse(text)?;
    let mut tree = WidgetTree::new();
    let root = SceneBuilder::new(&mut tree).build(&node)?;
    Ok((tree, root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_layout::{Rect, WidgetType};

    const ROW: &str = r#"{
        "type": "box",
        "name": "row",
        "spacing": 10,
        "children": [
            { "type": "leaf", "name": "a", "min_width": 50, "nat_width": 50, "min_height": 10, "nat_height": 10 },
            { "type": "leaf", "name": "b", "min_width": 50, "nat_width": 80, "min_height": 10, "nat_height": 10,
              "pack": { "expand": true } },
            { "type": "leaf", "min_width": 20, "nat_width": 20, "min_height": 10, "nat_height": 10,
              "pack": { "pack_type": "end" } }
        ]
    }"#;

    #[test]
    fn test_box_scene_builds_and_allocates() {
        let (mut tree, root) = load(ROW).unwrap();
        assert_eq!(tree.widget_type(root).unwrap(), WidgetType::Box);
        let children = tree.children(root).unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(tree.name(children[2]), "leaf1", "unnamed widgets are numbered");

        let _ = tree.allocate(root, Rect::new(0, 0, 200, 10), None).unwrap();
        assert_eq!(tree.allocation(children[0]).unwrap(), Rect::new(0, 0, 50, 10));
        assert_eq!(tree.allocation(children[1]).unwrap(), Rect::new(60, 0, 110, 10));
        assert_eq!(tree.allocation(children[2]).unwrap(), Rect::new(180, 0, 20, 10));
    }

    #[test]
    fn test_grid_children_attach_where_asked() {
        let scene = r#"{
            "type": "grid",
            "children": [
                { "type": "leaf", "name": "wide", "attach": [0, 1, 2, 1] },
                { "type": "leaf", "name": "first" }
            ]
        }"#;
        let (tree, root) = load(scene).unwrap();
        let grid = tree.as_grid(root).unwrap();
        let wide = tree.children(root).unwrap()[0];
        let first = tree.children(root).unwrap()[1];
        assert_eq!(grid.child_position(wide).map(|attach| attach.width), Some(2));
        assert_eq!(grid.child_position(first).map(|attach| attach.left), Some(2));
    }

    #[test]
    fn test_list_box_rows_are_wrapped() {
        let scene = r#"{
            "type": "list_box",
            "rows": [{ "type": "leaf", "name": "one", "nat_height": 10 }],
            "placeholder": { "type": "leaf", "name": "empty" }
        }"#;
        let (tree, root) = load(scene).unwrap();
        let rows: Vec<_> = tree.as_list_box(root).unwrap().rows().iter().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(tree.name(rows[0]), "one-row");
        assert!(tree.as_list_box(root).unwrap().placeholder().is_some());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = parse(r#"{ "type": "canvas" }"#).unwrap_err();
        assert!(format!("{err:#}").contains("canvas"), "{err:#}");
    }

    #[test]
    fn test_rejected_property_surfaces() {
        let scene = r#"{ "type": "box", "spacing": -4 }"#;
        assert!(load(scene).is_err());
    }
}
