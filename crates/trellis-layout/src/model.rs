//! List-model binding for flow boxes and list boxes.
//!
//! A bound container mirrors a [`ListModel`]: one child per item, created by
//! the closure given at bind time. The model cannot reach the widget tree,
//! so whoever changes the model forwards the change through the container's
//! `model_items_changed` entry point.

use std::any::Any;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use trellis_tree::Sequence;

use crate::error::Result;
use crate::tree::WidgetTree;
use crate::widget::WidgetId;

/// An item of a list model.
pub type ModelItem = Rc<dyn Any>;

/// Builds the widget shown for a model item.
pub type CreateWidget = Box<dyn FnMut(&mut WidgetTree, &ModelItem) -> WidgetId>;

/// Decides whether a child is shown. Called with the wrapper child
/// (flow box child or list box row).
pub type FilterFunc = Box<dyn Fn(&WidgetTree, WidgetId) -> bool>;

/// Orders two wrapper children.
pub type SortFunc = Box<dyn Fn(&WidgetTree, WidgetId, WidgetId) -> Ordering>;

/// An ordered collection of items.
pub trait ListModel {
    /// Number of items.
    fn len(&self) -> usize;

    /// Whether the model is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The item at `position`.
    fn item(&self, position: usize) -> Option<ModelItem>;
}

/// A [`ListModel`] backed by a vector.
#[derive(Default)]
pub struct VecModel {
    items: RefCell<Vec<ModelItem>>,
}

impl fmt::Debug for VecModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecModel")
            .field("len", &self.items.borrow().len())
            .finish()
    }
}

impl VecModel {
    /// A model holding `items`.
    #[must_use]
    pub fn new(items: Vec<ModelItem>) -> Self {
        Self {
            items: RefCell::new(items),
        }
    }

    /// Replace `removed` items at `position` with `added`. The caller
    /// forwards the same triple to bound containers.
    pub fn splice(&self, position: usize, removed: usize, added: Vec<ModelItem>) {
        let mut items = self.items.borrow_mut();
        let end = (position + removed).min(items.len());
        let position = position.min(end);
        let _ = items.splice(position..end, added);
    }
}

impl ListModel for VecModel {
    fn len(&self) -> usize {
        self.items.borrow().len()
    }

    fn item(&self, position: usize) -> Option<ModelItem> {
        self.items.borrow().get(position).cloned()
    }
}

pub(crate) struct ModelBinding {
    pub model: Rc<dyn ListModel>,
    pub create: CreateWidget,
}

impl fmt::Debug for ModelBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBinding")
            .field("len", &self.model.len())
            .finish_non_exhaustive()
    }
}

/// How a flow box or list box came by one of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    /// A wrapper the container built around the caller's widget.
    Wrapped,
    /// Built by the model factory, wrapper and content alike.
    Model,
}

/// Free what a container built for a child it has just unparented. The
/// caller's own widget is detached from a wrapper and survives.
pub(crate) fn release(tree: &mut WidgetTree, child: WidgetId, origin: Option<Origin>) -> Result<()> {
    match origin {
        None => Ok(()),
        Some(Origin::Wrapped) => {
            tree.set_bin_child(child, None)?;
            tree.destroy(child)
        }
        Some(Origin::Model) => tree.destroy(child),
    }
}

/// The direct child of a container that holds `widget`: `widget` itself
/// or the wrapper around it.
pub(crate) fn holder(
    tree: &WidgetTree,
    children: &Sequence<WidgetId>,
    widget: WidgetId,
) -> Option<WidgetId> {
    if children.contains(widget) {
        return Some(widget);
    }
    tree.parent(widget).filter(|parent| children.contains(*parent))
}

/// Build widgets for `count` items starting at `position`.
pub(crate) fn create_widgets(
    tree: &mut WidgetTree,
    binding: &mut ModelBinding,
    position: usize,
    count: usize,
) -> Vec<WidgetId> {
    (position..position + count)
        .filter_map(|index| binding.model.item(index))
        .map(|item| (binding.create)(tree, &item))
        .collect()
}
