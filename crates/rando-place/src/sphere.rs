//! Sphere input and placement output

use crate::Participant;

/// Items and locations that became reachable at one depth
#[derive(Clone, Debug)]
pub struct Sphere<I, L> {
    pub depth: usize,
    pub items: Vec<I>,
    pub locations: Vec<L>,
    /// Last sphere of the attempt; coupled groups reconcile leftovers here
    pub is_final: bool,
    pub group_label: String,
}

impl<I, L> Sphere<I, L> {
    pub fn new(depth: usize, group_label: impl Into<String>) -> Self {
        Sphere {
            depth,
            items: Vec::new(),
            locations: Vec::new(),
            is_final: false,
            group_label: group_label.into(),
        }
    }

    pub fn with_items(mut self, items: Vec<I>) -> Self {
        self.items = items;
        self
    }

    pub fn with_locations(mut self, locations: Vec<L>) -> Self {
        self.locations = locations;
        self
    }

    pub fn finalize(mut self) -> Self {
        self.is_final = true;
        self
    }
}

impl<I: Participant, L> Sphere<I, L> {
    /// Mean item priority, if the sphere has items
    pub fn mean_item_priority(&self) -> Option<f32> {
        mean_priority(&self.items)
    }
}

pub(crate) fn mean_priority<P: Participant>(items: &[P]) -> Option<f32> {
    if items.is_empty() {
        return None;
    }
    let sum: f32 = items.iter().map(|item| item.priority()).sum();
    Some(sum / items.len() as f32)
}

/// One item assigned to one location
#[derive(Clone, Debug, PartialEq)]
pub struct RandoPlacement<I, L> {
    pub item: I,
    pub location: L,
}

impl<I, L> RandoPlacement<I, L> {
    pub fn new(item: I, location: L) -> Self {
        RandoPlacement { item, location }
    }
}
