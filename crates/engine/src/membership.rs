//! A hash set with two lazily sorted views.
//!
//! Membership tests go through the backing set. The enter-priority and
//! leave-priority views are cached `Vec`s that are dropped on insertion and
//! rebuilt, one at a time, on first access. Removal keeps a cached view valid
//! (removing from a sorted list leaves it sorted), so it evicts in place.

use std::collections::HashSet;
use std::hash::Hash;

use crate::region::PriorityType;

/// Something that can be placed in an [`OrderedMembershipSet`].
///
/// Views sort ascending by `(priority(order), sequence())`. `sequence` must be
/// unique per element for the order to be total.
pub trait Ranked {
    fn priority(&self, order: PriorityType) -> i32;
    fn sequence(&self) -> u64;
}

#[derive(Debug, Clone)]
pub struct OrderedMembershipSet<T> {
    members: HashSet<T>,
    by_enter: Option<Vec<T>>,
    by_leave: Option<Vec<T>>,
}

impl<T> Default for OrderedMembershipSet<T> {
    fn default() -> Self {
        Self {
            members: HashSet::new(),
            by_enter: None,
            by_leave: None,
        }
    }
}

impl<T: Ranked + Eq + Hash + Clone> OrderedMembershipSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.members.contains(item)
    }

    /// Unordered iteration over the backing set.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.members.iter()
    }

    /// Insert `item`. Returns `false` if an equal element was already present,
    /// in which case nothing changes.
    pub fn insert(&mut self, item: T) -> bool {
        if !self.members.insert(item) {
            return false;
        }
        self.by_enter = None;
        self.by_leave = None;
        true
    }

    /// Remove `item` from the set and from whichever views are cached.
    pub fn remove(&mut self, item: &T) -> bool {
        if !self.members.remove(item) {
            return false;
        }
        evict(&mut self.by_enter, item);
        evict(&mut self.by_leave, item);
        true
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.by_enter = None;
        self.by_leave = None;
    }

    /// Whether the requested view must be rebuilt before it can be read.
    pub fn is_dirty(&self, order: PriorityType) -> bool {
        self.view(order).is_none()
    }

    /// The elements in `order`, sorting that view (and only that view) if it
    /// is stale.
    pub fn ordered(&mut self, order: PriorityType) -> &[T] {
        self.ensure_sorted(order);
        self.view(order).as_deref().unwrap_or_default()
    }

    /// Walk the `order` view and remove every element matching `pred`,
    /// returning them in that order.
    ///
    /// Each removal also leaves the backing set and the other cached view
    /// (without re-sorting it).
    pub fn remove_ordered_where<F>(&mut self, order: PriorityType, mut pred: F) -> Vec<T>
    where
        F: FnMut(&T) -> bool,
    {
        self.ensure_sorted(order);
        let (view, other) = match order {
            PriorityType::Enter => (&mut self.by_enter, &mut self.by_leave),
            PriorityType::Leave => (&mut self.by_leave, &mut self.by_enter),
        };
        let Some(view) = view.as_mut() else {
            return Vec::new();
        };

        let mut removed = Vec::new();
        view.retain(|item| {
            if !pred(item) {
                return true;
            }
            let was_member = self.members.remove(item);
            assert!(was_member, "ordered view held an element missing from the backing set");
            evict(other, item);
            removed.push(item.clone());
            false
        });
        removed
    }

    /// Point-in-time copy of the `order` view.
    pub fn to_ordered_vec(&mut self, order: PriorityType) -> Vec<T> {
        self.ordered(order).to_vec()
    }

    fn view(&self, order: PriorityType) -> &Option<Vec<T>> {
        match order {
            PriorityType::Enter => &self.by_enter,
            PriorityType::Leave => &self.by_leave,
        }
    }

    fn ensure_sorted(&mut self, order: PriorityType) {
        let slot = match order {
            PriorityType::Enter => &mut self.by_enter,
            PriorityType::Leave => &mut self.by_leave,
        };
        if slot.is_some() {
            return;
        }
        let mut sorted: Vec<T> = self.members.iter().cloned().collect();
        sorted.sort_unstable_by_key(|item| (item.priority(order), item.sequence()));
        *slot = Some(sorted);
    }
}

/// Drop `item` from a cached view, if the view is cached. A cached view that
/// does not contain a member is a broken invariant.
fn evict<T: Eq>(view: &mut Option<Vec<T>>, item: &T) {
    if let Some(list) = view {
        let pos = list
            .iter()
            .position(|x| x == item)
            .unwrap_or_else(|| panic!("cached ordered view is missing a set member"));
        list.remove(pos);
    }
}
