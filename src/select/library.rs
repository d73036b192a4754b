use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::model::{Chart, ChartId, SetId, SongSet};

/// Sets that entered or left the library during a structural mutation.
/// The carousel turns this into membership notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipChange {
    pub added: Vec<SetId>,
    pub removed: Vec<SetId>,
}

impl MembershipChange {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Owns the two-level set/chart hierarchy in insertion order.
///
/// Invariants: set identities are unique, every chart belongs to exactly
/// one set, and a set with zero charts is never stored. Malformed entries
/// in a bulk load are normalized away rather than failing the batch.
#[derive(Default)]
pub struct Library {
    sets: Vec<SongSet>,
    set_slots: HashMap<SetId, usize>,
    chart_owner: HashMap<ChartId, SetId>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wholesale replace. Duplicate set identities keep the first
    /// occurrence, duplicate chart identities keep the first copy, and
    /// chartless sets are dropped.
    pub fn replace_all(&mut self, sets: Vec<SongSet>) -> MembershipChange {
        let mut next: Vec<SongSet> = Vec::with_capacity(sets.len());
        let mut slots: HashMap<SetId, usize> = HashMap::new();
        let mut owners: HashMap<ChartId, SetId> = HashMap::new();

        for mut set in sets {
            if slots.contains_key(&set.id) {
                warn!("duplicate set {:?} in bulk load, keeping the first", set.id);
                continue;
            }
            let set_id = set.id;
            set.charts.retain(|chart| {
                if owners.contains_key(&chart.id) {
                    warn!(
                        "chart {:?} appears twice in bulk load, dropping the later copy",
                        chart.id
                    );
                    return false;
                }
                owners.insert(chart.id, set_id);
                true
            });
            if set.charts.is_empty() {
                warn!("dropping set {:?}: no charts", set.id);
                continue;
            }
            for chart in &mut set.charts {
                chart.set_id = set_id;
            }
            slots.insert(set_id, next.len());
            next.push(set);
        }

        let removed: Vec<SetId> = self
            .sets
            .iter()
            .map(|s| s.id)
            .filter(|id| !slots.contains_key(id))
            .collect();
        let added: Vec<SetId> = next
            .iter()
            .map(|s| s.id)
            .filter(|id| !self.set_slots.contains_key(id))
            .collect();

        self.sets = next;
        self.set_slots = slots;
        self.chart_owner = owners;
        MembershipChange { added, removed }
    }

    /// Insert a set, or reconcile an existing one chart-by-chart.
    ///
    /// Surviving charts are updated in place and keep their relative order,
    /// vanished charts are removed, new charts append at the end; traversal
    /// indices stay stable across unrelated updates. An upsert with no
    /// charts is equivalent to `remove`.
    pub fn upsert(&mut self, mut set: SongSet) -> MembershipChange {
        self.normalize_charts(&mut set);
        if set.charts.is_empty() {
            warn!("upsert of set {:?} carries no charts, dropping it", set.id);
            return self.remove(set.id);
        }

        if let Some(&slot) = self.set_slots.get(&set.id) {
            let SongSet {
                id,
                artist,
                title,
                author,
                added_at,
                charts,
            } = set;
            let incoming_order: Vec<ChartId> = charts.iter().map(|c| c.id).collect();
            let mut incoming: HashMap<ChartId, Chart> =
                charts.into_iter().map(|c| (c.id, c)).collect();

            let old_charts = std::mem::take(&mut self.sets[slot].charts);
            let mut merged = Vec::with_capacity(incoming_order.len());
            for old in old_charts {
                match incoming.remove(&old.id) {
                    Some(updated) => merged.push(updated),
                    None => {
                        self.chart_owner.remove(&old.id);
                    }
                }
            }
            for chart_id in incoming_order {
                if let Some(fresh) = incoming.remove(&chart_id) {
                    self.chart_owner.insert(chart_id, id);
                    merged.push(fresh);
                }
            }

            let entry = &mut self.sets[slot];
            entry.artist = artist;
            entry.title = title;
            entry.author = author;
            entry.added_at = added_at;
            entry.charts = merged;
            MembershipChange::default()
        } else {
            for chart in &set.charts {
                self.chart_owner.insert(chart.id, set.id);
            }
            self.set_slots.insert(set.id, self.sets.len());
            let added = vec![set.id];
            self.sets.push(set);
            MembershipChange {
                added,
                removed: Vec::new(),
            }
        }
    }

    pub fn remove(&mut self, id: SetId) -> MembershipChange {
        let Some(slot) = self.set_slots.remove(&id) else {
            return MembershipChange::default();
        };
        let set = self.sets.remove(slot);
        for chart in &set.charts {
            self.chart_owner.remove(&chart.id);
        }
        for (i, s) in self.sets.iter().enumerate().skip(slot) {
            self.set_slots.insert(s.id, i);
        }
        MembershipChange {
            added: Vec::new(),
            removed: vec![id],
        }
    }

    /// Drop incoming duplicates and charts already owned by another set,
    /// and point the back-references at the upserted set.
    fn normalize_charts(&self, set: &mut SongSet) {
        let own = set.id;
        let mut seen: HashSet<ChartId> = HashSet::new();
        let chart_owner = &self.chart_owner;
        set.charts.retain(|chart| {
            if !seen.insert(chart.id) {
                warn!("duplicate chart {:?} in upsert, keeping the first", chart.id);
                return false;
            }
            if chart_owner.get(&chart.id).is_some_and(|owner| *owner != own) {
                warn!(
                    "chart {:?} already belongs to another set, dropping it",
                    chart.id
                );
                return false;
            }
            true
        });
        for chart in &mut set.charts {
            chart.set_id = own;
        }
    }

    pub fn set_chart_hidden(&mut self, id: ChartId, hidden: bool) -> bool {
        match self.chart_mut(id) {
            Some(chart) => {
                chart.hidden = hidden;
                true
            }
            None => false,
        }
    }

    pub fn set_chart_rating(&mut self, id: ChartId, rating: f64) -> bool {
        match self.chart_mut(id) {
            Some(chart) => {
                chart.rating = rating;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// All sets in insertion order.
    pub fn sets(&self) -> &[SongSet] {
        &self.sets
    }

    pub fn set(&self, id: SetId) -> Option<&SongSet> {
        self.set_slots.get(&id).map(|&slot| &self.sets[slot])
    }

    pub fn chart(&self, id: ChartId) -> Option<(&SongSet, &Chart)> {
        let owner = self.owner_of(id)?;
        let set = self.set(owner)?;
        let chart = set.chart(id)?;
        Some((set, chart))
    }

    pub fn owner_of(&self, id: ChartId) -> Option<SetId> {
        self.chart_owner.get(&id).copied()
    }

    pub fn contains_set(&self, id: SetId) -> bool {
        self.set_slots.contains_key(&id)
    }

    fn chart_mut(&mut self, id: ChartId) -> Option<&mut Chart> {
        let owner = *self.chart_owner.get(&id)?;
        let slot = *self.set_slots.get(&owner)?;
        self.sets[slot].charts.iter_mut().find(|c| c.id == id)
    }
}
