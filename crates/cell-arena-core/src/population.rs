use crate::cell::{Cell, CellId, CellKind};

/// Bounded collection of live cells.
///
/// All mutation happens from within a single `World::step`; renderers only
/// ever see the population between steps.
#[derive(Clone, Debug)]
pub struct Population {
    cells: Vec<Cell>,
    capacity: usize,
}

impl Population {
    pub fn new(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the cap. Existing cells above a lowered cap are kept; only new
    /// inserts are refused.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.cells.len() >= self.capacity
    }

    /// Add a cell unless the cap is reached. Returns whether it was added.
    pub fn insert(&mut self, cell: Cell) -> bool {
        if self.is_full() {
            return false;
        }
        self.cells.push(cell);
        true
    }

    /// Remove every cell matching `predicate` in one pass. Survivors keep
    /// their relative order.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&Cell) -> bool) -> usize {
        let before = self.cells.len();
        self.cells.retain(|cell| !predicate(cell));
        before - self.cells.len()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.cells.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Cell> {
        self.cells.iter_mut()
    }

    pub fn as_slice(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|c| c.id() == id)
    }

    pub fn count_kind(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|c| c.kind() == kind).count()
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(id: CellId, kind: CellKind) -> Cell {
        Cell::new(id, kind, [10.0, 10.0], 3.0, 100, 100.0)
    }

    #[test]
    fn insert_is_noop_at_capacity() {
        let mut pop = Population::new(2);
        assert!(pop.insert(cell(1, CellKind::Normal)));
        assert!(pop.insert(cell(2, CellKind::Tumor)));
        assert!(!pop.insert(cell(3, CellKind::Immune)));
        assert_eq!(pop.len(), 2);
        assert!(pop.get(3).is_none());
    }

    #[test]
    fn remove_where_keeps_survivor_order() {
        let mut pop = Population::new(8);
        for id in 0..6 {
            let kind = if id % 2 == 0 {
                CellKind::Normal
            } else {
                CellKind::Tumor
            };
            pop.insert(cell(id, kind));
        }
        let removed = pop.remove_where(|c| c.kind() == CellKind::Tumor);
        assert_eq!(removed, 3);
        let ids: Vec<CellId> = pop.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![0, 2, 4]);
    }

    #[test]
    fn remove_where_on_empty_is_noop() {
        let mut pop = Population::new(4);
        assert_eq!(pop.remove_where(|_| true), 0);
        assert!(pop.is_empty());
    }

    #[test]
    fn lowered_capacity_refuses_new_inserts_only() {
        let mut pop = Population::new(4);
        for id in 0..4 {
            pop.insert(cell(id, CellKind::Immune));
        }
        pop.set_capacity(2);
        assert_eq!(pop.len(), 4);
        assert!(!pop.insert(cell(9, CellKind::Immune)));
        assert_eq!(pop.count_kind(CellKind::Immune), 4);
    }
}
