/// Merge-diff over two sequences sorted by the same total order: one linear
/// two-pointer pass, no auxiliary index structures.
///
/// `added` holds elements present only in the new sequence, `deleted`
/// elements present only in the old one; together with the common
/// subsequence they partition the union of both inputs.
pub(crate) struct DiffContainer<E> {
    element_added: Vec<E>,
    element_deleted: Vec<E>,
}

impl<E: Ord + Clone> DiffContainer<E> {
    pub(crate) fn new(
        old_list: &[E],
        new_list: &[E],
    ) -> Self {
        let capacity = old_list.len().max(new_list.len());
        let mut container = Self {
            element_added: Vec::with_capacity(capacity),
            element_deleted: Vec::with_capacity(capacity),
        };
        container.calc_diff(old_list, new_list);
        container
    }

    fn calc_diff(
        &mut self,
        old_list: &[E],
        new_list: &[E],
    ) {
        let mut i = 0;
        let mut j = 0;
        while i < old_list.len() && j < new_list.len() {
            match old_list[i].cmp(&new_list[j]) {
                std::cmp::Ordering::Less => {
                    self.element_deleted.push(old_list[i].clone());
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    self.element_added.push(new_list[j].clone());
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        self.element_deleted.extend_from_slice(&old_list[i..]);
        self.element_added.extend_from_slice(&new_list[j..]);
    }

    pub(crate) fn added(&self) -> &[E] {
        &self.element_added
    }

    pub(crate) fn deleted(&self) -> &[E] {
        &self.element_deleted
    }
}
