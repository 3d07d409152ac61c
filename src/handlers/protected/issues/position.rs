/// Assigns checklist positions within one creation batch.
///
/// An entry keeps the position it asked for, or its index in the batch when it asked
/// for none. A position already handed out in this batch is replaced by one past the
/// highest position used so far, or by the smallest free non-negative position when
/// that would overflow.
#[derive(Debug, Default)]
pub struct PositionAllocator {
    used: Vec<i32>,
}

impl PositionAllocator {
    pub fn assign(&mut self, index: usize, requested: Option<i32>) -> i32 {
        let candidate = requested.unwrap_or_else(|| i32::try_from(index).unwrap_or(i32::MAX));
        let position = if self.used.contains(&candidate) {
            self.used
                .iter()
                .copied()
                .max()
                .and_then(|max| max.checked_add(1))
                .unwrap_or_else(|| self.smallest_free())
        } else {
            candidate
        };
        self.used.push(position);
        position
    }

    fn smallest_free(&self) -> i32 {
        let mut position = 0;
        while self.used.contains(&position) {
            position += 1;
        }
        position
    }
}
