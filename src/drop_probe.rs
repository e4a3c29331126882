#![cfg(test)]

// Test payload that records how many times it has been destroyed.

use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug)]
pub(crate) struct DropProbe {
    pub(crate) id: u32,
    drops: Rc<Cell<usize>>,
}

impl DropProbe {
    pub(crate) fn new(id: u32, drops: &Rc<Cell<usize>>) -> Self {
        Self {
            id,
            drops: drops.clone(),
        }
    }
}

impl Drop for DropProbe {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

pub(crate) fn counter() -> Rc<Cell<usize>> {
    Rc::new(Cell::new(0))
}
