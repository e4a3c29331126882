#![cfg(test)]

// Property tests for SharedPointer/WeakPointer kept inside the crate so they
// can observe the live control-block counter.
//
// Model: per value slot, the number of outstanding strong and weak handles,
// whether the value was ever created, and whether it has been destroyed.
// Invariants after each step:
//  - every strong handle reports use_count == model strong count;
//  - every weak handle reports is_expired == (strong == 0);
//  - a value is destroyed exactly once, when its strong count hits zero;
//  - live control blocks == slots with any strong or weak handle left.

use crate::control_block::live_blocks;
use crate::drop_probe::{counter, DropProbe};
use crate::{SharedPointer, WeakPointer};
use proptest::prelude::*;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Clone, Debug)]
enum Op {
    Create(usize),
    CloneStrong(usize),
    DropStrong(usize),
    Downgrade(usize),
    CloneWeak(usize),
    DropWeak(usize),
    Lock(usize),
    TakeStrong(usize),
}

fn arb_ops(slots: usize) -> impl Strategy<Value = Vec<Op>> {
    let i = 0..slots;
    let op = prop_oneof![
        i.clone().prop_map(Op::Create),
        i.clone().prop_map(Op::CloneStrong),
        i.clone().prop_map(Op::DropStrong),
        i.clone().prop_map(Op::Downgrade),
        i.clone().prop_map(Op::CloneWeak),
        i.clone().prop_map(Op::DropWeak),
        i.clone().prop_map(Op::Lock),
        i.prop_map(Op::TakeStrong),
    ];
    proptest::collection::vec(op, 1..120)
}

struct Slot {
    strong: Vec<SharedPointer<DropProbe>>,
    weak: Vec<WeakPointer<DropProbe>>,
    drops: Rc<Cell<usize>>,
    created: bool,
}

impl Slot {
    fn new() -> Self {
        Self {
            strong: Vec::new(),
            weak: Vec::new(),
            drops: counter(),
            created: false,
        }
    }

    fn has_block(&self) -> bool {
        !self.strong.is_empty() || !self.weak.is_empty()
    }
}

const SLOTS: usize = 4;

proptest! {
    #[test]
    fn prop_counts_and_destruction_match_model(ops in arb_ops(SLOTS)) {
        let baseline = live_blocks();
        let mut slots: Vec<Slot> = (0..SLOTS).map(|_| Slot::new()).collect();

        for op in ops {
            match op {
                // A slot holds at most one value over its lifetime.
                Op::Create(i) => {
                    let s = &mut slots[i];
                    if !s.created {
                        s.created = true;
                        s.strong.push(SharedPointer::new(DropProbe::new(i as u32, &s.drops)));
                    }
                }
                Op::CloneStrong(i) => {
                    if let Some(sp) = slots[i].strong.last().cloned() {
                        slots[i].strong.push(sp);
                    }
                }
                Op::DropStrong(i) => {
                    slots[i].strong.pop();
                }
                Op::Downgrade(i) => {
                    if let Some(w) = slots[i].strong.last().map(SharedPointer::downgrade) {
                        slots[i].weak.push(w);
                    }
                }
                Op::CloneWeak(i) => {
                    if let Some(w) = slots[i].weak.last().cloned() {
                        slots[i].weak.push(w);
                    }
                }
                Op::DropWeak(i) => {
                    slots[i].weak.pop();
                }
                Op::Lock(i) => {
                    let before = slots[i].strong.len();
                    if let Some(sp) = slots[i].weak.last().map(WeakPointer::lock) {
                        if before == 0 {
                            prop_assert!(sp.is_null());
                            prop_assert_eq!(sp.use_count(), 0);
                        } else {
                            prop_assert_eq!(sp.use_count(), before + 1);
                            prop_assert_eq!(sp.id, i as u32);
                            slots[i].strong.push(sp);
                        }
                    }
                }
                // Move out of one handle: the moved-from handle is empty and
                // the destination keeps the count.
                Op::TakeStrong(i) => {
                    let n = slots[i].strong.len();
                    if let Some(last) = slots[i].strong.last_mut() {
                        let moved = last.take();
                        prop_assert_eq!(last.use_count(), 0);
                        prop_assert_eq!(moved.use_count(), n);
                        *last = moved;
                    }
                }
            }

            let mut expected_blocks = 0;
            for s in &slots {
                let strong = s.strong.len();
                for sp in &s.strong {
                    prop_assert_eq!(sp.use_count(), strong);
                    prop_assert_eq!(sp.weak_count(), s.weak.len());
                }
                for w in &s.weak {
                    prop_assert_eq!(w.is_expired(), strong == 0);
                    prop_assert_eq!(w.use_count(), strong);
                }
                let destroyed = s.created && strong == 0;
                prop_assert_eq!(s.drops.get(), usize::from(destroyed));
                if s.has_block() {
                    expected_blocks += 1;
                }
            }
            prop_assert_eq!(live_blocks(), baseline + expected_blocks);
        }

        drop(slots);
        prop_assert_eq!(live_blocks(), baseline);
    }
}
