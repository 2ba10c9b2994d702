//! Random operation sequences against a sorted reference model

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use rando_core::PriorityQueue;

#[derive(Arbitrary, Debug)]
enum Op {
    Enqueue(u8),
    Extract,
    UpdateHead(u8),
    Peek,
}

fuzz_target!(|ops: Vec<Op>| {
    let mut queue = PriorityQueue::new();
    // (key, arrival) pairs; arrival breaks ties like the queue does
    let mut model: Vec<(u8, u32)> = Vec::new();
    let mut arrival = 0u32;

    for op in ops {
        match op {
            Op::Enqueue(key) => {
                queue.enqueue(key, arrival);
                model.push((key, arrival));
                arrival += 1;
            }
            Op::Extract => {
                model.sort();
                let expected = if model.is_empty() {
                    None
                } else {
                    Some(model.remove(0))
                };
                assert_eq!(queue.try_extract_min(), expected);
            }
            Op::UpdateHead(key) => {
                model.sort();
                match model.first_mut() {
                    Some(head) => {
                        assert!(queue.update_head(key).is_ok());
                        head.0 = key;
                    }
                    None => assert!(queue.update_head(key).is_err()),
                }
            }
            Op::Peek => {
                model.sort();
                assert_eq!(queue.try_peek().map(|(k, v)| (*k, *v)), model.first().copied());
            }
        }
        assert_eq!(queue.len(), model.len());
    }
});
