//! Arbitrary infix text must parse or fail cleanly, and anything that
//! parses must compile or fail cleanly against a small term table.

#![no_main]

use libfuzzer_sys::fuzz_target;

use rando_logic::{LogicManagerBuilder, RawLogicDef};

fuzz_target!(|data: &[u8]| {
    let Ok(infix) = std::str::from_utf8(data) else {
        return;
    };

    let mut lmb = LogicManagerBuilder::new();
    for term in ["A", "B", "C", "Keys"] {
        lmb.get_or_add_term(term);
    }
    let _ = lmb.processor.set_macro("M", "A | B");

    if lmb.add_logic_def(RawLogicDef::new("Fuzz", infix)).is_err() {
        return;
    }
    if let Ok(lm) = lmb.build() {
        if let Some(def) = lm.get_logic_def("Fuzz") {
            // printing must not panic on anything the compiler produced
            let _ = lm.to_infix(def);
        }
    }
});
