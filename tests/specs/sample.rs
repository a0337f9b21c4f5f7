//! Instrumented code exercised by the behavioral specs.
//!
//! Each tag belongs to one spec so concurrently running specs never observe
//! each other's hits.

#![allow(dead_code)]

/// Executes the `foobar` statement only when `run` is set.
pub fn foobar(run: bool) {
    if run {
        covers::probe!();
        std::hint::black_box(()); //covers:foobar
    }
}

pub fn classify(n: i32) -> &'static str {
    covers::probe!();
    if n < 0 {
        covers::probe!();
        return "negative"; //covers:classify-negative
    }
    covers::probe!();
    if n == 0 {
        covers::probe!();
        return "zero"; //covers:classify-zero
    }
    covers::probe!();
    "positive" //covers:classify-positive
}

pub fn layered() {
    covers::probe!();
    std::hint::black_box(()); //covers:layered
}

pub fn deferred() {
    covers::probe!();
    std::hint::black_box(()); //covers:deferred
}

pub fn threaded() {
    covers::probe!();
    std::hint::black_box(()); //covers:threaded
}

/// Two tags in one block read the same counter.
pub fn shared() {
    covers::probe!();
    let a = std::hint::black_box(1); //covers:shared-first
    let b = std::hint::black_box(2); //covers:shared-second
    std::hint::black_box(a + b);
}

pub fn callback() {
    covers::probe!();
    std::hint::black_box(()); //covers:callback
}

/// Never called: its tag must always read zero.
pub fn unreached() {
    covers::probe!();
    std::hint::black_box(()); //covers:unreached
}
