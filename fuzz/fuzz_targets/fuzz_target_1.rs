// Copyright 2024 Lars Wilhelmsen <sral-backwards@sral.org>. All rights reserved.
// Use of this source code is governed by the MIT or Apache-2.0 license that can be found in the LICENSE-MIT or LICENSE-APACHE files.

#![no_main]
extern crate authz_expr;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Exercise both consumers of the grammar directly on raw bytes; the
    // tokenizer and parser are byte-oriented and never require UTF-8.
    let _ = authz_expr::validate(data);
    let _ = authz_expr::parse(data);
});
