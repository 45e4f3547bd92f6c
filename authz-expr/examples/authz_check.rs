// Copyright 2024 Lars Wilhelmsen <sral-backwards@sral.org>. All rights reserved.
// Use of this source code is governed by the MIT or Apache-2.0 license that can be found in the LICENSE-MIT or LICENSE-APACHE files.

//! A small command-line demo of the library: `authz_check <expression> <tokens> [--tree]`.
//! `tokens` is a comma-separated list of held authorizations.

use std::env::args;

use authz_expr::{parse, AuthorizationSet, Evaluator};

fn main() {
    let mut args = args();
    args.next();
    let expression = args.next().expect("missing expression");
    let tokens = args.next().expect("missing tokens");
    let show_tree = matches!(args.next().as_deref(), Some("--tree"));

    let held = AuthorizationSet::new(tokens.split(',').map(str::to_owned));
    let evaluator = Evaluator::single(held);

    match evaluator.can_access(&expression) {
        Ok(result) => {
            if show_tree {
                let tree = parse(expression.as_bytes()).expect("can_access already validated this");
                println!("{tree:?}");
            }
            println!("{result}");
            std::process::exit(if result { 0 } else { 1 });
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    }
}
