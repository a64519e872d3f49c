//! Binary for generating contract schemas from odra modules.
#![doc = "Binary for generating contract schemas from odra modules."]

#[allow(unused_imports)]
use unified_lending;

fn main() {
    // Schema generation is driven by odra-build through this binary
}
