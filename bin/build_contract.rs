//! Binary for building WASM contracts from odra modules.
#![doc = "Binary for building WASM contracts from odra modules."]

#[allow(unused_imports)]
use unified_lending;

fn main() {
    // Compilation to WASM is driven by odra-build through this binary
}
