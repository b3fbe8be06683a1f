//! UCI entry point.

use std::env;
use std::sync::Arc;

use corvid::nnue::NnueNetwork;
use corvid::uci::{run_bench, UciLoop};

#[cfg(feature = "embedded_nnue")]
fn default_network() -> NnueNetwork {
    NnueNetwork::from_embedded()
}

#[cfg(not(feature = "embedded_nnue"))]
fn default_network() -> NnueNetwork {
    NnueNetwork::zeroed()
}

fn load_network() -> NnueNetwork {
    let path = env::var("CORVID_NNUE_PATH").ok();
    if let Some(path) = path {
        match NnueNetwork::load(&path) {
            Ok(net) => return net,
            Err(e) => eprintln!("info string failed to load network from {path}: {e}"),
        }
    }
    default_network()
}

fn main() {
    let network = Arc::new(load_network());
    let args: Vec<String> = env::args().collect();

    if args.get(1).map(String::as_str) == Some("--bench") {
        let depth = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10);
        run_bench(depth, network);
        return;
    }

    let mut uci = UciLoop::new(network);
    uci.run();
}
