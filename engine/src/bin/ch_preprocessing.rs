// Complete CH toolchain for GeoJSON road networks.
// Takes a feature collection with `_cost` properties and writes the contracted graph.
// The output format is determined by the extension of the output path (.json or .pbf).

use std::{env, error::Error};

use ch_router::{
    algo::contraction_hierarchy,
    datastr::graph::GraphOptions,
    error::Error as RouterError,
    import::geojson::*,
    io::*,
    report,
    report::*,
};

fn main() -> Result<(), Box<dyn Error>> {
    let _reporter = enable_reporting("ch_preprocessing");
    let mut args = env::args().skip(1);
    let input = args.next().ok_or(RouterError::Usage("No GeoJSON input file arg given"))?;
    let output = args.next().ok_or(RouterError::Usage("No output file arg given"))?;
    let debug_mode = args.any(|arg| arg == "--debug");
    // fail early instead of after the contraction
    Format::from_path(&output)?;

    let network = report_time_with_key("GeoJSON parsing", "parsing_running_time_ms", || read_feature_collection(&input))?;
    report!("num_features", network.features.len());

    let mut graph = load_geojson_with(&network, GraphOptions { debug_mode })?;
    report!("graph", { "num_nodes": graph.num_nodes(), "num_edges": graph.num_edges() });

    contraction_hierarchy::contract(&mut graph)?;

    report_time_with_key("saving", "saving_running_time_ms", || save_to(&graph, &output))?;

    Ok(())
}
