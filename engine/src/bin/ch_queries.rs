// Random query benchmark on a contracted graph.
// Takes the path to a saved hierarchy (.json or .pbf) and optionally the number of queries.
// A few queries are reported individually, then the whole batch runs in parallel with one query server per worker thread.

use std::{env, error::Error};

use ch_router::{
    algo::{contraction_hierarchy::query::*, Query},
    datastr::graph::*,
    error::Error as RouterError,
    io::*,
    report, report_silent,
    report::*,
};
use rand::prelude::*;
use rayon::prelude::*;

const NUM_REPORTED_QUERIES: usize = 100;
const DEFAULT_NUM_QUERIES: usize = 10_000;

fn main() -> Result<(), Box<dyn Error>> {
    let _reporter = enable_reporting("ch_queries");
    let mut args = env::args().skip(1);
    let path = args.next().ok_or(RouterError::Usage("No contracted graph file arg given"))?;
    let num_queries = match args.next() {
        Some(arg) => arg.parse()?,
        None => DEFAULT_NUM_QUERIES,
    };

    let graph = report_time_with_key("loading", "loading_running_time_ms", || load_from(&path))?;
    report!("graph", { "num_nodes": graph.num_nodes(), "num_edges": graph.num_edges(), "num_arcs": graph.num_arcs() });
    if graph.num_nodes() == 0 {
        return Err(Box::new(RouterError::Usage("Graph has no nodes")));
    }

    let seed = Default::default();
    report!("seed", seed);
    let mut rng = StdRng::from_seed(seed);
    let n = graph.num_nodes() as NodeId;
    let queries: Vec<Query> = (0..num_queries)
        .map(|_| Query {
            from: rng.gen_range(0..n),
            to: rng.gen_range(0..n),
        })
        .collect();

    {
        let mut queries_ctxt = push_collection_context("queries".to_string());
        let mut server = Server::new(&graph, PathfinderOptions { ids: true, ..Default::default() })?;

        for &Query { from, to } in queries.iter().take(NUM_REPORTED_QUERIES) {
            let _query_ctxt = queries_ctxt.push_collection_item();
            report_silent!("from", graph.node_key(from));
            report_silent!("to", graph.node_key(to));
            let (result, time) = measure(|| server.query(graph.node_key(from), graph.node_key(to)));
            let result = result?;
            report!("running_time_ms", time.as_secs_f64() * 1000.0);
            report!("total_cost", result.total_cost);
            report!("num_edges", result.ids.map_or(0, |ids| ids.len()));
        }
    }

    let (num_found, time) = measure(|| {
        queries
            .par_iter()
            .map_init(
                || Server::new(&graph, PathfinderOptions::default()).expect("graph is contracted, a server was already created above"),
                |server, &Query { from, to }| server.distance(from, to).is_some(),
            )
            .filter(|&found| found)
            .count()
    });

    let total_ms = time.as_secs_f64() * 1000.0;
    eprintln!("{} queries, {} with path, took {}ms", queries.len(), num_found, total_ms);
    report!("num_queries", queries.len());
    report!("num_queries_with_path", num_found);
    report!("parallel_running_time_ms", total_ms);
    report!("avg_query_running_time_ms", total_ms / queries.len().max(1) as f64);

    Ok(())
}
