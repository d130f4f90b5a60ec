//! Command-line driver: run a pipeline of JSON-pointer queries over a JSON
//! document, printing per-step progress and the final result.
//!
//! ```text
//! scry <data.json> <pointer>...
//! SCRY_PRETTY=1 scry data.json /items /0
//! ```

use std::env;
use std::fs;
use std::sync::Arc;

use anyhow::{Context as _, anyhow};
use log::{error, info};
use scry_graph::{Graph, subquery};
use scry_pipeline::{ComputationState, Session};
use serde_json::Value;
use tokio::runtime::Runtime;

use crate::config::ScryConfig;
use crate::pointer::PointerEngine;

mod config;
mod pointer;

fn main() {
    env_logger::init();
    if let Err(error) = run() {
        error!("scry: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = ScryConfig::from_env();
    let mut args = env::args().skip(1);
    let data_path = args
        .next()
        .ok_or_else(|| anyhow!("usage: scry <data.json> <pointer>..."))?;
    let queries: Vec<String> = args.collect();
    if queries.is_empty() {
        return Err(anyhow!("at least one pointer query is required"));
    }

    let raw = fs::read_to_string(&data_path)
        .with_context(|| format!("reading data file {data_path}"))?;
    let data: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing JSON from {data_path}"))?;

    let (graph, live_query) = build_chain(&queries)?;

    let mut session = Session::new(PointerEngine);
    session.set_observer(|computation| {
        info!(
            "step [{}] {:?} ({:?})",
            computation.path, computation.state, computation.duration
        );
    });

    let runtime = Runtime::new()?;
    let target = runtime.block_on(session.compute_graph(
        &graph,
        &live_query,
        Arc::new(data),
        Arc::new(Value::Null),
    ))?;

    match target.state {
        ComputationState::Successful => {
            let computed = target
                .computed
                .ok_or_else(|| anyhow!("successful record without a value"))?;
            let rendered = if config.pretty {
                serde_json::to_string_pretty(computed.as_ref())?
            } else {
                serde_json::to_string(computed.as_ref())?
            };
            println!("{rendered}");
        }
        ComputationState::Failed => {
            let message = target
                .error
                .map_or_else(|| "unknown failure".to_owned(), |error| format!("{error:#}"));
            return Err(anyhow!("query {:?} failed: {message}", target.query));
        }
        state => {
            return Err(anyhow!("pipeline ended in unexpected state {state:?}"));
        }
    }

    if config.emit_graph_param {
        println!("{}", graph.to_url_param()?);
    }
    Ok(())
}

/// Build a single chain of steps, one per query; the last query is the live
/// editor text for the target depth.
fn build_chain(queries: &[String]) -> anyhow::Result<(Graph, String)> {
    let mut graph = Graph::default();
    graph.normalize();
    let Some((live, committed)) = queries.split_last() else {
        return Ok((graph, String::new()));
    };
    for query in committed {
        // Commit each intermediate query, then branch into a fresh child;
        // the last query stays live in the "editor".
        graph = subquery(&graph, Some(query.clone()), None)?;
    }
    Ok((graph, live.clone()))
}
