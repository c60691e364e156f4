use std::collections::BTreeMap;
use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use concord::{
    aggregate, Corpus, Document, DocumentFilter, GroupingSpec, HitList, Sensitivity, SortOrder,
    WindowSpec,
};

mod cli;
use cli::{Cli, Commands};

/// Corpus file payload: declared schema plus documents.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Payload {
    attributes: Vec<String>,
    #[serde(default)]
    fields: Vec<String>,
    documents: Vec<Document>,
}

fn main() {
    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Group {
            corpus,
            patt,
            group,
            filter,
            sort,
            first,
            size,
            attribute,
        } => run_group(
            &corpus, &patt, &group, filter.as_deref(), &sort, first, size, &attribute,
        ),
        Commands::Inspect { corpus } => run_inspect(&corpus),
    };
    if let Err(e) = outcome {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_corpus(path: &str) -> Result<Corpus> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading corpus file {}", path))?;
    let payload: Payload =
        serde_json::from_str(&raw).with_context(|| format!("parsing corpus file {}", path))?;
    Ok(Corpus::new(
        payload.attributes,
        payload.fields,
        payload.documents,
    )?)
}

#[allow(clippy::too_many_arguments)]
fn run_group(
    corpus_path: &str,
    patt: &str,
    group: &str,
    filter: Option<&str>,
    sort: &str,
    first: u64,
    size: u64,
    attribute: &str,
) -> Result<()> {
    let corpus = load_corpus(corpus_path)?;

    let hits: HitList = if patt == "[]" {
        corpus.all_token_hits()
    } else {
        let literal = patt.trim_matches('"');
        corpus.word_hits(attribute, literal, Sensitivity::Insensitive)
    };

    let spec: GroupingSpec = group.parse()?;
    let doc_filter: DocumentFilter = filter.unwrap_or("").parse()?;
    let sort_order: SortOrder = sort.parse()?;
    let window_spec = WindowSpec {
        first_result: first,
        requested_size: size,
    };

    let mut params = BTreeMap::new();
    params.insert("patt".to_string(), patt.to_string());
    params.insert("group".to_string(), group.to_string());
    params.insert("sort".to_string(), sort.to_string());
    if let Some(f) = filter {
        params.insert("filter".to_string(), f.to_string());
    }

    let response = aggregate(
        &corpus,
        &hits,
        &spec,
        &doc_filter,
        &sort_order,
        &window_spec,
        params,
    )?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run_inspect(corpus_path: &str) -> Result<()> {
    let corpus = load_corpus(corpus_path)?;
    println!("attributes: {}", corpus.attributes().join(", "));
    println!("fields:     {}", corpus.fields().join(", "));
    println!("documents:  {}", corpus.num_docs());
    for doc in corpus.doc_ids() {
        println!("  doc {}: {} tokens", doc.get(), corpus.doc_len(doc));
    }
    Ok(())
}
