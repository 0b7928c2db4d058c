use std::env;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use markidx_core::cap::effective_cap;
use markidx_core::config::{resolve_with_base, Config};
use markidx_core::memory::{MarkupData, MemoryDocument};
use markidx_core::types::ViewPhase;
use markidx_index::MarkupIndex;

const VOCABULARY: [&str; 5] = ["beam", "column", "slab", "footing", "rebar"];

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <scan <pages> <per_page> [filter] | caps <pages>>", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn arg_usize(args: &[String], i: usize, name: &str) -> anyhow::Result<usize> {
    let raw = args.get(i).with_context(|| format!("missing <{}>", name))?;
    raw.parse().with_context(|| format!("<{}> must be a number, got '{}'", name, raw))
}

/// `MARKIDX_CONFIG` names an explicit file; otherwise the usual layered lookup.
fn load_config() -> anyhow::Result<Config> {
    match env::var("MARKIDX_CONFIG") {
        Ok(path) => {
            let cwd = env::current_dir()?;
            Config::load_from(resolve_with_base(&cwd, path).to_string_lossy())
        }
        Err(_) => Config::load(),
    }
}

/// Every fifth markup is a measurement; the rest are notes cycling through a
/// small construction vocabulary so filters have something to match.
fn synthetic_document(pages: usize, per_page: usize) -> anyhow::Result<MemoryDocument> {
    let mut doc = MemoryDocument::new(pages);
    let mut n = 0usize;
    for page in 0..pages {
        for _ in 0..per_page {
            let data = if n % 5 == 4 {
                MarkupData::measurement(1.0 + (n % 17) as f64 * 0.25)
            } else {
                let word = VOCABULARY[n % VOCABULARY.len()];
                MarkupData::note("text", &format!("Check {} at grid {}", word, n % 40))
            };
            doc.add_markup(page, data)?;
            n += 1;
        }
    }
    Ok(doc)
}

async fn scan(index: &mut MarkupIndex, doc: &MemoryDocument, filter: Option<&str>) -> anyhow::Result<()> {
    match filter {
        Some(f) => index.set_filter(doc, f),
        None => index.refresh(doc, None, false),
    };

    let pb = ProgressBar::new(index.rebuild_progress().map_or(0, |(_, planned)| planned as u64));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages {msg}")?
            .progress_chars("#>-"),
    );
    let mut provisional_seen = false;
    while index.pump(doc) {
        if let Some((done, planned)) = index.rebuild_progress() {
            pb.set_length(planned as u64);
            pb.set_position(done as u64);
        }
        if !provisional_seen && index.current_view().phase == ViewPhase::Provisional {
            provisional_seen = true;
            pb.println(format!("preview: {}", index.status_label()));
        }
        pb.set_message(index.status_label());
        tokio::task::yield_now().await;
    }
    pb.finish_with_message(index.status_label());

    println!("{}", index.status_label());
    let m = index.measurement_summary();
    println!("measurements: {} totaling {:.2}", m.count, m.total_magnitude);
    println!("{}", serde_json::to_string_pretty(&index.stats(doc))?);
    let preview: Vec<_> = index.current_view().result.listed.iter().take(10).collect();
    println!("{}", serde_json::to_string_pretty(&preview)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let config = load_config().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.index_settings()?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "scan" => {
            let pages = arg_usize(&args, 0, "pages")?;
            let per_page = arg_usize(&args, 1, "per_page")?;
            let filter = args.get(2).map(String::as_str);
            let doc = synthetic_document(pages, per_page)?;
            info!(pages, markups = doc.markup_count(), "synthetic document ready");
            let mut index = MarkupIndex::new(settings);
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
            rt.block_on(scan(&mut index, &doc, filter))?;
        }
        "caps" => {
            let pages = arg_usize(&args, 0, "pages")?;
            println!("effective cap for {} pages: {}", pages, effective_cap(pages, &settings.caps));
        }
        _ => {
            eprintln!("Unknown command: {}", cmd);
            std::process::exit(1);
        }
    }
    Ok(())
}
