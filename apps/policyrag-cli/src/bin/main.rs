use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use policyrag_core::chunker::ChunkConfig;
use policyrag_core::config::{expand_path, Config};
use policyrag_core::roles::KeywordRoleTagger;
use policyrag_core::types::DEFAULT_EMBED_DIM;
use policyrag_embed::{chat_provider, embedding_provider, ProviderSettings};
use policyrag_pipeline::{
    IngestRequest, Ingestor, PdfExtractor, QueryEngine, QueryOptions, QueryRequest,
};
use policyrag_vector::PolicyStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <ingest|ask|documents|delete> [args...]", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1).cloned())
}

struct App {
    store: Arc<PolicyStore>,
    ingestor: Ingestor,
    engine: QueryEngine,
}

async fn build_app(config: &Config) -> anyhow::Result<App> {
    let db_dir = expand_path(
        config
            .get::<String>("store.db_dir")
            .unwrap_or_else(|_| "./data/lancedb".to_string()),
    );
    let table: String = config
        .get("store.table")
        .unwrap_or_else(|_| "policies".to_string());
    let dim: usize = config.get("store.dim").unwrap_or(DEFAULT_EMBED_DIM);
    let store = Arc::new(PolicyStore::open(&db_dir.to_string_lossy(), &table, dim).await?);

    let settings = ProviderSettings {
        base_url: config
            .get("provider.base_url")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
        api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
        embed_model: config
            .get("provider.embed_model")
            .unwrap_or_else(|_| "text-embedding-3-large".to_string()),
        chat_model: config
            .get("provider.chat_model")
            .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        dim,
    };
    let embedder = embedding_provider(&settings)?;
    if embedder.dim() != store.dim() {
        anyhow::bail!(
            "embedding dim {} does not match store dim {}",
            embedder.dim(),
            store.dim()
        );
    }
    let chat = chat_provider(&settings)?;

    let ingestor = Ingestor::new(
        store.clone(),
        embedder.clone(),
        Arc::new(PdfExtractor::new()),
        Arc::new(KeywordRoleTagger::new()),
        ChunkConfig::default(),
    );
    let engine = QueryEngine::new(store.clone(), embedder, chat, QueryOptions::default());
    Ok(App {
        store,
        ingestor,
        engine,
    })
}

fn ingest_request(path: &PathBuf, source_id: Option<String>, args: &[String]) -> IngestRequest {
    let source_id = source_id.or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
    });
    IngestRequest {
        pdf_path: Some(path.clone()),
        pdf_bytes: None,
        source_id,
        policy_type: flag_value(args, "--policy-type").unwrap_or_default(),
        version: flag_value(args, "--version").unwrap_or_default(),
        jurisdiction: flag_value(args, "--jurisdiction").unwrap_or_default(),
    }
}

async fn run_ingest(app: &App, args: &[String]) -> anyhow::Result<()> {
    let target = args.first().map(PathBuf::from).unwrap_or_else(|| {
        eprintln!("Usage: policyrag ingest <pdf-or-directory> [--source-id S] [--policy-type T] [--version V] [--jurisdiction J]");
        std::process::exit(1)
    });

    if target.is_dir() {
        let mut files: Vec<PathBuf> = WalkDir::new(&target)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| {
                p.extension()
                    .and_then(|s| s.to_str())
                    .map(|s| s.eq_ignore_ascii_case("pdf"))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        if files.is_empty() {
            println!("No .pdf files found under {}.", target.display());
            return Ok(());
        }
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        let mut total = 0usize;
        for file in &files {
            pb.set_message(format!("{}", file.display()));
            let outcome = app.ingestor.run(ingest_request(file, None, args)).await?;
            total += outcome.ingested;
            pb.inc(1);
        }
        pb.finish_with_message("done");
        println!(
            "Ingested {} chunks from {} documents under {}",
            total,
            files.len(),
            target.display()
        );
        return Ok(());
    }

    let outcome = app
        .ingestor
        .run(ingest_request(&target, flag_value(args, "--source-id"), args))
        .await?;
    println!("Ingested {} chunks from {}", outcome.ingested, target.display());
    Ok(())
}

async fn run_ask(app: &App, args: &[String]) -> anyhow::Result<()> {
    let question = args.first().cloned().unwrap_or_else(|| {
        eprintln!("Usage: policyrag ask \"<question>\" [top_k] [--source S ...]");
        std::process::exit(1)
    });

    let mut request = QueryRequest::new(question);
    let mut allowed: Vec<String> = Vec::new();
    let mut rest = args[1..].iter();
    while let Some(arg) = rest.next() {
        if arg == "--source" {
            if let Some(s) = rest.next() {
                allowed.push(s.clone());
            }
        } else if let Ok(k) = arg.parse::<usize>() {
            request.top_k = k;
        }
    }
    if !allowed.is_empty() {
        request.allowed_sources = Some(allowed);
    }

    let result = app.engine.run(request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn run_documents(app: &App) -> anyhow::Result<()> {
    let documents = app.store.list_documents().await?;
    println!("{}", serde_json::to_string_pretty(&documents)?);
    Ok(())
}

async fn run_delete(app: &App, args: &[String]) -> anyhow::Result<()> {
    let source_id = args.first().cloned().unwrap_or_else(|| {
        eprintln!("Usage: policyrag delete <source-id>");
        std::process::exit(1)
    });
    let deleted = app.store.delete_document(&source_id).await?;
    println!("Deleted {} records for {}", deleted, source_id);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let (cmd, args) = parse_args();
    let app = build_app(&config).await?;
    match cmd.as_str() {
        "ingest" => run_ingest(&app, &args).await?,
        "ask" => run_ask(&app, &args).await?,
        "documents" => run_documents(&app).await?,
        "delete" => run_delete(&app, &args).await?,
        _ => {
            eprintln!("Unknown command: {}", cmd);
            std::process::exit(1);
        }
    }
    Ok(())
}
