use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ragrade_cli::{
    display_banner, handle_input_with_history, is_exit_command, print_exam_summary,
    print_grading_result, print_help, print_query_answer,
};
use ragrade_core::{
    DocumentIndexer, IndexingConfig, LLMProvider, RAGEngine, RetryConfig, ScoreScaling,
    VectorStore,
};
use ragrade_grader::{load_exam, save_report, ExamGrader, GraderConfig, QaAssistant};
use ragrade_ollama::{OllamaClient, OllamaConfig};
use ragrade_rag::{LocalDocumentIndexer, LocalRAGEngine, LocalVectorStore};

const DEFAULT_STORE: &str = "data/vector_db/knowledge_base.json";

type Engine = LocalRAGEngine<LocalVectorStore, LocalDocumentIndexer<LocalVectorStore>>;

#[derive(Parser)]
#[command(name = "ragrade")]
#[command(about = "Grade control-systems exam answers with retrieval-augmented LLM feedback", long_about = None)]
#[command(version)]
struct Cli {
    /// Knowledge base file used for retrieval
    #[arg(long, global = true, default_value = DEFAULT_STORE)]
    store: PathBuf,

    /// Ollama model, overriding OLLAMA_MODEL
    #[arg(long, global = true)]
    model: Option<String>,

    /// Log filter, overriding RUST_LOG (e.g. "debug", "ragrade_grader=trace")
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade an exam file, or a single answer with --question
    Grade(GradeArgs),
    /// Ask questions about the indexed course material
    Query {
        /// Answer one question and exit instead of starting the interactive prompt
        question: Option<String>,

        /// Number of snippets to retrieve per question
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Index a directory of .txt and .md course notes
    Index {
        /// Directory to scan recursively
        dir: PathBuf,

        /// Remove previously indexed material first
        #[arg(long)]
        clear: bool,

        #[arg(long, default_value_t = IndexingConfig::default().chunk_size)]
        chunk_size: usize,

        #[arg(long, default_value_t = IndexingConfig::default().chunk_overlap)]
        chunk_overlap: usize,
    },
}

#[derive(Args)]
struct GradeArgs {
    /// Exam file: a JSON array of {question, student_answer, correct_answer}
    #[arg(required_unless_present = "question")]
    exam: Option<PathBuf>,

    /// Where to write the JSON report (a .txt report is written alongside)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum score per question
    #[arg(long)]
    max_score: Option<u32>,

    /// Number of snippets to retrieve per question
    #[arg(long)]
    top_k: Option<usize>,

    /// Rescale the model's 0-100 score to the maximum instead of clamping
    #[arg(long)]
    rescale: bool,

    /// Total generator attempts per question
    #[arg(long)]
    retries: Option<u32>,

    /// Grade a single question instead of an exam file
    #[arg(long, conflicts_with = "exam", requires = "student", requires = "reference")]
    question: Option<String>,

    /// Student answer for --question
    #[arg(long, requires = "question")]
    student: Option<String>,

    /// Reference answer for --question
    #[arg(long, requires = "question")]
    reference: Option<String>,
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Commands::Grade(args) => grade(args, &cli.store, cli.model).await,
        Commands::Query { question, top_k } => query(question, top_k, &cli.store, cli.model).await,
        Commands::Index {
            dir,
            clear,
            chunk_size,
            chunk_overlap,
        } => index(&dir, clear, IndexingConfig { chunk_size, chunk_overlap }, &cli.store).await,
    }
}

/// Build the generator, tolerating an unreachable server
async fn connect_llm(model: Option<String>) -> Result<OllamaClient> {
    let mut config = OllamaConfig::from_env().context("Invalid Ollama configuration")?;
    if let Some(model) = model {
        config.model = model;
    }

    let mut llm = OllamaClient::new(config)?;
    if let Err(e) = llm.connect().await {
        warn!(error = %e, "could not reach Ollama, generation will fail until it is available");
    }
    Ok(llm)
}

/// Open the knowledge base and make it ready for retrieval
async fn open_engine(store_path: &Path, indexing: IndexingConfig) -> Result<Engine> {
    let mut store = LocalVectorStore::persistent(store_path);
    store
        .connect()
        .await
        .with_context(|| format!("Failed to open knowledge base {}", store_path.display()))?;

    let store = Arc::new(store);
    let count = store.count().await?;
    if count == 0 {
        warn!(store = %store_path.display(), "knowledge base is empty, run `ragrade index <dir>` first");
    }

    let indexer = Arc::new(LocalDocumentIndexer::with_config(store.clone(), indexing));
    let mut engine = LocalRAGEngine::new(store, indexer);
    engine.initialize().await?;
    info!(chunks = count, "knowledge base ready");
    Ok(engine)
}

fn default_output_path(exam: &Path) -> PathBuf {
    let stem = exam
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "exam".to_string());
    exam.with_file_name(format!("{}_graded.json", stem))
}

async fn grade(args: GradeArgs, store: &Path, model: Option<String>) -> Result<()> {
    let mut config = GraderConfig::from_env().context("Invalid grader configuration")?;
    if let Some(max_score) = args.max_score {
        config = config.with_max_score(max_score);
    }
    if let Some(top_k) = args.top_k {
        config = config.with_top_k(top_k);
    }
    if args.rescale {
        config = config.with_score_scaling(ScoreScaling::Rescale);
    }
    if let Some(retries) = args.retries {
        config = config.with_retry(RetryConfig::with_attempts(retries));
    }
    config.validate()?;

    // Exam file errors are fatal before any grading starts
    let exam = match &args.exam {
        Some(path) => Some((
            path.clone(),
            load_exam(path)
                .await
                .with_context(|| format!("Failed to read exam file {}", path.display()))?,
        )),
        None => None,
    };

    let llm = connect_llm(model).await?;
    let engine = open_engine(store, IndexingConfig::default()).await?;
    let max_score = config.max_score_per_question;
    let grader = ExamGrader::new(llm, engine, config);

    if let Some((path, items)) = exam {
        println!("{} Grading {} questions from {}", "📝".cyan(), items.len(), path.display());
        let report = grader.grade_exam(&items).await;

        let output = args.output.unwrap_or_else(|| default_output_path(&path));
        let companion = save_report(&report, &output)
            .await
            .with_context(|| format!("Failed to write report {}", output.display()))?;

        println!();
        print_exam_summary(&report);
        println!();
        println!("{} Results saved to {}", "✅".green(), output.display());
        println!("{} Report saved to {}", "📄".green(), companion.display());
        return Ok(());
    }

    let question = args.question.unwrap_or_default();
    let result = grader
        .grade_answer(
            &question,
            args.student.as_deref().unwrap_or_default(),
            args.reference.as_deref().unwrap_or_default(),
            max_score,
        )
        .await;

    if let Some(output) = args.output {
        tokio::fs::write(&output, serde_json::to_string_pretty(&result)?)
            .await
            .with_context(|| format!("Failed to write result {}", output.display()))?;
    }
    print_grading_result(&result, max_score);
    Ok(())
}

async fn query(question: Option<String>, top_k: Option<usize>, store: &Path, model: Option<String>) -> Result<()> {
    let config = GraderConfig::from_env().context("Invalid grader configuration")?;
    let top_k = top_k.unwrap_or(config.top_k).max(1);

    let llm = connect_llm(model).await?;
    let model_id = llm.model_id().to_string();
    let engine = open_engine(store, IndexingConfig::default()).await?;
    let assistant = QaAssistant::new(llm, engine, top_k);

    if let Some(question) = question {
        print_query_answer(&assistant.answer(&question).await);
        return Ok(());
    }

    display_banner(&model_id);
    let mut history = Vec::new();

    loop {
        let input = handle_input_with_history(&mut history).await?;

        if input.is_empty() {
            continue;
        }

        if is_exit_command(&input) {
            println!("{}", "👋 Goodbye!".green());
            break;
        }

        match input.to_lowercase().as_str() {
            "help" => print_help(),
            "history" => {
                for (i, entry) in history.iter().enumerate() {
                    println!("  {:>3}  {}", i + 1, entry);
                }
            }
            "stats" => {
                let stats = assistant.rag().stats().await?;
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            _ => {
                let answer = assistant.answer(&input).await;
                print_query_answer(&answer);
            }
        }
    }

    Ok(())
}

async fn index(dir: &Path, clear: bool, indexing: IndexingConfig, store_path: &Path) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Knowledge base directory not found: {}", dir.display());
    }

    let mut store = LocalVectorStore::persistent(store_path);
    store
        .connect()
        .await
        .with_context(|| format!("Failed to open knowledge base {}", store_path.display()))?;
    if clear {
        store.clear().await?;
    }

    let store = Arc::new(store);
    let indexer = LocalDocumentIndexer::with_config(store.clone(), indexing);

    println!("{} Indexing {}", "📚".cyan(), dir.display());
    let result = indexer.index_directory(dir).await?;

    for error in &result.errors {
        println!("{} {}", "⚠️ ".yellow(), error);
    }
    println!(
        "{} Indexed {} documents into {} chunks ({} failed); knowledge base now holds {} chunks",
        "✅".green(),
        result.documents_indexed,
        result.chunks_indexed,
        result.documents_failed,
        store.count().await?
    );
    println!("   Stored at {}", store_path.display());
    Ok(())
}
