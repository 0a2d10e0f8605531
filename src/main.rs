use anyhow::Context;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use schema_refcheck::output::{
    EXIT_FAILURE, ensure_output_available, exit_code, exit_code_for_error, write_reference_dump,
};
use schema_refcheck::{
    AliasTable, AsyncHttpClient, CheckerError, Cli, ConfigManager, DocumentLoader,
    ProgressCallback, Reporter, RootContext, TraversalEngine, TraversalProgress, VerbosityLevel,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {:#}", error);
            error
                .downcast_ref::<CheckerError>()
                .map(exit_code_for_error)
                .unwrap_or(EXIT_FAILURE)
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = ConfigManager::load_config(&cli)
        .await
        .context("failed to load configuration")?;
    init_tracing(config.verbosity());

    // Checked before any network traffic
    if let Some(path) = &cli.refoutput {
        ensure_output_available(path)?;
    }

    let aliases = match &cli.alias {
        Some(path) => AliasTable::load(path)
            .await
            .with_context(|| format!("failed to load alias file {}", path.display()))?,
        None => AliasTable::new(),
    };
    info!(aliases = aliases.len(), "alias table ready");

    let root = if cli.file {
        RootContext::from_file(cli.url.as_str())
    } else {
        RootContext::from_url(cli.url.as_str())
    };

    let reporter = Arc::new(Reporter::new(config.output.format, config.verbosity()));
    if let Some(header) = reporter.format_header(&root) {
        println!("{}", header);
    }

    let client = AsyncHttpClient::new(config.http_client_config())?;
    let loader = DocumentLoader::new(
        Arc::new(aliases),
        root.clone(),
        Arc::new(client),
        config.loader_config(),
    );

    let cancelled = Arc::new(AtomicBool::new(false));
    spawn_interrupt_handler(Arc::clone(&cancelled));

    let engine = TraversalEngine::new(Arc::new(loader), config.traversal_config())
        .with_cancellation(cancelled);

    let echo = Arc::clone(&reporter);
    let callback: ProgressCallback = Arc::new(move |progress: TraversalProgress| {
        if let Some(line) = echo.format_progress(&progress) {
            println!("{}", line);
        }
    });

    let result = engine.run_with_progress(Some(callback)).await?;
    print!("{}", reporter.format_result(&root, &result)?);

    if let Some(path) = &cli.refoutput {
        write_reference_dump(path, result.captured()).await?;
        info!(path = %path.display(), references = result.captured().len(), "reference dump written");
    }

    Ok(exit_code(&result))
}

fn init_tracing(verbosity: VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("schema_refcheck={}", verbosity.log_directive()))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn spawn_interrupt_handler(cancelled: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping after in-flight fetches");
            cancelled.store(true, Ordering::SeqCst);
        }
    });
}
