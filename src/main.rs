use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use praster::config::Config;
use praster::error::{AppError, AppResult};
use praster::{PageDetails, Session};

#[derive(Debug, Parser)]
#[command(name = "praster", version, about = "Render PDF pages to PNG images")]
struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print page count and page sizes as JSON.
    Info { file: PathBuf },
    /// Render pages to `page-<N>.png` files.
    Render {
        file: PathBuf,
        /// Zero-based page index; repeat for several pages.
        #[arg(long = "page", required = true)]
        pages: Vec<usize>,
        /// Output width in pixels. Defaults to the page width times `--scale`.
        #[arg(long)]
        width: Option<u32>,
        /// Output height in pixels. Defaults to the page height times `--scale`.
        #[arg(long)]
        height: Option<u32>,
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct DocumentInfo {
    path: PathBuf,
    page_count: usize,
    pages: Vec<PageDetails>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run(Cli::parse()).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let session = Arc::new(Session::new(config));

    match cli.command {
        Command::Info { file } => info(&session, &file),
        Command::Render {
            file,
            pages,
            width,
            height,
            scale,
            out,
        } => {
            let size = OutputSize::new(width, height, scale)?;
            render(session, &file, pages, size, out).await
        }
    }
}

fn info(session: &Session, file: &Path) -> AppResult<()> {
    let doc = open_checked(session, file)?;
    let page_count = session.page_count(&doc)?;
    let mut pages = Vec::with_capacity(page_count);
    for index in 0..page_count {
        let page = session.open_page(&doc, index)?;
        pages.push(session.page_details(&page)?);
        session.close_page(&page)?;
    }
    session.close_document(&doc)?;

    let info = DocumentInfo {
        path: file.to_path_buf(),
        page_count,
        pages,
    };
    let json = serde_json::to_string_pretty(&info)
        .map_err(|err| AppError::invalid_input(format!("failed to serialize info: {err}")))?;
    println!("{json}");
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct OutputSize {
    width: Option<u32>,
    height: Option<u32>,
    scale: f32,
}

impl OutputSize {
    fn new(width: Option<u32>, height: Option<u32>, scale: f32) -> AppResult<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(AppError::invalid_input(
                "scale must be a positive finite value",
            ));
        }
        Ok(Self {
            width,
            height,
            scale,
        })
    }

    fn resolve(self, details: PageDetails) -> (u32, u32) {
        let scaled = |edge: u32| ((edge as f32 * self.scale).round() as u32).max(1);
        (
            self.width.unwrap_or_else(|| scaled(details.width)),
            self.height.unwrap_or_else(|| scaled(details.height)),
        )
    }
}

async fn render(
    session: Arc<Session>,
    file: &Path,
    pages: Vec<usize>,
    size: OutputSize,
    out: PathBuf,
) -> AppResult<()> {
    std::fs::create_dir_all(&out).map_err(|source| {
        AppError::io_with_context(source, format!("failed to create {}", out.display()))
    })?;
    let doc = open_checked(&session, file)?;

    let mut tasks = Vec::with_capacity(pages.len());
    for index in pages {
        let session = Arc::clone(&session);
        let doc = doc.clone();
        let target = out.join(format!("page-{index}.png"));
        tasks.push(tokio::task::spawn_blocking(move || {
            render_one(&session, &doc, index, size, &target).map(|()| target)
        }));
    }

    let mut first_error = None;
    for task in tasks {
        match task.await {
            Ok(Ok(target)) => println!("{}", target.display()),
            Ok(Err(err)) => {
                eprintln!("{err}");
                first_error.get_or_insert(err);
            }
            Err(join_err) => {
                first_error.get_or_insert(AppError::invalid_input(format!(
                    "render task failed: {join_err}"
                )));
            }
        }
    }

    session.close_document(&doc)?;
    first_error.map_or(Ok(()), Err)
}

fn render_one(
    session: &Session,
    doc: &str,
    index: usize,
    size: OutputSize,
    target: &Path,
) -> AppResult<()> {
    let page = session.open_page(doc, index)?;
    let result = write_page(session, &page, index, size, target);
    session.close_page(&page)?;
    result
}

fn write_page(
    session: &Session,
    page: &str,
    index: usize,
    size: OutputSize,
    target: &Path,
) -> AppResult<()> {
    let details = session.page_details(page)?;
    if details == PageDetails::default() {
        return Err(AppError::invalid_input(format!(
            "page {index} does not exist"
        )));
    }
    let (width, height) = size.resolve(details);
    let render = session.render(page, width, height)?;
    std::fs::write(target, &render.bytes).map_err(|source| {
        AppError::io_with_context(source, format!("failed to write {}", target.display()))
    })
}

fn open_checked(session: &Session, file: &Path) -> AppResult<String> {
    let doc = session.open_document_path(file)?;
    let document = session.lookup_document(&doc)?;
    if let Some(reason) = document.invalid_reason() {
        let message = format!("{}: {reason}", file.display());
        drop(document);
        session.close_document(&doc)?;
        return Err(AppError::invalid_input(message));
    }
    Ok(doc)
}
