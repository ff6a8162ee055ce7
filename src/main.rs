//! Font picker command line
//!
//! Browses the font catalog and registers fonts in a JSON style document
use clap::{Parser, Subcommand};
use fontpicker_rs::{
    catalog::CatalogSource,
    config::Config,
    error::FontPickerError,
    media::DirectoryMediaStore,
    picker::{FontPicker, Services},
    sfnt::SfntParser,
    styles::JsonStyleStore,
    transport::UreqTransport,
    view::ConsoleViewManager,
};
use std::{path::PathBuf, sync::Arc};
#[allow(unused_imports)]
use tracing::{debug, error, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lists the catalog fonts whose family name contains PATTERN
    Search {
        /// Case insensitive family name filter
        #[arg(default_value = "")]
        pattern: String,

        /// Number of pages to list
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Registers a catalog font in the style document
    Select {
        /// Family name, case insensitive
        family: String,
    },
    /// Uploads a font file and registers it in the style document
    Upload { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), FontPickerError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::new()?;
    let view = Arc::new(ConsoleViewManager::new());
    let services = Services {
        transport: Arc::new(UreqTransport::new()),
        styles: Arc::new(JsonStyleStore::new(&config.styles_path)),
        media: Arc::new(DirectoryMediaStore::new(&config.media_path)),
        view: view.clone(),
        parser: Arc::new(SfntParser),
    };
    let mut builder = FontPicker::builder(services).configure(&config);
    if config.catalog_api_key.is_some() {
        builder = builder.catalog_source(CatalogSource::from_config(&config)?);
    }
    let picker = builder.build();

    let res = match cli.command {
        Command::Search { pattern, pages } => search(&picker, &pattern, pages).await,
        Command::Select { family } => select(&picker, &family).await,
        Command::Upload { file } => {
            view.queue_file(&file);
            match picker.upload_font().await {
                Ok(Some(descriptor)) => {
                    println!("{}\t{}", descriptor.key, descriptor.family);
                    Ok(())
                }
                Ok(None) => Ok(()),
                Err(e) => Err(e),
            }
        }
    };
    if let Err(e) = &res {
        error!("{e}");
    }
    res
}

async fn search(picker: &FontPicker, pattern: &str, pages: usize) -> Result<(), FontPickerError> {
    picker.load_catalog().await?;
    picker.search(pattern).await;
    for _ in 1..pages {
        if picker.load_next_page() == 0 {
            break;
        }
    }
    for font in picker.visible_fonts() {
        let preview = font.preview();
        println!(
            "{}\t{}\t{}",
            font.family(),
            font.entry().category.as_deref().unwrap_or("-"),
            preview.file.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn select(picker: &FontPicker, family: &str) -> Result<(), FontPickerError> {
    picker.load_catalog().await?;
    picker.search(family).await;
    loop {
        let found = picker
            .visible_fonts()
            .into_iter()
            .find(|font| font.family().eq_ignore_ascii_case(family));
        if let Some(font) = found {
            let descriptor = picker.select_font(&font).await?;
            println!("{}\t{}", descriptor.key, descriptor.family);
            return Ok(());
        }
        if picker.load_next_page() == 0 {
            return Err(FontPickerError::FontNotFound(family.to_string()));
        }
    }
}
