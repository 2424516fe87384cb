mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Commands, ImageSource};
use pictext::{categorize, decode_base64_image, encode_image_file, Conversion};
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status when the input is not a decodable image.
const EXIT_REJECTED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pictext=info,pictext_ocr=info".into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let args = Args::parse();

  match run(args).await {
    Ok(code) => code,
    Err(e) => {
      eprintln!("Error: {:#}", e);
      ExitCode::FAILURE
    }
  }
}

async fn run(args: Args) -> Result<ExitCode> {
  match args.command {
    Commands::Version => {
      println!("pictext {}", env!("CARGO_PKG_VERSION"));
    }
    Commands::Labels { settings } => {
      let table = settings.category_table()?;
      println!("{}", serde_json::to_string_pretty(&table)?);
    }
    Commands::Classify { source, settings } => {
      let encoded = read_encoded(&source).await?;
      let image = decode_base64_image(&encoded).context("Failed to decode image")?;
      let table = settings.category_table()?;
      let classifier = settings.classifier()?;

      let classified = categorize(classifier.as_ref(), &table, &image).await?;
      println!(
        "{}\t{}\t{:.4}",
        classified.category, classified.label, classified.score
      );
    }
    Commands::Convert { source, json, settings } => {
      let encoded = read_encoded(&source).await?;
      let dispatcher = settings.build_dispatcher()?;

      let conversion = dispatcher.convert(&encoded).await;
      let rejected = matches!(conversion, Conversion::Rejected(_));

      if json {
        println!("{}", serde_json::to_string_pretty(&conversion.report())?);
      } else if let Some(text) = conversion.into_text() {
        println!("{}", text);
      }

      if rejected {
        return Ok(ExitCode::from(EXIT_REJECTED));
      }
    }
  }

  Ok(ExitCode::SUCCESS)
}

async fn read_encoded(source: &ImageSource) -> Result<String> {
  if let Some(path) = &source.image {
    return encode_image_file(path).with_context(|| format!("Failed to read {}", path.display()));
  }

  match &source.input {
    Some(path) if path.as_os_str() != "-" => tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("Failed to read {}", path.display())),
    _ => {
      let mut encoded = String::new();
      tokio::io::stdin()
        .read_to_string(&mut encoded)
        .await
        .context("Failed to read stdin")?;
      Ok(encoded)
    }
  }
}
