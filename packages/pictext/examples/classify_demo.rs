use anyhow::{Context, Result};
use pictext::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .context("usage: classify_demo <image file>")?;

    // Load the image the same way the CLI does for --image
    let encoded = encode_image_file(std::path::Path::new(&path))?;
    let image = decode_base64_image(&encoded)?;
    println!("Image: {} ({}x{}, {})", path, image.width(), image.height(), image.mime_type());
    println!();

    let table = CategoryTable::default();
    let classifier = ClipClassifier::new()?;

    let classification = classifier
        .classify(&image, &table.candidate_labels())
        .await?;
    println!("Best label: {}", classification.label);
    println!("  Category: {}", table.category_of(&classification.label));
    println!("  Score: {:.4}", classification.score);
    println!();

    // Show what each category would do with it
    println!("Routing:");
    println!("{}", "=".repeat(60));
    for category in [Category::Text, Category::Formula, Category::Graph] {
        let marker = if table.category_of(&classification.label) == category {
            "->"
        } else {
            "  "
        };
        println!("{} {:<8} {}", marker, category, table.labels(category).join(", "));
    }

    Ok(())
}
